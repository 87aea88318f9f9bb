//! Device session: owns the transport, the encoder array, and the reader
//! thread.
//!
//! Two threads touch encoder state: the background reader applies inbound
//! values, the caller thread mutates configuration and can write values
//! directly. Every encoder sits behind its own mutex, so the two never race
//! and independent encoders never serialize against each other. Shutdown is
//! cooperative: `close()` raises the stop flag and joins the reader before
//! the ports go away, so no read completes against a closed port.

use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{channels, system, Bank, DEVICE_NAME, ENCODER_COUNT};
use crate::device_settings::DeviceSettings;
use crate::encoder::{EncoderState, SettingKind};
use crate::error::TwisterError;
use crate::knobs::KnobSettings;
use crate::mapper::RelativeStep;
use crate::midi::ChannelMessage;
use crate::sync::{ConfigSync, SyncReport};
use crate::transport::{MidirTransport, Transport};

/// Invoked with `(encoder_label, mapped_value)` when a subscribed encoder's
/// mapped value changes.
pub type ChangeCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Session lifecycle.
///
/// `Disconnected` is the pre-transport state; constructing a session
/// requires an open transport, so a live session starts at `Discovered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Discovered,
    Configured,
    Running,
    Closed,
}

/// Routes decoded messages into encoder state and fires change callbacks.
///
/// Callback gating uses the dispatcher's own per-encoder last-dispatched
/// value, not [`EncoderState::has_changed`]: that flag belongs to the
/// poll-style `read_*_changed` accessors, and the dispatcher must never
/// consume a transition it does not deliver.
#[derive(Clone)]
struct Dispatcher {
    encoders: Vec<Arc<Mutex<EncoderState>>>,
    subscriptions: Arc<RwLock<HashSet<usize>>>,
    callback: Arc<RwLock<Option<ChangeCallback>>>,
    steps: Arc<RwLock<RelativeStep>>,
    last_dispatched: Arc<Vec<Mutex<f64>>>,
}

impl Dispatcher {
    fn handle(&self, data: &[u8]) {
        let Some(msg) = ChannelMessage::parse(data) else {
            // Device noise; drop silently
            return;
        };
        let ChannelMessage::ControlChange { channel, cc, value } = msg else {
            return;
        };
        // Switch, color, and system-bank traffic is not encoder input
        if channel != channels::ROTARY_ENCODER {
            return;
        }

        let index = cc as usize;
        let Some(slot) = self.encoders.get(index) else {
            return;
        };

        let steps = *self.steps.read();
        let (label, mapped) = {
            let mut enc = slot.lock();
            if enc.is_relative() {
                enc.apply_relative(value, &steps);
            } else {
                enc.apply_raw(value);
            }
            (enc.label(), enc.mapped_value())
        };

        if !self.subscriptions.read().contains(&index) {
            return;
        }

        // Clone out of the lock so the callback can call back into the
        // session without deadlocking
        let callback = self.callback.read().clone();
        let Some(callback) = callback else {
            return;
        };

        {
            let mut last = self.last_dispatched[index].lock();
            if *last == mapped {
                return;
            }
            *last = mapped;
        }
        callback(&label, mapped);
    }
}

/// A live connection to one Midi Fighter Twister.
pub struct DeviceSession<T: Transport + 'static> {
    transport: Arc<Mutex<T>>,
    config: ConfigSync,
    dispatcher: Dispatcher,
    state: SessionState,
    bank: Bank,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl DeviceSession<MidirTransport> {
    /// Locate the device's MIDI ports by name and open them.
    pub fn discover() -> Result<Self, TwisterError> {
        let transport = MidirTransport::connect(DEVICE_NAME)?;
        info!("{} found", DEVICE_NAME);
        Ok(Self::new(transport))
    }
}

impl<T: Transport + 'static> DeviceSession<T> {
    /// Wrap an already-open transport.
    pub fn new(transport: T) -> Self {
        let encoders: Vec<_> = (0..ENCODER_COUNT)
            .map(|i| Arc::new(Mutex::new(EncoderState::new(i))))
            .collect();
        let config = ConfigSync::new(
            encoders.clone(),
            Arc::new(Mutex::new(DeviceSettings::new())),
        );

        let dispatcher = Dispatcher {
            encoders,
            subscriptions: Arc::new(RwLock::new(HashSet::new())),
            callback: Arc::new(RwLock::new(None)),
            steps: Arc::new(RwLock::new(RelativeStep::default())),
            last_dispatched: Arc::new((0..ENCODER_COUNT).map(|_| Mutex::new(0.0)).collect()),
        };

        Self {
            transport: Arc::new(Mutex::new(transport)),
            config,
            dispatcher,
            state: SessionState::Discovered,
            bank: Bank::Bank1,
            stop: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configuration model, for direct encoder/global access.
    pub fn config(&self) -> &ConfigSync {
        &self.config
    }

    /// Tune the relative-encoder step table.
    pub fn set_relative_steps(&self, steps: RelativeStep) {
        *self.dispatcher.steps.write() = steps;
    }

    /// Register the change callback fired from the reader thread.
    pub fn set_value_changed_callback<F>(&self, callback: F)
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        *self.dispatcher.callback.write() = Some(Arc::new(callback));
    }

    /// Load the factory-style default configuration for all encoders.
    pub fn initialize_defaults(&self) {
        self.config.initialize_defaults();
    }

    /// Opt an encoder into active reads and change callbacks, applying the
    /// knob settings to its configuration.
    pub fn subscribe(&self, index: usize, settings: &KnobSettings) -> Result<(), TwisterError> {
        self.ensure_open()?;
        let slot = self.config.encoder(index)?;
        settings.apply_to(&mut slot.lock())?;
        self.dispatcher.subscriptions.write().insert(index);
        Ok(())
    }

    pub fn unsubscribe(&self, index: usize) {
        self.dispatcher.subscriptions.write().remove(&index);
    }

    /// Set one configuration slot on one encoder.
    pub fn set_setting(
        &self,
        index: usize,
        kind: SettingKind,
        value: u8,
    ) -> Result<(), TwisterError> {
        self.ensure_open()?;
        self.config.encoder(index)?.lock().set_kind(kind, value);
        Ok(())
    }

    /// Update an encoder's calibrated range.
    pub fn update_range(&self, index: usize, min: f64, max: f64) -> Result<(), TwisterError> {
        self.ensure_open()?;
        self.config.encoder(index)?.lock().update_range(min, max)
    }

    /// Push the full configuration to the device (first-time bring-up).
    pub fn configure(&mut self) -> Result<SyncReport, TwisterError> {
        self.ensure_open()?;
        let report = self.config.push_all(&mut *self.transport.lock());
        self.mark_configured();
        Ok(report)
    }

    /// Push only modified configuration to the device.
    pub fn push_modified(&mut self) -> Result<SyncReport, TwisterError> {
        self.ensure_open()?;
        let report = self.config.push_modified(&mut *self.transport.lock());
        self.mark_configured();
        Ok(report)
    }

    /// Select the active bank on the device.
    pub fn set_bank(&mut self, bank: Bank) -> Result<(), TwisterError> {
        self.ensure_open()?;
        let msg = ChannelMessage::ControlChange {
            channel: channels::SYSTEM,
            cc: bank.code(),
            value: system::BANK_ON,
        };
        self.send_logged(&msg.encode())?;
        self.bank = bank;
        Ok(())
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    /// Write a mapped value back to an encoder: updates the local state and
    /// sends the raw byte as CC feedback so the LED ring follows.
    pub fn set_encoder_value(&self, index: usize, value: f64) -> Result<(), TwisterError> {
        self.ensure_open()?;
        let slot = self.config.encoder(index)?;
        let raw = slot.lock().set_mapped(value);

        let msg = ChannelMessage::ControlChange {
            channel: channels::ROTARY_ENCODER,
            cc: index as u8,
            value: raw,
        };
        self.send_logged(&msg.encode())
    }

    /// Mapped values of all encoders, indexed by encoder.
    pub fn read_all(&self) -> Vec<f64> {
        (0..ENCODER_COUNT)
            .map(|i| self.dispatcher.encoders[i].lock().mapped_value())
            .collect()
    }

    /// Mapped values that changed since the last change check.
    pub fn read_changed(&self) -> Vec<(usize, f64)> {
        self.read_changed_filtered(|_| true)
    }

    /// Mapped values of the subscribed encoders.
    pub fn read_active(&self) -> Vec<(usize, f64)> {
        let subs = self.dispatcher.subscriptions.read();
        let mut values: Vec<(usize, f64)> = subs
            .iter()
            .map(|&i| (i, self.dispatcher.encoders[i].lock().mapped_value()))
            .collect();
        values.sort_unstable_by_key(|&(i, _)| i);
        values
    }

    /// Subscribed encoders whose mapped value changed since the last check.
    pub fn read_active_changed(&self) -> Vec<(usize, f64)> {
        let subs = self.dispatcher.subscriptions.read().clone();
        self.read_changed_filtered(|i| subs.contains(&i))
    }

    fn read_changed_filtered(&self, keep: impl Fn(usize) -> bool) -> Vec<(usize, f64)> {
        (0..ENCODER_COUNT)
            .filter(|&i| keep(i))
            .filter_map(|i| {
                let mut enc = self.dispatcher.encoders[i].lock();
                enc.has_changed().then(|| (i, enc.mapped_value()))
            })
            .collect()
    }

    /// Start the background reader thread.
    pub fn start(&mut self) -> Result<(), TwisterError> {
        self.ensure_open()?;
        if self.reader.is_some() {
            return Ok(());
        }

        let stop = self.stop.clone();
        let transport = self.transport.clone();
        let dispatcher = self.dispatcher.clone();

        let handle = thread::Builder::new()
            .name("twister-reader".to_string())
            .spawn(move || {
                debug!("Reader thread started");
                while !stop.load(Ordering::Relaxed) {
                    // Hold the transport lock only for the poll itself so
                    // caller-thread sends interleave freely
                    let next = transport.lock().try_receive();
                    match next {
                        Some(bytes) => dispatcher.handle(&bytes),
                        None => thread::sleep(Duration::from_millis(1)),
                    }
                }
                debug!("Reader thread stopped");
            })
            .map_err(|e| TwisterError::Transport(format!("failed to spawn reader: {e}")))?;

        self.reader = Some(handle);
        self.state = SessionState::Running;
        Ok(())
    }

    /// Stop the reader thread and release the MIDI ports. Idempotent.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("Reader thread panicked during shutdown");
            }
        }

        self.transport.lock().close();
        self.state = SessionState::Closed;
        info!("Session closed");
    }

    fn ensure_open(&self) -> Result<(), TwisterError> {
        if self.state == SessionState::Closed {
            return Err(TwisterError::SessionClosed);
        }
        Ok(())
    }

    fn mark_configured(&mut self) {
        if self.state == SessionState::Discovered {
            self.state = SessionState::Configured;
        }
    }

    fn send_logged(&self, data: &[u8]) -> Result<(), TwisterError> {
        self.transport.lock().send(data).map_err(|e| {
            warn!("Send failed: {}", e);
            e
        })
    }
}

impl<T: Transport + 'static> Drop for DeviceSession<T> {
    fn drop(&mut self) {
        self.close();
    }
}
