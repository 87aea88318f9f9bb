//! Configuration push orchestration.
//!
//! Owns the shared encoder array and the global settings block, and decides
//! what a full or incremental push must retransmit. Commit semantics are
//! at-least-once: dirty flags clear only after the transport accepted every
//! frame for an encoder, so a failed send retries on the next push.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::constants::{
    colors, Bank, EncoderMidiType, IndicatorType, MovementType, SwitchAction,
    ENCODER_COUNT,
};
use crate::device_settings::DeviceSettings;
use crate::encoder::{EncoderState, SettingKind};
use crate::error::TwisterError;
use crate::sysex;
use crate::transport::Transport;

/// Outcome of a push. Failed encoders keep their dirty flags and retry on
/// the next `push_modified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub encoders_sent: usize,
    pub encoders_failed: usize,
    pub global_sent: bool,
}

impl SyncReport {
    /// Whether anything at all went out on the wire.
    pub fn any_sent(&self) -> bool {
        self.encoders_sent > 0 || self.global_sent
    }
}

/// The device's configuration model: 64 encoders plus the global block.
#[derive(Clone)]
pub struct ConfigSync {
    encoders: Vec<Arc<Mutex<EncoderState>>>,
    device: Arc<Mutex<DeviceSettings>>,
}

impl ConfigSync {
    pub fn new(
        encoders: Vec<Arc<Mutex<EncoderState>>>,
        device: Arc<Mutex<DeviceSettings>>,
    ) -> Self {
        Self { encoders, device }
    }

    /// Shared handle to one encoder's state.
    pub fn encoder(&self, index: usize) -> Result<Arc<Mutex<EncoderState>>, TwisterError> {
        self.encoders
            .get(index)
            .cloned()
            .ok_or(TwisterError::InvalidEncoder(index))
    }

    /// Shared handle to the global settings block.
    pub fn device_settings(&self) -> Arc<Mutex<DeviceSettings>> {
        self.device.clone()
    }

    /// Load the factory-style defaults: relative encoders, blended-bar
    /// indicators, and a distinct color scheme per bank.
    pub fn initialize_defaults(&self) {
        for bank in Bank::ALL {
            let (inactive_color, active_color) = match bank {
                Bank::Bank1 => (colors::BLUE, colors::RED),
                Bank::Bank2 => (colors::PINK, colors::BLUE),
                Bank::Bank3 => (colors::YELLOW, colors::PINK),
                Bank::Bank4 => (colors::RED, colors::YELLOW),
            };

            for slot in 0..crate::constants::ENCODERS_PER_BANK {
                let index = bank.base_index() + slot;
                let mut enc = self.encoders[index].lock();
                enc.set_detent(false);
                enc.set_kind(SettingKind::Movement, MovementType::DirectHighResolution.code());
                enc.set_kind(SettingKind::SwitchActionType, SwitchAction::CcHold.code());
                enc.set_kind(SettingKind::SwitchMidiChannel, 2);
                enc.set_kind(SettingKind::SwitchMidiNumber, index as u8);
                // No longer used by the firmware, still part of the block
                enc.set_kind(SettingKind::SwitchMidiType, 0);
                enc.set_kind(SettingKind::EncoderMidiChannel, 1);
                enc.set_kind(SettingKind::EncoderMidiNumber, index as u8);
                // Relative type so the device reports direction codes
                enc.set_kind(SettingKind::EncoderMidiType, EncoderMidiType::SendRelEnc.code());
                enc.set_kind(SettingKind::ActiveColor, active_color);
                enc.set_kind(SettingKind::InactiveColor, inactive_color);
                enc.set_kind(SettingKind::DetentColor, colors::DEFAULT_DETENT);
                enc.set_kind(
                    SettingKind::IndicatorDisplayType,
                    IndicatorType::BlendedBar.code(),
                );
                enc.set_kind(SettingKind::IsSuperKnob, crate::constants::CFG_FALSE);
                enc.set_kind(SettingKind::ShiftMidiChannel, 0);
            }
        }
    }

    /// Push every configured setting of every encoder, then the global
    /// block, regardless of dirty state. First-time device bring-up.
    pub fn push_all<T: Transport>(&self, transport: &mut T) -> SyncReport {
        let mut report = self.push_encoders(transport, true);
        report.global_sent = self.push_global(transport);
        report
    }

    /// Push only dirty encoders. If any encoder went out, the global block
    /// follows as the config-commit signal, even when itself unmodified.
    /// With nothing dirty anywhere, nothing is transmitted.
    pub fn push_modified<T: Transport>(&self, transport: &mut T) -> SyncReport {
        let mut report = self.push_encoders(transport, false);
        if report.encoders_sent > 0 || self.device.lock().is_dirty() {
            report.global_sent = self.push_global(transport);
        }
        report
    }

    /// One encoder's failure must not prevent attempting the rest.
    fn push_encoders<T: Transport>(&self, transport: &mut T, force_all: bool) -> SyncReport {
        let mut report = SyncReport::default();

        for slot in &self.encoders {
            let mut enc = slot.lock();
            let pairs = if force_all {
                enc.collect_full_payload()
            } else {
                if !enc.is_dirty() {
                    continue;
                }
                enc.collect_dirty_payload()
            };

            let frames = sysex::encode_bulk(enc.sysex_tag(), &pairs);
            if frames.is_empty() {
                continue;
            }

            let mut failed = false;
            for frame in &frames {
                if let Err(e) = transport.send(frame) {
                    warn!("Failed to send config for {}: {}", enc.label(), e);
                    failed = true;
                    break;
                }
            }

            if failed {
                report.encoders_failed += 1;
            } else {
                enc.commit();
                report.encoders_sent += 1;
            }
        }

        if report.encoders_sent > 0 {
            debug!(
                "Pushed config for {} encoder(s), {} failed",
                report.encoders_sent, report.encoders_failed
            );
        }
        report
    }

    fn push_global<T: Transport>(&self, transport: &mut T) -> bool {
        let mut device = self.device.lock();
        let frame = sysex::encode_global(device.entries());
        match transport.send(&frame) {
            Ok(()) => {
                device.commit();
                true
            }
            Err(e) => {
                warn!("Failed to send global config: {}", e);
                false
            }
        }
    }

    /// Build the standard 64-encoder array plus global block.
    pub fn with_default_layout() -> Self {
        let encoders = (0..ENCODER_COUNT)
            .map(|i| Arc::new(Mutex::new(EncoderState::new(i))))
            .collect();
        Self::new(encoders, Arc::new(Mutex::new(DeviceSettings::new())))
    }
}
