//! Transport abstraction and the midir-backed implementation.
//!
//! The driver core only needs send/receive primitives; port discovery by
//! name substring and the midir plumbing live here. Incoming bytes are
//! posted from the midir callback onto a bounded channel and drained with a
//! non-blocking `try_receive`, so the session's reader thread never blocks
//! inside the MIDI backend.

use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

use crate::error::TwisterError;
use crate::midi::format_hex;

/// Raw byte-message transport to the device.
pub trait Transport: Send {
    /// Send raw MIDI bytes (channel message or SysEx frame).
    fn send(&mut self, data: &[u8]) -> Result<(), TwisterError>;

    /// Non-blocking poll for the next inbound message.
    fn try_receive(&mut self) -> Option<Vec<u8>>;

    /// Release ports. Further sends fail with a transport error.
    fn close(&mut self);
}

/// Depth of the inbound message queue. A turn of all 64 encoders at full
/// speed is well under this.
const INBOUND_QUEUE: usize = 1024;

/// midir-backed transport.
pub struct MidirTransport {
    // Held so the input callback stays alive
    input_conn: Option<MidiInputConnection<()>>,
    output_conn: Option<MidiOutputConnection>,
    rx: Receiver<Vec<u8>>,
}

impl MidirTransport {
    /// Open the first input/output port pair whose names contain
    /// `port_hint` (case-insensitive).
    pub fn connect(port_hint: &str) -> Result<Self, TwisterError> {
        let midi_in = MidiInput::new("Twister-Driver-Input")
            .map_err(|e| TwisterError::Transport(e.to_string()))?;

        let (in_port, in_name) = Self::find_input_port(&midi_in, port_hint)
            .ok_or_else(|| TwisterError::PortNotFound(port_hint.to_string()))?;

        info!("Connecting to input port: {}", in_name);

        let (tx, rx): (Sender<Vec<u8>>, Receiver<Vec<u8>>) = bounded(INBOUND_QUEUE);

        let input_conn = midi_in
            .connect(
                &in_port,
                "Twister-Driver",
                move |_timestamp, data, _| {
                    // Never block or panic inside the midir callback; if the
                    // queue is full the message is dropped like device noise.
                    let _ = tx.try_send(data.to_vec());
                },
                (),
            )
            .map_err(|e| TwisterError::Transport(e.to_string()))?;

        let midi_out = MidiOutput::new("Twister-Driver-Output")
            .map_err(|e| TwisterError::Transport(e.to_string()))?;

        let (out_port, out_name) = Self::find_output_port(&midi_out, port_hint)
            .ok_or_else(|| TwisterError::PortNotFound(port_hint.to_string()))?;

        info!("Connecting to output port: {}", out_name);

        let output_conn = midi_out
            .connect(&out_port, "Twister-Driver")
            .map_err(|e| TwisterError::Transport(e.to_string()))?;

        Ok(Self {
            input_conn: Some(input_conn),
            output_conn: Some(output_conn),
            rx,
        })
    }

    /// Find an input port by substring match (Windows-friendly)
    fn find_input_port(
        midi_in: &MidiInput,
        pattern: &str,
    ) -> Option<(midir::MidiInputPort, String)> {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// Find an output port by substring match (Windows-friendly)
    fn find_output_port(
        midi_out: &MidiOutput,
        pattern: &str,
    ) -> Option<(midir::MidiOutputPort, String)> {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                if name.to_lowercase().contains(&pattern.to_lowercase()) {
                    debug!("Found port '{}' matching pattern '{}'", name, pattern);
                    return Some((port, name));
                }
            }
        }
        None
    }

    /// List available MIDI port names as `(inputs, outputs)`.
    pub fn list_ports() -> Result<(Vec<String>, Vec<String>), TwisterError> {
        let midi_in = MidiInput::new("Twister-Driver-Scanner")
            .map_err(|e| TwisterError::Transport(e.to_string()))?;
        let inputs = midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect();

        let midi_out = MidiOutput::new("Twister-Driver-Scanner")
            .map_err(|e| TwisterError::Transport(e.to_string()))?;
        let outputs = midi_out
            .ports()
            .iter()
            .filter_map(|p| midi_out.port_name(p).ok())
            .collect();

        Ok((inputs, outputs))
    }
}

impl Transport for MidirTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TwisterError> {
        let conn = self
            .output_conn
            .as_mut()
            .ok_or_else(|| TwisterError::Transport("output port closed".to_string()))?;

        conn.send(data)
            .map_err(|e| TwisterError::Transport(e.to_string()))?;

        debug!("Sent: {}", format_hex(data));
        Ok(())
    }

    fn try_receive(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    fn close(&mut self) {
        // Dropping the connections closes the ports
        self.input_conn = None;
        self.output_conn = None;
        info!("MIDI ports closed");
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording transport for synchronizer and session tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Shared-handle mock: clones observe the same queues, so a test can
    /// keep one clone while the session owns another.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
        pub inbound: Arc<Mutex<VecDeque<Vec<u8>>>>,
        fail_sends: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `n` sends fail with a transport error.
        pub fn fail_next_sends(&self, n: usize) {
            self.fail_sends.store(n, Ordering::SeqCst);
        }

        pub fn push_inbound(&self, data: Vec<u8>) {
            self.inbound.lock().push_back(data);
        }

        pub fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.sent.lock().clone()
        }

        pub fn clear_sent(&self) {
            self.sent.lock().clear();
        }

        pub fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, data: &[u8]) -> Result<(), TwisterError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(TwisterError::Transport("closed".to_string()));
            }
            let remaining = self.fail_sends.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_sends.store(remaining - 1, Ordering::SeqCst);
                return Err(TwisterError::Transport("injected failure".to_string()));
            }
            self.sent.lock().push(data.to_vec());
            Ok(())
        }

        fn try_receive(&mut self) -> Option<Vec<u8>> {
            self.inbound.lock().pop_front()
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}
