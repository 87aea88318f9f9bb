//! Driver for the DJ TechTools Midi Fighter Twister.
//!
//! Talks to the device over MIDI: pushes encoder and global configuration
//! via the DJ TechTools SysEx protocol, reads encoder turns back on the
//! rotary channel, and maps raw 0-127 values into caller-defined ranges.
//!
//! Typical flow: [`DeviceSession::discover`], configure knobs with
//! [`KnobSettings`], push with [`DeviceSession::configure`], then
//! [`DeviceSession::start`] the reader and consume values through the
//! change callback or the `read_*` accessors.

pub mod constants;
pub mod device_settings;
pub mod encoder;
pub mod error;
pub mod knobs;
pub mod mapper;
pub mod midi;
pub mod session;
pub mod sync;
pub mod sysex;
pub mod transport;

pub use constants::{Bank, EncoderMidiType, IndicatorType, MovementType, SwitchAction};
pub use encoder::{EncoderState, SettingKind};
pub use error::TwisterError;
pub use knobs::{load_knob_config, KnobSettings, KnobType};
pub use mapper::RelativeStep;
pub use session::{DeviceSession, SessionState};
pub use sync::{ConfigSync, SyncReport};
pub use transport::{MidirTransport, Transport};
