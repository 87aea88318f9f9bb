//! Error types for the Twister driver.
//!
//! Transport failures are recoverable: callers log them and abort the
//! current operation only. Malformed inbound MIDI is not an error at all;
//! the decoder returns `None` and the frame is dropped.

use thiserror::Error;

/// Driver error taxonomy.
#[derive(Debug, Error)]
pub enum TwisterError {
    /// No MIDI port name contained the requested substring.
    #[error("MIDI port matching '{0}' not found")]
    PortNotFound(String),

    /// Port open, send, or receive failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Rejected at the API boundary; state is left unchanged.
    #[error("invalid range: min {min} must be less than max {max}")]
    InvalidRange { min: f64, max: f64 },

    /// Setting name or address not present in the protocol tables.
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    /// Encoder index outside 0..=63.
    #[error("invalid encoder index {0} (valid range is 0-63)")]
    InvalidEncoder(usize),

    /// Operation attempted on a closed session.
    #[error("session is closed")]
    SessionClosed,
}

pub type Result<T, E = TwisterError> = std::result::Result<T, E>;
