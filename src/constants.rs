//! Protocol constants for the Midi Fighter Twister.
//!
//! Channel assignments, SysEx command bytes, and the typed configuration
//! value tables from the DJ TechTools reference documentation. The driver
//! core treats the raw byte values as opaque; the enums here exist so that
//! configuration files and callers never deal in magic numbers.

use serde::{Deserialize, Serialize};

/// Substring used to locate the device's MIDI ports.
pub const DEVICE_NAME: &str = "Midi Fighter Twister";

/// Number of encoders on the device.
pub const ENCODER_COUNT: usize = 64;

/// Encoders per bank.
pub const ENCODERS_PER_BANK: usize = 16;

/// Number of selectable banks.
pub const BANK_COUNT: usize = 4;

/// Maximum raw payload bytes per bulk-transfer SysEx part.
pub const PART_SIZE_BYTES: usize = 24;

/// DJ TechTools SysEx manufacturer ID.
pub const MFR_ID: [u8; 3] = [0x00, 0x01, 0x79];

/// Config-value encodings of false/true.
pub const CFG_FALSE: u8 = 0x00;
pub const CFG_TRUE: u8 = 0x01;

/// MIDI channel assignments used by the device.
pub mod channels {
    pub const ROTARY_ENCODER: u8 = 0;
    pub const SWITCH_AND_COLOR: u8 = 1;
    pub const ANIMATIONS_AND_BRIGHTNESS: u8 = 2;
    pub const SYSTEM: u8 = 3;
    pub const SHIFT: u8 = 4;
    pub const SWITCH_ANIMATION: u8 = 5;
    pub const SEQUENCER: u8 = 7;
}

/// SysEx command bytes following the manufacturer ID.
pub mod commands {
    pub const PUSH_CONF: u8 = 0x01;
    pub const PULL_CONF: u8 = 0x02;
    pub const SYSTEM: u8 = 0x03;
    pub const BULK_XFER: u8 = 0x04;
}

/// Relative-encoder direction/speed codes sent on the rotary channel.
pub mod relative {
    pub const DECREMENT_VERYFAST: u8 = 61;
    pub const DECREMENT_FAST: u8 = 62;
    pub const DECREMENT: u8 = 63;
    pub const INCREMENT: u8 = 65;
    pub const INCREMENT_FAST: u8 = 66;
    pub const INCREMENT_VERYFAST: u8 = 67;

    /// Encoder ticks per discrete detent step.
    pub const TICKS_PER_DISCRETE_INCREMENT: u8 = 8;
}

/// Bank select values on the system channel.
pub mod system {
    pub const BANK_ON: u8 = 127;
    pub const BANK_OFF: u8 = 0;
}

/// Named LED color values on the color channel. Values 1-126 select a hue;
/// 0 and 127 select the configured inactive/active colors.
pub mod colors {
    pub const INACTIVE: u8 = 0;
    pub const ACTIVE: u8 = 127;
    pub const BLUE: u8 = 1;
    pub const GREEN: u8 = 50;
    pub const YELLOW: u8 = 64;
    pub const RED: u8 = 80;
    pub const PINK: u8 = 100;

    /// Factory defaults for the per-encoder color settings.
    pub const DEFAULT_ACTIVE: u8 = 51;
    pub const DEFAULT_INACTIVE: u8 = 1;
    pub const DEFAULT_DETENT: u8 = 63;
}

/// Animation and brightness note values on the animation channel.
/// Intermediate values within the documented brightness bands are valid too.
pub mod animations {
    pub const RGB_ANIMATION_NONE: u8 = 0;
    pub const RGB_TOGGLE_EVERY_BEAT: u8 = 4;
    pub const RGB_PULSE_EVERY_BEAT: u8 = 13;
    pub const RGB_BRIGHTNESS_OFF: u8 = 17;
    pub const RGB_BRIGHTNESS_MID: u8 = 32;
    pub const RGB_BRIGHTNESS_MAX: u8 = 47;
    pub const INDICATOR_ANIMATION_NONE: u8 = 48;
    pub const INDICATOR_BRIGHTNESS_OFF: u8 = 65;
    pub const INDICATOR_BRIGHTNESS_MID: u8 = 80;
    pub const INDICATOR_BRIGHTNESS_MAX: u8 = 95;
    pub const RAINBOW_CYCLE: u8 = 127;
}

/// One of the four encoder banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bank {
    Bank1 = 0,
    Bank2 = 1,
    Bank3 = 2,
    Bank4 = 3,
}

impl Bank {
    pub const ALL: [Bank; 4] = [Bank::Bank1, Bank::Bank2, Bank::Bank3, Bank::Bank4];

    /// CC number selecting this bank on the system channel.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Index of the bank's first encoder in the 0..=63 array.
    pub fn base_index(self) -> usize {
        self as usize * ENCODERS_PER_BANK
    }
}

/// Side-switch behaviors configurable in the global block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideSwitchAction {
    /// CC 127 while pressed, 0 on release.
    CcHold = 0x00,
    /// Toggles between CC 127 and CC 0 with each press.
    CcToggle = 0x01,
    NoteHold = 0x02,
    NoteToggle = 0x03,
    ShiftPage1 = 0x04,
    ShiftPage2 = 0x05,
    BankUp = 0x06,
    BankDown = 0x07,
    Bank1 = 0x08,
    Bank2 = 0x09,
    Bank3 = 0x0A,
    Bank4 = 0x0B,
    CycleBank = 0x0C,
}

impl SideSwitchAction {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Encoder movement response curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Highest resolution movement available.
    DirectHighResolution = 0x00,
    /// 270 degrees of rotation spans the full MIDI range.
    EmulationResponsive = 0x01,
    /// Faster turns produce larger CC changes.
    VelocitySensitive = 0x02,
}

impl MovementType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Encoder push-switch behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchAction {
    CcHold = 0x00,
    CcToggle = 0x01,
    NoteHold = 0x02,
    NoteToggle = 0x03,
    /// Resets the encoder value to 0 (63 with detent enabled).
    EncResetValue = 0x04,
    /// Reduced sensitivity while held, for fine adjustment.
    EncFineAdjust = 0x05,
    /// Secondary value while held; one encoder drives two knobs.
    ShiftHold = 0x06,
    ShiftToggle = 0x07,
}

impl SwitchAction {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// MIDI message types an encoder can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMidiType {
    /// Note On with velocity = encoder value.
    SendNote = 0x00,
    /// Absolute Control Change.
    SendCc = 0x01,
    /// Relative Control Change: 65 increments, 63 decrements.
    SendRelEnc = 0x02,
    SendNoteOff = 0x03,
    /// Mouse-emulation variants, unused by current firmware.
    SendRelEncMouseEmuDrag = 0x04,
    SendRelEncMouseEmuScroll = 0x05,
}

impl EncoderMidiType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// LED indicator display styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorType {
    Dot = 0x00,
    Bar = 0x01,
    /// Bar graph with a brightness-blended leading LED.
    BlendedBar = 0x02,
    BlendedDot = 0x03,
}

impl IndicatorType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_base_indices() {
        assert_eq!(Bank::Bank1.base_index(), 0);
        assert_eq!(Bank::Bank2.base_index(), 16);
        assert_eq!(Bank::Bank4.base_index(), 48);
        assert_eq!(Bank::Bank4.code(), 3);
    }

    #[test]
    fn test_wire_codes_match_firmware_tables() {
        assert_eq!(SideSwitchAction::CycleBank.code(), 0x0C);
        assert_eq!(MovementType::VelocitySensitive.code(), 0x02);
        assert_eq!(SwitchAction::ShiftToggle.code(), 0x07);
        assert_eq!(EncoderMidiType::SendRelEnc.code(), 0x02);
        assert_eq!(IndicatorType::BlendedBar.code(), 0x02);
    }

    #[test]
    fn test_enum_config_names() {
        let m: MovementType = serde_json::from_str("\"direct_high_resolution\"").unwrap();
        assert_eq!(m, MovementType::DirectHighResolution);
        let t: EncoderMidiType = serde_json::from_str("\"send_rel_enc\"").unwrap();
        assert_eq!(t, EncoderMidiType::SendRelEnc);
    }
}
