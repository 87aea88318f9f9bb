//! Device-wide configuration block.
//!
//! An explicit ordered list of `(address, value)` entries matching the Midi
//! Fighter Utility's sysex layout. Addresses are sparse: the gap between 24
//! and 31 is intentional and must be preserved on the wire. The global
//! push-config frame requires ascending address order, which the fixed list
//! guarantees by construction.

use crate::constants::{
    colors, EncoderMidiType, IndicatorType, SideSwitchAction, CFG_TRUE,
};
use crate::error::TwisterError;

/// Well-known addresses in the global block.
pub mod global_addr {
    pub const SYSTEM_MIDI_CHANNEL: u8 = 0;
    pub const BANK_SIDE_BUTTONS: u8 = 1;
    pub const LEFT_BUTTON_1: u8 = 2;
    pub const LEFT_BUTTON_2: u8 = 3;
    pub const LEFT_BUTTON_3: u8 = 4;
    pub const RIGHT_BUTTON_1: u8 = 5;
    pub const RIGHT_BUTTON_2: u8 = 6;
    pub const RIGHT_BUTTON_3: u8 = 7;
    pub const SUPER_KNOB_START: u8 = 8;
    pub const SUPER_KNOB_END: u8 = 9;
    pub const RGB_BRIGHTNESS: u8 = 31;
    pub const INDICATOR_BRIGHTNESS: u8 = 32;
}

/// Global configuration settings shared by all encoders.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    entries: Vec<(u8, u8)>,
    dirty: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSettings {
    /// Factory-style defaults, matching the Midi Fighter Utility table.
    pub fn new() -> Self {
        let entries = vec![
            (global_addr::SYSTEM_MIDI_CHANNEL, 4),
            (global_addr::BANK_SIDE_BUTTONS, CFG_TRUE),
            (global_addr::LEFT_BUTTON_1, SideSwitchAction::CcToggle.code()),
            (global_addr::LEFT_BUTTON_2, SideSwitchAction::BankDown.code()),
            (global_addr::LEFT_BUTTON_3, SideSwitchAction::CcToggle.code()),
            (global_addr::RIGHT_BUTTON_1, SideSwitchAction::CcToggle.code()),
            (global_addr::RIGHT_BUTTON_2, SideSwitchAction::BankUp.code()),
            (global_addr::RIGHT_BUTTON_3, SideSwitchAction::CcToggle.code()),
            (global_addr::SUPER_KNOB_START, 63),
            (global_addr::SUPER_KNOB_END, 127),
            // Addresses 10-18 and 23-24 are not documented in the reference
            // PDF; values taken from a Midi Fighter Utility capture.
            (10, 0),
            (11, 0),
            (12, 0),
            (13, 2),
            (14, 0),
            (15, 0),
            (16, 1),
            (17, 0),
            (18, EncoderMidiType::SendRelEnc.code()),
            (19, colors::DEFAULT_ACTIVE),
            (20, colors::DEFAULT_INACTIVE),
            (21, colors::DEFAULT_DETENT),
            (22, IndicatorType::BlendedBar.code()),
            (23, 0),
            (24, 0),
            // The gap to 31 matches the Midi Fighter Utility sysex
            (global_addr::RGB_BRIGHTNESS, 127),
            (global_addr::INDICATOR_BRIGHTNESS, 127),
        ];
        Self { entries, dirty: false }
    }

    /// Current value at a global address.
    pub fn get(&self, address: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|(a, _)| *a == address)
            .map(|&(_, v)| v)
    }

    /// Change a global value; marks the block dirty only on an actual
    /// change. Addresses outside the fixed layout are rejected.
    pub fn set(&mut self, address: u8, value: u8) -> Result<(), TwisterError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(a, _)| *a == address)
            .ok_or_else(|| {
                TwisterError::UnknownSetting(format!("global address {address}"))
            })?;
        if entry.1 != value {
            entry.1 = value;
            self.dirty = true;
        }
        Ok(())
    }

    /// All entries in ascending address order, ready for the global frame.
    pub fn entries(&self) -> &[(u8, u8)] {
        &self.entries
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a confirmed send.
    pub fn commit(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_ascending_with_gap() {
        let settings = DeviceSettings::new();
        let addrs: Vec<u8> = settings.entries().iter().map(|&(a, _)| a).collect();

        let mut sorted = addrs.clone();
        sorted.sort_unstable();
        assert_eq!(addrs, sorted);

        // 0..=24 then 31, 32; nothing in between
        assert!(addrs.contains(&24));
        assert!(addrs.contains(&31));
        assert!(!addrs.iter().any(|&a| (25..=30).contains(&a)));
        assert_eq!(addrs.len(), 27);
    }

    #[test]
    fn test_set_tracks_dirty_on_change_only() {
        let mut settings = DeviceSettings::new();
        assert!(!settings.is_dirty());

        // Same value as default: no dirty
        settings.set(global_addr::SUPER_KNOB_START, 63).unwrap();
        assert!(!settings.is_dirty());

        settings.set(global_addr::SUPER_KNOB_START, 64).unwrap();
        assert!(settings.is_dirty());
        assert_eq!(settings.get(global_addr::SUPER_KNOB_START), Some(64));

        settings.commit();
        assert!(!settings.is_dirty());
    }

    #[test]
    fn test_set_rejects_addresses_in_the_gap() {
        let mut settings = DeviceSettings::new();
        assert!(matches!(
            settings.set(27, 1),
            Err(TwisterError::UnknownSetting(_))
        ));
        assert!(!settings.is_dirty());
        assert_eq!(settings.get(27), None);
    }
}
