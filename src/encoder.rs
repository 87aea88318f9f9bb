//! Per-encoder configuration state and dirty tracking.
//!
//! Each of the 64 encoders owns fifteen configuration slots addressed by
//! [`SettingKind`], a calibrated value range, and the last raw/mapped values
//! seen from the device. Dirty flags decide what an incremental config push
//! must retransmit; they are cleared only by an explicit [`EncoderState::commit`]
//! after the transport accepted the frames, so a failed send retries with
//! the same payload.

use crate::constants::{CFG_FALSE, CFG_TRUE};
use crate::error::TwisterError;
use crate::mapper::{self, RelativeStep};

/// One of the fifteen per-encoder configuration slots, in the device's
/// configuration-table order. Bulk payloads iterate this order, not address
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKind {
    Detent,
    Movement,
    SwitchActionType,
    SwitchMidiChannel,
    SwitchMidiNumber,
    SwitchMidiType,
    EncoderMidiChannel,
    EncoderMidiNumber,
    EncoderMidiType,
    ActiveColor,
    InactiveColor,
    DetentColor,
    IndicatorDisplayType,
    IsSuperKnob,
    ShiftMidiChannel,
}

impl SettingKind {
    /// All kinds in configuration-table order.
    pub const ALL: [SettingKind; 15] = [
        SettingKind::Detent,
        SettingKind::Movement,
        SettingKind::SwitchActionType,
        SettingKind::SwitchMidiChannel,
        SettingKind::SwitchMidiNumber,
        SettingKind::SwitchMidiType,
        SettingKind::EncoderMidiChannel,
        SettingKind::EncoderMidiNumber,
        SettingKind::EncoderMidiType,
        SettingKind::ActiveColor,
        SettingKind::InactiveColor,
        SettingKind::DetentColor,
        SettingKind::IndicatorDisplayType,
        SettingKind::IsSuperKnob,
        SettingKind::ShiftMidiChannel,
    ];

    /// Protocol address of this setting in the per-encoder block.
    pub fn address(self) -> u8 {
        match self {
            SettingKind::Detent => 10,
            SettingKind::Movement => 11,
            SettingKind::SwitchActionType => 12,
            SettingKind::SwitchMidiChannel => 13,
            SettingKind::SwitchMidiNumber => 14,
            SettingKind::SwitchMidiType => 15,
            SettingKind::EncoderMidiChannel => 16,
            SettingKind::EncoderMidiNumber => 17,
            SettingKind::EncoderMidiType => 18,
            SettingKind::ActiveColor => 19,
            SettingKind::InactiveColor => 20,
            SettingKind::DetentColor => 21,
            SettingKind::IndicatorDisplayType => 22,
            SettingKind::IsSuperKnob => 23,
            SettingKind::ShiftMidiChannel => 24,
        }
    }

    /// Stable configuration name for this setting.
    pub fn name(self) -> &'static str {
        match self {
            SettingKind::Detent => "has_detent",
            SettingKind::Movement => "movement",
            SettingKind::SwitchActionType => "switch_action_type",
            SettingKind::SwitchMidiChannel => "switch_midi_channel",
            SettingKind::SwitchMidiNumber => "switch_midi_number",
            SettingKind::SwitchMidiType => "switch_midi_type",
            SettingKind::EncoderMidiChannel => "encoder_midi_channel",
            SettingKind::EncoderMidiNumber => "encoder_midi_number",
            SettingKind::EncoderMidiType => "encoder_midi_type",
            SettingKind::ActiveColor => "active_color",
            SettingKind::InactiveColor => "inactive_color",
            SettingKind::DetentColor => "detent_color",
            SettingKind::IndicatorDisplayType => "indicator_display_type",
            SettingKind::IsSuperKnob => "is_super_knob",
            SettingKind::ShiftMidiChannel => "encoder_shift_midi_channel",
        }
    }

    /// Look up a kind by configuration name. Unknown names fail fast rather
    /// than silently writing to a wrong address.
    pub fn from_name(name: &str) -> Result<Self, TwisterError> {
        SettingKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| TwisterError::UnknownSetting(name.to_string()))
    }
}

/// A single configuration slot: unset until first written, dirty once its
/// value changes. Unset slots are never emitted on the wire.
#[derive(Debug, Clone, Copy, Default)]
struct Setting {
    value: Option<u8>,
    dirty: bool,
}

impl Setting {
    /// Returns true when the stored value actually changed.
    fn set(&mut self, value: u8) -> bool {
        if self.value == Some(value) {
            return false;
        }
        self.value = Some(value);
        self.dirty = true;
        true
    }
}

/// State of one physical encoder.
#[derive(Debug, Clone)]
pub struct EncoderState {
    /// Fixed identity: also the CC number on the rotary channel.
    index: usize,
    settings: [Setting; 15],
    min: f64,
    max: f64,
    raw_value: u8,
    mapped_value: f64,
    last_reported: f64,
}

impl EncoderState {
    /// Create an encoder with all settings unset and a unit range.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            settings: [Setting::default(); 15],
            min: 0.0,
            max: 1.0,
            raw_value: 0,
            mapped_value: 0.0,
            last_reported: 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Tag identifying this encoder in bulk-transfer frames (1-based).
    pub fn sysex_tag(&self) -> u8 {
        (self.index + 1) as u8
    }

    /// Human-readable label used in change callbacks.
    pub fn label(&self) -> String {
        format!("ENCODER_{}", self.index + 1)
    }

    /// Set a configuration slot. No-op when the value is unchanged, which
    /// keeps incremental sync from retransmitting clean settings.
    pub fn set_kind(&mut self, kind: SettingKind, value: u8) {
        self.settings[kind as usize].set(value);
    }

    /// Set a configuration slot by name.
    pub fn set(&mut self, name: &str, value: u8) -> Result<(), TwisterError> {
        let kind = SettingKind::from_name(name)?;
        self.set_kind(kind, value);
        Ok(())
    }

    /// Convenience wrapper for the detent slot.
    pub fn set_detent(&mut self, on: bool) {
        self.set_kind(SettingKind::Detent, if on { CFG_TRUE } else { CFG_FALSE });
    }

    /// Current value of a slot, `None` while unset.
    pub fn get(&self, kind: SettingKind) -> Option<u8> {
        self.settings[kind as usize].value
    }

    /// Whether this encoder is configured to send relative CC codes.
    pub fn is_relative(&self) -> bool {
        self.get(SettingKind::EncoderMidiType)
            == Some(crate::constants::EncoderMidiType::SendRelEnc.code())
    }

    /// Update the calibrated range. The mapped value is recomputed from the
    /// current raw value so it never refers to a stale range.
    pub fn update_range(&mut self, min: f64, max: f64) -> Result<(), TwisterError> {
        if min >= max {
            return Err(TwisterError::InvalidRange { min, max });
        }
        self.min = min;
        self.max = max;
        self.mapped_value = mapper::map_raw(self.raw_value, min, max);
        Ok(())
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Record a raw 0-127 byte from the device and rescale it.
    pub fn apply_raw(&mut self, raw: u8) {
        self.raw_value = raw & 0x7F;
        self.mapped_value = mapper::map_raw(self.raw_value, self.min, self.max);
    }

    /// Apply a relative direction/speed code to the raw accumulator.
    /// Codes outside the documented table are ignored.
    pub fn apply_relative(&mut self, code: u8, steps: &RelativeStep) {
        if let Some(raw) = steps.accumulate(self.raw_value, code) {
            self.apply_raw(raw);
        }
    }

    /// Override the raw/mapped state from a caller-supplied mapped value.
    /// Returns the raw byte to transmit as LED/position feedback.
    pub fn set_mapped(&mut self, value: f64) -> u8 {
        let raw = mapper::unmap(value, self.min, self.max);
        self.raw_value = raw;
        self.mapped_value = value;
        raw
    }

    pub fn raw_value(&self) -> u8 {
        self.raw_value
    }

    pub fn mapped_value(&self) -> f64 {
        self.mapped_value
    }

    /// Consuming change check: true exactly once per distinct transition.
    /// Polling again without a new sample returns false.
    pub fn has_changed(&mut self) -> bool {
        let changed = self.mapped_value != self.last_reported;
        self.last_reported = self.mapped_value;
        changed
    }

    /// True iff at least one setting is individually dirty.
    pub fn is_dirty(&self) -> bool {
        self.settings.iter().any(|s| s.dirty)
    }

    /// `(address, value)` pairs for every dirty setting, in configuration-
    /// table order. Collection does not clear dirty flags; call
    /// [`EncoderState::commit`] after the transport accepted the frames.
    pub fn collect_dirty_payload(&self) -> Vec<(u8, u8)> {
        self.collect(true)
    }

    /// `(address, value)` pairs for every configured setting, dirty or not.
    pub fn collect_full_payload(&self) -> Vec<(u8, u8)> {
        self.collect(false)
    }

    fn collect(&self, dirty_only: bool) -> Vec<(u8, u8)> {
        SettingKind::ALL
            .iter()
            .filter_map(|&kind| {
                let slot = &self.settings[kind as usize];
                if dirty_only && !slot.dirty {
                    return None;
                }
                slot.value.map(|v| (kind.address(), v))
            })
            .collect()
    }

    /// Clear all dirty flags after a confirmed send.
    pub fn commit(&mut self) {
        for slot in &mut self.settings {
            slot.dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EncoderMidiType;

    #[test]
    fn test_addresses_span_10_to_24() {
        let addrs: Vec<u8> = SettingKind::ALL.iter().map(|k| k.address()).collect();
        assert_eq!(addrs, (10..=24).collect::<Vec<u8>>());
    }

    #[test]
    fn test_from_name_round_trip_and_unknown() {
        for kind in SettingKind::ALL {
            assert_eq!(SettingKind::from_name(kind.name()).unwrap(), kind);
        }
        assert!(matches!(
            SettingKind::from_name("knob_speed"),
            Err(TwisterError::UnknownSetting(_))
        ));
    }

    #[test]
    fn test_set_marks_dirty_and_is_idempotent() {
        let mut enc = EncoderState::new(0);
        assert!(!enc.is_dirty());

        enc.set_kind(SettingKind::ActiveColor, 80);
        assert!(enc.is_dirty());
        assert_eq!(enc.collect_dirty_payload(), vec![(19, 80)]);

        // Same value again: still one payload entry, still dirty
        enc.set_kind(SettingKind::ActiveColor, 80);
        assert_eq!(enc.collect_dirty_payload(), vec![(19, 80)]);

        enc.commit();
        assert!(!enc.is_dirty());
        assert!(enc.collect_dirty_payload().is_empty());

        // Unchanged value after commit stays clean
        enc.set_kind(SettingKind::ActiveColor, 80);
        assert!(!enc.is_dirty());
    }

    #[test]
    fn test_payload_follows_table_order_not_address_order() {
        let mut enc = EncoderState::new(2);
        enc.set_kind(SettingKind::ShiftMidiChannel, 0);
        enc.set_detent(true);
        enc.set_kind(SettingKind::EncoderMidiNumber, 2);

        // Declaration order: detent (10), encoder number (17), shift (24)
        assert_eq!(
            enc.collect_dirty_payload(),
            vec![(10, CFG_TRUE), (17, 2), (24, 0)]
        );
    }

    #[test]
    fn test_unset_settings_never_emitted() {
        let mut enc = EncoderState::new(0);
        enc.set_kind(SettingKind::Movement, 0);
        assert_eq!(enc.collect_full_payload(), vec![(11, 0)]);
    }

    #[test]
    fn test_update_range_rejects_inverted() {
        let mut enc = EncoderState::new(0);
        assert!(matches!(
            enc.update_range(1.0, 1.0),
            Err(TwisterError::InvalidRange { .. })
        ));
        assert!(matches!(
            enc.update_range(5.0, -5.0),
            Err(TwisterError::InvalidRange { .. })
        ));
        assert_eq!(enc.range(), (0.0, 1.0));

        enc.update_range(-10.0, 10.0).unwrap();
        assert_eq!(enc.range(), (-10.0, 10.0));
        // Mapped value rescaled into the new range
        assert_eq!(enc.mapped_value(), -10.0);
    }

    #[test]
    fn test_apply_raw_maps_endpoints() {
        let mut enc = EncoderState::new(4);
        enc.update_range(-10.0, 10.0).unwrap();

        enc.apply_raw(0);
        assert_eq!(enc.mapped_value(), -10.0);
        enc.apply_raw(127);
        assert_eq!(enc.mapped_value(), 10.0);
        enc.apply_raw(64);
        assert!(enc.mapped_value().abs() < 0.1);
    }

    #[test]
    fn test_has_changed_fires_once_per_transition() {
        let mut enc = EncoderState::new(0);
        assert!(!enc.has_changed());

        enc.apply_raw(42);
        assert!(enc.has_changed());
        assert!(!enc.has_changed());

        // Same raw value again: no transition
        enc.apply_raw(42);
        assert!(!enc.has_changed());

        enc.apply_raw(43);
        assert!(enc.has_changed());
        assert!(!enc.has_changed());
    }

    #[test]
    fn test_relative_accumulation() {
        let steps = RelativeStep::default();
        let mut enc = EncoderState::new(0);
        enc.set_kind(SettingKind::EncoderMidiType, EncoderMidiType::SendRelEnc.code());
        assert!(enc.is_relative());

        enc.apply_relative(crate::constants::relative::INCREMENT, &steps);
        assert_eq!(enc.raw_value(), 1);
        enc.apply_relative(crate::constants::relative::INCREMENT_VERYFAST, &steps);
        assert_eq!(enc.raw_value(), 9);
        enc.apply_relative(crate::constants::relative::DECREMENT_FAST, &steps);
        assert_eq!(enc.raw_value(), 5);
        // Unknown code leaves the accumulator alone
        enc.apply_relative(64, &steps);
        assert_eq!(enc.raw_value(), 5);
    }

    #[test]
    fn test_set_mapped_inverse() {
        let mut enc = EncoderState::new(0);
        enc.update_range(-10.0, 10.0).unwrap();

        let raw = enc.set_mapped(0.0);
        assert_eq!(raw, 64);
        assert_eq!(enc.mapped_value(), 0.0);

        assert_eq!(enc.set_mapped(10.0), 127);
        assert_eq!(enc.set_mapped(-99.0), 0);
    }

    #[test]
    fn test_sysex_tag_is_one_based() {
        assert_eq!(EncoderState::new(0).sysex_tag(), 1);
        assert_eq!(EncoderState::new(63).sysex_tag(), 64);
        assert_eq!(EncoderState::new(7).label(), "ENCODER_8");
    }
}
