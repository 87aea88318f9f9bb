//! Raw MIDI value to calibrated range conversions.
//!
//! Absolute encoders report a 0-127 position that maps linearly into the
//! caller's range. Relative encoders report direction/speed codes instead;
//! those become signed tick deltas on the raw accumulator.

use crate::constants::relative;

/// Linearly rescale a raw 0-127 byte into `[min, max]`.
pub fn map_raw(raw: u8, min: f64, max: f64) -> f64 {
    min + (raw as f64 / 127.0) * (max - min)
}

/// Inverse of [`map_raw`]: nearest raw byte for a desired mapped value,
/// clamped into the range. Requires `min < max`; a zero-width range has no
/// inverse.
pub fn unmap(value: f64, min: f64, max: f64) -> u8 {
    debug_assert!(min < max, "unmap requires min < max, got {min}..{max}");
    (((value - min) / (max - min)).clamp(0.0, 1.0) * 127.0).round() as u8
}

/// Step sizes, in raw ticks, for the three relative-encoder speed tiers.
///
/// The firmware documents the direction codes (61/62/63 down, 65/66/67 up)
/// but not how far a host should move per fast or very-fast tick, so the
/// step table is caller-tunable policy. The defaults scale up to the
/// 8-ticks-per-detent figure from the reference documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeStep {
    pub normal: u8,
    pub fast: u8,
    pub very_fast: u8,
}

impl Default for RelativeStep {
    fn default() -> Self {
        Self {
            normal: 1,
            fast: 4,
            very_fast: relative::TICKS_PER_DISCRETE_INCREMENT,
        }
    }
}

impl RelativeStep {
    /// Signed tick delta for a relative direction/speed code.
    ///
    /// Codes outside the documented table yield `None` and must be ignored
    /// by the caller.
    pub fn delta(&self, code: u8) -> Option<i16> {
        match code {
            relative::DECREMENT => Some(-(self.normal as i16)),
            relative::DECREMENT_FAST => Some(-(self.fast as i16)),
            relative::DECREMENT_VERYFAST => Some(-(self.very_fast as i16)),
            relative::INCREMENT => Some(self.normal as i16),
            relative::INCREMENT_FAST => Some(self.fast as i16),
            relative::INCREMENT_VERYFAST => Some(self.very_fast as i16),
            _ => None,
        }
    }

    /// Apply a relative code to a raw accumulator, clamped to 0..=127.
    pub fn accumulate(&self, raw: u8, code: u8) -> Option<u8> {
        self.delta(code)
            .map(|d| (raw as i16 + d).clamp(0, 127) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_map_raw_endpoints() {
        assert_eq!(map_raw(0, -10.0, 10.0), -10.0);
        assert_eq!(map_raw(127, -10.0, 10.0), 10.0);
        assert_eq!(map_raw(0, 0.0, 1.0), 0.0);
        assert_eq!(map_raw(127, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_center_byte_near_zero_for_symmetric_range() {
        // 64/127 sits 1/254 of the span above center
        let v = map_raw(64, -10.0, 10.0);
        assert!(v.abs() < 0.1, "got {v}");
    }

    #[test]
    fn test_unmap_clamps_and_rounds() {
        assert_eq!(unmap(-10.0, -10.0, 10.0), 0);
        assert_eq!(unmap(10.0, -10.0, 10.0), 127);
        assert_eq!(unmap(-42.0, -10.0, 10.0), 0);
        assert_eq!(unmap(42.0, -10.0, 10.0), 127);
        assert_eq!(unmap(0.0, -10.0, 10.0), 64);
    }

    #[test]
    #[should_panic(expected = "min < max")]
    fn test_unmap_rejects_zero_width_range() {
        unmap(0.5, 1.0, 1.0);
    }

    #[test]
    fn test_relative_deltas() {
        let steps = RelativeStep::default();
        assert_eq!(steps.delta(relative::INCREMENT), Some(1));
        assert_eq!(steps.delta(relative::DECREMENT), Some(-1));
        assert_eq!(steps.delta(relative::INCREMENT_FAST), Some(4));
        assert_eq!(steps.delta(relative::DECREMENT_VERYFAST), Some(-8));
        // An absolute position byte is not a relative code
        assert_eq!(steps.delta(64), None);
        assert_eq!(steps.delta(0), None);
    }

    #[test]
    fn test_accumulate_clamps_at_bounds() {
        let steps = RelativeStep::default();
        assert_eq!(steps.accumulate(0, relative::DECREMENT), Some(0));
        assert_eq!(steps.accumulate(127, relative::INCREMENT_VERYFAST), Some(127));
        assert_eq!(steps.accumulate(64, relative::INCREMENT), Some(65));
        assert_eq!(steps.accumulate(2, relative::DECREMENT_VERYFAST), Some(0));
        assert_eq!(steps.accumulate(64, 100), None);
    }

    proptest! {
        #[test]
        fn prop_map_raw_endpoints_hit_range(min in -1000.0f64..1000.0, span in 0.001f64..1000.0) {
            let max = min + span;
            prop_assert!((map_raw(0, min, max) - min).abs() < 1e-9);
            prop_assert!((map_raw(127, min, max) - max).abs() < 1e-9);
        }

        #[test]
        fn prop_map_raw_monotonic(raw in 0u8..127, min in -1000.0f64..1000.0, span in 0.001f64..1000.0) {
            let max = min + span;
            prop_assert!(map_raw(raw, min, max) < map_raw(raw + 1, min, max));
        }

        #[test]
        fn prop_unmap_inverts_map(raw in 0u8..=127, min in -100.0f64..100.0, span in 0.5f64..100.0) {
            let max = min + span;
            prop_assert_eq!(unmap(map_raw(raw, min, max), min, max), raw);
        }
    }
}
