//! Knob-level settings records and the JSON configuration loader.
//!
//! A knob record describes one encoder the application cares about: its
//! polarity, calibrated range, LED color, and optional behavior overrides.
//! The file loader turns `(bank, encoder)` labels into array indices and
//! hands back already-validated records; the session applies them via
//! [`KnobSettings::apply_to`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::constants::{
    colors, Bank, EncoderMidiType, IndicatorType, MovementType, SwitchAction,
    ENCODERS_PER_BANK,
};
use crate::encoder::{EncoderState, SettingKind};
use crate::error::TwisterError;

/// Polarity of a knob's value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnobType {
    /// 0..1 style range, no detent.
    Unipolar,
    /// Centered range with a detent at rest.
    Bipolar,
}

/// LED color: a named palette entry or a raw 1-126 hue value.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Code(u8),
    Named(NamedColor),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    Blue,
    Green,
    Yellow,
    Red,
    Pink,
    Active,
    Inactive,
}

impl ColorSpec {
    pub fn code(self) -> u8 {
        match self {
            ColorSpec::Code(v) => v,
            ColorSpec::Named(NamedColor::Blue) => colors::BLUE,
            ColorSpec::Named(NamedColor::Green) => colors::GREEN,
            ColorSpec::Named(NamedColor::Yellow) => colors::YELLOW,
            ColorSpec::Named(NamedColor::Red) => colors::RED,
            ColorSpec::Named(NamedColor::Pink) => colors::PINK,
            ColorSpec::Named(NamedColor::Active) => colors::ACTIVE,
            ColorSpec::Named(NamedColor::Inactive) => colors::INACTIVE,
        }
    }
}

/// Desired configuration for one knob.
#[derive(Debug, Clone)]
pub struct KnobSettings {
    pub knob_type: KnobType,
    pub detent: bool,
    pub min: f64,
    pub max: f64,
    pub led_color: Option<u8>,
    pub detent_color: Option<u8>,
    pub movement_type: Option<MovementType>,
    pub switch_action_type: Option<SwitchAction>,
    pub encoder_midi_type: Option<EncoderMidiType>,
    pub indicator_display_type: Option<IndicatorType>,
}

impl KnobSettings {
    /// Defaults for the polarity: bipolar knobs get a detent and a (-1, 1)
    /// range, unipolar knobs no detent and (0, 1).
    pub fn new(knob_type: KnobType) -> Self {
        let (detent, min, max) = match knob_type {
            KnobType::Bipolar => (true, -1.0, 1.0),
            KnobType::Unipolar => (false, 0.0, 1.0),
        };
        Self {
            knob_type,
            detent,
            min,
            max,
            led_color: None,
            detent_color: None,
            movement_type: None,
            switch_action_type: None,
            encoder_midi_type: None,
            indicator_display_type: None,
        }
    }

    /// Override the calibrated range.
    pub fn with_range(mut self, min: f64, max: f64) -> Result<Self, TwisterError> {
        if min >= max {
            return Err(TwisterError::InvalidRange { min, max });
        }
        self.min = min;
        self.max = max;
        Ok(self)
    }

    pub fn with_color(mut self, color: u8) -> Self {
        self.led_color = Some(color);
        self
    }

    pub fn with_movement(mut self, movement: MovementType) -> Self {
        self.movement_type = Some(movement);
        self
    }

    pub fn with_midi_type(mut self, midi_type: EncoderMidiType) -> Self {
        self.encoder_midi_type = Some(midi_type);
        self
    }

    pub fn with_switch_action(mut self, action: SwitchAction) -> Self {
        self.switch_action_type = Some(action);
        self
    }

    pub fn with_indicator(mut self, indicator: IndicatorType) -> Self {
        self.indicator_display_type = Some(indicator);
        self
    }

    /// Write these settings into an encoder's configuration slots.
    ///
    /// When no color was requested, both color slots get the factory active
    /// color so the LED ring still lights up on an otherwise default device.
    pub fn apply_to(&self, enc: &mut EncoderState) -> Result<(), TwisterError> {
        enc.update_range(self.min, self.max)?;
        enc.set_detent(self.detent);

        if let Some(m) = self.movement_type {
            enc.set_kind(SettingKind::Movement, m.code());
        }
        if let Some(a) = self.switch_action_type {
            enc.set_kind(SettingKind::SwitchActionType, a.code());
        }
        if let Some(t) = self.encoder_midi_type {
            enc.set_kind(SettingKind::EncoderMidiType, t.code());
        }
        if let Some(i) = self.indicator_display_type {
            enc.set_kind(SettingKind::IndicatorDisplayType, i.code());
        }
        if let Some(c) = self.detent_color {
            enc.set_kind(SettingKind::DetentColor, c);
        }

        match self.led_color {
            Some(c) => {
                enc.set_kind(SettingKind::ActiveColor, c);
                enc.set_kind(SettingKind::InactiveColor, c);
            }
            None => {
                enc.set_kind(SettingKind::ActiveColor, colors::DEFAULT_ACTIVE);
                enc.set_kind(SettingKind::InactiveColor, colors::DEFAULT_ACTIVE);
            }
        }

        Ok(())
    }
}

/// One record in the knob configuration file.
#[derive(Debug, Deserialize)]
pub struct KnobConfigRecord {
    pub bank: Bank,
    /// Encoder label within the bank, `ENCODER_1` through `ENCODER_16`.
    pub encoder: String,
    pub knob_type: KnobType,
    pub led_color: ColorSpec,
    pub min_threshold: f64,
    pub max_threshold: f64,
    #[serde(default)]
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub encoder_midi_type: Option<EncoderMidiType>,
    #[serde(default)]
    pub detent_color: Option<ColorSpec>,
    #[serde(default)]
    pub indicator_display_type: Option<IndicatorType>,
}

impl KnobConfigRecord {
    /// Absolute encoder index of this record's `(bank, encoder)` label.
    pub fn encoder_index(&self) -> Result<usize> {
        let offset = self
            .encoder
            .strip_prefix("ENCODER_")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| (1..=ENCODERS_PER_BANK).contains(n));

        match offset {
            Some(n) => Ok(self.bank.base_index() + n - 1),
            None => bail!(
                "invalid encoder label '{}' (expected ENCODER_1..ENCODER_16)",
                self.encoder
            ),
        }
    }

    fn to_settings(&self) -> Result<KnobSettings> {
        let mut settings = KnobSettings::new(self.knob_type)
            .with_range(self.min_threshold, self.max_threshold)
            .with_context(|| format!("record for {}", self.encoder))?
            .with_color(self.led_color.code());

        settings.movement_type = self.movement_type;
        settings.encoder_midi_type = self.encoder_midi_type;
        settings.detent_color = self.detent_color.map(ColorSpec::code);
        settings.indicator_display_type = self.indicator_display_type;
        Ok(settings)
    }
}

/// Load knob records from a JSON file into `(encoder_index, settings)`
/// pairs, validated and ready to subscribe.
pub fn load_knob_config(path: impl AsRef<Path>) -> Result<Vec<(usize, KnobSettings)>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let records: Vec<KnobConfigRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    records
        .iter()
        .map(|record| Ok((record.encoder_index()?, record.to_settings()?)))
        .collect()
}
