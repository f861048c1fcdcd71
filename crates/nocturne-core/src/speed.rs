//! Speed mapping - the single source of truth for playback rate
//!
//! Live playback, mode toggling, and offline export all derive their rate
//! from [`resolve_rate`]. Nothing else in the codebase may restate the
//! formula; three call sites drifting apart is exactly the bug this module
//! exists to prevent.

use serde::{Deserialize, Serialize};

/// Slider value substituted when the input is not a finite number
pub const DEFAULT_SLIDER_VALUE: f64 = 1.25;

/// Lower bound on the Daycore rate; slowing below half speed is not useful
/// and the mirror formula would go to zero at slider 2.0
pub const MIN_DAYCORE_RATE: f64 = 0.5;

/// Playback direction of the speed control
///
/// Nightcore maps the slider directly to rate (faster); Daycore mirrors it
/// around 1.0 (slower), so one slider drives both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Nightcore,
    Daycore,
}

impl Mode {
    /// Lowercase name used in export filenames
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Nightcore => "nightcore",
            Mode::Daycore => "daycore",
        }
    }

    /// Toggle between the two modes
    pub fn toggled(&self) -> Self {
        match self {
            Mode::Nightcore => Mode::Daycore,
            Mode::Daycore => Mode::Nightcore,
        }
    }
}

/// Map a slider value and mode to the playback rate
///
/// Nightcore: `rate = slider`. Daycore: `rate = max(0.5, 2.0 - slider)`.
/// A non-finite slider value falls back to [`DEFAULT_SLIDER_VALUE`] before
/// the mode formula is applied.
///
/// Symmetry invariant: for slider values `x <= 1.5` the two modes mirror
/// around 1.0, so `resolve_rate(x, Nightcore) + resolve_rate(x, Daycore)
/// == 2.0`. Above 1.5 the Daycore clamp breaks the mirror on purpose.
pub fn resolve_rate(slider_value: f64, mode: Mode) -> f64 {
    let slider = if slider_value.is_finite() {
        slider_value
    } else {
        DEFAULT_SLIDER_VALUE
    };

    match mode {
        Mode::Nightcore => slider,
        Mode::Daycore => (2.0 - slider).max(MIN_DAYCORE_RATE),
    }
}

/// Named speed presets offered by the front end
///
/// Preset values are slider positions, not rates; the active mode decides
/// which direction they push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedPreset {
    Light,
    Normal,
    Heavy,
    Extreme,
}

impl SpeedPreset {
    /// All presets in menu order
    pub const ALL: [SpeedPreset; 4] = [
        SpeedPreset::Light,
        SpeedPreset::Normal,
        SpeedPreset::Heavy,
        SpeedPreset::Extreme,
    ];

    /// Slider value this preset selects
    pub fn slider_value(&self) -> f64 {
        match self {
            SpeedPreset::Light => 1.1,
            SpeedPreset::Normal => 1.25,
            SpeedPreset::Heavy => 1.4,
            SpeedPreset::Extreme => 1.6,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            SpeedPreset::Light => "Light",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Heavy => "Heavy",
            SpeedPreset::Extreme => "Extreme",
        }
    }

    /// Parse a preset from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(SpeedPreset::Light),
            "normal" => Some(SpeedPreset::Normal),
            "heavy" => Some(SpeedPreset::Heavy),
            "extreme" => Some(SpeedPreset::Extreme),
            _ => None,
        }
    }
}
