//! Player configuration for the nocturne binary
//!
//! Stored as YAML in the user's config directory, default
//! ~/.config/nocturne/config.yaml. Loading and saving go through
//! `nocturne_core::config`, so a missing or unparsable file falls back
//! to these defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use nocturne_core::config::default_export_dir;
use nocturne_core::export::DEFAULT_BITRATE_KBPS;
use nocturne_core::speed::{Mode, DEFAULT_SLIDER_VALUE};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlayerConfig {
    /// Playback settings restored between sessions
    pub playback: PlaybackConfig,
    /// Export settings (bitrate, output directory)
    pub export: ExportConfig,
}

/// Playback configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Mode the player starts in
    pub mode: Mode,
    /// Speed slider position (a rate in Nightcore, mirrored in Daycore)
    pub slider_value: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Nightcore,
            slider_value: DEFAULT_SLIDER_VALUE,
        }
    }
}

/// Export configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Constant bitrate for MP3 exports, in kbps
    pub bitrate_kbps: u32,
    /// Directory exported files are written to
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            output_dir: default_export_dir(),
        }
    }
}
