//! Export progress messages
//!
//! These messages are sent from the export worker to the front end via
//! mpsc channel. Each message represents a step in the export lifecycle:
//!
//! Started → Rendered → Complete/Failed

use std::time::Duration;

use super::{EncodedAsset, ExportFormat};

/// Progress messages for a single-track export
///
/// The worker sends exactly one terminal message per run. `Complete`
/// carries the finished asset itself, so the receiver owns the bytes and
/// decides where they go.
#[derive(Debug, Clone)]
pub enum ExportProgress {
    /// Export started
    Started {
        /// Title of the track being exported
        title: String,
        /// Target container format
        format: ExportFormat,
    },

    /// Offline render finished, encoding is next
    Rendered {
        /// Samples per channel in the rendered buffer
        output_samples: usize,
        /// Rendered duration in seconds
        output_seconds: f64,
    },

    /// Export finished and the asset is ready
    Complete {
        /// The encoded bytes with MIME type and suggested filename
        asset: EncodedAsset,
        /// Total render + encode duration
        duration: Duration,
    },

    /// Render or encode failed
    Failed {
        /// Error description
        error: String,
    },
}

impl ExportProgress {
    /// Get a human-readable description of this progress message
    pub fn description(&self) -> String {
        match self {
            Self::Started { title, format } => {
                format!("Exporting: {} ({})", title, format.extension())
            }
            Self::Rendered {
                output_seconds, ..
            } => {
                format!("Rendered {:.1}s of audio, encoding...", output_seconds)
            }
            Self::Complete { asset, duration } => {
                format!(
                    "Export complete: {} ({} bytes in {:.1}s)",
                    asset.filename,
                    asset.bytes.len(),
                    duration.as_secs_f64()
                )
            }
            Self::Failed { error } => format!("Export failed: {}", error),
        }
    }

    /// Check if this is a terminal message (Complete or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_messages() {
        let complete = ExportProgress::Complete {
            asset: EncodedAsset {
                bytes: vec![0u8; 4],
                mime: "audio/wav",
                filename: "t (nightcore).wav".to_string(),
            },
            duration: Duration::from_millis(250),
        };
        let failed = ExportProgress::Failed {
            error: "boom".to_string(),
        };
        let started = ExportProgress::Started {
            title: "t".to_string(),
            format: ExportFormat::Wav,
        };

        assert!(complete.is_terminal());
        assert!(failed.is_terminal());
        assert!(!started.is_terminal());
    }

    #[test]
    fn test_descriptions_name_the_track() {
        let msg = ExportProgress::Started {
            title: "Neon Sky".to_string(),
            format: ExportFormat::Mp3,
        };
        assert_eq!(msg.description(), "Exporting: Neon Sky (mp3)");

        let msg = ExportProgress::Failed {
            error: "MP3 encoder is not available in this build".to_string(),
        };
        assert!(msg.description().contains("not available"));
    }
}
