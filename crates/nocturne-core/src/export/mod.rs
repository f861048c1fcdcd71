//! Export pipeline - offline render plus container encoding
//!
//! Everything between "user picked a format" and "bytes ready to write":
//!
//! ```text
//! PcmBuffer ──render_offline──▶ PcmBuffer ──┬─▶ WAV encoder ─────────────▶ EncodedAsset
//!                                           └─▶ MP3 encoder ─▶ ID3 writer ─▶ EncodedAsset
//! ```
//!
//! The encoders are deliberately explicit byte writers with fixed offsets;
//! the layouts are external file-format contracts, not serialization
//! choices.

mod filename;
mod id3;
mod message;
mod service;
mod wav;

pub mod mp3;

pub use filename::{build_filename, sanitize_track_name};
pub use id3::attach_id3;
pub use message::ExportProgress;
pub use mp3::encode_mp3;
pub use service::ExportService;
pub use wav::{encode_wav, WAV_HEADER_LEN};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::render::render_offline;
use crate::speed::Mode;
use crate::types::{PcmBuffer, Sample};

/// Default MP3 bitrate in kbps
pub const DEFAULT_BITRATE_KBPS: u32 = 320;

/// Errors from the encoding side of the pipeline
#[derive(Error, Debug)]
pub enum ExportError {
    /// The LAME binding is not compiled in or failed to initialize
    #[error("MP3 encoder is not available in this build")]
    EncoderUnavailable,

    /// The encoder rejected its configuration
    #[error("MP3 encoder configuration failed: {0}")]
    EncoderConfig(String),

    /// A frame encode or flush call failed
    #[error("MP3 encoding failed: {0}")]
    EncodeFailed(String),

    /// Writing the finished asset to disk failed
    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Wav,
    Mp3,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
        }
    }

    /// MIME type of the encoded stream
    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "audio/wav",
            ExportFormat::Mp3 => "audio/mpeg",
        }
    }

    /// Parse a format from its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wav" => Some(ExportFormat::Wav),
            "mp3" => Some(ExportFormat::Mp3),
            _ => None,
        }
    }
}

/// Everything one export run needs besides the source buffer
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub slider_value: f64,
    pub mode: Mode,
    /// Track title, used for the filename and the TIT2 frame
    pub title: String,
    pub bitrate_kbps: u32,
    /// JPEG bytes for the APIC frame; absence simply omits the frame
    pub artwork: Option<Vec<u8>>,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, slider_value: f64, mode: Mode, title: String) -> Self {
        Self {
            format,
            slider_value,
            mode,
            title,
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
            artwork: None,
        }
    }
}

/// A finished export: bytes, their MIME type, and the suggested filename
#[derive(Debug, Clone)]
pub struct EncodedAsset {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl EncodedAsset {
    /// Write the asset into `dir` under its suggested filename
    ///
    /// Creates the directory if needed and returns the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Quantize a float sample to signed 16-bit
///
/// Clamps to [-1, 1] first, then scales asymmetrically: negative values by
/// 32768, non-negative by 32767. This uses the full signed range without
/// overflowing on the positive side, and both container encoders must
/// quantize identically.
#[inline]
pub fn quantize_i16(sample: Sample) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

/// Render and encode one track
///
/// Pure function of its inputs: render at the resolved rate, encode into
/// the requested container, and (for MP3) prepend the ID3v2.3 tag. The
/// source buffer is never mutated.
pub fn export_track(
    buffer: &PcmBuffer,
    request: &ExportRequest,
) -> Result<EncodedAsset, ExportError> {
    let rendered = render_offline(buffer, request.slider_value, request.mode);
    encode_rendered(&rendered, request)
}

/// Encode an already-rendered buffer into the requested container
///
/// Split out of [`export_track`] so the export worker can report between
/// the render and encode phases.
pub(crate) fn encode_rendered(
    rendered: &PcmBuffer,
    request: &ExportRequest,
) -> Result<EncodedAsset, ExportError> {
    let bytes = match request.format {
        ExportFormat::Wav => encode_wav(rendered),
        ExportFormat::Mp3 => {
            let frames = encode_mp3(rendered, request.bitrate_kbps)?;
            attach_id3(&frames, &request.title, request.artwork.as_deref())
        }
    };

    Ok(EncodedAsset {
        bytes,
        mime: request.format.mime(),
        filename: build_filename(&request.title, request.mode, request.format),
    })
}
