//! Audio file decoding
//!
//! Turns compressed or PCM audio files (MP3, FLAC, WAV) into planar
//! [`PcmBuffer`]s via Symphonia. The source sample rate and channel
//! layout are preserved; playback and export handle any resampling.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::types::{PcmBuffer, Sample};

/// Channels beyond this are dropped during load
const MAX_CHANNELS: usize = 2;

/// Audio file errors
#[derive(Debug)]
pub enum AudioFileError {
    /// File not found or couldn't be opened
    Io(std::io::Error),
    /// Container or codec not recognized
    UnsupportedFormat(String),
    /// Recognized but failed to decode
    DecodeFailed(String),
    /// Container held no audio track
    NoAudioTrack,
}

impl std::fmt::Display for AudioFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioFileError::Io(err) => write!(f, "IO error: {}", err),
            AudioFileError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            AudioFileError::DecodeFailed(msg) => write!(f, "Decode failed: {}", msg),
            AudioFileError::NoAudioTrack => write!(f, "No audio track found"),
        }
    }
}

impl std::error::Error for AudioFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AudioFileError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AudioFileError {
    fn from(err: std::io::Error) -> Self {
        AudioFileError::Io(err)
    }
}

/// A decoded track ready for playback and export
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    /// Display title, normally the file stem
    pub title: String,
    /// Decoded audio at the file's native sample rate
    pub buffer: PcmBuffer,
}

impl LoadedTrack {
    pub fn new(title: impl Into<String>, buffer: PcmBuffer) -> Self {
        Self {
            title: title.into(),
            buffer,
        }
    }
}

/// Load and decode an audio file from disk
///
/// The track title is taken from the file stem ("tracks/Neon Sky.mp3"
/// loads as "Neon Sky").
pub fn load_track(path: &Path) -> Result<LoadedTrack, AudioFileError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let buffer = decode_stream(mss, hint)?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());

    log::info!(
        "Loaded \"{}\": {} samples, {} ch, {} Hz",
        title,
        buffer.len(),
        buffer.num_channels(),
        buffer.sample_rate()
    );

    Ok(LoadedTrack::new(title, buffer))
}

/// Decode audio from an in-memory byte buffer
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer, AudioFileError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    decode_stream(mss, hint)
}

/// Probe a media stream and decode its first audio track to planar f32
fn decode_stream(mss: MediaSourceStream, hint: Hint) -> Result<PcmBuffer, AudioFileError> {
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioFileError::UnsupportedFormat(e.to_string()))?;

    let mut format = probed.format;

    // First real audio track wins; video or data tracks are skipped
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioFileError::NoAudioTrack)?;

    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioFileError::UnsupportedFormat(e.to_string()))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels: Vec<Vec<Sample>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut src_channels = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(symphonia::core::errors::Error::ResetRequired) => break,
            Err(e) => return Err(AudioFileError::DecodeFailed(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                // Malformed packets (common at MP3 stream edges) are skipped
                log::warn!("Error decoding packet: {}", e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            sample_rate = spec.rate;
            src_channels = spec.channels.count();
            channels = vec![Vec::new(); src_channels.min(MAX_CHANNELS).max(1)];
            sample_buf = Some(SampleBuffer::new(duration, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            deinterleave(buf.samples(), src_channels, &mut channels);
        }
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(AudioFileError::DecodeFailed(
            "no audio frames decoded".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(AudioFileError::UnsupportedFormat(
            "unknown sample rate".to_string(),
        ));
    }

    Ok(PcmBuffer::new(sample_rate, channels))
}

/// Split interleaved frames into the kept planar channels
///
/// `channels.len()` never exceeds `src_channels`, so surplus source
/// channels fall off the end of each frame.
fn deinterleave(samples: &[f32], src_channels: usize, channels: &mut [Vec<Sample>]) {
    if src_channels == 0 {
        return;
    }
    for frame in samples.chunks_exact(src_channels) {
        for (i, channel) in channels.iter_mut().enumerate() {
            channel.push(frame[i]);
        }
    }
}
