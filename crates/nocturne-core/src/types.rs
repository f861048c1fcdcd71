//! Common types for Nocturne
//!
//! This module contains the fundamental audio types used throughout the
//! Nocturne player and export pipeline: the planar PCM buffer produced by
//! the decoder and consumed by the renderer and encoders, and the small
//! interleaved frame type used by the real-time output path.

/// Canonical sample rate for generated test signals and default output
/// (44.1kHz). Decoded buffers carry their own rate; nothing in the
/// pipeline assumes this value.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Audio sample type (32-bit float for processing, stored as 16-bit in files)
pub type Sample = f32;

/// A single stereo frame (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// This enables zero-copy conversion between `&[StereoSample]` and `&[f32]`
/// (interleaved format) using bytemuck in the output callback.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    /// Create a new stereo frame
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    /// Create a silent frame
    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Create a mono frame (same value in both channels)
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// A decoded PCM buffer in planar layout
///
/// This is the central entity of the pipeline: one `Vec<f32>` per channel,
/// every channel exactly the same length, samples nominally in [-1.0, 1.0]
/// (out-of-range values are tolerated and clamped at quantization time).
/// Buffers are created by the decoder or the offline renderer and are
/// read-only afterwards; the renderer always produces a fresh buffer and
/// never mutates its input.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<Sample>>,
}

impl PcmBuffer {
    /// Create a buffer from planar channel data
    ///
    /// Panics if `channels` is empty or the channels differ in length;
    /// both violate the invariants every consumer relies on.
    pub fn new(sample_rate: u32, channels: Vec<Vec<Sample>>) -> Self {
        assert!(!channels.is_empty(), "PcmBuffer needs at least one channel");
        let len = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == len),
            "PcmBuffer channels must have equal length"
        );
        Self { sample_rate, channels }
    }

    /// Create a mono buffer
    pub fn mono(sample_rate: u32, samples: Vec<Sample>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    /// Create a stereo buffer from separate left and right channels
    pub fn stereo(sample_rate: u32, left: Vec<Sample>, right: Vec<Sample>) -> Self {
        Self::new(sample_rate, vec![left, right])
    }

    /// Create a silent buffer with the given channel count and length
    pub fn silence(sample_rate: u32, num_channels: usize, len: usize) -> Self {
        assert!(num_channels > 0, "PcmBuffer needs at least one channel");
        Self {
            sample_rate,
            channels: vec![vec![0.0; len]; num_channels],
        }
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (1 = mono, 2 = stereo)
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get one channel's samples
    #[inline]
    pub fn channel(&self, index: usize) -> &[Sample] {
        &self.channels[index]
    }

    /// Iterate over channels in order
    pub fn channels(&self) -> impl Iterator<Item = &[Sample]> {
        self.channels.iter().map(|c| c.as_slice())
    }

    /// Convert to interleaved stereo frames for the output path
    ///
    /// Mono duplicates the single channel into both sides; sources with
    /// more than two channels contribute only their first two.
    pub fn to_stereo_frames(&self) -> Vec<StereoSample> {
        match self.num_channels() {
            1 => self.channels[0].iter().map(|&s| StereoSample::mono(s)).collect(),
            _ => self.channels[0]
                .iter()
                .zip(self.channels[1].iter())
                .map(|(&l, &r)| StereoSample::new(l, r))
                .collect(),
        }
    }
}

/// Playback state of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlayState {
    /// Check if the transport is running
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_sample_lerp_ops() {
        let a = StereoSample::new(0.0, 1.0);
        let b = StereoSample::new(1.0, 0.0);

        let mid = a * 0.5 + b * 0.5;
        assert_eq!(mid.left, 0.5);
        assert_eq!(mid.right, 0.5);
    }

    #[test]
    fn test_pcm_buffer_invariants() {
        let buf = PcmBuffer::stereo(44100, vec![0.0; 100], vec![0.0; 100]);
        assert_eq!(buf.num_channels(), 2);
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.sample_rate(), 44100);
        assert!((buf.duration_seconds() - 100.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_pcm_buffer_rejects_ragged_channels() {
        PcmBuffer::new(44100, vec![vec![0.0; 10], vec![0.0; 9]]);
    }

    #[test]
    fn test_mono_to_stereo_frames_duplicates() {
        let buf = PcmBuffer::mono(44100, vec![0.25, -0.5]);
        let frames = buf.to_stereo_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], StereoSample::new(0.25, 0.25));
        assert_eq!(frames[1], StereoSample::new(-0.5, -0.5));
    }

    #[test]
    fn test_stereo_frames_preserve_channels() {
        let buf = PcmBuffer::stereo(44100, vec![0.1, 0.2], vec![-0.1, -0.2]);
        let frames = buf.to_stereo_frames();
        assert_eq!(frames[0], StereoSample::new(0.1, -0.1));
        assert_eq!(frames[1], StereoSample::new(0.2, -0.2));
    }
}
