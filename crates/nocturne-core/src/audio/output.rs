//! CPAL output stream hosting the playback voice
//!
//! One stereo output stream whose callback owns the [`Voice`]
//! exclusively. Commands arrive over the lock-free queue and state
//! flows back through [`PlayerAtomics`], so the callback never takes a
//! lock and the control thread never touches the voice directly.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use std::sync::Arc;

use crate::engine::{command_channel, PlayerAtomics, PlayerCommand, Voice};
use crate::types::{StereoSample, DEFAULT_SAMPLE_RATE};

use super::error::{AudioError, AudioResult};

/// Scratch buffer capacity in frames
///
/// Covers every buffer size devices negotiate in practice; the
/// callback grows it once if a device asks for more.
const SCRATCH_FRAMES: usize = 8192;

/// Handle to the active output stream
///
/// Keeps the stream alive. Drop this to stop audio.
pub struct AudioHandle {
    _stream: Stream,
    sample_rate: u32,
}

impl AudioHandle {
    /// Sample rate the device is running at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Everything the control thread needs after stream startup
pub struct AudioSystem {
    /// Keeps the stream alive; dropping it stops output
    pub handle: AudioHandle,
    /// Producer side of the command queue
    pub commands: rtrb::Producer<PlayerCommand>,
    /// Lock-free playback state written by the callback
    pub atomics: Arc<PlayerAtomics>,
    /// Device sample rate in Hz
    pub sample_rate: u32,
}

/// Open the default output device and start the playback stream
pub fn start_output() -> AudioResult<AudioSystem> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = pick_output_config(&device)?;
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels();

    let stream_config = StreamConfig {
        channels,
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    log::info!("Audio config: {} channels, {}Hz", channels, sample_rate);

    let mut voice = Voice::new(sample_rate);
    let atomics = voice.atomics();
    let (command_tx, mut command_rx) = command_channel();

    let n_channels = channels as usize;
    let mut scratch = vec![StereoSample::silence(); SCRATCH_FRAMES];

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let n_frames = data.len() / n_channels;
                if scratch.len() < n_frames {
                    scratch.resize(n_frames, StereoSample::silence());
                }

                voice.process_commands(&mut command_rx);
                voice.fill(&mut scratch[..n_frames]);

                if n_channels == 2 {
                    // StereoSample's [left, right] layout matches cpal's
                    // interleaved stereo, so this is a straight memcpy
                    let interleaved: &[f32] = bytemuck::cast_slice(&scratch[..n_frames]);
                    data[..n_frames * 2].copy_from_slice(interleaved);
                } else {
                    for (frame, sample) in data.chunks_mut(n_channels).zip(&scratch[..n_frames]) {
                        frame[0] = sample.left;
                        if n_channels > 1 {
                            frame[1] = sample.right;
                        }
                        // Fill additional channels with silence
                        for ch in frame.iter_mut().skip(2) {
                            *ch = 0.0;
                        }
                    }
                }
            },
            move |err| {
                log::error!("Audio stream error: {}", err);
            },
            None, // No timeout (blocking)
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started");

    Ok(AudioSystem {
        handle: AudioHandle {
            _stream: stream,
            sample_rate,
        },
        commands: command_tx,
        atomics,
        sample_rate,
    })
}

/// Get the best output configuration for a device
///
/// Prefers f32 stereo configs whose rate range covers 44.1kHz, then
/// falls back to anything stereo, then to whatever the device offers.
fn pick_output_config(device: &cpal::Device) -> AudioResult<cpal::SupportedStreamConfig> {
    let supported_configs: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?
        .collect();

    if supported_configs.is_empty() {
        return Err(AudioError::ConfigError(
            "No supported output configurations".to_string(),
        ));
    }

    let best = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(|c| {
            DEFAULT_SAMPLE_RATE >= c.min_sample_rate().0
                && DEFAULT_SAMPLE_RATE <= c.max_sample_rate().0
        })
        .or_else(|| supported_configs.iter().find(|c| c.channels() >= 2))
        .or_else(|| supported_configs.first())
        .ok_or_else(|| AudioError::ConfigError("No suitable output configuration".to_string()))?;

    let sample_rate = if DEFAULT_SAMPLE_RATE >= best.min_sample_rate().0
        && DEFAULT_SAMPLE_RATE <= best.max_sample_rate().0
    {
        cpal::SampleRate(DEFAULT_SAMPLE_RATE)
    } else {
        let fallback = best.max_sample_rate();
        log::warn!(
            "Audio device doesn't support {}Hz, falling back to {}Hz",
            DEFAULT_SAMPLE_RATE,
            fallback.0
        );
        fallback
    };

    Ok(best.clone().with_sample_rate(sample_rate))
}
