//! Offline rendering - resample a whole buffer by playback rate
//!
//! This is the export-side twin of live playback: the output is exactly
//! what a variable-rate transport would produce, captured ahead of time.
//! Pitch and tempo shift together (true nightcore/daycore), which is why
//! this is a plain resample at rate-adjusted read positions and not a
//! time-stretch.

use crate::speed::{resolve_rate, Mode};
use crate::types::{PcmBuffer, Sample};

/// Render `buffer` at the rate resolved from `slider_value` and `mode`
///
/// The output has `max(1, floor(len / rate))` samples per channel and the
/// input's sample rate and channel count. The input is never mutated; a
/// fresh buffer is returned.
pub fn render_offline(buffer: &PcmBuffer, slider_value: f64, mode: Mode) -> PcmBuffer {
    let rate = resolve_rate(slider_value, mode);
    let output_len = ((buffer.len() as f64 / rate).floor() as usize).max(1);

    let channels = buffer
        .channels()
        .map(|channel| {
            (0..output_len)
                .map(|i| sample_at(channel, i as f64 * rate))
                .collect()
        })
        .collect();

    PcmBuffer::new(buffer.sample_rate(), channels)
}

/// Linearly interpolated read at a fractional source position
///
/// Positions past the last sample hold it; an empty channel reads as
/// silence (the length rule above still emits one output sample).
#[inline]
fn sample_at(channel: &[Sample], position: f64) -> Sample {
    if channel.is_empty() {
        return 0.0;
    }

    let index = position as usize;
    if index + 1 >= channel.len() {
        return channel[channel.len() - 1];
    }

    let frac = (position - index as f64) as Sample;
    channel[index] + (channel[index + 1] - channel[index]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_length_nightcore() {
        // 3 s at 44100 Hz, slider 1.25: 132300 / 1.25 = 105840.
        let buf = PcmBuffer::silence(44100, 2, 132300);
        let out = render_offline(&buf, 1.25, Mode::Nightcore);
        assert_eq!(out.len(), 105840);
        assert_eq!(out.sample_rate(), 44100);
        assert_eq!(out.num_channels(), 2);
    }

    #[test]
    fn test_render_length_daycore() {
        // Daycore at slider 1.25 resolves to 0.75: 132300 / 0.75 = 176400.
        let buf = PcmBuffer::silence(44100, 2, 132300);
        let out = render_offline(&buf, 1.25, Mode::Daycore);
        assert_eq!(out.len(), 176400);
    }

    #[test]
    fn test_render_at_unity_rate_is_identity() {
        let samples: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0) - 0.5).collect();
        let buf = PcmBuffer::mono(44100, samples.clone());
        let out = render_offline(&buf, 1.0, Mode::Nightcore);
        assert_eq!(out.len(), 64);
        for (a, b) in out.channel(0).iter().zip(samples.iter()) {
            assert!((a - b).abs() < 1e-7);
        }
    }

    #[test]
    fn test_double_rate_skips_every_other_sample() {
        // Linear interpolation reproduces a linear ramp exactly, so the
        // rate-2 output must be the even-indexed source values.
        let ramp: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let buf = PcmBuffer::mono(44100, ramp);
        let out = render_offline(&buf, 2.0, Mode::Nightcore);
        assert_eq!(out.len(), 50);
        for (i, &s) in out.channel(0).iter().enumerate() {
            assert!((s - (2 * i) as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn test_half_rate_interpolates_midpoints() {
        let buf = PcmBuffer::mono(44100, vec![0.0, 1.0]);
        let out = render_offline(&buf, 0.5, Mode::Nightcore);
        assert_eq!(out.channel(0), &[0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_output_never_shorter_than_one_sample() {
        let buf = PcmBuffer::mono(44100, vec![0.1, 0.2]);
        let out = render_offline(&buf, 4.0, Mode::Nightcore);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_channels_render_independently() {
        let buf = PcmBuffer::stereo(44100, vec![1.0; 8], vec![-1.0; 8]);
        let out = render_offline(&buf, 2.0, Mode::Nightcore);
        assert!(out.channel(0).iter().all(|&s| s == 1.0));
        assert!(out.channel(1).iter().all(|&s| s == -1.0));
    }

    #[test]
    fn test_rendered_duration_matches_rate_within_one_sample() {
        let buf = PcmBuffer::silence(44100, 1, 441000);
        for &(slider, mode) in &[
            (1.25, Mode::Nightcore),
            (1.6, Mode::Nightcore),
            (0.8, Mode::Daycore),
            (1.25, Mode::Daycore),
        ] {
            let rate = resolve_rate(slider, mode);
            let out = render_offline(&buf, slider, mode);
            let expected = buf.duration_seconds() / rate;
            let one_sample = 1.0 / 44100.0;
            assert!(
                (out.duration_seconds() - expected).abs() <= one_sample,
                "duration off at slider {} mode {:?}",
                slider,
                mode
            );
        }
    }
}
