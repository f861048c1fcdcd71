//! WAV container writer - canonical 44-byte header, 16-bit PCM
//!
//! The layout is fixed by the RIFF/WAVE format, little-endian throughout:
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  36 + data size
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  16 (fmt chunk size)
//!     20     2  1 (PCM)
//!     22     2  channel count
//!     24     4  sample rate
//!     28     4  byte rate (rate * channels * 2)
//!     32     2  block align (channels * 2)
//!     34     2  16 (bits per sample)
//!     36     4  "data"
//!     40     4  data size
//!     44     -  interleaved i16 samples, sample-major
//! ```

use super::quantize_i16;
use crate::types::PcmBuffer;

/// Size of the canonical header preceding the sample data
pub const WAV_HEADER_LEN: usize = 44;

/// Audio format tag for uncompressed PCM
const FORMAT_PCM: u16 = 1;

/// Bits per encoded sample
const BITS_PER_SAMPLE: u16 = 16;

/// Encode a buffer as a complete WAV file
///
/// Output is exactly `44 + len * channels * 2` bytes. Samples are clamped
/// and quantized per [`quantize_i16`] and interleaved sample-major: all
/// channels for sample 0, then all channels for sample 1, and so on.
pub fn encode_wav(buffer: &PcmBuffer) -> Vec<u8> {
    let num_channels = buffer.num_channels() as u16;
    let sample_rate = buffer.sample_rate();
    let block_align = num_channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate * block_align as u32;
    let data_size = buffer.len() as u32 * block_align as u32;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_size as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());

    for i in 0..buffer.len() {
        for channel in buffer.channels() {
            out.extend_from_slice(&quantize_i16(channel[i]).to_le_bytes());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn i16_at(bytes: &[u8], offset: usize) -> i16 {
        i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_size_invariant_one_second_stereo() {
        let buf = PcmBuffer::silence(44100, 2, 44100);
        let wav = encode_wav(&buf);
        assert_eq!(wav.len(), 44 + 44100 * 2 * 2);
        assert_eq!(wav.len(), 176444);
    }

    #[test]
    fn test_size_invariant_mono() {
        let buf = PcmBuffer::silence(22050, 1, 1000);
        assert_eq!(encode_wav(&buf).len(), 44 + 1000 * 2);
    }

    #[test]
    fn test_header_fields_at_documented_offsets() {
        let buf = PcmBuffer::silence(44100, 2, 44100);
        let wav = encode_wav(&buf);
        let data_size = 44100 * 2 * 2;

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + data_size);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1, "format tag must be PCM");
        assert_eq!(u16_at(&wav, 22), 2, "channel count");
        assert_eq!(u32_at(&wav, 24), 44100, "sample rate");
        assert_eq!(u32_at(&wav, 28), 44100 * 4, "byte rate");
        assert_eq!(u16_at(&wav, 32), 4, "block align");
        assert_eq!(u16_at(&wav, 34), 16, "bits per sample");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), data_size);
    }

    #[test]
    fn test_out_of_range_samples_saturate() {
        let buf = PcmBuffer::stereo(44100, vec![2.0], vec![-2.0]);
        let wav = encode_wav(&buf);
        assert_eq!(i16_at(&wav, 44), 32767);
        assert_eq!(i16_at(&wav, 46), -32768);
    }

    #[test]
    fn test_samples_interleave_sample_major() {
        let buf = PcmBuffer::stereo(44100, vec![1.0, 0.0], vec![-1.0, 0.0]);
        let wav = encode_wav(&buf);
        // Frame 0: left then right; frame 1 follows.
        assert_eq!(i16_at(&wav, 44), 32767);
        assert_eq!(i16_at(&wav, 46), -32768);
        assert_eq!(i16_at(&wav, 48), 0);
        assert_eq!(i16_at(&wav, 50), 0);
    }

    #[test]
    fn test_header_tracks_buffer_rate_and_channels() {
        let buf = PcmBuffer::silence(48000, 1, 10);
        let wav = encode_wav(&buf);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 48000);
        assert_eq!(u32_at(&wav, 28), 48000 * 2);
        assert_eq!(u16_at(&wav, 32), 2);
    }
}
