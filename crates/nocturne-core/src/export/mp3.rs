//! MP3 encoding - LAME frame-encoder adapter
//!
//! Feeds LAME its native 1152-sample blocks per channel and concatenates
//! the emitted chunks; that concatenation is the finished MPEG stream, no
//! extra framing. The binding is optional (`mp3-lame` feature): without
//! it, or if LAME fails to initialize, encoding reports
//! [`ExportError::EncoderUnavailable`] and WAV export is unaffected.

use super::ExportError;
use crate::types::PcmBuffer;

/// LAME's native samples-per-frame; input is blocked to this size
pub const MP3_BLOCK_SAMPLES: usize = 1152;

/// Encode a buffer as an MPEG stream at the requested constant bitrate
///
/// Mono buffers feed one channel per block; stereo feeds matched
/// left/right chunks of equal length (the final block may be short).
/// The encoder is flushed exactly once after the last block.
#[cfg(feature = "mp3-lame")]
pub fn encode_mp3(buffer: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>, ExportError> {
    lame::encode(buffer, bitrate_kbps)
}

/// Without the `mp3-lame` feature there is no encoder to drive
#[cfg(not(feature = "mp3-lame"))]
pub fn encode_mp3(_buffer: &PcmBuffer, _bitrate_kbps: u32) -> Result<Vec<u8>, ExportError> {
    Err(ExportError::EncoderUnavailable)
}

#[cfg(feature = "mp3-lame")]
mod lame {
    use std::mem::MaybeUninit;

    use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality};

    use super::MP3_BLOCK_SAMPLES;
    use crate::export::{quantize_i16, ExportError};
    use crate::types::PcmBuffer;

    pub fn encode(buffer: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>, ExportError> {
        let mut builder = Builder::new().ok_or(ExportError::EncoderUnavailable)?;
        builder.set_sample_rate(buffer.sample_rate()).map_err(cfg_err)?;
        builder
            .set_num_channels(buffer.num_channels().min(2) as u8)
            .map_err(cfg_err)?;
        builder.set_brate(select_bitrate(bitrate_kbps)).map_err(cfg_err)?;
        builder.set_quality(Quality::Best).map_err(cfg_err)?;
        let mut encoder = builder.build().map_err(cfg_err)?;

        let left = quantize_channel(buffer, 0);
        let right = (buffer.num_channels() > 1).then(|| quantize_channel(buffer, 1));

        // Worst case per block from the LAME docs: 1.25 * samples + 7200.
        let mut out = Vec::new();
        let mut chunk: Vec<MaybeUninit<u8>> =
            vec![MaybeUninit::uninit(); MP3_BLOCK_SAMPLES * 5 / 4 + 7200];

        match &right {
            Some(right) => {
                for (l, r) in left
                    .chunks(MP3_BLOCK_SAMPLES)
                    .zip(right.chunks(MP3_BLOCK_SAMPLES))
                {
                    let written = encoder
                        .encode(DualPcm { left: l, right: r }, &mut chunk)
                        .map_err(encode_err)?;
                    append_init(&mut out, &chunk[..written]);
                }
            }
            None => {
                for block in left.chunks(MP3_BLOCK_SAMPLES) {
                    let written = encoder.encode(MonoPcm(block), &mut chunk).map_err(encode_err)?;
                    append_init(&mut out, &chunk[..written]);
                }
            }
        }

        let written = encoder.flush::<FlushNoGap>(&mut chunk).map_err(encode_err)?;
        append_init(&mut out, &chunk[..written]);

        Ok(out)
    }

    fn quantize_channel(buffer: &PcmBuffer, index: usize) -> Vec<i16> {
        buffer.channel(index).iter().copied().map(quantize_i16).collect()
    }

    /// Copy the encoder-initialized prefix of the scratch buffer
    fn append_init(out: &mut Vec<u8>, chunk: &[MaybeUninit<u8>]) {
        // SAFETY: the encoder returned the number of bytes it wrote and
        // only that prefix is passed in.
        out.extend(chunk.iter().map(|b| unsafe { b.assume_init() }));
    }

    /// Map the requested kbps onto LAME's CBR table
    fn select_bitrate(kbps: u32) -> Bitrate {
        match kbps {
            0..=96 => Bitrate::Kbps96,
            97..=112 => Bitrate::Kbps112,
            113..=128 => Bitrate::Kbps128,
            129..=160 => Bitrate::Kbps160,
            161..=192 => Bitrate::Kbps192,
            193..=224 => Bitrate::Kbps224,
            225..=256 => Bitrate::Kbps256,
            _ => Bitrate::Kbps320,
        }
    }

    fn cfg_err<E: std::fmt::Debug>(e: E) -> ExportError {
        ExportError::EncoderConfig(format!("{:?}", e))
    }

    fn encode_err<E: std::fmt::Debug>(e: E) -> ExportError {
        ExportError::EncodeFailed(format!("{:?}", e))
    }
}


#[cfg(all(test, not(feature = "mp3-lame")))]
mod tests {
    use super::*;

    #[test]
    fn test_reports_encoder_unavailable() {
        let buf = PcmBuffer::silence(44100, 2, 64);
        assert!(matches!(
            encode_mp3(&buf, 320),
            Err(ExportError::EncoderUnavailable)
        ));
    }
}
