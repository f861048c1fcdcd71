//! Export service running render + encode off the control thread
//!
//! One export is one worker thread. Rendering a long track at a slow
//! rate allocates and fills millions of samples, so the control thread
//! only ever polls the progress receiver.

use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use super::{encode_rendered, ExportProgress, ExportRequest};
use crate::audio_file::LoadedTrack;
use crate::render::render_offline;

/// Coordinates background exports of the loaded track
///
/// Stateless between runs. Each call to [`start_export`](Self::start_export)
/// spawns a fresh worker; exports are not cancellable once started.
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Render and encode `track` in the background
    ///
    /// Returns a receiver for progress messages, ending with exactly one
    /// terminal message (`Complete` or `Failed`). Returns `None` when no
    /// track is loaded, which is the caller's cue to do nothing.
    pub fn start_export(
        &self,
        track: Option<Arc<LoadedTrack>>,
        request: ExportRequest,
    ) -> Option<Receiver<ExportProgress>> {
        let track = track?;
        let (progress_tx, progress_rx) = channel();

        thread::Builder::new()
            .name("nocturne-export".to_string())
            .spawn(move || {
                let start_time = Instant::now();

                let _ = progress_tx.send(ExportProgress::Started {
                    title: request.title.clone(),
                    format: request.format,
                });

                let rendered =
                    render_offline(&track.buffer, request.slider_value, request.mode);
                let _ = progress_tx.send(ExportProgress::Rendered {
                    output_samples: rendered.len(),
                    output_seconds: rendered.duration_seconds(),
                });

                match encode_rendered(&rendered, &request) {
                    Ok(asset) => {
                        log::info!(
                            "Exported {} ({} bytes) in {:.1}s",
                            asset.filename,
                            asset.bytes.len(),
                            start_time.elapsed().as_secs_f64()
                        );
                        let _ = progress_tx.send(ExportProgress::Complete {
                            asset,
                            duration: start_time.elapsed(),
                        });
                    }
                    Err(e) => {
                        log::error!("Export of {} failed: {}", request.title, e);
                        let _ = progress_tx.send(ExportProgress::Failed {
                            error: e.to_string(),
                        });
                    }
                }
            })
            .expect("Failed to spawn export worker");

        Some(progress_rx)
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportFormat, WAV_HEADER_LEN};
    use crate::speed::Mode;
    use crate::types::PcmBuffer;

    fn stereo_track(title: &str, len: usize) -> Arc<LoadedTrack> {
        let wave: Vec<f32> = (0..len)
            .map(|i| (i as f32 * 0.01).sin() * 0.4)
            .collect();
        let buffer = PcmBuffer::new(44100, vec![wave.clone(), wave]);
        Arc::new(LoadedTrack::new(title, buffer))
    }

    #[test]
    fn test_no_track_yields_no_receiver() {
        let service = ExportService::new();
        let request = ExportRequest::new(
            ExportFormat::Wav,
            1.25,
            Mode::Nightcore,
            "ignored".to_string(),
        );
        assert!(service.start_export(None, request).is_none());
    }

    #[test]
    fn test_wav_export_lifecycle() {
        let service = ExportService::new();
        let track = stereo_track("Neon Sky", 44100);
        let request = ExportRequest::new(
            ExportFormat::Wav,
            1.25,
            Mode::Nightcore,
            track.title.clone(),
        );

        let rx = service.start_export(Some(track), request).unwrap();
        let messages: Vec<ExportProgress> = rx.iter().collect();

        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[0], ExportProgress::Started { .. }));
        assert!(matches!(
            messages[1],
            ExportProgress::Rendered { output_samples: 35280, .. }
        ));
        match &messages[2] {
            ExportProgress::Complete { asset, .. } => {
                assert_eq!(asset.filename, "Neon Sky (nightcore).wav");
                assert_eq!(asset.bytes.len(), WAV_HEADER_LEN + 35280 * 2 * 2);
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_message_arrives_last() {
        let service = ExportService::new();
        let track = stereo_track("Short", 4410);
        let request = ExportRequest::new(
            ExportFormat::Wav,
            1.5,
            Mode::Daycore,
            track.title.clone(),
        );

        let rx = service.start_export(Some(track), request).unwrap();
        let messages: Vec<ExportProgress> = rx.iter().collect();

        let (last, rest) = messages.split_last().unwrap();
        assert!(last.is_terminal());
        assert!(rest.iter().all(|m| !m.is_terminal()));
    }
}
