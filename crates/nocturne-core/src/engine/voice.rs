//! Single playback voice and its lock-free state
//!
//! The voice is owned exclusively by the audio callback. It reads
//! stereo frames from the loaded track at a fractional read head and
//! advances by `rate * file_rate / device_rate` per output frame, so
//! pitch and tempo shift together and tracks play correctly on devices
//! running at a different sample rate than the file.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use basedrop::Shared;

use crate::types::{PcmBuffer, PlayState, StereoSample};

use super::command::PlayerCommand;

/// A decoded track in the layout the callback reads
///
/// Frames are interleaved stereo at the file's native sample rate.
/// Mono sources arrive already duplicated into both channels.
pub struct PlaybackTrack {
    frames: Vec<StereoSample>,
    sample_rate: u32,
}

impl PlaybackTrack {
    pub fn new(frames: Vec<StereoSample>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    pub fn from_buffer(buffer: &PcmBuffer) -> Self {
        Self::new(buffer.to_stereo_frames(), buffer.sample_rate())
    }

    /// Number of stereo frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Track length in seconds at its native rate
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / self.sample_rate as f64
    }
}

/// Lock-free playback state for control-thread reads
///
/// The audio callback writes these after every buffer; the control
/// thread reads them without locks. All operations use
/// `Ordering::Relaxed` since only visibility is needed, not ordering
/// against other memory operations.
pub struct PlayerAtomics {
    /// Current position in source seconds, stored as f64 bits
    position_bits: AtomicU64,
    /// Playback state: 0=Stopped, 1=Playing, 2=Paused
    state: AtomicU8,
    /// One-shot flag raised when the track plays to its end
    ended: AtomicBool,
}

impl PlayerAtomics {
    pub fn new() -> Self {
        Self {
            position_bits: AtomicU64::new(0.0f64.to_bits()),
            state: AtomicU8::new(0),
            ended: AtomicBool::new(false),
        }
    }

    /// Get current position in source seconds (lock-free)
    #[inline]
    pub fn position_seconds(&self) -> f64 {
        f64::from_bits(self.position_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_position_seconds(&self, seconds: f64) {
        self.position_bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    /// Get play state as enum (lock-free)
    #[inline]
    pub fn play_state(&self) -> PlayState {
        match self.state.load(Ordering::Relaxed) {
            1 => PlayState::Playing,
            2 => PlayState::Paused,
            _ => PlayState::Stopped,
        }
    }

    #[inline]
    pub fn set_state(&self, state: PlayState) {
        let value = match state {
            PlayState::Stopped => 0,
            PlayState::Playing => 1,
            PlayState::Paused => 2,
        };
        self.state.store(value, Ordering::Relaxed);
    }

    /// Check if playing (lock-free)
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.load(Ordering::Relaxed) == 1
    }

    /// Raise the end-of-track flag
    #[inline]
    pub fn set_ended(&self) {
        self.ended.store(true, Ordering::Relaxed);
    }

    /// Consume the end-of-track flag
    ///
    /// Returns true at most once per raised flag, so polling cannot
    /// observe the same track end twice.
    #[inline]
    pub fn take_ended(&self) -> bool {
        self.ended.swap(false, Ordering::Relaxed)
    }
}

impl Default for PlayerAtomics {
    fn default() -> Self {
        Self::new()
    }
}

/// The playback voice owned by the audio callback
pub struct Voice {
    /// Loaded track; dropping a replacement defers the free to the GC thread
    track: Option<Shared<PlaybackTrack>>,
    /// Fractional read position in source frames
    read_head: f64,
    /// Playback rate multiplier
    rate: f64,
    /// Whether the voice is producing audio
    active: bool,
    /// Output device sample rate
    device_rate: u32,
    atomics: Arc<PlayerAtomics>,
}

impl Voice {
    pub fn new(device_rate: u32) -> Self {
        Self {
            track: None,
            read_head: 0.0,
            rate: 1.0,
            active: false,
            device_rate,
            atomics: Arc::new(PlayerAtomics::new()),
        }
    }

    /// Get a clone of the shared state for control-thread reads
    pub fn atomics(&self) -> Arc<PlayerAtomics> {
        self.atomics.clone()
    }

    /// Drain and apply all pending commands
    ///
    /// Called at the start of each output buffer so state never
    /// changes mid-buffer.
    pub fn process_commands(&mut self, commands: &mut rtrb::Consumer<PlayerCommand>) {
        while let Ok(cmd) = commands.pop() {
            self.apply(cmd);
        }
    }

    /// Apply one command
    pub fn apply(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Load { track } => {
                self.read_head = 0.0;
                self.active = false;
                // Old Shared drops here; the free happens on the GC thread
                self.track = Some(track);
                self.publish();
            }
            PlayerCommand::Unload => {
                self.track = None;
                self.read_head = 0.0;
                self.active = false;
                self.publish();
            }
            PlayerCommand::Start {
                offset_seconds,
                rate,
            } => {
                self.rate = rate;
                if let Some(track) = self.track.as_ref() {
                    let offset = offset_seconds.clamp(0.0, track.duration_seconds());
                    self.read_head = offset * track.sample_rate as f64;
                    self.active = !track.is_empty();
                }
                self.publish();
            }
            PlayerCommand::Stop => {
                self.active = false;
                self.publish();
            }
            PlayerCommand::SetRate(rate) => {
                self.rate = rate;
            }
        }
    }

    /// Fill one output buffer at the device sample rate
    ///
    /// Writes silence when idle. On reaching the end of the track the
    /// voice deactivates, clamps its position to the track length, and
    /// raises the one-shot ended flag.
    pub fn fill(&mut self, output: &mut [StereoSample]) {
        let track = match self.track.clone() {
            Some(track) => track,
            None => {
                output.fill(StereoSample::silence());
                self.publish();
                return;
            }
        };

        if !self.active || track.is_empty() || self.device_rate == 0 {
            output.fill(StereoSample::silence());
            self.publish();
            return;
        }

        let frames = &track.frames;
        let len = frames.len() as f64;
        let step = self.rate * track.sample_rate as f64 / self.device_rate as f64;

        let mut written = 0;
        while written < output.len() && self.read_head < len {
            output[written] = frame_at(frames, self.read_head);
            self.read_head += step;
            written += 1;
        }

        if self.read_head >= len {
            self.read_head = len;
            self.active = false;
            self.atomics.set_ended();
        }

        for frame in &mut output[written..] {
            *frame = StereoSample::silence();
        }

        self.publish();
    }

    /// Write position and state for the control thread
    fn publish(&self) {
        let seconds = match self.track.as_ref() {
            Some(track) if track.sample_rate > 0 => self.read_head / track.sample_rate as f64,
            _ => 0.0,
        };
        self.atomics.set_position_seconds(seconds);
        self.atomics.set_state(if self.active {
            PlayState::Playing
        } else {
            PlayState::Stopped
        });
    }
}

/// Linearly interpolate a stereo frame at a fractional position
///
/// Past the last frame pair this holds the final frame, matching the
/// offline render path. Callers guarantee `frames` is non-empty.
#[inline]
fn frame_at(frames: &[StereoSample], position: f64) -> StereoSample {
    let index = position as usize;
    if index + 1 >= frames.len() {
        return frames[frames.len() - 1];
    }
    let frac = (position - index as f64) as f32;
    frames[index] * (1.0 - frac) + frames[index + 1] * frac
}
