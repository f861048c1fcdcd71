//! Control-side playback state machine
//!
//! [`PlaybackController`] is the single owner of transport state. It
//! drives the audio callback through the command queue, reconstructs
//! the displayed position from the wall clock, and folds the
//! callback's end-of-track flag back into its state machine. The
//! callback never blocks on any of this.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use basedrop::Shared;

use crate::audio_file::LoadedTrack;
use crate::clock::{MonotonicClock, PositionClock, WallClock};
use crate::speed::{resolve_rate, Mode, DEFAULT_SLIDER_VALUE};
use crate::types::PlayState;

use super::command::PlayerCommand;
use super::gc::gc_handle;
use super::voice::{PlaybackTrack, PlayerAtomics};

/// Settle time between the stop and restart halves of a live seek
///
/// Gives the callback a buffer's worth of time to drain the stop
/// before the restart lands.
const SEEK_SETTLE: Duration = Duration::from_millis(50);

/// Transport state machine and position source for one track
pub struct PlaybackController<C: WallClock = MonotonicClock> {
    commands: rtrb::Producer<PlayerCommand>,
    atomics: Arc<PlayerAtomics>,
    clock: PositionClock<C>,
    state: PlayState,
    slider_value: f64,
    mode: Mode,
    duration_seconds: f64,
    track: Option<Arc<LoadedTrack>>,
}

impl PlaybackController<MonotonicClock> {
    pub fn new(commands: rtrb::Producer<PlayerCommand>, atomics: Arc<PlayerAtomics>) -> Self {
        Self::with_clock(commands, atomics, PositionClock::monotonic())
    }
}

impl<C: WallClock> PlaybackController<C> {
    pub fn with_clock(
        commands: rtrb::Producer<PlayerCommand>,
        atomics: Arc<PlayerAtomics>,
        clock: PositionClock<C>,
    ) -> Self {
        Self {
            commands,
            atomics,
            clock,
            state: PlayState::Stopped,
            slider_value: DEFAULT_SLIDER_VALUE,
            mode: Mode::default(),
            duration_seconds: 0.0,
            track: None,
        }
    }

    /// Swap in a new track, stopping any current playback first
    pub fn load(&mut self, track: Arc<LoadedTrack>) {
        self.stop();
        self.atomics.take_ended();

        let playback = Shared::new(&gc_handle(), PlaybackTrack::from_buffer(&track.buffer));
        self.duration_seconds = track.buffer.duration_seconds();
        self.send(PlayerCommand::Load { track: playback });
        self.clock.seek(0.0, self.duration_seconds);
        self.track = Some(track);
    }

    /// Begin or resume playback at the resolved rate
    ///
    /// No-op while already playing or without a track. Playing a track
    /// that sits at its end restarts it from the top.
    pub fn play(&mut self) {
        if self.track.is_none() || self.state == PlayState::Playing {
            return;
        }

        let mut offset = self.clock.position();
        if offset >= self.duration_seconds {
            offset = 0.0;
        }

        let rate = self.rate();
        self.clock.start(offset, self.duration_seconds);
        self.send(PlayerCommand::Start {
            offset_seconds: offset,
            rate,
        });
        self.state = PlayState::Playing;
    }

    /// Freeze playback, keeping the position for resume
    pub fn pause(&mut self) {
        if self.state != PlayState::Playing {
            return;
        }
        self.send(PlayerCommand::Stop);
        self.clock.sample(self.rate(), self.duration_seconds);
        self.clock.stop();
        self.state = PlayState::Paused;
    }

    /// Stop playback; position stays where it was
    ///
    /// Safe to call in any state, repeatedly.
    pub fn stop(&mut self) {
        if self.state != PlayState::Stopped {
            self.send(PlayerCommand::Stop);
        }
        self.clock.stop();
        self.state = PlayState::Stopped;
    }

    /// Toggle between playing and paused
    pub fn toggle_play(&mut self) {
        if self.state == PlayState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to a position in source seconds (clamped to the track)
    ///
    /// While playing, the voice is stopped, given [`SEEK_SETTLE`] to
    /// drain, and restarted at the target so playback continues with no
    /// stale buffer at the old position.
    pub fn seek(&mut self, seconds: f64) {
        if self.track.is_none() || !seconds.is_finite() {
            return;
        }
        let target = seconds.clamp(0.0, self.duration_seconds);

        if self.state == PlayState::Playing {
            self.send(PlayerCommand::Stop);
            thread::sleep(SEEK_SETTLE);
            // A natural end racing the seek must not surface after the restart
            self.atomics.take_ended();
            self.clock.seek(target, self.duration_seconds);
            self.send(PlayerCommand::Start {
                offset_seconds: target,
                rate: self.rate(),
            });
        } else {
            self.clock.seek(target, self.duration_seconds);
        }
    }

    /// Change the speed slider; takes effect immediately while playing
    pub fn set_slider_value(&mut self, value: f64) {
        // Charge elapsed time at the old rate before it changes
        self.clock.sample(self.rate(), self.duration_seconds);
        self.slider_value = value;
        if self.state == PlayState::Playing {
            self.send(PlayerCommand::SetRate(self.rate()));
        }
    }

    /// Switch between nightcore and daycore without restarting
    pub fn set_mode(&mut self, mode: Mode) {
        self.clock.sample(self.rate(), self.duration_seconds);
        self.mode = mode;
        if self.state == PlayState::Playing {
            self.send(PlayerCommand::SetRate(self.rate()));
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode.toggled());
    }

    /// Fold the callback's end-of-track flag into the state machine
    ///
    /// Returns true exactly once per track end. Afterwards the state is
    /// Stopped with the position pinned at the duration.
    pub fn poll_end(&mut self) -> bool {
        if !self.atomics.take_ended() {
            return false;
        }
        self.clock.seek(self.duration_seconds, self.duration_seconds);
        self.clock.stop();
        self.state = PlayState::Stopped;
        true
    }

    /// Current position in source seconds, recomputed from wall time
    pub fn position(&mut self) -> f64 {
        self.clock.sample(self.rate(), self.duration_seconds).position
    }

    /// The playback rate the current slider and mode resolve to
    pub fn rate(&self) -> f64 {
        resolve_rate(self.slider_value, self.mode)
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn slider_value(&self) -> f64 {
        self.slider_value
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// The loaded track, shared with the export side
    pub fn track(&self) -> Option<Arc<LoadedTrack>> {
        self.track.clone()
    }

    fn send(&mut self, cmd: PlayerCommand) {
        if self.commands.push(cmd).is_err() {
            log::warn!("Player command queue full, command dropped");
        }
    }
}
