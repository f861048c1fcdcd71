//! Lock-free command queue for real-time playback control
//!
//! The control thread sends commands via a lock-free queue and the
//! audio callback processes them at buffer boundaries. A mutex here
//! would let a slow control-side operation starve the callback and
//! drop output; `rtrb` pushes and pops in O(1) without blocking
//! either side.

use basedrop::Shared;

use super::voice::PlaybackTrack;

/// Commands sent from the control thread to the audio callback
///
/// Each variant is one atomic operation on the voice, applied at the
/// start of an output buffer so state never changes mid-buffer.
pub enum PlayerCommand {
    /// Swap in a decoded track, replacing any current one
    ///
    /// The track rides in a `Shared` so the callback's drop of the old
    /// buffer is deferred to the GC thread instead of freeing tens of
    /// megabytes inside the output deadline.
    Load { track: Shared<PlaybackTrack> },

    /// Drop the current track and go silent
    Unload,

    /// Begin or resume playback
    Start {
        /// Starting position in source seconds
        offset_seconds: f64,
        /// Playback rate multiplier
        rate: f64,
    },

    /// Stop output, keeping the track and read position
    Stop,

    /// Change the playback rate without interrupting output
    SetRate(f64),
}

/// Capacity of the command queue
///
/// Transport operations arrive one keystroke at a time, so even a
/// burst (load + seek + rate + start) stays far below this.
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Create a new command channel (producer/consumer pair)
///
/// The producer belongs to the control thread, the consumer to the
/// audio callback. Bounded at [`COMMAND_QUEUE_CAPACITY`].
pub fn command_channel() -> (rtrb::Producer<PlayerCommand>, rtrb::Consumer<PlayerCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
