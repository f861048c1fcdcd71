//! Playback engine - voice, commands, controller
//!
//! This module contains the moving parts of playback:
//! - Voice: reads track frames inside the audio callback
//! - PlayerCommand: lock-free control queue into the callback
//! - PlaybackController: control-side state machine and position source
//! - gc: deferred deallocation of swapped-out track buffers

mod command;
mod gc;
mod player;
mod voice;

pub use command::*;
pub use gc::*;
pub use player::*;
pub use voice::*;
