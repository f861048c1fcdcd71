//! Audio output for Nocturne
//!
//! The output side follows a lock-free design for real-time safety:
//!
//! - **Control thread**: Sends commands via lock-free ringbuffer
//! - **Audio callback**: Owns the [`Voice`](crate::engine::Voice)
//!   exclusively, processes commands at buffer boundaries
//! - **Atomics**: Control thread reads playback state via relaxed
//!   atomics (no locks)
//!
//! # Example Usage
//!
//! ```ignore
//! use nocturne_core::audio::start_output;
//! use nocturne_core::engine::PlaybackController;
//!
//! let system = start_output()?;
//! let mut player = PlaybackController::new(system.commands, system.atomics);
//!
//! player.load(track);
//! player.play();
//! ```

mod error;
mod output;

pub use error::{AudioError, AudioResult};
pub use output::{start_output, AudioHandle, AudioSystem};
