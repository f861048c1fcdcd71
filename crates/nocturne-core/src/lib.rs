//! Nocturne Core - Nightcore/Daycore playback and export engine

pub mod audio;
pub mod audio_file;
pub mod clock;
pub mod config;
pub mod engine;
pub mod export;
pub mod render;
pub mod speed;
pub mod types;

pub use types::*;
