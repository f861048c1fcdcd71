//! Deferred deallocation for track buffers
//!
//! Loading a new track swaps a `Shared<PlaybackTrack>` into the audio
//! callback, which drops its previous one. A decoded track is tens of
//! megabytes, and freeing that inside the callback can blow the output
//! deadline and glitch. `basedrop` defers the free: dropping a
//! `Shared<T>` on the audio thread only enqueues a pointer, and a
//! background GC thread does the actual deallocation.
//!
//! ## Usage
//!
//! ```ignore
//! use basedrop::Shared;
//! use crate::engine::gc::gc_handle;
//!
//! let track = Shared::new(&gc_handle(), PlaybackTrack::from_buffer(&buffer));
//!
//! // Clones work like Arc; the last drop on any thread defers the free
//! let for_callback = track.clone();
//! ```

use basedrop::{Collector, Handle};
use std::sync::mpsc;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Global handle for creating Shared<T> allocations
///
/// Initialized once; clones are cheap. The Collector itself lives on
/// the GC thread.
static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Initialize the global collector and return a handle
fn init_gc() -> Handle {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("track-gc".to_string())
        .spawn(move || {
            // Collector is !Sync, so it must be created on its own thread
            let mut collector = Collector::new();

            let handle = collector.handle();
            tx.send(handle).expect("Failed to send GC handle");

            log::info!("Track GC thread started");

            loop {
                collector.collect();

                // 100ms is plenty for reclaiming dropped track buffers
                thread::sleep(Duration::from_millis(100));
            }
        })
        .expect("Failed to spawn track GC thread");

    rx.recv().expect("Failed to receive GC handle")
}

/// Get a handle for creating Shared<T> allocations
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
