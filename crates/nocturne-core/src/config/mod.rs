//! Configuration infrastructure
//!
//! Generic YAML settings I/O plus the standard Nocturne file paths.
//! The settings structs themselves live with the front end that owns
//! them; this module only provides the plumbing:
//!
//! ```ignore
//! use nocturne_core::config::{default_config_path, load_config, save_config};
//!
//! let settings: MySettings = load_config(&default_config_path());
//! save_config(&settings, &default_config_path())?;
//! ```

mod io;
mod paths;

pub use io::{load_config, save_config};
pub use paths::{default_config_path, default_export_dir};
