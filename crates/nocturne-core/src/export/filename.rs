//! Export filename construction
//!
//! `"<sanitized track name> (<mode>).<ext>"`, with filesystem-reserved
//! characters stripped from the name and spaces preserved.

use super::ExportFormat;
use crate::speed::Mode;

/// Characters stripped from track names; reserved on at least one of the
/// supported filesystems
const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Remove reserved characters, keeping everything else including spaces
pub fn sanitize_track_name(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

/// Build the export filename for a title, mode, and container
pub fn build_filename(title: &str, mode: Mode, format: ExportFormat) -> String {
    format!(
        "{} ({}).{}",
        sanitize_track_name(title),
        mode.label(),
        format.extension()
    )
}
