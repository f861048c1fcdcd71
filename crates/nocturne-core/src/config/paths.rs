//! Standard paths for Nocturne files

use std::path::PathBuf;

/// Get the default config file path
///
/// Returns: `~/.config/nocturne/config.yaml` (platform equivalent)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("nocturne")
        .join("config.yaml")
}

/// Get the default directory for exported files
///
/// Returns: `~/Music/nocturne` (platform equivalent)
pub fn default_export_dir() -> PathBuf {
    dirs::audio_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Music")
        })
        .join("nocturne")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_config_yaml() {
        let path = default_config_path();
        assert!(path.ends_with("nocturne/config.yaml"));
    }

    #[test]
    fn test_export_dir_ends_with_nocturne() {
        let path = default_export_dir();
        assert!(path.ends_with("nocturne"));
    }
}
