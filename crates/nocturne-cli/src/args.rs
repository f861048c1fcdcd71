//! Command line argument parsing for the nocturne binary
//!
//! Hand-rolled flag parsing; the surface is small enough that a CLI
//! framework would outweigh the parser.

use std::path::PathBuf;

use nocturne_core::export::ExportFormat;
use nocturne_core::speed::{Mode, SpeedPreset};

pub const USAGE: &str = "\
Usage: nocturne [OPTIONS] <input-file>

Options:
  --daycore           Start in Daycore mode (slowed) instead of Nightcore
  --speed <value>     Speed slider value (default 1.25)
  --preset <name>     Speed preset: light, normal, heavy, extreme
  --export <format>   Export the track and exit: wav or mp3
  --bitrate <kbps>    MP3 bitrate in kbps (default 320)
  --artwork <jpeg>    JPEG file to embed as MP3 cover art
  --out <dir>         Output directory for exports
  --no-play           Never open an audio device
  --help              Show this help
";

/// Parsed command line, before config defaults are merged in
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Positional input file
    pub input: Option<PathBuf>,
    pub daycore: bool,
    /// Slider value from `--speed` or `--preset`, whichever came last
    pub slider_value: Option<f64>,
    pub export: Option<ExportFormat>,
    pub bitrate_kbps: Option<u32>,
    pub artwork: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub no_play: bool,
    pub show_help: bool,
}

impl CliArgs {
    /// Mode selected on the command line, if any
    pub fn mode(&self) -> Option<Mode> {
        if self.daycore {
            Some(Mode::Daycore)
        } else {
            None
        }
    }
}

/// Parse the argument list (without the program name)
pub fn parse(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--daycore" => parsed.daycore = true,
            "--no-play" => parsed.no_play = true,
            "--help" | "-h" => parsed.show_help = true,
            "--speed" => {
                let value = iter.next().ok_or("--speed requires a value")?;
                let speed: f64 = value
                    .parse()
                    .map_err(|_| format!("invalid --speed value: {}", value))?;
                parsed.slider_value = Some(speed);
            }
            "--preset" => {
                let name = iter.next().ok_or("--preset requires a name")?;
                let preset = SpeedPreset::from_name(name).ok_or_else(|| {
                    format!("unknown preset: {} (try light, normal, heavy, extreme)", name)
                })?;
                parsed.slider_value = Some(preset.slider_value());
            }
            "--export" => {
                let name = iter.next().ok_or("--export requires a format")?;
                let format = ExportFormat::from_name(name)
                    .ok_or_else(|| format!("unknown export format: {} (try wav or mp3)", name))?;
                parsed.export = Some(format);
            }
            "--bitrate" => {
                let value = iter.next().ok_or("--bitrate requires a value")?;
                let kbps: u32 = value
                    .parse()
                    .map_err(|_| format!("invalid --bitrate value: {}", value))?;
                parsed.bitrate_kbps = Some(kbps);
            }
            "--artwork" => {
                let path = iter.next().ok_or("--artwork requires a path")?;
                parsed.artwork = Some(PathBuf::from(path));
            }
            "--out" => {
                let path = iter.next().ok_or("--out requires a directory")?;
                parsed.out_dir = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown flag: {}", flag));
            }
            path => {
                if parsed.input.is_some() {
                    return Err(format!("unexpected extra argument: {}", path));
                }
                parsed.input = Some(PathBuf::from(path));
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_input_with_defaults() {
        let parsed = parse(&args(&["song.mp3"])).unwrap();
        assert_eq!(parsed.input, Some(PathBuf::from("song.mp3")));
        assert!(!parsed.daycore);
        assert_eq!(parsed.slider_value, None);
        assert_eq!(parsed.export, None);
        assert!(!parsed.no_play);
    }

    #[test]
    fn test_daycore_flag_sets_mode() {
        let parsed = parse(&args(&["--daycore", "song.mp3"])).unwrap();
        assert!(parsed.daycore);
        assert_eq!(parsed.mode(), Some(Mode::Daycore));

        let parsed = parse(&args(&["song.mp3"])).unwrap();
        assert_eq!(parsed.mode(), None);
    }

    #[test]
    fn test_speed_value() {
        let parsed = parse(&args(&["--speed", "1.4", "song.mp3"])).unwrap();
        assert_eq!(parsed.slider_value, Some(1.4));
    }

    #[test]
    fn test_preset_maps_to_slider_value() {
        let parsed = parse(&args(&["--preset", "heavy", "song.mp3"])).unwrap();
        assert_eq!(parsed.slider_value, Some(1.4));

        let parsed = parse(&args(&["--preset", "extreme", "song.mp3"])).unwrap();
        assert_eq!(parsed.slider_value, Some(1.6));
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let err = parse(&args(&["--preset", "ultra"])).unwrap_err();
        assert!(err.contains("ultra"));
    }

    #[test]
    fn test_export_format() {
        let parsed = parse(&args(&["song.flac", "--export", "mp3"])).unwrap();
        assert_eq!(parsed.export, Some(ExportFormat::Mp3));

        let parsed = parse(&args(&["song.flac", "--export", "wav"])).unwrap();
        assert_eq!(parsed.export, Some(ExportFormat::Wav));
    }

    #[test]
    fn test_flag_missing_value_is_an_error() {
        assert!(parse(&args(&["--speed"])).is_err());
        assert!(parse(&args(&["song.mp3", "--export"])).is_err());
    }

    #[test]
    fn test_unknown_flag_is_an_error() {
        let err = parse(&args(&["--loudness", "11"])).unwrap_err();
        assert!(err.contains("--loudness"));
    }

    #[test]
    fn test_second_positional_is_an_error() {
        assert!(parse(&args(&["a.mp3", "b.mp3"])).is_err());
    }

    #[test]
    fn test_export_run_flags_together() {
        let parsed = parse(&args(&[
            "song.mp3", "--export", "mp3", "--bitrate", "192", "--artwork", "cover.jpg", "--out",
            "/tmp/renders", "--no-play",
        ]))
        .unwrap();
        assert_eq!(parsed.bitrate_kbps, Some(192));
        assert_eq!(parsed.artwork, Some(PathBuf::from("cover.jpg")));
        assert_eq!(parsed.out_dir, Some(PathBuf::from("/tmp/renders")));
        assert!(parsed.no_play);
    }
}
