//! Command-line arguments for the demo binary.

use std::path::PathBuf;

use clap::Parser;

/// Headless planet tessellation demo.
#[derive(Parser, Debug)]
#[command(name = "tellus-demo", about = "Flies a camera down to a procedural planet")]
pub struct DemoArgs {
    /// Frames to simulate.
    #[arg(long, default_value_t = 240)]
    pub frames: u32,

    /// Worker threads for tile generation.
    #[arg(long, default_value_t = 3)]
    pub workers: usize,

    /// Draw-error threshold override in pixels (otherwise read from the
    /// settings file).
    #[arg(long)]
    pub draw_error_threshold: Option<f64>,

    /// Settings file path. Defaults to the user configuration directory.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Terrain seed.
    #[arg(long, default_value_t = 0)]
    pub seed: u32,

    /// Log filter (e.g. `debug` or `tellus_lod=trace`).
    #[arg(long)]
    pub log: Option<String>,
}

impl DemoArgs {
    /// The settings path to use: the `--settings` override or the default
    /// location.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }
}

/// `tellus/settings.cfg` under the platform config directory, falling back
/// to the working directory when none exists.
#[must_use]
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("tellus").join("settings.cfg"))
        .unwrap_or_else(|| PathBuf::from("settings.cfg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let args = DemoArgs::parse_from(["tellus-demo"]);
        assert_eq!(args.frames, 240);
        assert_eq!(args.workers, 3);
        assert!(args.draw_error_threshold.is_none());
        assert!(args.settings.is_none());
    }

    #[test]
    fn test_overrides_parse() {
        let args = DemoArgs::parse_from([
            "tellus-demo",
            "--frames",
            "10",
            "--workers",
            "5",
            "--draw-error-threshold",
            "22.5",
            "--settings",
            "/tmp/s.cfg",
        ]);
        assert_eq!(args.frames, 10);
        assert_eq!(args.workers, 5);
        assert_eq!(args.draw_error_threshold, Some(22.5));
        assert_eq!(args.settings_path(), PathBuf::from("/tmp/s.cfg"));
    }

    #[test]
    fn test_default_settings_path_is_stable() {
        assert_eq!(default_settings_path(), default_settings_path());
    }
}
