//! Plain-text `key = value` settings.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::SettingsError;

/// Settings key for the tessellation split threshold.
pub const DRAW_ERROR_THRESHOLD_KEY: &str = "planet.draw_error_threshold";

/// An ordered key/value settings map with plain-text persistence.
///
/// The file format is one `key = value` pair per line; `#` starts a
/// comment. Keys are saved in sorted order so files diff cleanly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// An empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a settings file.
    ///
    /// Malformed lines are skipped with a warning rather than failing the
    /// whole file.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Read`] when the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(SettingsError::Read)?;
        let mut settings = Self::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    settings
                        .values
                        .insert(key.trim().to_string(), value.trim().to_string());
                }
                None => {
                    warn!(line = number + 1, content = line, "skipping malformed settings line");
                }
            }
        }
        Ok(settings)
    }

    /// Load a settings file, falling back to defaults when it is missing
    /// or unreadable (first run).
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(path = %path.display(), %error, "using default settings");
                Self::new()
            }
        }
    }

    /// Write the settings file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Write`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(SettingsError::Write)?;
            }
        }
        let mut text = String::new();
        for (key, value) in &self.values {
            text.push_str(key);
            text.push_str(" = ");
            text.push_str(value);
            text.push('\n');
        }
        std::fs::write(path, text).map_err(SettingsError::Write)
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Store a raw value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Floating-point value for a key, with a default for missing or
    /// unparsable entries.
    #[must_use]
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, raw, "settings value is not a number, using default");
                default
            }),
        }
    }

    /// Store a floating-point value.
    pub fn set_f64(&mut self, key: &str, value: f64) {
        self.set(key, format!("{value}"));
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
