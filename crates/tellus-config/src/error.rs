//! Settings persistence error types.

/// Errors while loading or saving the settings file. Malformed lines are
/// not errors; they are skipped with a warning so a stray edit never
/// blocks startup.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    #[error("failed to read settings: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write the settings file to disk.
    #[error("failed to write settings: {0}")]
    Write(#[source] std::io::Error),
}
