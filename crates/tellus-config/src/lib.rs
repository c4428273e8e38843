//! Settings persistence and CLI parsing.
//!
//! Settings live in a plain-text file, one `key = value` pair per line, so
//! they can be hand-edited between sessions. Only the in-memory values are
//! consumed by the engine core.

mod cli;
mod error;
mod settings;

pub use cli::{DemoArgs, default_settings_path};
pub use error::SettingsError;
pub use settings::{DRAW_ERROR_THRESHOLD_KEY, Settings};
