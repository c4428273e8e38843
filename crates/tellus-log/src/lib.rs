//! Structured logging setup for the tessellation engine.
//!
//! Console output goes through the `tracing` ecosystem with uptime
//! timestamps and thread names, which matters here because generation runs
//! on named worker threads alongside the render thread.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Filtering resolves in order: the `RUST_LOG` environment variable, then
/// the optional `filter` argument, then `info`.
///
/// # Examples
///
/// ```no_run
/// tellus_log::init_logging(None);
/// tellus_log::init_logging(Some("tellus_lod=debug"));
/// ```
pub fn init_logging(filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or("info")));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// The default filter used when neither `RUST_LOG` nor an explicit filter
/// is provided.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}
