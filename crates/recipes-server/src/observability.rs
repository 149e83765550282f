//! Tracing setup with a log level that can be changed after startup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber at `info`. `RUST_LOG` wins when set.
pub fn init_tracing() {
    init_tracing_with_level("info");
}

pub fn init_tracing_with_level(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (reload_layer, handle) = reload::Layer::new(filter);
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Swaps the active filter for `level`. Does nothing when `RUST_LOG` is
/// set or tracing was never initialized.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing::debug!("RUST_LOG is set, ignoring logging.level");
        return;
    }
    let Some(handle) = LOG_RELOAD_HANDLE.get() else {
        return;
    };
    match handle.modify(|f| *f = EnvFilter::new(level)) {
        Ok(()) => tracing::debug!(level, "log level applied"),
        Err(e) => tracing::warn!(error = %e, "failed to apply log level"),
    }
}
