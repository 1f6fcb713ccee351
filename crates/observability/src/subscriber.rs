//! Tracing subscriber initialization.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing for the process, filtered by `RUST_LOG`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Initialize tracing with an explicit filter directive (e.g. `"dishcost_infra=debug"`).
///
/// An unparsable directive falls back to [`DEFAULT_FILTER`] with a warning.
pub fn init_with_filter(directive: &str) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => install(filter),
        Err(err) => {
            install(EnvFilter::new(DEFAULT_FILTER));
            tracing::warn!(directive, error = %err, "invalid log filter, using default");
        }
    }
}

fn install(filter: EnvFilter) {
    // JSON logs + timestamps.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        init_with_filter("debug");
        init_with_filter("not a [valid filter");
        init();
    }
}
