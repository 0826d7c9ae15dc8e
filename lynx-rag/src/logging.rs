//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init_tracing`].
///
/// `RUST_LOG` wins when it is set and parses; otherwise `default` is used,
/// falling back to `info` if `default` itself is not a valid directive.
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a global `fmt` subscriber filtered by [`env_filter`].
///
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is kept.
pub fn init_tracing(default: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_target(true)
        .try_init()
        .is_ok()
}
