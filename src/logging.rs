//! Structured logging setup.
//!
//! Initializes a [`tracing`] subscriber from a configured level, honoring
//! `RUST_LOG` when present. Safe to call more than once; later calls are
//! no-ops rather than panics.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// `level` is used as the default filter directive when `RUST_LOG` is not
/// set in the environment.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init("info");
        init("debug");
    }
}
