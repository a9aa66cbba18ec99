//! # Logging
//!
//! Tracing subscriber setup for binaries and ad-hoc debugging.
//!
//! ## Filter
//! `RUST_LOG` wins when set; otherwise engine crates log at debug and
//! everything else at info.
//! ```text
//!   RUST_LOG=warn bazaar-quote            only warnings
//!   RUST_LOG=bazaar_engine=trace ...      loader internals
//! ```

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,bazaar_core=debug,bazaar_engine=debug";

/// Installs the global subscriber. Later calls are ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // try_init: a test harness or host app may have installed one already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialised twice without panicking");
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
