//! Logging setup
//!
//! Runs report phase transitions, calibration results and faults through
//! `tracing`. Install a subscriber once per process to see them.

use tracing_subscriber::EnvFilter;

/// Default filter directive
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "trialbench=debug"
    } else {
        "trialbench=info"
    }
}

/// Install a formatting subscriber on stderr
///
/// `RUST_LOG` takes precedence over `verbose` when set. Fails if another
/// global subscriber is already installed.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive() {
        assert_eq!(default_directive(true), "trialbench=debug");
        assert_eq!(default_directive(false), "trialbench=info");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging(false);
        assert!(init_logging(true).is_err());
    }
}
