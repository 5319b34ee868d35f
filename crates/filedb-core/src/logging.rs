//! Logging setup for binaries that embed filedb.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "filedb_core=info,filedb_demo=info";

pub struct LogConfig {
    /// `debug` for filedb crates instead of `info`. Ignored when `RUST_LOG` is set.
    pub verbose: bool,
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` (or the default filter).
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: LogConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config.verbose {
            EnvFilter::new("filedb_core=debug,filedb_demo=debug")
        } else {
            EnvFilter::new(DEFAULT_LOG_FILTER)
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
}
