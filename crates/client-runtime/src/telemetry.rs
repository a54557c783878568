//! Logging bootstrap for embedding hosts.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global log subscriber.
///
/// Honors `RUST_LOG` when set, defaulting to `info` otherwise. Hosts call
/// this once at startup; a second call fails because the global subscriber
/// is already set.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(Level::INFO.into()));
    fmt().with_env_filter(filter).with_target(true).try_init()
}
