// 📜 Logging setup

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Respects the `BCC_LOG` environment variable for filtering.
/// Defaults to `info` level if not set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("BCC_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
