//! Log setup for the provider process
//!
//! Terraform reads the plugin's stdout, so logs go to stderr. The level comes
//! from `TF_LOG` when set, `info` otherwise.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TF_LOG";

/// Installs the global subscriber; a second call, or one after the host set
/// its own, is a no-op. `TencentCloudProvider::configure` calls it.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
