//! Process-wide logging setup shared by the storefront binaries.

/// Initialize tracing for the process from the environment.
///
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init() -> bool {
    tracing::init(tracing::LogConfig::from_env())
}

/// Tracing configuration (filter, output format).
pub mod tracing;

pub use self::tracing::{LogConfig, LogFormat};
