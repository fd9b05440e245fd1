//! Logging utilities with Oasis segment prefixes.
//!
//! Provides consistent logging setup for native Oasis components. Browser
//! builds install their own console sink (see `oasis-wasm`).

/// Initialize tracing with Oasis defaults.
///
/// Sets up tracing-subscriber with:
/// - Environment filter (RUST_LOG)
/// - Compact format suitable for terminal output
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(not(target_arch = "wasm32"))]
pub fn init() -> bool {
    init_with_filter("info")
}

/// Initialize tracing with a custom default filter.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_with_filter(default_filter: &str) -> bool {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init()
        .is_ok()
}

/// Oasis segment prefixes for logging.
pub mod prefix {
    /// Database operations prefix
    pub const DB: &str = "⊔";
}
