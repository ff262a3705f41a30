//! Logging utilities
//!
//! Provides logging setup and configuration.

/// Setup logging for the portal.
///
/// Honours `RUST_LOG`; calling it more than once is harmless.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
