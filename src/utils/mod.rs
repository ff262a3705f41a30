//! Utility functions
//!
//! Provides logging setup and call bounds.

pub mod logging;
pub mod timeout;

pub use logging::setup_logging;
pub use timeout::within;
