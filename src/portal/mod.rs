//! Portal core functionality
//!
//! The entry point the site's form handlers call into.

pub mod core;

pub use core::Portal;
