//! Backend adapters
//!
//! Implementations of the identity service and profile store
//! collaborators: the hosted project over HTTP and an in-memory stand-in.

pub mod memory;
pub mod rest;

pub use memory::MemoryBackend;
pub use rest::RestBackend;
