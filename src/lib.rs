pub mod auth;
pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod portal;
pub mod profile;
pub mod registration;
pub mod utils;

pub use portal::Portal;
