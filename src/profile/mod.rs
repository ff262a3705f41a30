//! User profiles
//!
//! The profile store collaborator and the view/edit operations on top of it.

pub mod operations;
pub mod store;

pub use operations::{edit_profile, view_profile};
pub use store::{ProfileChanges, ProfileRecord, ProfileStore};
