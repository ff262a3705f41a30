//! Client state management
//!
//! Handles a visitor's sign-in state and the form handlers built on it.

pub mod operations;
pub mod results;
pub mod state;

pub use operations::{
    process_edit_profile, process_login, process_logout, process_view_profile,
};
pub use results::{LoginResult, LogoutResult};
pub use state::{BusyGuard, Client};
