//! Account registration
//!
//! Sign-up form validation and the sign-up flow.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::register;
pub use results::Registered;
pub use validation::{RegistrationForm, validate_registration};
