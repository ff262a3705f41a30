//! Authentication system
//!
//! Handles login input, credential resolution and form validation.

pub mod credentials;
pub mod resolver;
pub mod validator;

pub use credentials::{CredentialInput, Identifier};
pub use resolver::CredentialResolver;
pub use validator::{validate_email, validate_login, validate_username};
