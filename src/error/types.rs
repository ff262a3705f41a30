//! Error types
//!
//! Defines domain-specific error types for each module of the portal.

use std::fmt;

/// Authentication module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Local pre-flight failure, raised before any service call.
    Validation(String),
    UserNotFound(String),
    InvalidCredentials,
    /// Network, service or backend inconsistency. The message is detail for logs.
    Transient(String),
    NotLoggedIn,
    InvalidState(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Validation(s) => write!(f, "Validation failed: {}", s),
            AuthError::UserNotFound(u) => write!(f, "User not found: {}", u),
            AuthError::InvalidCredentials => write!(f, "Invalid login credentials"),
            AuthError::Transient(s) => write!(f, "Transient error: {}", s),
            AuthError::NotLoggedIn => write!(f, "User not logged in"),
            AuthError::InvalidState(s) => write!(f, "Invalid state: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

/// Identity service errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The service answered and refused the request.
    Rejected { reason: String },
    /// The service could not be reached or answered with something unreadable.
    Transport(String),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityError::Rejected { reason } => write!(f, "Identity service rejected request: {}", reason),
            IdentityError::Transport(s) => write!(f, "Identity service unreachable: {}", s),
        }
    }
}

impl std::error::Error for IdentityError {}

/// Profile store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// More than one profile carries the same username.
    Ambiguous { username: String, matches: usize },
    /// A write would break username uniqueness.
    Conflict(String),
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Ambiguous { username, matches } => {
                write!(f, "Username {} matches {} profiles", username, matches)
            }
            StoreError::Conflict(u) => write!(f, "Username already taken: {}", u),
            StoreError::Backend(s) => write!(f, "Profile store error: {}", s),
        }
    }
}

impl std::error::Error for StoreError {}

/// Registration module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    Validation(String),
    UsernameTaken(String),
    Rejected(String),
    Transient(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Validation(s) => write!(f, "Validation failed: {}", s),
            RegistrationError::UsernameTaken(u) => write!(f, "Username already taken: {}", u),
            RegistrationError::Rejected(s) => write!(f, "Sign-up rejected: {}", s),
            RegistrationError::Transient(s) => write!(f, "Transient error: {}", s),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Profile module errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    NotLoggedIn,
    NotFound(String),
    Validation(String),
    UsernameTaken(String),
    Transient(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::NotLoggedIn => write!(f, "User not logged in"),
            ProfileError::NotFound(id) => write!(f, "Profile not found: {}", id),
            ProfileError::Validation(s) => write!(f, "Validation failed: {}", s),
            ProfileError::UsernameTaken(u) => write!(f, "Username already taken: {}", u),
            ProfileError::Transient(s) => write!(f, "Transient error: {}", s),
        }
    }
}

impl std::error::Error for ProfileError {}

impl From<StoreError> for ProfileError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(u) => ProfileError::UsernameTaken(u),
            other => ProfileError::Transient(other.to_string()),
        }
    }
}

/// General portal error that encompasses all error types
#[derive(Debug)]
pub enum PortalError {
    Auth(AuthError),
    Identity(IdentityError),
    Store(StoreError),
    Registration(RegistrationError),
    Profile(ProfileError),
    Config(config::ConfigError),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalError::Auth(e) => write!(f, "Authentication error: {}", e),
            PortalError::Identity(e) => write!(f, "Identity error: {}", e),
            PortalError::Store(e) => write!(f, "Store error: {}", e),
            PortalError::Registration(e) => write!(f, "Registration error: {}", e),
            PortalError::Profile(e) => write!(f, "Profile error: {}", e),
            PortalError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for PortalError {}

// Implement conversions from specific errors to PortalError
impl From<AuthError> for PortalError {
    fn from(error: AuthError) -> Self {
        PortalError::Auth(error)
    }
}

impl From<IdentityError> for PortalError {
    fn from(error: IdentityError) -> Self {
        PortalError::Identity(error)
    }
}

impl From<StoreError> for PortalError {
    fn from(error: StoreError) -> Self {
        PortalError::Store(error)
    }
}

impl From<RegistrationError> for PortalError {
    fn from(error: RegistrationError) -> Self {
        PortalError::Registration(error)
    }
}

impl From<ProfileError> for PortalError {
    fn from(error: ProfileError) -> Self {
        PortalError::Profile(error)
    }
}

impl From<config::ConfigError> for PortalError {
    fn from(error: config::ConfigError) -> Self {
        PortalError::Config(error)
    }
}
