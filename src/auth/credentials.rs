//! Login credentials
//!
//! What the login form submits and how its identifier is read.

/// Identifier/secret pair from the login form. Neither field is trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialInput {
    pub identifier: String,
    pub secret: String,
}

impl CredentialInput {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn classify(&self) -> Identifier<'_> {
        Identifier::classify(&self.identifier)
    }
}

impl std::fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialInput")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A login identifier: an email when it contains `@`, a username otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl<'a> Identifier<'a> {
    pub fn classify(raw: &'a str) -> Self {
        if raw.contains('@') {
            Identifier::Email(raw)
        } else {
            Identifier::Username(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_sign_means_email() {
        assert_eq!(Identifier::classify("j@example.com"), Identifier::Email("j@example.com"));
        assert_eq!(Identifier::classify("@"), Identifier::Email("@"));
        assert_eq!(Identifier::classify("jdoe"), Identifier::Username("jdoe"));
        assert_eq!(Identifier::classify(" jdoe "), Identifier::Username(" jdoe "));
    }

    #[test]
    fn debug_hides_secret() {
        let input = CredentialInput::new("jdoe", "hunter2");
        let printed = format!("{:?}", input);
        assert!(printed.contains("jdoe"));
        assert!(!printed.contains("hunter2"));
    }
}
