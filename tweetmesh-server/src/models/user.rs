//! User credential validation

use super::validation::bounded_text;
use super::ValidationError;

/// Width of the `users.username` and `users.password` columns
const MAX_CREDENTIAL_LEN: usize = 50;

/// Validated username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Create a username: non-blank, at most 50 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text(s, "username", MAX_CREDENTIAL_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated password (stored verbatim; hashing is out of scope)
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text(s, "password", MAX_CREDENTIAL_LEN)?;
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(..)")
    }
}
