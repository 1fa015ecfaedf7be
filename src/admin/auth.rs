use sha2::{Digest, Sha256};
use thiserror::Error;

/// Authorization errors for the admin surface
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Admin token required")]
    MissingToken,

    #[error("Invalid admin token")]
    InvalidToken,

    #[error("Admin token is not configured")]
    NotConfigured,
}

/// Capability to run privileged operations
///
/// Holds the SHA-256 digest of the expected token rather than the token
/// itself. Presented tokens are hashed the same way and compared without
/// early exit.
#[derive(Clone)]
pub struct AdminToken {
    digest: [u8; 32],
}

impl AdminToken {
    /// Creates the capability from the expected token value
    ///
    /// A blank value is rejected so a missing environment variable can
    /// never turn into an open endpoint.
    pub fn new(expected: &str) -> Result<Self, AuthError> {
        let expected = expected.trim();
        if expected.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        Ok(Self {
            digest: hash(expected),
        })
    }

    /// Checks a presented token
    pub fn verify(&self, presented: Option<&str>) -> Result<(), AuthError> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let diff = hash(presented)
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken").finish_non_exhaustive()
    }
}

fn hash(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
