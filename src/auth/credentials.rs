use std::sync::Arc;

use crate::error::AppResult;

/// Password hashing capability used by signup and login.
pub trait CredentialService: Send + Sync {
    /// Produce a salted digest for storage
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Check a plaintext password against a stored digest.
    /// A malformed digest verifies as `false` rather than erroring.
    fn verify(&self, password: &str, digest: &str) -> bool;
}

pub type DynCredentialService = Arc<dyn CredentialService>;

/// bcrypt-backed credentials
#[derive(Debug, Clone)]
pub struct BcryptCredentials {
    cost: u32,
}

impl BcryptCredentials {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptCredentials {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialService for BcryptCredentials {
    fn hash(&self, password: &str) -> AppResult<String> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        // constant-time via bcrypt
        bcrypt::verify(password, digest).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> BcryptCredentials {
        BcryptCredentials::new(4)
    }

    #[test]
    fn digest_verifies_but_differs_from_password() {
        let creds = fast();
        let digest = creds.hash("hunter22").unwrap();
        assert_ne!(digest, "hunter22");
        assert!(creds.verify("hunter22", &digest));
        assert!(!creds.verify("hunter23", &digest));
    }

    #[test]
    fn same_password_hashes_differently() {
        let creds = fast();
        let a = creds.hash("samepass").unwrap();
        let b = creds.hash("samepass").unwrap();
        // Different salts, both verify
        assert_ne!(a, b);
        assert!(creds.verify("samepass", &a));
        assert!(creds.verify("samepass", &b));
    }

    #[test]
    fn malformed_digest_does_not_verify() {
        assert!(!fast().verify("whatever", "not-a-bcrypt-digest"));
    }

    #[test]
    fn invalid_cost_is_an_error() {
        assert!(BcryptCredentials::new(2).hash("password").is_err());
    }
}
