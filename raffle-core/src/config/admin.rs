//! Admin configuration.

use argon2::password_hash::{self, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Admin configuration with hashed secret.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// The argon2 hashed admin secret.
    pub secret_hash: String,
}

impl AdminConfig {
    pub fn new(secret_hash: String) -> Self {
        Self { secret_hash }
    }

    /// Build a config from a plaintext secret, hashing it with a fresh salt.
    pub fn from_plaintext(secret: &str) -> Result<Self, password_hash::Error> {
        hash_secret(secret).map(Self::new)
    }

    /// Verify a plaintext password against the stored hash.
    ///
    /// An unparsable hash never verifies.
    pub fn verify_secret(&self, plaintext: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.secret_hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash `secret` into a PHC string (`$argon2id$...`).
pub fn hash_secret(secret: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(secret.as_bytes(), &salt)?
        .to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_secret() {
        let admin_config = AdminConfig::from_plaintext("spin-the-wheel").unwrap();

        assert!(admin_config.secret_hash.starts_with("$argon2"));
        assert!(admin_config.verify_secret("spin-the-wheel"));
        assert!(!admin_config.verify_secret("spin-the-whee1"));
        assert!(!admin_config.verify_secret(""));
    }

    #[test]
    fn test_unparsable_hash_never_verifies() {
        let admin_config = AdminConfig::new("not-a-hash".to_string());
        assert!(!admin_config.verify_secret("not-a-hash"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_secret("same").unwrap();
        let b = hash_secret("same").unwrap();
        assert_ne!(a, b);
    }
}
