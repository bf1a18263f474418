//! Admin session gate.
//!
//! Logging in with the admin secret yields an opaque bearer token. Only one
//! token is active at a time: a new login replaces the previous one. The
//! token itself is never stored, only its HMAC tag under a per-process key,
//! so validation is a constant-time tag comparison.

use crate::config::AdminConfig;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Random bytes per token.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("invalid admin secret")]
    InvalidSecret,

    #[error("failed to generate session token")]
    Rng,
}

pub struct AdminSession {
    key: hmac::Key,
    rng: SystemRandom,
    active: RwLock<Option<hmac::Tag>>,
}

impl AdminSession {
    pub fn new() -> Result<Self, ring::error::Unspecified> {
        let rng = SystemRandom::new();
        let key = hmac::Key::generate(hmac::HMAC_SHA256, &rng)?;
        Ok(Self {
            key,
            rng,
            active: RwLock::new(None),
        })
    }

    /// Exchange the admin secret for a fresh token.
    ///
    /// Invalidates any previously issued token.
    pub async fn login(&self, admin: &AdminConfig, password: &str) -> Result<String, LoginError> {
        if !admin.verify_secret(password) {
            warn!("Rejected admin login");
            return Err(LoginError::InvalidSecret);
        }

        let mut raw = [0u8; TOKEN_BYTES];
        self.rng.fill(&mut raw).map_err(|_| LoginError::Rng)?;
        let token = fast32::base64::RFC4648_NOPAD.encode(&raw);

        let tag = hmac::sign(&self.key, token.as_bytes());
        *self.active.write().await = Some(tag);
        info!("Admin session started");
        Ok(token)
    }

    /// Whether `token` is the currently active one.
    pub async fn validate(&self, token: &str) -> bool {
        match self.active.read().await.as_ref() {
            Some(tag) => hmac::verify(&self.key, token.as_bytes(), tag.as_ref()).is_ok(),
            None => false,
        }
    }

    /// Drop the active token, if any.
    pub async fn revoke(&self) {
        if self.active.write().await.take().is_some() {
            info!("Admin session revoked");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin() -> AdminConfig {
        AdminConfig::from_plaintext("letmein").unwrap()
    }

    #[tokio::test]
    async fn test_login_issues_valid_token() {
        let session = AdminSession::new().unwrap();
        let token = session.login(&admin(), "letmein").await.unwrap();

        assert!(!token.is_empty());
        assert!(session.validate(&token).await);
        assert!(!session.validate("forged").await);
        assert!(!session.validate("").await);
    }

    #[tokio::test]
    async fn test_wrong_secret_keeps_current_token() {
        let session = AdminSession::new().unwrap();
        let admin = admin();
        let token = session.login(&admin, "letmein").await.unwrap();

        let err = session.login(&admin, "guess").await.unwrap_err();
        assert!(matches!(err, LoginError::InvalidSecret));
        assert!(session.validate(&token).await);
    }

    #[tokio::test]
    async fn test_new_login_replaces_token() {
        let session = AdminSession::new().unwrap();
        let admin = admin();
        let first = session.login(&admin, "letmein").await.unwrap();
        let second = session.login(&admin, "letmein").await.unwrap();

        assert_ne!(first, second);
        assert!(!session.validate(&first).await);
        assert!(session.validate(&second).await);
    }

    #[tokio::test]
    async fn test_revoke() {
        let session = AdminSession::new().unwrap();
        assert!(!session.validate("anything").await);

        let token = session.login(&admin(), "letmein").await.unwrap();
        session.revoke().await;
        assert!(!session.validate(&token).await);
    }
}
