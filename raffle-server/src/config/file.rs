//! TOML file configuration structures.
//!
//! These structs directly map to the `raffle-config.toml` file format.

use raffle_core::config::StorageBackend;
use raffle_core::coordinator::DEFAULT_RECENT_WINNERS;
use raffle_sdk::objects::{Participant, Prize};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub raffle: RaffleConfig,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub prizes: Vec<Prize>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Origins allowed by CORS. Leave empty to allow any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    #[serde(default)]
    pub secret: String,
}

/// Raffle section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleConfig {
    /// Number of recent winners included in every state snapshot.
    #[serde(default = "default_recent_winners")]
    pub recent_winners: usize,
    /// `memory` or `postgres`.
    #[serde(default)]
    pub storage: StorageBackend,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            recent_winners: default_recent_winners(),
            storage: StorageBackend::default(),
        }
    }
}

fn default_recent_winners() -> usize {
    DEFAULT_RECENT_WINNERS
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        self.admin.secret.starts_with("$argon2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"
allowed_origins = ["https://wheel.example.com"]

[admin]
secret = "test-secret"

[raffle]
recent_winners = 3
storage = "postgres"

[[participants]]
id = 1
name = "Elena"
email = "elena@example.com"

[[participants]]
id = 2
name = "Carlos"
email = "carlos@example.com"

[[prizes]]
id = 1
name = "Surprise Box"
description = "Wrapped in red"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.server.allowed_origins.len(), 1);
        assert_eq!(config.raffle.recent_winners, 3);
        assert_eq!(config.raffle.storage, StorageBackend::Postgres);
        assert_eq!(config.participants.len(), 2);
        assert_eq!(config.prizes[0].name, "Surprise Box");
        assert!(!config.is_admin_secret_hashed());
    }

    #[test]
    fn test_defaults() {
        let config: FileConfig = toml::from_str("[admin]\nsecret = \"x\"\n").unwrap();
        assert_eq!(config.server.listen, default_listen_addr());
        assert_eq!(config.raffle.recent_winners, DEFAULT_RECENT_WINNERS);
        assert_eq!(config.raffle.storage, StorageBackend::Memory);
        assert!(config.participants.is_empty());
    }

    #[test]
    fn test_hashed_secret_detection() {
        let config = FileConfig {
            admin: AdminConfig {
                secret: "$argon2id$v=19$m=19456,t=2,p=1$abc123".to_string(),
            },
            ..FileConfig::default()
        };
        assert!(config.is_admin_secret_hashed());
    }

    #[test]
    fn test_unknown_storage_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("[raffle]\nstorage = \"redis\"\n");
        assert!(result.is_err());
    }
}
