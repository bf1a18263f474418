//! Configuration module for raffle-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;

use crate::config::file::FileConfig;
use raffle_core::config::{AdminConfig, RaffleConfig, ServerConfig, SharedConfig, hash_secret};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted recent winners window.
pub const MAX_RECENT_WINNERS: usize = 100;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub raffle: RaffleConfig,
}

impl LoadedConfig {
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.admin, self.raffle)
    }
}

/// Values given on the command line or in the environment that take
/// precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen: Option<SocketAddr>,
    /// Plaintext admin secret. Hashed in memory, never written to disk.
    pub admin_secret: Option<String>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    overrides: Overrides,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, overrides: Overrides) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            overrides,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.overrides.listen {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        let secret_hash = if let Some(secret) = &self.overrides.admin_secret {
            hash(secret)?
        } else if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = hash(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if self.overrides.admin_secret.is_none() && config.admin.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin secret is empty; set [admin].secret or RAFFLE_ADMIN_SECRET".to_string(),
            ));
        }

        let recent = config.raffle.recent_winners;
        if !(1..=MAX_RECENT_WINNERS).contains(&recent) {
            return Err(ConfigError::ValidationError(format!(
                "raffle.recent_winners must be between 1 and {MAX_RECENT_WINNERS}, got {recent}"
            )));
        }

        check_unique(
            "participant",
            config.participants.iter().map(|p| (p.id.0, p.name.as_str())),
        )?;
        check_unique(
            "prize",
            config.prizes.iter().map(|p| (p.id.0, p.name.as_str())),
        )?;
        Ok(())
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn hash(plaintext: &str) -> Result<String, ConfigError> {
    hash_secret(plaintext).map_err(|e| ConfigError::HashError(e.to_string()))
}

/// Ids must be positive and unique, names non-blank.
fn check_unique<'a>(
    kind: &str,
    entries: impl Iterator<Item = (i64, &'a str)>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (id, name) in entries {
        if id <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "{kind} id must be positive, got {id}"
            )));
        }
        if !seen.insert(id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate {kind} id {id}"
            )));
        }
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{kind} {id} has an empty name"
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
            allowed_origins: file_config.server.allowed_origins,
        },
        admin: AdminConfig::new(secret_hash),
        raffle: RaffleConfig {
            recent_winners: file_config.raffle.recent_winners,
            storage: file_config.raffle.storage,
            participants: file_config.participants,
            prizes: file_config.prizes,
        },
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOLS: &str = r#"
[[participants]]
id = 1
name = "Elena"
email = "elena@example.com"

[[prizes]]
id = 1
name = "Scarf"
description = "Embroidered"
"#;

    fn write_config(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("raffle-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.toml"));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_plaintext_secret_is_hashed_and_rewritten() {
        let path = write_config("rewrite", &format!("[admin]\nsecret = \"hunter2\"\n{POOLS}"));
        let loaded = ConfigLoader::new(&path, Overrides::default()).load().unwrap();

        assert!(loaded.admin.verify_secret("hunter2"));
        assert_eq!(loaded.raffle.participants.len(), 1);

        let rewritten: FileConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(rewritten.is_admin_secret_hashed());
        assert_eq!(rewritten.participants, loaded.raffle.participants);

        // A second load keeps the stored hash.
        let again = ConfigLoader::new(&path, Overrides::default()).load().unwrap();
        assert_eq!(again.admin.secret_hash, rewritten.admin.secret);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let content = "[admin]\nsecret = \"$argon2id$v=19$m=19456,t=2,p=1$abc$def\"\n";
        let path = write_config("overrides", content);
        let overrides = Overrides {
            listen: Some("127.0.0.1:9999".parse().unwrap()),
            admin_secret: Some("from-env".to_string()),
        };
        let loaded = ConfigLoader::new(&path, overrides).load().unwrap();

        assert_eq!(loaded.server.listen.port(), 9999);
        assert!(loaded.admin.verify_secret("from-env"));
        // The file is left untouched.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_validation_errors() {
        let cases = [
            ("empty_secret", "[admin]\nsecret = \"\"\n".to_string()),
            (
                "recent_zero",
                "[admin]\nsecret = \"x\"\n[raffle]\nrecent_winners = 0\n".to_string(),
            ),
            (
                "recent_large",
                "[admin]\nsecret = \"x\"\n[raffle]\nrecent_winners = 101\n".to_string(),
            ),
            (
                "duplicate_prize",
                format!(
                    "[admin]\nsecret = \"x\"\n{POOLS}\n[[prizes]]\nid = 1\nname = \"Again\"\ndescription = \"\"\n"
                ),
            ),
            (
                "negative_id",
                "[admin]\nsecret = \"x\"\n[[participants]]\nid = -1\nname = \"N\"\nemail = \"\"\n"
                    .to_string(),
            ),
            (
                "blank_name",
                "[admin]\nsecret = \"x\"\n[[prizes]]\nid = 2\nname = \" \"\ndescription = \"\"\n"
                    .to_string(),
            ),
        ];

        for (name, content) in cases {
            let path = write_config(name, &content);
            let result = ConfigLoader::new(&path, Overrides::default()).load();
            assert!(
                matches!(result, Err(ConfigError::ValidationError(_))),
                "{name} should fail validation"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new("/nonexistent/raffle.toml", Overrides::default()).load();
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
