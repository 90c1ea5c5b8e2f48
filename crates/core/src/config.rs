//! Configuration management
//!
//! Optional convenience layer: named profiles (token plus endpoint overrides)
//! stored as TOML at `~/.config/dropvault/config.toml`. Nothing in the client
//! requires it; a token can always be passed directly at construction.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// A named set of credentials for a remote store account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    /// Opaque bearer token for the account
    pub token: String,

    /// Override for the RPC endpoint base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,

    /// Override for the content-transfer endpoint base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_endpoint: Option<String>,
}

impl Profile {
    /// Create a profile with the default endpoints
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
            api_endpoint: None,
            content_endpoint: None,
        }
    }
}

/// On-disk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Configured profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            profiles: Vec::new(),
        }
    }
}

/// Loads and saves the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager over the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".into()))?;
        Ok(Self {
            config_path: config_dir.join("dropvault").join("config.toml"),
        })
    }

    /// Manager over a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// The configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the configuration, defaulting when the file does not exist
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "configuration version {} is newer than supported version {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save the configuration, creating parent directories as needed.
    ///
    /// The file holds credentials, so permissions are restricted to the
    /// owner on Unix systems.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Get a profile by name
    pub fn profile(&self, name: &str) -> Result<Profile> {
        self.load()?
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::Config(format!("profile not found: {name}")))
    }

    /// Add or replace a profile
    pub fn set_profile(&self, profile: Profile) -> Result<()> {
        let mut config = self.load()?;
        config.profiles.retain(|p| p.name != profile.name);
        config.profiles.push(profile);
        self.save(&config)
    }

    /// Remove a profile
    pub fn remove_profile(&self, name: &str) -> Result<()> {
        let mut config = self.load()?;
        let before = config.profiles.len();
        config.profiles.retain(|p| p.name != name);
        if config.profiles.len() == before {
            return Err(Error::Config(format!("profile not found: {name}")));
        }
        self.save(&config)
    }
}
