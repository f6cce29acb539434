//! Client configuration: server address and local identity.
//!
//! Stored as TOML under the platform config directory so `profile` runs
//! once and later commands pick the identity up.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default server when neither the config nor `--server` provides one.
pub const DEFAULT_SERVER: &str = "http://localhost:5000";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat server base URL.
    pub server_url: Option<String>,
    /// Local user id, as registered via the profile endpoint.
    pub user_id: Option<String>,
    /// Display name shown to other room members.
    pub username: Option<String>,
    /// Avatar as a data URL, if one was uploaded with the profile.
    pub avatar: Option<String>,
}

impl Config {
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "parley-cli", "parley-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Effective server URL: CLI override, then config, then default.
    pub fn server_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(String::from)
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string())
    }

    /// The saved identity, or an error telling the user what to run first.
    pub fn identity(&self) -> Result<(String, String)> {
        let user_id = self
            .user_id
            .clone()
            .context("No user id saved. Run 'parley-cli profile' first.")?;
        let username = self.username.clone().unwrap_or_else(|| user_id.clone());
        Ok((user_id, username))
    }
}
