// CircInspect - Quantum Circuit Debugger
// Copyright (C) 2025 UBC Quantum Software and Algorithms Research Lab
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration and stored credentials
//!
//! User preferences live in `~/.circinspect.toml`. The login token is kept
//! in a separate file so the config can be checked in or shared without
//! leaking credentials.

use std::fs;
use std::path::PathBuf;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend URL.
    pub server_url: String,
    /// Email used for login links and bug reports.
    pub user_email: Option<String>,
    /// Whether the user accepted the data-collection policy.
    pub policy_accepted: bool,
    /// Milliseconds between a significant edit and its evaluation.
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            user_email: None,
            policy_accepted: false,
            debounce_ms: 1000,
        }
    }
}

impl Config {
    /// Get the config file path (`~/.circinspect.toml`).
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("unable to determine home directory"))?;
        Ok(home.join(".circinspect.toml"))
    }

    /// Load configuration from file, creating the default if it does not
    /// exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!("config file not found, creating default at {config_path:?}");
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {config_path:?}"))?;
        let config =
            toml::from_str(&content).with_context(|| "failed to parse config file as TOML")?;
        debug!("loaded configuration from {config_path:?}");
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        let content =
            toml::to_string_pretty(self).with_context(|| "failed to serialize config to TOML")?;
        fs::write(&config_path, content)
            .with_context(|| format!("failed to write config file: {config_path:?}"))?;
        debug!("saved configuration to {config_path:?}");
        Ok(())
    }
}

/// Path of the stored login token (`~/.circinspect-token`).
pub fn token_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| eyre::eyre!("unable to determine home directory"))?;
    Ok(home.join(".circinspect-token"))
}

/// Read the stored token, if any.
pub fn load_token() -> Option<String> {
    let path = token_path().ok()?;
    match fs::read_to_string(&path) {
        Ok(token) => {
            let token = token.trim().to_string();
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        }
        Err(_) => None,
    }
}

/// Persist a verified token for later sessions.
pub fn store_token(token: &str) -> Result<()> {
    let path = token_path()?;
    fs::write(&path, token).with_context(|| format!("failed to write token file: {path:?}"))?;
    debug!("stored token at {path:?}");
    Ok(())
}

/// Remove the stored token. Called when the backend rejects it.
pub fn clear_token() {
    if let Ok(path) = token_path() {
        if path.exists() {
            if let Err(err) = fs::remove_file(&path) {
                warn!(?path, %err, "failed to remove stale token file");
            } else {
                info!("cleared stored token");
            }
        }
    }
}
