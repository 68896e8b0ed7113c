pub mod cli;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod job;
pub mod logging;
pub mod reload;
pub mod runner;
pub mod webhook;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::error::{HookError, Result};
use crate::runner::CommandRunner;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Contents of the JSON config file.
///
/// Keys are PascalCase (`Address`, `Port`, `Repositories`); lowercase
/// spellings are accepted too. Missing keys take their zero value.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct HookConfig {
    #[serde(alias = "address")]
    pub address: String,
    #[serde(alias = "port")]
    pub port: u16,
    #[serde(alias = "repositories")]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default, rename_all = "PascalCase")]
pub struct RepositoryConfig {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "commands")]
    pub commands: Vec<String>,
}

impl HookConfig {
    /// `host:port` to bind. An empty host listens on every interface.
    pub fn bind_address(&self) -> String {
        let host = if self.address.is_empty() {
            "0.0.0.0"
        } else {
            self.address.as_str()
        };
        format!("{}:{}", host, self.port)
    }
}

/// Read the whole config file and decode it.
pub async fn load_config(path: impl AsRef<Path>) -> Result<HookConfig> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| HookError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_slice(&bytes).map_err(|source| HookError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

pub struct AppState {
    config: RwLock<Arc<HookConfig>>,
    pub config_path: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(config: HookConfig, config_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            config_path,
            runner,
        }
    }

    /// Snapshot of the active configuration. The lock is held only while
    /// cloning the `Arc`, so a reload never blocks behind running commands.
    pub fn current_config(&self) -> Arc<HookConfig> {
        let guard = self.config.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new configuration wholesale, returning the previous one.
    pub fn replace_config(&self, config: HookConfig) -> Arc<HookConfig> {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(config))
    }

    /// Re-read `config_path` and replace the active configuration.
    ///
    /// On error the active configuration is left untouched.
    pub async fn reload(&self) -> Result<()> {
        let new_config = load_config(&self.config_path).await?;
        let new_address = new_config.bind_address();
        let previous = self.replace_config(new_config);

        if previous.bind_address() != new_address {
            warn!(
                "Listen address changed from {} to {}; restart to apply it",
                previous.bind_address(),
                new_address
            );
        }
        info!("config reloaded from {:?}", self.config_path);
        Ok(())
    }
}

pub type SharedState = Arc<AppState>;
