//! Collaborator backend configuration
//!
//! Loaded from an optional YAML file. Every section may be omitted:
//!
//! ```yaml
//! compute:
//!   type: http
//!   base_url: "http://compute.internal:8080"
//!   timeout: 10000
//!
//! ledger:
//!   type: file
//!   dir: ".compute-toggle"
//!
//! notifier:
//!   type: webhook
//!   base_url: "http://hooks.internal"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{ConfigError, Settings};
use crate::bridge::{
    ExecutionLedger, FileLedger, HttpCompute, HttpLedger, LogChannel, MemoryLedger,
    NotificationChannel, WebhookChannel,
};
use crate::engine::Services;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComputeConfig {
    Http {
        #[serde(default = "default_compute_url")]
        base_url: String,
        /// Request timeout in milliseconds
        #[serde(default = "default_http_timeout")]
        timeout: u64,
    },
}

impl Default for ComputeConfig {
    fn default() -> Self {
        ComputeConfig::Http {
            base_url: default_compute_url(),
            timeout: default_http_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LedgerConfig {
    Memory,
    File {
        #[serde(default = "default_ledger_dir")]
        dir: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default = "default_http_timeout")]
        timeout: u64,
    },
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig::File {
            dir: default_ledger_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifierConfig {
    #[default]
    Log,
    Webhook {
        base_url: String,
        #[serde(default = "default_http_timeout")]
        timeout: u64,
    },
}

fn default_compute_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from(".compute-toggle")
}

fn default_http_timeout() -> u64 {
    10_000
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default)]
    pub compute: ComputeConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl ServicesConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The file ledger this configuration writes to, if it uses one
    pub fn file_ledger(&self, settings: &Settings) -> Option<FileLedger> {
        match &self.ledger {
            LedgerConfig::File { dir } => Some(FileLedger::new(dir, &settings.ledger_table)),
            _ => None,
        }
    }

    /// Construct every collaborator handle once
    pub fn build(&self, settings: &Settings) -> Result<Services, ConfigError> {
        let compute = match &self.compute {
            ComputeConfig::Http { base_url, timeout } => {
                info!("Initializing compute bridge (base_url: {})", base_url);
                Arc::new(HttpCompute::new(base_url, *timeout).map_err(|e| {
                    ConfigError::Backend {
                        service: "compute",
                        message: e.message,
                    }
                })?)
            }
        };

        let ledger: Arc<dyn ExecutionLedger> = match &self.ledger {
            LedgerConfig::Memory => {
                info!("Initializing in-memory ledger");
                Arc::new(MemoryLedger::new())
            }
            LedgerConfig::File { dir } => {
                let ledger = FileLedger::new(dir, &settings.ledger_table);
                info!("Initializing file ledger ({})", ledger.path().display());
                Arc::new(ledger)
            }
            LedgerConfig::Http { base_url, timeout } => {
                info!("Initializing HTTP ledger (base_url: {})", base_url);
                Arc::new(
                    HttpLedger::new(base_url, &settings.ledger_table, *timeout).map_err(|e| {
                        ConfigError::Backend {
                            service: "ledger",
                            message: e.to_string(),
                        }
                    })?,
                )
            }
        };

        let channel: Arc<dyn NotificationChannel> = match &self.notifier {
            NotifierConfig::Log => Arc::new(LogChannel::new(&settings.notify_channel)),
            NotifierConfig::Webhook { base_url, timeout } => {
                info!("Initializing webhook notifier (base_url: {})", base_url);
                Arc::new(
                    WebhookChannel::new(base_url, &settings.notify_channel, *timeout).map_err(
                        |e| ConfigError::Backend {
                            service: "notifier",
                            message: e.to_string(),
                        },
                    )?,
                )
            }
        };

        Ok(Services {
            inventory: compute.clone(),
            control: compute,
            ledger,
            channel,
        })
    }
}
