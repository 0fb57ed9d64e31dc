//! Process configuration
//!
//! - `settings` - required environment, resolved once at start
//! - `services` - optional YAML file selecting collaborator backends

pub mod services;
pub mod settings;

pub use services::{ComputeConfig, LedgerConfig, NotifierConfig, ServicesConfig};
pub use settings::Settings;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid environment variable {0}: {1}")]
    Invalid(&'static str, &'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },

    #[error("failed to initialize {service} backend: {message}")]
    Backend {
        service: &'static str,
        message: String,
    },
}
