//! Configuration for the validation engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (validation.toml)
//! - Environment variables (VALIDATION__*)
//!
//! ## Example config file (validation.toml):
//! ```toml
//! [messages]
//! string = "Please enter text"
//! number = "Please enter a number"
//! generic = "Something is wrong with this form"
//!
//! [loader]
//! models_dir = "./models"
//!
//! [logging]
//! filter = "familiar_validation=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::schema::messages;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Message overrides
    #[serde(default)]
    pub messages: MessageConfig,

    /// Model loading
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Logging defaults for binaries
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Overrides for the messages reported by atomic type checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default)]
    pub string: Option<String>,

    #[serde(default)]
    pub number: Option<String>,

    #[serde(default)]
    pub boolean: Option<String>,

    /// Message for enum fields whose value is not one of the allowed values
    #[serde(default)]
    pub enumeration: Option<String>,

    /// Reported when validation aborts for a reason other than invalid input
    #[serde(default = "default_generic_message")]
    pub generic: String,
}

/// Where models are loaded from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory scanned when no model path is given
    #[serde(default)]
    pub models_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_generic_message() -> String {
    messages::GENERIC.to_string()
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            string: None,
            number: None,
            boolean: None,
            enumeration: None,
            generic: default_generic_message(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` layered over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "validation.toml",
            ".validation.toml",
            "config/validation.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "validation") {
            let xdg_config = config_dir.config_dir().join("validation.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("VALIDATION")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Models directory, resolved against the current directory
    pub fn models_dir(&self) -> Option<PathBuf> {
        self.loader.models_dir.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
