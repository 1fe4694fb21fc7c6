//! Configuration management for Uddokta.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults, then overlaid with the environment variables the hosted
//! deployment has always used (`PORT`, `HF_MODEL`, ...).

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Uddokta.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Provider call limits
    pub limits: LimitsConfig,

    /// Retry settings
    pub retry: RetryConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Text provider settings
    pub llm: LlmConfig,

    /// Image provider settings
    pub image: ImageConfig,
}

impl Config {
    /// Load configuration from the default location, then apply environment
    /// overrides.
    ///
    /// Starts from defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay values from environment-style variables.
    ///
    /// `lookup` abstracts `std::env::var` so tests don't touch process state.
    /// API keys are not listed here: they resolve through `${VAR}` references.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{port}'"),
            }
        }
        if let Some(model) = lookup("GEMINI_TEXT_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.gemini.get_or_insert_with(Default::default).model = model.trim().to_string();
        }

        let hf = &mut self.image.huggingface;
        if let Some(model) = lookup("HF_MODEL").filter(|m| !m.trim().is_empty()) {
            hf.model = model.trim().to_string();
        }
        if let Some(provider) = lookup("HF_PROVIDER") {
            hf.provider = provider.trim().to_string();
        }
        if let Some(fallbacks) = lookup("HF_MODEL_FALLBACKS") {
            hf.fallbacks = parse_model_list(&fallbacks);
        }
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/ai.uddokta.uddokta/config.toml
    /// - Linux: ~/.config/uddokta/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\uddokta\uddokta\config\config.toml
    ///
    /// Falls back to ~/.uddokta/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("ai", "uddokta", "uddokta")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".uddokta").join("config.toml")
            })
    }

    /// Get the resolved static file directory (with ~ expansion), if any.
    pub fn static_dir(&self) -> Option<PathBuf> {
        self.server.static_dir.as_ref().map(|dir| {
            let path_str = dir.to_string_lossy();
            let expanded = shellexpand::tilde(&path_str);
            PathBuf::from(expanded.into_owned())
        })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
