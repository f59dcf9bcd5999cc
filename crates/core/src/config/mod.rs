//! Probe configuration, stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::{RenderOptions, DEFAULT_MAX_STRING_LEN};
use crate::rules::{default_registry, MagicFileRules, RuleRegistry};

/// Error type for loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse config {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Which rule sources to compile and how to render messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicConfig {
    /// Compile the built-in rule groups first.
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
    /// Extra magic files, probed after the built-ins in this order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub magic_files: Vec<PathBuf>,
    /// Cap on bytes read by a single `%s` conversion.
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
}

fn default_include_builtin() -> bool {
    true
}

fn default_max_string_len() -> usize {
    DEFAULT_MAX_STRING_LEN
}

impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            include_builtin: true,
            magic_files: Vec::new(),
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl MagicConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let body = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&body)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions { max_string_len: self.max_string_len }
    }

    /// Registry with the built-ins (if enabled) followed by every magic file.
    pub fn registry(&self) -> RuleRegistry {
        let mut registry =
            if self.include_builtin { default_registry() } else { RuleRegistry::new() };
        for path in &self.magic_files {
            registry.register(MagicFileRules::new(path));
        }
        registry
    }
}
