use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{DEFAULT_MAX_DOCUMENT_BYTES, atomic_write};

pub const CONFIG_FILE: &str = "config.toml";

/// Store-level settings read from `config.toml` in the store directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How many times an append is tried against fresh state before it
    /// gives up with a conflict.
    pub max_append_attempts: u32,
    /// Largest encoded comment document accepted by the store.
    pub max_document_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_append_attempts: 5,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl Config {
    pub fn file_path(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(base: &Path) -> Result<Self> {
        let path = Self::file_path(base);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        self.validate()?;
        let path = Self::file_path(base);
        let content = toml::to_string(self).context("Failed to serialize config")?;
        atomic_write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        if self.max_append_attempts == 0 {
            bail!("max_append_attempts must be at least 1");
        }
        if self.max_document_bytes == 0 {
            bail!("max_document_bytes must be at least 1");
        }
        Ok(())
    }
}
