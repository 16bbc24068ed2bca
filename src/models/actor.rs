use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::db::atomic_write;

pub const PROFILE_FILE: &str = "profile.toml";

/// The signed-in actor. Passed explicitly to every write so nothing reads
/// ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    pub email: String,
}

impl ActorProfile {
    pub fn file_path(base: &Path) -> PathBuf {
        base.join(PROFILE_FILE)
    }

    /// Load the stored profile, or `None` when nobody has signed in yet.
    pub fn load(base: &Path) -> Result<Option<Self>> {
        let path = Self::file_path(base);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let profile: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(profile))
    }

    pub fn write_file(&self, base: &Path) -> Result<()> {
        if self.display_name.trim().is_empty() {
            bail!("Display name must not be empty");
        }
        if !self.email.contains('@') {
            bail!("Invalid email address: {}", self.email);
        }

        let path = Self::file_path(base);
        let content = toml::to_string(self).context("Failed to serialize profile")?;
        atomic_write(&path, content.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
