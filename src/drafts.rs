//! Unsent comment text kept between CLI invocations, one file per subject.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{atomic_write, validate_key};

pub const DRAFTS_DIR: &str = "drafts";

pub struct Drafts {
    dir: PathBuf,
}

impl Drafts {
    pub fn new(base: &Path) -> Self {
        Self {
            dir: base.join(DRAFTS_DIR),
        }
    }

    fn path(&self, subject: &str) -> Result<PathBuf> {
        validate_key(subject)?;
        Ok(self.dir.join(format!("{subject}.txt")))
    }

    pub fn load(&self, subject: &str) -> Result<Option<String>> {
        let path = self.path(subject)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    pub fn save(&self, subject: &str, text: &str) -> Result<()> {
        let path = self.path(subject)?;
        fs::create_dir_all(&self.dir).context("Failed to create drafts directory")?;
        atomic_write(&path, text.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn clear(&self, subject: &str) -> Result<()> {
        let path = self.path(subject)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_clear() {
        let dir = TempDir::new().unwrap();
        let drafts = Drafts::new(dir.path());

        assert_eq!(drafts.load("550").unwrap(), None);
        drafts.save("550", "half a thought").unwrap();
        assert_eq!(drafts.load("550").unwrap().as_deref(), Some("half a thought"));

        drafts.clear("550").unwrap();
        assert_eq!(drafts.load("550").unwrap(), None);
        // Clearing twice is fine.
        drafts.clear("550").unwrap();
    }

    #[test]
    fn subject_must_be_a_valid_key() {
        let dir = TempDir::new().unwrap();
        assert!(Drafts::new(dir.path()).save("../x", "nope").is_err());
    }
}
