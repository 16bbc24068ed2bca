//! Versioned document storage.
//!
//! A document is addressed by `(collection, key)` and carries a version that
//! every successful write bumps by one. [`DocumentStore::write_if`] only
//! writes when the caller's expected version is still current, which is what
//! lets several writers append to the same document without losing entries.

mod file;
mod memory;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Default cap on an encoded document.
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

/// Atomically write content to a file using a temporary file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp = path.with_extension("toml.tmp");
    let mut file = File::create(&temp)?;
    file.write_all(content)?;
    file.sync_all()?;
    fs::rename(&temp, path)
}

/// A document together with the version it was stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<D> {
    pub version: u64,
    pub document: D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write went through and the document is now at `version`.
    Committed { version: u64 },
    /// Somebody else wrote first; the stored version is `current`.
    Conflict { current: u64 },
}

pub trait DocumentStore {
    /// Read a document. `None` when it has never been written.
    fn read<D: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Versioned<D>>, StoreError>;

    /// Replace a document regardless of what is stored. Returns the new
    /// version. Concurrent read-modify-write cycles built on this lose data;
    /// use [`write_if`](Self::write_if) for those.
    fn write<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        document: &D,
    ) -> Result<u64, StoreError>;

    /// Replace a document only if its stored version equals `expected`
    /// (0 for a document that does not exist yet).
    fn write_if<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        expected: u64,
        document: &D,
    ) -> Result<WriteOutcome, StoreError>;
}

impl<S: DocumentStore> DocumentStore for &S {
    fn read<D: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Versioned<D>>, StoreError> {
        (**self).read(collection, key)
    }

    fn write<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        document: &D,
    ) -> Result<u64, StoreError> {
        (**self).write(collection, key, document)
    }

    fn write_if<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        expected: u64,
        document: &D,
    ) -> Result<WriteOutcome, StoreError> {
        (**self).write_if(collection, key, expected, document)
    }
}

/// Collection names and keys become path components, so keep them tame.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}

/// Encode a document in its on-disk envelope, enforcing the size cap.
fn encode<D: Serialize>(version: u64, document: &D, limit: usize) -> Result<String, StoreError> {
    let encoded = toml::to_string(&Versioned { version, document })
        .map_err(|e| StoreError::Encode(e.to_string()))?;

    if encoded.len() > limit {
        return Err(StoreError::PayloadTooLarge {
            size: encoded.len(),
            limit,
        });
    }
    Ok(encoded)
}

fn decode<D: DeserializeOwned>(key: &str, content: &str) -> Result<Versioned<D>, StoreError> {
    toml::from_str(content).map_err(|e| StoreError::Corrupt {
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    // -- atomic_write --

    // atomic_write should persist exact byte content to disk via
    // tmp-file-then-rename, handling normal text, newlines, and empty content.
    #[rstest]
    #[case::plain_text(b"hello" as &[u8], "hello")]
    #[case::with_newlines(b"line1\nline2", "line1\nline2")]
    #[case::empty(b"", "")]
    fn atomic_write_persists_content(#[case] input: &[u8], #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.toml");
        atomic_write(&path, input).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
    }

    // Writing to the same path twice should replace the content, not append.
    #[rstest]
    fn atomic_write_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.toml");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("toml.tmp").exists());
    }

    // -- validate_key --

    #[rstest]
    #[case::numeric("550")]
    #[case::slug("the-matrix_1999")]
    #[case::dotted("tv.1399")]
    fn valid_keys(#[case] key: &str) {
        assert!(validate_key(key).is_ok());
    }

    #[rstest]
    #[case::empty("")]
    #[case::hidden(".lock")]
    #[case::parent("..")]
    #[case::slash("a/b")]
    #[case::space("a b")]
    fn invalid_keys(#[case] key: &str) {
        assert!(matches!(validate_key(key), Err(StoreError::InvalidKey(_))));
    }

    // -- encode --

    #[test]
    fn encode_rejects_oversized_documents() {
        #[derive(Serialize)]
        struct Doc {
            body: String,
        }
        let doc = Doc {
            body: "x".repeat(64),
        };

        let err = encode(1, &doc, 32).unwrap_err();
        assert!(matches!(err, StoreError::PayloadTooLarge { limit: 32, .. }));
        assert!(encode(1, &doc, 1024).is_ok());
    }

    #[test]
    fn decode_reports_corruption_with_key() {
        let err = decode::<toml::Table>("550", "version = [").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "550"));
    }
}
