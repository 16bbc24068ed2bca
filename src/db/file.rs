use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, warn};

use super::{
    DEFAULT_MAX_DOCUMENT_BYTES, DocumentStore, Versioned, WriteOutcome, atomic_write, decode,
    encode, validate_key,
};
use crate::error::StoreError;

/// Documents as TOML files at `<root>/<collection>/<key>.toml`.
///
/// Writers to the same key serialize on an exclusive lock of
/// `<key>.lock`, held across the version check and the rename. Readers take
/// no lock; the rename means they see either the old file or the new one.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    max_document_bytes: usize,
}

impl FileStore {
    /// Open a store rooted at an existing directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "store directory does not exist: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        })
    }

    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_key(collection)?;
        Ok(self.root.join(collection))
    }

    fn document_path(&self, collection: &str, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.collection_dir(collection)?.join(format!("{key}.toml")))
    }

    /// Take the per-key writer lock, creating the collection on first use.
    fn lock(&self, collection: &str, key: &str) -> Result<File, StoreError> {
        let dir = self.collection_dir(collection)?;
        fs::create_dir_all(&dir)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(dir.join(format!("{key}.lock")))?;
        FileExt::lock_exclusive(&lock)?;
        Ok(lock)
    }

    /// Drop the writer lock. Once a write has been renamed into place it is
    /// committed, so an unlock failure is only logged; closing the file
    /// releases the lock anyway.
    fn release(lock: File, collection: &str, key: &str) {
        if let Err(e) = FileExt::unlock(&lock) {
            warn!(collection, key, error = %e, "failed to unlock document");
        }
    }

    fn current_version(&self, path: &Path, key: &str) -> Result<u64, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(decode::<IgnoredAny>(key, &content)?.version),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn commit<D: Serialize>(
        &self,
        path: &Path,
        version: u64,
        document: &D,
    ) -> Result<(), StoreError> {
        let encoded = encode(version, document, self.max_document_bytes)?;
        atomic_write(path, encoded.as_bytes())?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn read<D: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Versioned<D>>, StoreError> {
        let path = self.document_path(collection, key)?;

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(collection, key, "document not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let versioned: Versioned<D> = decode(key, &content)?;
        debug!(collection, key, version = versioned.version, "read document");
        Ok(Some(versioned))
    }

    fn write<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        document: &D,
    ) -> Result<u64, StoreError> {
        let path = self.document_path(collection, key)?;
        let lock = self.lock(collection, key)?;

        let result = self
            .current_version(&path, key)
            .and_then(|current| {
                let version = current + 1;
                self.commit(&path, version, document).map(|()| version)
            });

        Self::release(lock, collection, key);
        let version = result?;

        debug!(collection, key, version, "overwrote document");
        Ok(version)
    }

    fn write_if<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        expected: u64,
        document: &D,
    ) -> Result<WriteOutcome, StoreError> {
        let path = self.document_path(collection, key)?;
        let lock = self.lock(collection, key)?;

        let current = match self.current_version(&path, key) {
            Ok(current) => current,
            Err(e) => {
                Self::release(lock, collection, key);
                return Err(e);
            }
        };

        if current != expected {
            Self::release(lock, collection, key);
            debug!(collection, key, expected, current, "version conflict");
            return Ok(WriteOutcome::Conflict { current });
        }

        let version = expected + 1;
        let result = self.commit(&path, version, document);

        Self::release(lock, collection, key);
        result?;

        debug!(collection, key, version, "committed document");
        Ok(WriteOutcome::Committed { version })
    }
}
