use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{
    DEFAULT_MAX_DOCUMENT_BYTES, DocumentStore, Versioned, WriteOutcome, decode, encode,
    validate_key,
};
use crate::error::StoreError;

/// Process-local store. Documents are kept encoded so reads and writes go
/// through the same codec and size cap as [`FileStore`](super::FileStore).
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    max_document_bytes: usize,
}

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<(String, String), (u64, String)>,
    writes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    /// Number of writes that reached the store, committed or not.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }
}

impl DocumentStore for MemoryStore {
    fn read<D: DeserializeOwned>(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Versioned<D>>, StoreError> {
        validate_key(collection)?;
        validate_key(key)?;

        let inner = self.inner.lock();
        inner
            .documents
            .get(&(collection.to_owned(), key.to_owned()))
            .map(|(_, encoded)| decode(key, encoded))
            .transpose()
    }

    fn write<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        document: &D,
    ) -> Result<u64, StoreError> {
        validate_key(collection)?;
        validate_key(key)?;

        let mut inner = self.inner.lock();
        inner.writes += 1;

        let slot = (collection.to_owned(), key.to_owned());
        let version = inner.documents.get(&slot).map_or(0, |(v, _)| *v) + 1;
        let encoded = encode(version, document, self.max_document_bytes)?;
        inner.documents.insert(slot, (version, encoded));
        Ok(version)
    }

    fn write_if<D: Serialize>(
        &self,
        collection: &str,
        key: &str,
        expected: u64,
        document: &D,
    ) -> Result<WriteOutcome, StoreError> {
        validate_key(collection)?;
        validate_key(key)?;

        let mut inner = self.inner.lock();
        inner.writes += 1;

        let slot = (collection.to_owned(), key.to_owned());
        let current = inner.documents.get(&slot).map_or(0, |(v, _)| *v);
        if current != expected {
            return Ok(WriteOutcome::Conflict { current });
        }

        let version = expected + 1;
        let encoded = encode(version, document, self.max_document_bytes)?;
        inner.documents.insert(slot, (version, encoded));
        Ok(WriteOutcome::Committed { version })
    }
}
