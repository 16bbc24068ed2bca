use std::io;

use thiserror::Error;

/// Failures reported by a [`DocumentStore`](crate::db::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("invalid document key {0:?}")]
    InvalidKey(String),

    #[error("corrupt document {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("failed to encode document: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied(err.to_string()),
            _ => StoreError::Io(err),
        }
    }
}

/// Failures of the comment read-modify-write cycle.
#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error(
        "comments for {subject} kept changing underneath us; gave up after {attempts} attempts"
    )]
    ConcurrentModification { subject: String, attempts: u32 },

    #[error("comment not found: {id}{}", did_you_mean(.suggestion))]
    CommentNotFound {
        id: String,
        suggestion: Option<String>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_deref()
        .map(|s| format!("\nDid you mean: {s}"))
        .unwrap_or_default()
}

/// Why a composer submit did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(&'static str),

    #[error(transparent)]
    Store(#[from] CommentError),
}
