use serde::{Deserialize, Serialize};

use super::Comment;

/// The persisted value of one subject's document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDocument {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A subject's comments as of a particular document version.
///
/// Version 0 means the document has never been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentList {
    pub subject: String,
    pub version: u64,
    pub comments: Vec<Comment>,
}

impl CommentList {
    pub fn empty(subject: &str) -> Self {
        Self {
            subject: subject.to_owned(),
            version: 0,
            comments: Vec::new(),
        }
    }

    pub fn from_document(subject: &str, version: u64, document: CommentDocument) -> Self {
        Self {
            subject: subject.to_owned(),
            version,
            comments: document.comments,
        }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn last(&self) -> Option<&Comment> {
        self.comments.last()
    }

    pub fn find(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.comments.iter().map(|c| c.id.as_str()).collect()
    }

    /// The document that results from appending `comment` to this list.
    /// The comment takes the next sequence number.
    pub fn appended(&self, mut comment: Comment) -> CommentDocument {
        let mut comments = self.comments.clone();
        comment.seq = comments.len() as u64 + 1;
        comments.push(comment);
        CommentDocument { comments }
    }

    pub fn to_document(&self) -> CommentDocument {
        CommentDocument {
            comments: self.comments.clone(),
        }
    }
}
