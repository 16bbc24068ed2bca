use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::ActorProfile;
use crate::id::generate_id;

/// Author fields copied from the actor's profile when the comment is written.
/// Later profile edits never reach comments that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub id: String,
    pub display_name: String,
    pub avatar_url: String,
    pub email: String,
}

impl From<&ActorProfile> for AuthorSnapshot {
    fn from(actor: &ActorProfile) -> Self {
        Self {
            id: actor.id.clone(),
            display_name: actor.display_name.clone(),
            avatar_url: actor.avatar_url.clone(),
            email: actor.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Reaction {
    Like,
    Dislike,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// Position in the subject's list, assigned when the append commits.
    /// Zero until then.
    #[serde(default)]
    pub seq: u64,
    pub content: String,
    pub like_count: u64,
    pub dislike_count: u64,
    pub created_at: Timestamp,
    pub author: AuthorSnapshot,
}

impl Comment {
    pub fn new(actor: &ActorProfile, content: String, created_at: Timestamp) -> Self {
        Self {
            id: generate_id(),
            seq: 0,
            content,
            like_count: 0,
            dislike_count: 0,
            created_at,
            author: AuthorSnapshot::from(actor),
        }
    }

    pub fn react(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::Like => self.like_count += 1,
            Reaction::Dislike => self.dislike_count += 1,
        }
    }
}
