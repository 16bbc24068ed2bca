//! The comment read-modify-write cycle.
//!
//! Every write names the document version it was computed from. When
//! another writer got there first the store reports a conflict, the list is
//! read again and the change is reapplied on top. An append never replaces
//! a list that already holds someone else's newer comment.

use std::borrow::Cow;

use tracing::{info, warn};

use crate::db::{DocumentStore, WriteOutcome};
use crate::error::{CommentError, StoreError};
use crate::helpers::find_similar_id;
use crate::models::{Comment, CommentDocument, CommentList, Reaction};

pub const COMMENTS_COLLECTION: &str = "comments";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

pub struct CommentStore<S> {
    store: S,
    max_attempts: u32,
}

impl<S: DocumentStore> CommentStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Cap on write attempts per operation. At least one attempt is always made.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current comments for `subject`; an empty list at version 0 if nobody
    /// has commented yet.
    pub fn fetch(&self, subject: &str) -> Result<CommentList, StoreError> {
        let list = match self
            .store
            .read::<CommentDocument>(COMMENTS_COLLECTION, subject)?
        {
            Some(versioned) => {
                CommentList::from_document(subject, versioned.version, versioned.document)
            }
            None => CommentList::empty(subject),
        };
        Ok(list)
    }

    /// Append `comment` to `current` and persist the result.
    ///
    /// `current` is what the caller last saw. If the stored list has moved on
    /// since, the comment is appended to the fresh list instead. Returns the
    /// list as committed.
    pub fn append_and_persist(
        &self,
        current: &CommentList,
        comment: Comment,
    ) -> Result<CommentList, CommentError> {
        let committed = self.commit_with(Cow::Borrowed(current), |list| {
            Ok(list.appended(comment.clone()))
        })?;

        info!(
            subject = %committed.subject,
            version = committed.version,
            comment_id = %comment.id,
            count = committed.len(),
            "appended comment"
        );
        Ok(committed)
    }

    /// Add a like or dislike to an existing comment. Returns the comment
    /// with its updated counters.
    pub fn react(
        &self,
        subject: &str,
        comment_id: &str,
        reaction: Reaction,
    ) -> Result<Comment, CommentError> {
        let start = self.fetch(subject)?;
        let committed = self.commit_with(Cow::Owned(start), |list| {
            let mut document = list.to_document();
            let Some(target) = document.comments.iter_mut().find(|c| c.id == comment_id) else {
                let ids = list.ids();
                return Err(CommentError::CommentNotFound {
                    id: comment_id.to_owned(),
                    suggestion: find_similar_id(comment_id, &ids).map(str::to_owned),
                });
            };
            target.react(reaction);
            Ok(document)
        })?;

        info!(
            subject,
            comment_id,
            reaction = reaction.as_ref(),
            version = committed.version,
            "recorded reaction"
        );

        committed
            .find(comment_id)
            .cloned()
            .ok_or_else(|| CommentError::CommentNotFound {
                id: comment_id.to_owned(),
                suggestion: None,
            })
    }

    /// Compare-and-swap loop: derive the next document from `base`, write it
    /// conditioned on `base.version`, and on conflict start over from a
    /// fresh read.
    fn commit_with<F>(
        &self,
        mut base: Cow<'_, CommentList>,
        mut build: F,
    ) -> Result<CommentList, CommentError>
    where
        F: FnMut(&CommentList) -> Result<CommentDocument, CommentError>,
    {
        let subject = base.subject.clone();

        for attempt in 1..=self.max_attempts {
            let next = build(&base)?;

            match self
                .store
                .write_if(COMMENTS_COLLECTION, &subject, base.version, &next)?
            {
                WriteOutcome::Committed { version } => {
                    return Ok(CommentList::from_document(&subject, version, next));
                }
                WriteOutcome::Conflict { current } => {
                    warn!(
                        subject = %subject,
                        attempt,
                        expected = base.version,
                        current,
                        "comments changed since they were read, retrying on fresh state"
                    );
                    base = Cow::Owned(self.fetch(&subject)?);
                }
            }
        }

        Err(CommentError::ConcurrentModification {
            subject,
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileStore, MemoryStore};
    use crate::models::ActorProfile;
    use jiff::Timestamp;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn actor(id: &str) -> ActorProfile {
        ActorProfile {
            id: id.to_string(),
            display_name: format!("user {id}"),
            avatar_url: format!("https://img.example/{id}.png"),
            email: format!("{id}@example.com"),
        }
    }

    fn comment(author: &str, text: &str) -> Comment {
        Comment::new(&actor(author), text.to_string(), Timestamp::now())
    }

    fn contents(list: &CommentList) -> Vec<&str> {
        list.comments.iter().map(|c| c.content.as_str()).collect()
    }

    /// An adapter over an in-memory store whose subject "550" already
    /// holds one comment, "c1".
    #[fixture]
    fn seeded() -> CommentStore<MemoryStore> {
        let comments = CommentStore::new(MemoryStore::new());
        let empty = comments.fetch("550").unwrap();
        comments
            .append_and_persist(&empty, comment("a", "c1"))
            .unwrap();
        comments
    }

    #[rstest]
    fn fetch_unknown_subject_is_empty() {
        let comments = CommentStore::new(MemoryStore::new());
        let list = comments.fetch("550").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.version, 0);
        assert_eq!(list.subject, "550");
    }

    // N comments in, N+1 out: the prefix is untouched and in order, and the
    // new comment sits at the end exactly as built.
    #[rstest]
    fn append_extends_list_by_one(seeded: CommentStore<MemoryStore>) {
        let before = seeded.fetch("550").unwrap();
        let new = comment("b", "c2");

        let after = seeded.append_and_persist(&before, new.clone()).unwrap();

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.comments[..before.len()], before.comments[..]);
        let last = after.last().unwrap();
        assert_eq!(last.id, new.id);
        assert_eq!(last.content, new.content);
        assert_eq!(last.author, new.author);
        assert_eq!(last.seq, 2);
        assert_eq!(after.version, before.version + 1);
        assert_eq!(seeded.fetch("550").unwrap(), after);
    }

    // A and B both read [c1]. A commits c2 first. B's append is computed
    // from the stale [c1] but must still land as [c1, c2, c3].
    #[rstest]
    fn stale_append_is_rebased_not_lost(seeded: CommentStore<MemoryStore>) {
        let seen_by_a = seeded.fetch("550").unwrap();
        let seen_by_b = seeded.fetch("550").unwrap();

        seeded
            .append_and_persist(&seen_by_a, comment("a", "c2"))
            .unwrap();
        let result = seeded
            .append_and_persist(&seen_by_b, comment("b", "c3"))
            .unwrap();

        assert_eq!(contents(&result), vec!["c1", "c2", "c3"]);
        assert_eq!(
            result.comments.iter().map(|c| c.seq).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(seeded.fetch("550").unwrap(), result);
    }

    // With no retries left the stale writer gets an explicit conflict and
    // the stored list keeps A's comment.
    #[rstest]
    fn exhausted_retries_report_conflict(seeded: CommentStore<MemoryStore>) {
        let seeded = seeded.with_max_attempts(1);
        let seen_by_a = seeded.fetch("550").unwrap();
        let seen_by_b = seeded.fetch("550").unwrap();

        seeded
            .append_and_persist(&seen_by_a, comment("a", "c2"))
            .unwrap();
        let err = seeded
            .append_and_persist(&seen_by_b, comment("b", "c3"))
            .unwrap_err();

        assert!(matches!(
            err,
            CommentError::ConcurrentModification { attempts: 1, .. }
        ));
        assert_eq!(contents(&seeded.fetch("550").unwrap()), vec!["c1", "c2"]);
    }

    // The unconditional overwrite this adapter avoids: replaying the same
    // race through `write` drops A's comment.
    #[rstest]
    fn blind_overwrite_loses_concurrent_append(seeded: CommentStore<MemoryStore>) {
        let seen_by_a = seeded.fetch("550").unwrap();
        let seen_by_b = seeded.fetch("550").unwrap();
        let store = seeded.store();

        store
            .write(COMMENTS_COLLECTION, "550", &seen_by_a.appended(comment("a", "c2")))
            .unwrap();
        store
            .write(COMMENTS_COLLECTION, "550", &seen_by_b.appended(comment("b", "c3")))
            .unwrap();

        assert_eq!(contents(&seeded.fetch("550").unwrap()), vec!["c1", "c3"]);
    }

    // Store failures are passed through once, never retried.
    #[rstest]
    fn persistence_errors_are_not_retried() {
        let comments = CommentStore::new(MemoryStore::new().with_max_document_bytes(16));
        let empty = comments.fetch("550").unwrap();

        let err = comments
            .append_and_persist(&empty, comment("a", "too long for the cap"))
            .unwrap_err();

        assert!(matches!(
            err,
            CommentError::Persistence(StoreError::PayloadTooLarge { .. })
        ));
        assert_eq!(comments.store().write_count(), 1);
        assert!(comments.fetch("550").unwrap().is_empty());
    }

    #[rstest]
    fn invalid_subject_is_a_persistence_error() {
        let comments = CommentStore::new(MemoryStore::new());
        let list = CommentList::empty("not a key");
        assert!(matches!(
            comments.append_and_persist(&list, comment("a", "hi")),
            Err(CommentError::Persistence(StoreError::InvalidKey(_)))
        ));
    }

    // -- react --

    #[rstest]
    fn react_updates_counters(seeded: CommentStore<MemoryStore>) {
        let id = seeded.fetch("550").unwrap().comments[0].id.clone();

        seeded.react("550", &id, Reaction::Like).unwrap();
        let updated = seeded.react("550", &id, Reaction::Dislike).unwrap();

        assert_eq!(updated.like_count, 1);
        assert_eq!(updated.dislike_count, 1);
        assert_eq!(seeded.fetch("550").unwrap().comments[0], updated);
    }

    #[rstest]
    fn react_unknown_comment_suggests_close_id(seeded: CommentStore<MemoryStore>) {
        let id = seeded.fetch("550").unwrap().comments[0].id.clone();
        let mut typo = id.clone();
        typo.replace_range(0..1, if id.starts_with('z') { "y" } else { "z" });

        let err = seeded.react("550", &typo, Reaction::Like).unwrap_err();
        match err {
            CommentError::CommentNotFound { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some(id.as_str()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // Reactions rewrite the whole document too, so they go through the same
    // versioned write and keep comments appended after the list was read.
    #[rstest]
    fn react_keeps_every_comment(seeded: CommentStore<MemoryStore>) {
        let list = seeded.fetch("550").unwrap();
        let id = list.comments[0].id.clone();
        seeded.append_and_persist(&list, comment("b", "c2")).unwrap();

        seeded.react("550", &id, Reaction::Like).unwrap();

        let list = seeded.fetch("550").unwrap();
        assert_eq!(contents(&list), vec!["c1", "c2"]);
        assert_eq!(list.comments[0].like_count, 1);
    }

    // -- concurrency against the file store --

    // Many writers appending to one subject at once, each from the list it
    // last read: every comment must survive with a unique sequence number.
    #[rstest]
    fn concurrent_appends_all_survive() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 5;

        let dir = TempDir::new().unwrap();
        let comments =
            CommentStore::new(FileStore::open(dir.path()).unwrap()).with_max_attempts(10_000);

        std::thread::scope(|scope| {
            for w in 0..WRITERS {
                let comments = &comments;
                scope.spawn(move || {
                    for i in 0..PER_WRITER {
                        let seen = comments.fetch("550").unwrap();
                        comments
                            .append_and_persist(&seen, comment(&format!("w{w}"), &format!("{w}-{i}")))
                            .unwrap();
                    }
                });
            }
        });

        let list = comments.fetch("550").unwrap();
        assert_eq!(list.len(), WRITERS * PER_WRITER);
        assert_eq!(list.version, (WRITERS * PER_WRITER) as u64);

        let seqs: Vec<u64> = list.comments.iter().map(|c| c.seq).collect();
        assert_eq!(seqs, (1..=(WRITERS * PER_WRITER) as u64).collect::<Vec<_>>());

        for w in 0..WRITERS {
            for i in 0..PER_WRITER {
                let text = format!("{w}-{i}");
                assert!(list.comments.iter().any(|c| c.content == text), "lost {text}");
            }
        }
    }
}
