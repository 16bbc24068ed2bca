//! The comment box: local draft state in front of the store adapter.

use jiff::Timestamp;
use tracing::debug;

use crate::db::DocumentStore;
use crate::error::SubmitError;
use crate::helpers::has_content;
use crate::models::{ActorProfile, Comment, CommentList};
use crate::store::CommentStore;

pub const EMPTY_CONTENT: &str = "empty content";

/// Where user-facing error messages go. Fire and forget.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// Passed to post-commit hooks after a comment has been stored.
#[derive(Debug, Clone, Copy)]
pub struct CommitEvent<'c> {
    pub subject: &'c str,
    pub comment: &'c Comment,
    pub version: u64,
}

type CommitHook<'a> = Box<dyn FnMut(&CommitEvent<'_>) + 'a>;

pub struct Composer<'a, S, N> {
    comments: &'a CommentStore<S>,
    notifier: N,
    draft: String,
    hooks: Vec<CommitHook<'a>>,
}

impl<'a, S: DocumentStore, N: Notifier> Composer<'a, S, N> {
    pub fn new(comments: &'a CommentStore<S>, notifier: N) -> Self {
        Self {
            comments,
            notifier,
            draft: String::new(),
            hooks: Vec::new(),
        }
    }

    /// Run `hook` after every successful submit, typically to re-fetch and
    /// redraw the list.
    pub fn on_commit(mut self, hook: impl FnMut(&CommitEvent<'_>) + 'a) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Post the current draft as `actor` onto `current`'s subject.
    ///
    /// On success the draft is cleared and the commit hooks run. On failure
    /// the notifier gets the error message and the draft is left alone so it
    /// can be submitted again. Each successful call adds a new comment, even
    /// for identical text.
    pub fn submit(
        &mut self,
        current: &CommentList,
        actor: &ActorProfile,
    ) -> Result<CommentList, SubmitError> {
        if !has_content(&self.draft) {
            return Err(self.report(SubmitError::Validation(EMPTY_CONTENT)));
        }

        let comment = Comment::new(actor, self.draft.clone(), Timestamp::now());
        let comment_id = comment.id.clone();

        let committed = match self.comments.append_and_persist(current, comment) {
            Ok(committed) => committed,
            Err(e) => return Err(self.report(e.into())),
        };

        self.draft.clear();

        if let Some(comment) = committed.find(&comment_id) {
            let event = CommitEvent {
                subject: &committed.subject,
                comment,
                version: committed.version,
            };
            for hook in &mut self.hooks {
                hook(&event);
            }
        }

        Ok(committed)
    }

    fn report(&mut self, err: SubmitError) -> SubmitError {
        debug!(error = %err, "submit failed");
        self.notifier.notify(&err.to_string());
        err
    }
}
