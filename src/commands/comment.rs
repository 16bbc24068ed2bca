use anyhow::{Context, Result, anyhow};
use tracing::warn;

use crate::Workspace;
use crate::commands::profile;
use crate::composer::{Composer, Notifier};
use crate::drafts::Drafts;
use crate::error::StoreError;
use crate::helpers::has_content;
use crate::models::{Comment, CommentList, Reaction};

/// A posted comment and the list as re-read after the post.
#[derive(Debug)]
pub struct AddResult {
    pub comment: Comment,
    pub list: CommentList,
}

pub fn add<N: Notifier>(
    subject: String,
    text: Option<String>,
    ws: &Workspace,
    notifier: N,
) -> Result<AddResult> {
    let actor = profile::require(ws.path())?;
    let drafts = Drafts::new(ws.path());

    let draft = match text {
        Some(text) => text,
        None => drafts
            .load(&subject)?
            .ok_or_else(|| anyhow!("No comment text given and no saved draft for {subject}"))?,
    };

    let current = match ws.comments().fetch(&subject) {
        Ok(current) => current,
        Err(err) => {
            keep_draft(&drafts, &subject, &draft)?;
            return Err(err).with_context(|| format!("Failed to load comments for {subject}"));
        }
    };

    let mut refreshed = None;
    let (submitted, leftover) = {
        let mut composer = Composer::new(ws.comments(), notifier).on_commit(|event| {
            refreshed = Some(ws.comments().fetch(event.subject));
        });
        composer.set_draft(draft);
        let submitted = composer.submit(&current, &actor);
        (submitted, composer.draft().to_owned())
    };

    let committed = match submitted {
        Ok(committed) => committed,
        Err(err) => {
            keep_draft(&drafts, &subject, &leftover)?;
            return Err(err.into());
        }
    };
    drafts.clear(&subject)?;

    let comment = committed
        .last()
        .cloned()
        .ok_or_else(|| anyhow!("Comment list for {subject} is empty after posting"))?;

    let list = refreshed_or_committed(committed, refreshed);

    Ok(AddResult { comment, list })
}

/// Save unsent text so the next `comment add` without text can post it.
fn keep_draft(drafts: &Drafts, subject: &str, text: &str) -> Result<()> {
    if has_content(text) {
        drafts.save(subject, text)?;
    }
    Ok(())
}

/// The post is stored once it commits, so a failed reload only costs
/// freshness; report the list as committed rather than failing the post.
fn refreshed_or_committed(
    committed: CommentList,
    refreshed: Option<Result<CommentList, StoreError>>,
) -> CommentList {
    match refreshed {
        Some(Ok(list)) => list,
        Some(Err(err)) => {
            warn!(
                subject = %committed.subject,
                error = %err,
                "failed to reload comments after posting"
            );
            committed
        }
        None => committed,
    }
}

pub fn list(subject: String, ws: &Workspace) -> Result<CommentList> {
    ws.comments()
        .fetch(&subject)
        .with_context(|| format!("Failed to load comments for {subject}"))
}

pub fn react(
    subject: String,
    comment_id: String,
    reaction: Reaction,
    ws: &Workspace,
) -> Result<Comment> {
    profile::require(ws.path())?;
    Ok(ws.comments().react(&subject, &comment_id, reaction)?)
}
