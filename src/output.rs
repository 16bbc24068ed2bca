use anyhow::Result;
use console::{Term, style};
use serde::Serialize;

use crate::commands::comment::AddResult;
use crate::composer::Notifier;
use crate::models::{ActorProfile, Comment, CommentList};

const WRAP_WIDTH: usize = 76;

pub struct Output {
    term: Term,
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self {
            term: Term::stdout(),
            json,
        }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.term.write_line(&output)?;
        Ok(())
    }

    pub fn profile(&self, profile: &ActorProfile) -> Result<()> {
        if self.json {
            return self.print_json(profile);
        }

        self.term.write_line(&format!(
            "{} {}",
            style("Signed in as:").green(),
            style(&profile.display_name).cyan().bold()
        ))?;
        self.term.write_line(&format!("  ID: {}", profile.id))?;
        self.term.write_line(&format!("  Email: {}", profile.email))?;
        if profile.avatar_url.is_empty() {
            self.term
                .write_line(&format!("  Avatar: {}", style("(not set)").dim()))?;
        } else {
            self.term
                .write_line(&format!("  Avatar: {}", profile.avatar_url))?;
        }
        Ok(())
    }

    pub fn comment_added(&self, result: &AddResult) -> Result<()> {
        if self.json {
            return self.print_json(&result.comment);
        }

        self.term.write_line(&format!(
            "{} {}",
            style("Posted comment:").green(),
            style(&result.comment.id).cyan().bold()
        ))?;
        self.term
            .write_line(&format!("  Movie: {}", result.list.subject))?;
        self.term
            .write_line(&format!("  Comment: {}", result.comment.content))?;
        self.term
            .write_line(&format!("  Total comments: {}", result.list.len()))?;
        Ok(())
    }

    pub fn comment_list(&self, list: &CommentList) -> Result<()> {
        if self.json {
            return self.print_json(list);
        }

        self.term.write_line(&format!(
            "Comments for movie: {} ({})",
            style(&list.subject).cyan().bold(),
            list.len()
        ))?;
        self.term.write_line("")?;

        if list.is_empty() {
            self.term.write_line("No comments yet.")?;
            return Ok(());
        }

        for comment in &list.comments {
            self.print_comment(comment)?;
            self.term.write_line("")?;
        }
        Ok(())
    }

    fn print_comment(&self, comment: &Comment) -> Result<()> {
        self.term.write_line(&format!(
            "#{} {} {} {}",
            comment.seq,
            style(&comment.id).cyan().bold(),
            style(&comment.author.display_name).yellow(),
            style(&comment.created_at).dim()
        ))?;

        let options = textwrap::Options::new(WRAP_WIDTH)
            .initial_indent("  ")
            .subsequent_indent("  ");
        self.term
            .write_line(&textwrap::fill(&comment.content, options))?;

        self.term.write_line(&format!(
            "  {} {}  {} {}",
            style("likes:").dim(),
            comment.like_count,
            style("dislikes:").dim(),
            comment.dislike_count
        ))?;
        Ok(())
    }

    pub fn reacted(&self, comment: &Comment) -> Result<()> {
        if self.json {
            return self.print_json(comment);
        }

        self.term.write_line(&format!(
            "{} {}",
            style("Reacted to comment:").green(),
            style(&comment.id).cyan().bold()
        ))?;
        self.term.write_line(&format!(
            "  Likes: {}  Dislikes: {}",
            comment.like_count, comment.dislike_count
        ))?;
        Ok(())
    }
}

/// Reports submit failures on stderr.
pub struct ConsoleNotifier {
    term: Term,
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str) {
        let line = format!("{} {message}", style("Error:").red().bold());
        if let Err(e) = self.term.write_line(&line) {
            tracing::warn!(error = %e, "failed to write notification");
        }
    }
}
