#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod commands;
pub mod composer;
pub mod config;
pub mod db;
pub mod drafts;
pub mod error;
pub mod helpers;
pub mod id;
pub mod models;
pub mod output;
pub mod store;

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

use cli::{Cli, Commands, CommentCommands, ProfileCommands};
use config::Config;
use db::FileStore;
use models::Reaction;
use output::{ConsoleNotifier, Output};
use store::CommentStore;

pub const MARQUEE_DIR: &str = ".marquee";
pub const REDIRECT_FILE: &str = "redirect";

/// Finds the `.marquee/` directory by walking up from the current directory.
/// Returns `None` if no `.marquee/` directory is found.
pub fn find_marquee_dir() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut dir = current_dir.as_path();

    loop {
        let marquee_path = dir.join(MARQUEE_DIR);
        if marquee_path.is_dir() {
            return Some(marquee_path);
        }

        dir = dir.parent()?;
    }
}

/// Resolves the final marquee directory, following any redirect file.
/// A redirect file contains a path (absolute or relative) to another `.marquee/` directory.
pub fn resolve_marquee_dir() -> Option<PathBuf> {
    let marquee_dir = find_marquee_dir()?;
    let redirect_path = marquee_dir.join(REDIRECT_FILE);

    if redirect_path.is_file() {
        let target = std::fs::read_to_string(&redirect_path).ok()?;
        let target = target.trim();

        let target_path = if PathBuf::from(target).is_absolute() {
            PathBuf::from(target)
        } else {
            marquee_dir.parent()?.join(target)
        };

        if target_path.is_dir() {
            return Some(target_path);
        }
    }

    Some(marquee_dir)
}

/// An opened `.marquee/` directory: its config and comment store.
pub struct Workspace {
    path: PathBuf,
    config: Config,
    comments: CommentStore<FileStore>,
}

impl Workspace {
    pub fn open(path: &Path) -> Result<Self> {
        let config = Config::load(path)?;
        let store = FileStore::open(path)
            .context("Failed to open comment store")?
            .with_max_document_bytes(config.max_document_bytes);
        let comments = CommentStore::new(store).with_max_attempts(config.max_append_attempts);

        Ok(Self {
            path: path.to_path_buf(),
            config,
            comments,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn comments(&self) -> &CommentStore<FileStore> {
        &self.comments
    }
}

fn ensure_initialized() -> Result<Workspace> {
    let marquee_dir = resolve_marquee_dir()
        .ok_or_else(|| anyhow!("Marquee not initialized. Run 'mq init' first."))?;

    Workspace::open(&marquee_dir)
}

fn run_profile(profile_cmd: ProfileCommands, ws: &Workspace) -> Result<()> {
    match profile_cmd {
        ProfileCommands::Set {
            display_name,
            email,
            avatar,
            json,
        } => {
            let profile = commands::profile::set(display_name, email, avatar, ws.path())?;
            Output::new(json).profile(&profile)
        }
        ProfileCommands::Show { json } => {
            let profile = commands::profile::require(ws.path())?;
            Output::new(json).profile(&profile)
        }
    }
}

fn run_comment(comment_cmd: CommentCommands, ws: &Workspace) -> Result<()> {
    match comment_cmd {
        CommentCommands::Add {
            subject,
            text,
            json,
        } => {
            let result = commands::comment::add(subject, text, ws, ConsoleNotifier::default())?;
            Output::new(json).comment_added(&result)
        }
        CommentCommands::List { subject, json } => {
            let list = commands::comment::list(subject, ws)?;
            Output::new(json).comment_list(&list)
        }
        CommentCommands::Like {
            subject,
            comment_id,
            json,
        } => {
            let comment = commands::comment::react(subject, comment_id, Reaction::Like, ws)?;
            Output::new(json).reacted(&comment)
        }
        CommentCommands::Dislike {
            subject,
            comment_id,
            json,
        } => {
            let comment = commands::comment::react(subject, comment_id, Reaction::Dislike, ws)?;
            Output::new(json).reacted(&comment)
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { stealth } => commands::init::run(stealth),
        Commands::Profile(profile_cmd) => {
            let ws = ensure_initialized()?;
            run_profile(profile_cmd, &ws)
        }
        Commands::Comment(comment_cmd) => {
            let ws = ensure_initialized()?;
            run_comment(comment_cmd, &ws)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CommentError, StoreError};
    use crate::models::{ActorProfile, Comment};
    use jiff::Timestamp;
    use tempfile::TempDir;

    // The store behind a workspace picks up the limits from config.toml.
    #[test]
    fn workspace_applies_config() {
        let dir = TempDir::new().unwrap();
        Config {
            max_append_attempts: 2,
            max_document_bytes: 64,
        }
        .write_file(dir.path())
        .unwrap();

        let ws = Workspace::open(dir.path()).unwrap();
        assert_eq!(ws.config().max_append_attempts, 2);

        let actor = ActorProfile {
            id: "u1".to_string(),
            display_name: "ann".to_string(),
            avatar_url: String::new(),
            email: "ann@example.com".to_string(),
        };
        let empty = ws.comments().fetch("550").unwrap();
        let err = ws
            .comments()
            .append_and_persist(&empty, Comment::new(&actor, "hi".to_string(), Timestamp::now()))
            .unwrap_err();
        assert!(matches!(
            err,
            CommentError::Persistence(StoreError::PayloadTooLarge { limit: 64, .. })
        ));
    }

    #[test]
    fn workspace_open_fails_on_missing_dir() {
        assert!(Workspace::open(Path::new("/tmp/definitely_does_not_exist_marquee")).is_err());
    }
}
