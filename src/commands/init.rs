use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::MARQUEE_DIR;
use crate::config::Config;
use crate::db::FileStore;

pub fn run(stealth: bool) -> Result<()> {
    let marquee_dir = std::path::PathBuf::from(MARQUEE_DIR);

    if marquee_dir.exists() {
        println!("Marquee already initialized in {}", marquee_dir.display());
        return Ok(());
    }

    fs::create_dir_all(&marquee_dir).context("Failed to create .marquee directory")?;
    Config::default().write_file(&marquee_dir)?;
    FileStore::open(&marquee_dir).context("Failed to open comment store")?;

    if stealth {
        add_to_gitignore()?;
    }

    println!("Initialized marquee in {}", marquee_dir.display());
    Ok(())
}

/// Adds `.marquee` to git exclusions.
/// Prefers `.git/info/exclude` if it exists (truly local), otherwise uses `.gitignore`.
fn add_to_gitignore() -> Result<()> {
    let exclude_path = Path::new(".git/info/exclude");
    let gitignore_path = Path::new(".gitignore");

    let target_path = if exclude_path.exists() {
        exclude_path
    } else if gitignore_path.exists() || Path::new(".git").is_dir() {
        gitignore_path
    } else {
        // Not a git repo, skip
        return Ok(());
    };

    let existing = fs::read_to_string(target_path).unwrap_or_default();
    if existing
        .lines()
        .any(|line| line.trim() == MARQUEE_DIR || line.trim() == ".marquee/")
    {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target_path)
        .context("Failed to open git exclusion file")?;

    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{MARQUEE_DIR}")?;

    println!("Added {MARQUEE_DIR} to {}", target_path.display());
    Ok(())
}
