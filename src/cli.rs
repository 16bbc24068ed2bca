use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Comments and reactions for movie pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize marquee in the current project
    Init {
        /// Initialize without committing to the repo (adds .marquee to .gitignore or .git/info/exclude)
        #[arg(long)]
        stealth: bool,
    },

    /// Manage the signed-in profile
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Post, list and react to comments
    #[command(subcommand)]
    Comment(CommentCommands),
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Sign in, or update the current profile
    Set {
        /// Name shown next to your comments
        display_name: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Avatar image URL
        #[arg(long)]
        avatar: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the current profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CommentCommands {
    /// Post a comment on a movie
    Add {
        /// The movie ID to comment on
        subject: String,

        /// The comment text (defaults to the saved draft)
        text: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List comments on a movie
    List {
        /// The movie ID
        subject: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Like a comment
    Like {
        /// The movie ID
        subject: String,

        /// The comment ID
        comment_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dislike a comment
    Dislike {
        /// The movie ID
        subject: String,

        /// The comment ID
        comment_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
