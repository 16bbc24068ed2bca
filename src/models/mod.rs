mod actor;
mod comment;
mod list;

pub use actor::{ActorProfile, PROFILE_FILE};
pub use comment::{AuthorSnapshot, Comment, Reaction};
pub use list::{CommentDocument, CommentList};
