use std::path::Path;

use anyhow::{Result, anyhow};

use crate::id::generate_id;
use crate::models::ActorProfile;

/// Create the profile, or update it in place. The ID survives updates so
/// earlier comments stay attributable; omitting the avatar keeps the old one.
pub fn set(
    display_name: String,
    email: String,
    avatar: Option<String>,
    base: &Path,
) -> Result<ActorProfile> {
    let existing = ActorProfile::load(base)?;

    let (id, old_avatar) = match existing {
        Some(profile) => (profile.id, profile.avatar_url),
        None => (generate_id(), String::new()),
    };

    let profile = ActorProfile {
        id,
        display_name,
        avatar_url: avatar.unwrap_or(old_avatar),
        email,
    };
    profile.write_file(base)?;

    Ok(profile)
}

/// The signed-in profile; commenting without one is refused.
pub fn require(base: &Path) -> Result<ActorProfile> {
    ActorProfile::load(base)?
        .ok_or_else(|| anyhow!("Not signed in. Run 'mq profile set <name> --email <email>' first."))
}
