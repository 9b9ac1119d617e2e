use serde::{Deserialize, Deserializer, Serialize};

use super::{
    check, validate_bio, validate_email, validate_name, validate_url, validate_username, Field,
    FieldRejection, RejectionReason,
};

/// The user-editable part of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
}

/// A partial update.
///
/// `None` means the field was left out of the request. For the optional
/// fields, `Some(None)` means the client sent `null` and wants the value
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_picture_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin_profile_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub github_profile_url: Option<Option<String>>,
}

// Only called when the key is in the payload, so `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

impl From<&UserProfile> for ProfileUpdate {
    fn from(profile: &UserProfile) -> Self {
        Self {
            username: Some(profile.username.clone()),
            email: Some(profile.email.clone()),
            first_name: Some(profile.first_name.clone()),
            last_name: Some(profile.last_name.clone()),
            bio: Some(profile.bio.clone()),
            profile_picture_url: Some(profile.profile_picture_url.clone()),
            linkedin_profile_url: Some(profile.linkedin_profile_url.clone()),
            github_profile_url: Some(profile.github_profile_url.clone()),
        }
    }
}

impl UserProfile {
    /// Runs every field through its validator, for records built from scratch.
    pub fn validated(&self) -> Result<UserProfile, FieldRejection> {
        merge_update(&UserProfile::default(), &ProfileUpdate::from(self))
    }
}

/// Applies `update` on top of `existing` and returns the merged copy.
///
/// Supplied fields are validated in declaration order and the first failure
/// aborts the merge. `existing` is never touched, so a rejected update leaves
/// the caller holding the original record.
pub fn merge_update(
    existing: &UserProfile,
    update: &ProfileUpdate,
) -> Result<UserProfile, FieldRejection> {
    let mut merged = existing.clone();

    if let Some(username) = &update.username {
        merged.username = check(Field::Username, validate_username(username))?;
    }
    if let Some(email) = &update.email {
        merged.email = check(Field::Email, validate_email(email))?;
    }
    if let Some(first_name) = &update.first_name {
        merged.first_name = optional(Field::FirstName, first_name, validate_name)?;
    }
    if let Some(last_name) = &update.last_name {
        merged.last_name = optional(Field::LastName, last_name, validate_name)?;
    }
    if let Some(bio) = &update.bio {
        merged.bio = optional(Field::Bio, bio, validate_bio)?;
    }
    if let Some(url) = &update.profile_picture_url {
        merged.profile_picture_url = optional(Field::ProfilePictureUrl, url, link)?;
    }
    if let Some(url) = &update.linkedin_profile_url {
        merged.linkedin_profile_url = optional(Field::LinkedinProfileUrl, url, link)?;
    }
    if let Some(url) = &update.github_profile_url {
        merged.github_profile_url = optional(Field::GithubProfileUrl, url, link)?;
    }

    Ok(merged)
}

fn optional(
    field: Field,
    value: &Option<String>,
    validate: fn(&str) -> Result<Option<String>, RejectionReason>,
) -> Result<Option<String>, FieldRejection> {
    match value {
        None => Ok(None),
        Some(raw) => check(field, validate(raw)),
    }
}

fn link(candidate: &str) -> Result<Option<String>, RejectionReason> {
    validate_url(candidate).map(Some)
}
