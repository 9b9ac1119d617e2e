//! Field validation and normalization for user profiles.
//!
//! Every validator takes a raw candidate and either returns the normalized
//! value or a [`RejectionReason`]. Nothing in here touches the database or
//! the request layer.

mod email;
mod merge;
mod password;
mod profile;
mod username;

use std::fmt;

pub use email::validate_email;
pub use merge::{merge_update, ProfileUpdate, UserProfile};
pub use password::{validate_password, CharacterClass};
pub use profile::{validate_bio, validate_name, validate_url};
pub use username::validate_username;

/// Why a candidate value was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("must not be empty")]
    Empty,
    #[error("is too long")]
    TooLong,
    #[error("is too short")]
    TooShort,
    #[error("contains illegal characters")]
    IllegalCharacters,
    #[error("must contain at least one {0} character")]
    MissingCharacterClass(CharacterClass),
    #[error("is malformed")]
    Malformed,
}

/// Profile fields that can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
    Email,
    FirstName,
    LastName,
    Bio,
    ProfilePictureUrl,
    LinkedinProfileUrl,
    GithubProfileUrl,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Password => "password",
            Field::Email => "email",
            Field::FirstName => "first_name",
            Field::LastName => "last_name",
            Field::Bio => "bio",
            Field::ProfilePictureUrl => "profile_picture_url",
            Field::LinkedinProfileUrl => "linkedin_profile_url",
            Field::GithubProfileUrl => "github_profile_url",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejection tied to the field it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{field} {reason}")]
pub struct FieldRejection {
    pub field: Field,
    pub reason: RejectionReason,
}

impl FieldRejection {
    pub fn new(field: Field, reason: RejectionReason) -> Self {
        Self { field, reason }
    }
}

/// Runs a validator and tags its rejection with `field`.
pub(crate) fn check<T>(
    field: Field,
    result: Result<T, RejectionReason>,
) -> Result<T, FieldRejection> {
    result.map_err(|reason| FieldRejection::new(field, reason))
}
