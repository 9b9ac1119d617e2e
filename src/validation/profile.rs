//! Free-form profile fields: names, bio and profile links.

use lazy_static::lazy_static;
use regex::Regex;

use super::RejectionReason;

pub const NAME_MAX_LEN: usize = 100;
pub const BIO_MAX_LEN: usize = 500;

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap();
}

/// Blank names normalize to `None`.
pub fn validate_name(candidate: &str) -> Result<Option<String>, RejectionReason> {
    bounded_text(candidate, NAME_MAX_LEN)
}

/// Blank bios normalize to `None`.
pub fn validate_bio(candidate: &str) -> Result<Option<String>, RejectionReason> {
    bounded_text(candidate, BIO_MAX_LEN)
}

/// Accepts absolute `http`/`https` links only.
pub fn validate_url(candidate: &str) -> Result<String, RejectionReason> {
    let url = candidate.trim();
    if url.is_empty() {
        return Err(RejectionReason::Empty);
    }
    if !URL_RE.is_match(url) {
        return Err(RejectionReason::Malformed);
    }
    Ok(url.to_string())
}

fn bounded_text(candidate: &str, max_len: usize) -> Result<Option<String>, RejectionReason> {
    let text = candidate.trim();
    if text.chars().count() > max_len {
        return Err(RejectionReason::TooLong);
    }
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(text.to_string()))
}
