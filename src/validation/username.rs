use super::RejectionReason;

/// Longest accepted username, in characters.
pub const USERNAME_MAX_LEN: usize = 32;

/// Trims and checks a username against `[A-Za-z0-9_-]{1,32}`.
pub fn validate_username(candidate: &str) -> Result<String, RejectionReason> {
    let username = candidate.trim();
    if username.is_empty() {
        return Err(RejectionReason::Empty);
    }
    if !username.chars().all(is_username_char) {
        return Err(RejectionReason::IllegalCharacters);
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(RejectionReason::TooLong);
    }
    Ok(username.to_string())
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
