use lazy_static::lazy_static;
use regex::Regex;

use super::RejectionReason;

/// Longest stored address, in characters; matches the `users.email` column.
pub const EMAIL_MAX_LEN: usize = 255;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Trims the address and lower-cases its domain. The local part keeps its case.
pub fn validate_email(candidate: &str) -> Result<String, RejectionReason> {
    let email = candidate.trim();
    if email.is_empty() {
        return Err(RejectionReason::Empty);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(RejectionReason::Malformed);
    }
    let (local, domain) = email.split_once('@').ok_or(RejectionReason::Malformed)?;
    let normalized = format!("{}@{}", local, domain.to_lowercase());
    if normalized.chars().count() > EMAIL_MAX_LEN {
        return Err(RejectionReason::Malformed);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_domain_only() {
        assert_eq!(
            validate_email("User@Example.COM").as_deref(),
            Ok("User@example.com")
        );
    }

    #[test]
    fn strips_surrounding_whitespace() {
        assert_eq!(
            validate_email("  john.doe@example.com\t").as_deref(),
            Ok("john.doe@example.com")
        );
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(validate_email(""), Err(RejectionReason::Empty));
        assert_eq!(validate_email("  "), Err(RejectionReason::Empty));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for candidate in [
            "john.doe.example.com",
            "bad-email",
            "@example.com",
            "john@",
            "john@localhost",
            "john@@example.com",
            "jo@hn@example.com",
            "john doe@example.com",
            "john@example.",
            "john@.com",
        ] {
            assert_eq!(
                validate_email(candidate),
                Err(RejectionReason::Malformed),
                "{candidate:?}"
            );
        }
    }

    #[test]
    fn enforces_column_length() {
        let domain = "@example.com";
        let at_limit = format!("{}{domain}", "a".repeat(EMAIL_MAX_LEN - domain.len()));
        assert_eq!(at_limit.len(), EMAIL_MAX_LEN);
        assert_eq!(validate_email(&at_limit).as_deref(), Ok(at_limit.as_str()));

        let over = format!("a{at_limit}");
        assert_eq!(validate_email(&over), Err(RejectionReason::Malformed));

        let way_over = format!("{}@example.com", "a".repeat(300));
        assert_eq!(validate_email(&way_over), Err(RejectionReason::Malformed));
    }

    #[test]
    fn normalizing_is_idempotent() {
        let once = validate_email("Mixed.Case@Sub.Example.Org").unwrap();
        assert_eq!(validate_email(&once).unwrap(), once);
    }
}
