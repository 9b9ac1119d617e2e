use std::fmt;

use super::RejectionReason;

/// Shortest accepted password, in characters.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Character classes every password has to draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterClass {
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl CharacterClass {
    const ALL: [CharacterClass; 4] = [
        CharacterClass::Uppercase,
        CharacterClass::Lowercase,
        CharacterClass::Digit,
        CharacterClass::Symbol,
    ];

    fn matches(self, c: char) -> bool {
        match self {
            CharacterClass::Uppercase => c.is_uppercase(),
            CharacterClass::Lowercase => c.is_lowercase(),
            CharacterClass::Digit => c.is_ascii_digit(),
            CharacterClass::Symbol => !c.is_alphanumeric() && !c.is_whitespace(),
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CharacterClass::Uppercase => "uppercase",
            CharacterClass::Lowercase => "lowercase",
            CharacterClass::Digit => "digit",
            CharacterClass::Symbol => "symbol",
        };
        f.write_str(name)
    }
}

/// Checks the complexity policy. The candidate is only inspected, never kept.
pub fn validate_password(candidate: &str) -> Result<(), RejectionReason> {
    if candidate.chars().count() < PASSWORD_MIN_LEN {
        return Err(RejectionReason::TooShort);
    }
    for class in CharacterClass::ALL {
        if !candidate.chars().any(|c| class.matches(c)) {
            return Err(RejectionReason::MissingCharacterClass(class));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_complex_password() {
        assert_eq!(validate_password("Secure*Pass123"), Ok(()));
        assert_eq!(validate_password("Secur3P@ssw0rd!"), Ok(()));
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(validate_password("Aa1!"), Err(RejectionReason::TooShort));
        assert_eq!(validate_password(""), Err(RejectionReason::TooShort));
    }

    #[test]
    fn reports_each_missing_class() {
        let cases = [
            ("secure*pass123", CharacterClass::Uppercase),
            ("SECURE*PASS123", CharacterClass::Lowercase),
            ("Secure*Password", CharacterClass::Digit),
            ("SecurePass123", CharacterClass::Symbol),
        ];
        for (candidate, class) in cases {
            assert_eq!(
                validate_password(candidate),
                Err(RejectionReason::MissingCharacterClass(class))
            );
        }
    }

    #[test]
    fn whitespace_is_not_a_symbol() {
        assert_eq!(
            validate_password("Secure Pass 123"),
            Err(RejectionReason::MissingCharacterClass(CharacterClass::Symbol))
        );
    }

    #[test]
    fn rejection_message_does_not_quote_input() {
        let err = validate_password("hunter2hunter").unwrap_err();
        assert!(!err.to_string().contains("hunter"));
    }
}
