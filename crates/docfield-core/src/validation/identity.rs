//! Spanish NIF/NIE check-letter validation.

use serde::{Deserialize, Serialize};

/// Check letter table, indexed by `n mod 23`.
pub const CHECK_LETTERS: &[u8; 23] = b"TRWAGMYFPDXBNJZSQVHLCKE";

/// Identity number kinds carrying a check letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdentityKind {
    /// Documento Nacional de Identidad number: 8 digits + letter.
    Nif,
    /// Foreigner identity number: X/Y/Z + 7 digits + letter.
    Nie,
}

impl IdentityKind {
    /// Guess the kind from the leading character.
    pub fn detect(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'X' | 'Y' | 'Z' => Some(IdentityKind::Nie),
            c if c.is_ascii_digit() => Some(IdentityKind::Nif),
            _ => None,
        }
    }

    /// Validate `code` as this kind.
    pub fn validate(self, code: &str) -> bool {
        match self {
            IdentityKind::Nif => validate_nif(code),
            IdentityKind::Nie => validate_nie(code),
        }
    }

    /// Field name used by the pattern registry.
    pub fn field_name(self) -> &'static str {
        match self {
            IdentityKind::Nif => "NIF",
            IdentityKind::Nie => "NIE",
        }
    }
}

/// Check letter for `n`.
pub fn check_letter(n: u32) -> char {
    CHECK_LETTERS[(n % 23) as usize] as char
}

/// Validate a NIF: 8 ASCII digits followed by the matching check letter.
///
/// Total: malformed input is simply invalid.
pub fn validate_nif(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != 9 {
        return false;
    }

    match parse_digits(&chars[..8]) {
        Some(n) => check_letter(n) == chars[8],
        None => false,
    }
}

/// Validate a NIE: X/Y/Z (read as 0/1/2), 7 ASCII digits, check letter.
pub fn validate_nie(code: &str) -> bool {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() != 9 {
        return false;
    }

    let prefix = match chars[0] {
        'X' => 0,
        'Y' => 1,
        'Z' => 2,
        _ => return false,
    };

    match parse_digits(&chars[1..8]) {
        Some(n) => check_letter(prefix * 10_000_000 + n) == chars[8],
        None => false,
    }
}

/// Validate either kind, dispatching on the leading character.
pub fn validate_identity(code: &str) -> bool {
    IdentityKind::detect(code).is_some_and(|kind| kind.validate(code))
}

fn parse_digits(chars: &[char]) -> Option<u32> {
    chars
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(10).filter(|_| c.is_ascii_digit()).map(|d| acc * 10 + d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_letter() {
        assert_eq!(check_letter(0), 'T');
        assert_eq!(check_letter(14), 'Z');
        assert_eq!(check_letter(22), 'E');
        assert_eq!(check_letter(23), 'T');
    }

    #[test]
    fn test_validate_nif_valid() {
        assert!(validate_nif("12345678Z"));
        assert!(validate_nif("00000000T"));
    }

    #[test]
    fn test_validate_nif_invalid() {
        assert!(!validate_nif("12345678A"));
        assert!(!validate_nif("1234567Z")); // Too short
        assert!(!validate_nif("123456789Z")); // Too long
        assert!(!validate_nif("1234A678Z")); // Non-numeric body
        assert!(!validate_nif("12345678z")); // Lowercase letter
        assert!(!validate_nif("+2345678Z"));
        assert!(!validate_nif(""));
    }

    #[test]
    fn test_validate_nif_counts_characters() {
        // 9 bytes but 8 characters
        assert!(!validate_nif("1234567Ñ"));
        // Non-ASCII digits are not digits here
        assert!(!validate_nif("١٢٣٤٥٦٧٨Z"));
    }

    #[test]
    fn test_validate_nie_valid() {
        // 1234567 mod 23 = 19 -> 'L'
        assert!(validate_nie("X1234567L"));
        // 11234567 mod 23 = 10 -> 'X'
        assert!(validate_nie("Y1234567X"));
        // 21234567 mod 23 = 1 -> 'R'
        assert!(validate_nie("Z1234567R"));
        // 0 mod 23 = 0 -> 'T'
        assert!(validate_nie("X0000000T"));
    }

    #[test]
    fn test_validate_nie_invalid() {
        assert!(!validate_nie("X1234567A"));
        assert!(!validate_nie("A1234567L"));
        assert!(!validate_nie("X123456L"));
        assert!(!validate_nie("X12345B7L"));
        assert!(!validate_nie("12345678Z"));
    }

    #[test]
    fn test_validate_identity_dispatch() {
        assert_eq!(IdentityKind::detect("12345678Z"), Some(IdentityKind::Nif));
        assert_eq!(IdentityKind::detect("Z1234567R"), Some(IdentityKind::Nie));
        assert_eq!(IdentityKind::detect("ABC123456"), None);
        assert_eq!(IdentityKind::detect(""), None);

        assert!(validate_identity("12345678Z"));
        assert!(validate_identity("X1234567L"));
        assert!(!validate_identity("X1234567Z"));
        assert!(!validate_identity("PAS123456"));
    }
}
