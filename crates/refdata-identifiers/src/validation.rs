//! Identifier format rules.
//!
//! Rules are keyed by the identifier tag so that any [`IdentifierKind`]
//! enum naming `ISIN`, `CUSIP`, `SEDOL`, `LEI` or `WKN` gets them. Other
//! tags accept any value.
//!
//! [`IdentifierKind`]: crate::types::IdentifierKind

use serde::{Deserialize, Serialize};

/// Outcome of checking one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatValidation {
    /// Whether the value satisfies its type's rule.
    pub is_valid: bool,
    /// Trimmed, upper-cased value.
    pub normalized_value: String,
    /// Empty when valid.
    pub validation_errors: Vec<String>,
}

/// Trims and upper-cases an identifier value.
#[must_use]
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Checks `value` against the rule for the identifier tag.
#[must_use]
pub fn validate_format(tag: &str, value: &str) -> FormatValidation {
    let normalized_value = normalize(value);
    let is_valid = match rule_for(tag) {
        Some(rule) => rule(&normalized_value),
        None => true,
    };
    FormatValidation {
        is_valid,
        validation_errors: if is_valid {
            Vec::new()
        } else {
            vec![format!("Invalid {tag} format")]
        },
        normalized_value,
    }
}

/// Whether the tag has a format rule at all.
#[must_use]
pub fn has_format_rule(tag: &str) -> bool {
    rule_for(tag).is_some()
}

fn rule_for(tag: &str) -> Option<fn(&str) -> bool> {
    match tag {
        "ISIN" => Some(is_isin),
        "CUSIP" => Some(is_cusip),
        "SEDOL" => Some(is_sedol),
        "LEI" => Some(is_lei),
        "WKN" => Some(is_wkn),
        _ => None,
    }
}

// 2 letters, 9 alphanumerics, 1 check digit
fn is_isin(v: &str) -> bool {
    let b = v.as_bytes();
    b.len() == 12
        && b[..2].iter().all(u8::is_ascii_alphabetic)
        && b[2..11].iter().all(u8::is_ascii_alphanumeric)
        && b[11].is_ascii_digit()
}

fn is_cusip(v: &str) -> bool {
    alnum_then_digit(v, 9)
}

fn is_sedol(v: &str) -> bool {
    alnum_then_digit(v, 7)
}

fn is_lei(v: &str) -> bool {
    v.len() == 20 && v.bytes().all(|c| c.is_ascii_alphanumeric())
}

fn is_wkn(v: &str) -> bool {
    v.len() == 6 && v.bytes().all(|c| c.is_ascii_alphanumeric())
}

fn alnum_then_digit(v: &str, len: usize) -> bool {
    let b = v.as_bytes();
    b.len() == len
        && b[..len - 1].iter().all(u8::is_ascii_alphanumeric)
        && b[len - 1].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isin() {
        assert!(validate_format("ISIN", "US0378331005").is_valid);
        assert!(validate_format("ISIN", " us0378331005 ").is_valid);
        assert!(!validate_format("ISIN", "1S0378331005").is_valid);
        assert!(!validate_format("ISIN", "US037833100X").is_valid);
        assert!(!validate_format("ISIN", "US03783310").is_valid);
    }

    #[test]
    fn test_cusip_and_sedol() {
        assert!(validate_format("CUSIP", "037833100").is_valid);
        assert!(!validate_format("CUSIP", "03783310A").is_valid);
        assert!(validate_format("SEDOL", "2046251").is_valid);
        assert!(!validate_format("SEDOL", "204625").is_valid);
    }

    #[test]
    fn test_lei_and_wkn() {
        assert!(validate_format("LEI", "HWUPKR0MPOU8FGXBT394").is_valid);
        assert!(!validate_format("LEI", "HWUPKR0MPOU8FGXBT39-").is_valid);
        assert!(validate_format("WKN", "865985").is_valid);
        assert!(!validate_format("WKN", "86598").is_valid);
    }

    #[test]
    fn test_unruled_tags_accept_anything() {
        let result = validate_format("TICKER", " brk.b ");
        assert!(result.is_valid);
        assert_eq!(result.normalized_value, "BRK.B");
        assert!(result.validation_errors.is_empty());
        assert!(!has_format_rule("TICKER"));
    }

    #[test]
    fn test_error_message_names_type() {
        let result = validate_format("ISIN", "bad");
        assert_eq!(result.validation_errors, vec!["Invalid ISIN format".to_string()]);
        assert_eq!(result.normalized_value, "BAD");
    }

    #[test]
    fn test_non_ascii_rejected_without_panic() {
        assert!(!validate_format("WKN", "ÄÖÜ").is_valid);
        assert!(!validate_format("ISIN", "ÄÄ0378331005").is_valid);
    }
}
