//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::game::JOKER_TERM;

/// Validates that a term value is usable as a secret term.
///
/// # Examples
///
/// ```ignore
/// validate_term_value("apple") // Ok
/// validate_term_value("   ")   // Err - blank
/// validate_term_value("Joker") // Err - reserved
/// ```
pub fn validate_term_value(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("term_blank");
        err.message = Some("Term must not be blank".into());
        return Err(err);
    }

    if trimmed.eq_ignore_ascii_case(JOKER_TERM) {
        let mut err = ValidationError::new("term_reserved");
        err.message = Some(format!("`{JOKER_TERM}` is reserved for unpaired players").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_term_value_valid() {
        assert!(validate_term_value("apple").is_ok());
        assert!(validate_term_value("ice cream").is_ok());
        assert!(validate_term_value("Éclair").is_ok());
    }

    #[test]
    fn test_validate_term_value_blank() {
        assert!(validate_term_value("").is_err());
        assert!(validate_term_value("   ").is_err());
    }

    #[test]
    fn test_validate_term_value_reserved() {
        assert!(validate_term_value("JOKER").is_err());
        assert!(validate_term_value("joker").is_err());
        assert!(validate_term_value(" Joker ").is_err());
    }
}
