//! Member validation utilities

use thiserror::Error;

/// Errors that can occur during member validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MemberValidationError {
    #[error("Member name cannot be empty")]
    EmptyName,

    #[error("Member name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Member name contains control character")]
    ControlCharacterInName,

    #[error("Member age cannot be negative")]
    NegativeAge,
}

const MAX_NAME_LENGTH: usize = 100;

/// Validate a member name
///
/// Rules:
/// - Cannot be empty
/// - Maximum 100 characters
/// - No control characters
pub fn validate_member_name(name: &str) -> Result<(), MemberValidationError> {
    if name.is_empty() {
        return Err(MemberValidationError::EmptyName);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(MemberValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    if name.chars().any(char::is_control) {
        return Err(MemberValidationError::ControlCharacterInName);
    }

    Ok(())
}

/// Validate a member age
pub fn validate_member_age(age: i32) -> Result<(), MemberValidationError> {
    if age < 0 {
        return Err(MemberValidationError::NegativeAge);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_name() {
        assert!(validate_member_name("memberA").is_ok());
        assert!(validate_member_name("AAA").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(
            validate_member_name(""),
            Err(MemberValidationError::EmptyName)
        );
    }

    #[test]
    fn test_name_too_long() {
        let name = "a".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            validate_member_name(&name),
            Err(MemberValidationError::NameTooLong(MAX_NAME_LENGTH))
        );
    }

    #[test]
    fn test_control_character() {
        assert_eq!(
            validate_member_name("mem\nber"),
            Err(MemberValidationError::ControlCharacterInName)
        );
    }

    #[test]
    fn test_age() {
        assert!(validate_member_age(0).is_ok());
        assert!(validate_member_age(40).is_ok());
        assert_eq!(
            validate_member_age(-1),
            Err(MemberValidationError::NegativeAge)
        );
    }
}
