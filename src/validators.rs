/// Input validators for request payloads
///
/// Length limits protect against oversized inputs; format and content
/// checks reject malformed emails and control characters before anything
/// reaches the database.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_NAME_LENGTH: usize = 256;
const MIN_CATEGORY_LENGTH: usize = 3;
const MAX_CATEGORY_LENGTH: usize = 100;
const MIN_DESCRIPTION_LENGTH: usize = 10;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates an email address and returns the trimmed value.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort(
            "email".to_string(),
            MIN_EMAIL_LENGTH,
        ));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong(
            "email".to_string(),
            MAX_EMAIL_LENGTH,
        ));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }

    if has_suspicious_content(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a user name and returns the trimmed value.
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name".to_string()));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(
            "name".to_string(),
            MAX_NAME_LENGTH,
        ));
    }

    if has_suspicious_content(trimmed) {
        return Err(ValidationError::SuspiciousContent("name".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a task category and returns the trimmed value.
pub fn is_valid_category(category: &str) -> Result<String, ValidationError> {
    let trimmed = category.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("category".to_string()));
    }

    if trimmed.len() < MIN_CATEGORY_LENGTH {
        return Err(ValidationError::TooShort(
            "category".to_string(),
            MIN_CATEGORY_LENGTH,
        ));
    }

    if trimmed.len() > MAX_CATEGORY_LENGTH {
        return Err(ValidationError::TooLong(
            "category".to_string(),
            MAX_CATEGORY_LENGTH,
        ));
    }

    if has_suspicious_content(trimmed) {
        return Err(ValidationError::SuspiciousContent("category".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a task description and returns the trimmed value.
pub fn is_valid_description(description: &str) -> Result<String, ValidationError> {
    let trimmed = description.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("description".to_string()));
    }

    if trimmed.len() < MIN_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooShort(
            "description".to_string(),
            MIN_DESCRIPTION_LENGTH,
        ));
    }

    if trimmed.len() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong(
            "description".to_string(),
            MAX_DESCRIPTION_LENGTH,
        ));
    }

    Ok(trimmed.to_string())
}

/// Detects null bytes and control characters in text inputs.
fn has_suspicious_content(input: &str) -> bool {
    input.contains('\0') || input.chars().any(|c| c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@b").is_err()); // Too short
    }

    #[test]
    fn test_email_is_trimmed() {
        let email = is_valid_email("  user@example.com  ").unwrap();
        assert_eq!(email, "user@example.com");
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("John Doe").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn test_name_length_limits() {
        let too_long = "a".repeat(257);
        assert!(is_valid_name(&too_long).is_err());

        assert!(is_valid_name("").is_err());
    }

    #[test]
    fn test_control_characters() {
        assert!(is_valid_name("Name\0with\0null").is_err());
        assert!(is_valid_name("Name\twith\ttabs").is_err());
    }

    #[test]
    fn test_category_minimum_length() {
        assert!(is_valid_category("ab").is_err());
        assert!(is_valid_category("work").is_ok());
    }

    #[test]
    fn test_description_minimum_length() {
        assert!(is_valid_description("too short").is_err());
        assert!(is_valid_description("a sufficiently long description").is_ok());
    }
}
