//! Validation Utilities
//!
//! Input validation functions for user data and API requests.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Maximum display name length in characters
pub const NAME_MAX_LEN: usize = 100;

/// Validates email address format and length (5-255 characters)
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    let trimmed = email.trim();
    (5..=255).contains(&trimmed.len()) && regex.is_match(trimmed)
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a name contains only allowed characters and length
pub fn validate_name(name: &str) -> bool {
    let trimmed = name.trim();

    if trimmed.is_empty() || trimmed.chars().count() > NAME_MAX_LEN {
        return false;
    }

    // Letters (any script), spaces, hyphens, and apostrophes
    trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'')
}

/// Validates URL format for profile images
pub fn validate_url(url: &str) -> bool {
    if url.is_empty() {
        return true;
    }

    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("Failed to compile URL regex")
    });

    regex.is_match(url) && url.len() <= 512
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message(messages::INVALID_EMAIL.into()))
    }
}

/// Custom validator for name fields using the validator crate
pub fn name_validator(name: &str) -> Result<(), ValidationError> {
    if validate_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_name").with_message(messages::INVALID_NAME.into()))
    }
}

/// Custom validator for URL fields using the validator crate
pub fn url_validator(url: &str) -> Result<(), ValidationError> {
    if validate_url(url) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_url").with_message(messages::INVALID_URL.into()))
    }
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please enter a valid email address";
    pub const INVALID_NAME: &str =
        "Name must contain only letters, spaces, hyphens, and apostrophes";
    pub const INVALID_URL: &str = "Please enter a valid URL starting with http:// or https://";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(validate_email("  user@example.com  "));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_validate_email_length() {
        let local = "a".repeat(250);
        assert!(!validate_email(&format!("{}@example.com", local)));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("John Doe"));
        assert!(validate_name("Mary-Jane O'Connor"));
        assert!(validate_name("José Núñez"));
        assert!(!validate_name(""));
        assert!(!validate_name("   "));
        assert!(!validate_name("John123"));
        assert!(!validate_name("John@Doe"));
        assert!(validate_name(&"a".repeat(100)));
        assert!(!validate_name(&"a".repeat(101)));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com"));
        assert!(validate_url("http://example.com/path?query=1"));
        assert!(validate_url(""));
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url("not-a-url"));
        assert!(!validate_url("https://"));
        assert!(!validate_url(&format!("https://example.com/{}", "a".repeat(500))));
    }

    #[test]
    fn test_custom_validators_carry_messages() {
        let err = email_validator("nope").unwrap_err();
        assert_eq!(err.code, "invalid_email");
        assert_eq!(err.message.as_deref(), Some(messages::INVALID_EMAIL));

        assert!(name_validator("Alice").is_ok());
        assert!(url_validator("https://example.com/a.png").is_ok());
    }
}
