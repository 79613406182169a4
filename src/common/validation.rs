// src/common/validation.rs
//
// Custom validator functions referenced from `#[validate(custom(...))]`.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-\(\)]+$").expect("valid phone regex"));

// Profile edits accept '+' anywhere in the number.
static PROFILE_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\-\+\(\)]+$").expect("valid profile phone regex"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static SIX_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").expect("valid code regex"));

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE.is_match(value.trim()) {
        Ok(())
    } else {
        Err(invalid("phone", "Please enter a valid phone number"))
    }
}

pub fn validate_profile_phone(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || PROFILE_PHONE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("phone", "Please enter a valid phone number"))
    }
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if EMAIL.is_match(value.trim()) {
        Ok(())
    } else {
        Err(invalid("email", "Please enter a valid email address"))
    }
}

pub fn validate_verification_code(value: &str) -> Result<(), ValidationError> {
    if SIX_DIGITS.is_match(value.trim()) {
        Ok(())
    } else {
        Err(invalid("verification_code", "Verification code must be exactly 6 digits"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("required", "This field is required"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_rules() {
        assert!(validate_phone("+256 (700) 123-456").is_ok());
        assert!(validate_phone("0700123456").is_ok());
        assert!(validate_phone("07001+23").is_err());
        assert!(validate_phone("call me").is_err());
        assert!(validate_profile_phone("").is_ok());
        assert!(validate_profile_phone("0700 12+3").is_ok());
    }

    #[test]
    fn email_and_code_rules() {
        assert!(validate_email("jane.doe@example.co").is_ok());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_verification_code("012345").is_ok());
        assert!(validate_verification_code("12345").is_err());
        assert!(validate_verification_code("12a456").is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank("x").is_ok());
    }
}
