use crate::error::{AppError, Result};

/// Validates an unlock code's shape.
///
/// # Arguments
///
/// * `code` - The code to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the code is well-formed.
pub fn validate_code(code: &str) -> Result<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(AppError::Validation("Code cannot be empty".to_string()));
    }

    if code.len() > 64 {
        return Err(AppError::Validation(
            "Code must be at most 64 characters".to_string(),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "Code can only contain letters and numbers".to_string(),
        ));
    }

    Ok(())
}

/// Validates an email address's shape.
pub fn validate_email(email: &str) -> Result<()> {
    if email.len() < 5 || email.len() > 255 {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::Validation("Invalid email address".to_string()));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(())
}

/// Validates a phone number's shape.
pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.len() < 6 || phone.len() > 20 {
        return Err(AppError::Validation("Invalid phone number".to_string()));
    }

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ')
    {
        return Err(AppError::Validation("Invalid phone number".to_string()));
    }

    Ok(())
}

/// Validates a first name.
pub fn validate_first_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }

    if name.len() > 100 {
        return Err(AppError::Validation(
            "Name must be at most 100 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_codes() {
        assert!(validate_code("CREPE25").is_ok());
        assert!(validate_code("  crepe25  ").is_ok());
    }

    #[test]
    fn rejects_bad_codes() {
        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("CREPE 25!").is_err());
        assert!(validate_code(&"A".repeat(65)).is_err());
    }

    #[test]
    fn accepts_plausible_emails() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("ana.martin@example.fr").is_ok());
    }

    #[test]
    fn rejects_bad_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing.local").is_err());
        assert!(validate_email("user@nodot").is_err());
    }

    #[test]
    fn accepts_plausible_phones() {
        assert!(validate_phone("0600000000").is_ok());
        assert!(validate_phone("+33 6 00 00 00 00").is_ok());
    }

    #[test]
    fn rejects_bad_phones() {
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("call-me-maybe").is_err());
    }

    #[test]
    fn validates_first_names() {
        assert!(validate_first_name("Ana").is_ok());
        assert!(validate_first_name("  ").is_err());
        assert!(validate_first_name(&"x".repeat(101)).is_err());
    }
}
