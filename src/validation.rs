//! Field validation for signup and password changes.

/// Usernames that would collide with API routes or read as placeholders.
const FORBIDDEN_USERNAMES: &[&str] = &["me", "user", "username"];

const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        return Err("Username cannot be empty");
    }
    if username.len() > 150 {
        return Err("Username is too long");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
    {
        return Err("Username contains invalid characters");
    }
    if FORBIDDEN_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err("This username is not allowed");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email address");
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email address");
    }
    if email.chars().any(char::is_whitespace) {
        return Err("Invalid email address");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err("Password is too short");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d+e@f").is_ok());
    }

    #[test]
    fn test_forbidden_usernames_rejected_case_insensitively() {
        assert!(validate_username("me").is_err());
        assert!(validate_username("Me").is_err());
        assert!(validate_username("USERNAME").is_err());
    }

    #[test]
    fn test_username_bad_characters() {
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@").is_err());
        assert!(validate_email("alice@nodot").is_err());
        assert!(validate_email("spa ce@example.com").is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password("12345678901").is_err());
    }
}
