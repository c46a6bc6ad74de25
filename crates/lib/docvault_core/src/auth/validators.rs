//! Signup field validation.

use std::sync::LazyLock;

use regex::Regex;

use super::AuthError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,30}$").unwrap());

/// Special characters a password may (and must at least once) contain.
const PASSWORD_SPECIALS: &str = "@$!%*?&";

const MIN_PASSWORD_LEN: usize = 6;

pub const PASSWORD_RULES: &str = "Password must be at least 6 characters long and contain at least \
     one uppercase letter, one lowercase letter, one number, and one special character";

pub const USERNAME_RULES: &str =
    "Username must be 3-30 characters long and can only contain letters, numbers, and underscores";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_username(username: &str) -> bool {
    USERNAME.is_match(username)
}

/// At least six characters drawn from ASCII letters, digits and `@$!%*?&`,
/// including one of each class.
pub fn is_valid_password(password: &str) -> bool {
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Validate a signup triple, in the order email, password, username.
pub fn validate_signup(email: &str, password: &str, username: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::Validation("Invalid email format".into()));
    }
    if !is_valid_password(password) {
        return Err(AuthError::Validation(PASSWORD_RULES.into()));
    }
    if !is_valid_username(username) {
        return Err(AuthError::Validation(USERNAME_RULES.into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn username_format() {
        assert!(is_valid_username("user_1"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username(&"a".repeat(31)));
        assert!(!is_valid_username("user-1"));
    }

    #[test]
    fn password_strength() {
        assert!(is_valid_password("Abcdef1!"));
        assert!(is_valid_password("aB1@xy"));
        assert!(!is_valid_password("aB1@x"), "too short");
        assert!(!is_valid_password("abcdef1!"), "no uppercase");
        assert!(!is_valid_password("ABCDEF1!"), "no lowercase");
        assert!(!is_valid_password("Abcdefg!"), "no digit");
        assert!(!is_valid_password("Abcdef12"), "no special");
        assert!(!is_valid_password("Abcdef1!#"), "disallowed character");
    }

    #[test]
    fn signup_reports_first_failing_field() {
        let err = validate_signup("bad", "weak", "x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");

        let err = validate_signup("a@x.com", "Abcdef1!", "x").unwrap_err();
        assert_eq!(err.to_string(), USERNAME_RULES);

        assert!(validate_signup("a@x.com", "Abcdef1!", "user_1").is_ok());
    }
}
