//! Input validation for signup and login fields.
//!
//! Rules match the remote service's limits (username 2-30 chars, password
//! 3-100 chars) so locally-created accounts stay valid if the same data is
//! ever replayed against the remote API.

use crate::engine::content::AVATARS;

pub const USERNAME_MIN: usize = 2;
pub const USERNAME_MAX: usize = 30;
pub const PASSWORD_MIN: usize = 3;
pub const PASSWORD_MAX: usize = 100;

/// Validation errors with messages suitable for direct display.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("username is too short (minimum {USERNAME_MIN} characters)")]
    UsernameTooShort,

    #[error("username is too long (maximum {USERNAME_MAX} characters)")]
    UsernameTooLong,

    #[error("username cannot start or end with whitespace")]
    UsernameWhitespace,

    #[error("username contains invalid characters: {chars}")]
    UsernameInvalidCharacters { chars: String },

    #[error("password is too short (minimum {PASSWORD_MIN} characters)")]
    PasswordTooShort,

    #[error("password is too long (maximum {PASSWORD_MAX} characters)")]
    PasswordTooLong,

    #[error("avatar must be one of the EcoQuest avatar set")]
    UnknownAvatar,
}

/// Validate a username, returning it unchanged on success.
/// Usernames are case-sensitive identities, so no normalization happens here.
pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    let char_count = username.chars().count();
    if char_count < USERNAME_MIN {
        return Err(ValidationError::UsernameTooShort);
    }
    if char_count > USERNAME_MAX {
        return Err(ValidationError::UsernameTooLong);
    }
    if username != username.trim() {
        return Err(ValidationError::UsernameWhitespace);
    }
    let bad: String = username
        .chars()
        .filter(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '\0'))
        .collect();
    if !bad.is_empty() {
        return Err(ValidationError::UsernameInvalidCharacters { chars: bad });
    }
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > PASSWORD_MAX {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

pub fn validate_avatar(avatar: &str) -> Result<(), ValidationError> {
    if AVATARS.contains(&avatar) {
        Ok(())
    } else {
        Err(ValidationError::UnknownAvatar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_usernames() {
        for name in ["luna", "Luna", "eco_kid_7", "🌱sprout", "ab"] {
            assert!(validate_username(name).is_ok(), "{name} should validate");
        }
    }

    #[test]
    fn rejects_bad_usernames() {
        assert!(matches!(
            validate_username("a"),
            Err(ValidationError::UsernameTooShort)
        ));
        assert!(matches!(
            validate_username(&"x".repeat(31)),
            Err(ValidationError::UsernameTooLong)
        ));
        assert!(matches!(
            validate_username(" luna"),
            Err(ValidationError::UsernameWhitespace)
        ));
        assert!(matches!(
            validate_username("lu/na"),
            Err(ValidationError::UsernameInvalidCharacters { .. })
        ));
        assert!(matches!(
            validate_username("lu\nna"),
            Err(ValidationError::UsernameInvalidCharacters { .. })
        ));
    }

    #[test]
    fn password_length_bounds() {
        assert!(matches!(
            validate_password("ab"),
            Err(ValidationError::PasswordTooShort)
        ));
        assert!(validate_password("abc").is_ok());
        assert!(matches!(
            validate_password(&"x".repeat(101)),
            Err(ValidationError::PasswordTooLong)
        ));
    }

    #[test]
    fn avatar_must_come_from_the_set() {
        assert!(validate_avatar("🌱").is_ok());
        assert!(matches!(
            validate_avatar("🚗"),
            Err(ValidationError::UnknownAvatar)
        ));
    }
}
