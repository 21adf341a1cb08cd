//! Password policy enforcement for new passwords.

use zxcvbn::Score;

use verdant_core::config::AuthConfig;
use verdant_core::error::AppError;
use verdant_core::result::AppResult;

/// Validates password strength against configured policies.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length.
    min_length: usize,
    /// Minimum zxcvbn strength score.
    min_score: Score,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            min_score: score_from_level(config.password_min_score),
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// `user_inputs` should carry the username and email so the strength
    /// estimate penalizes passwords built from them.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an error describing the first violation found.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> AppResult<()> {
        if password.len() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        if !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(AppError::validation(
                "Password must contain at least one special character",
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < self.min_score {
            return Err(AppError::validation(
                "Password is too weak. Please use a stronger password with more entropy.",
            ));
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(&self, old_password: &str, new_password: &str) -> AppResult<()> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

fn score_from_level(level: u8) -> Score {
    match level {
        0 => Score::Zero,
        1 => Score::One,
        2 => Score::Two,
        3 => Score::Three,
        _ => Score::Four,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> PasswordValidator {
        PasswordValidator {
            min_length: 8,
            min_score: Score::Three,
        }
    }

    #[test]
    fn accepts_a_strong_password() {
        assert!(validator().validate("Midnight!Garden7Trellis", &[]).is_ok());
    }

    #[test]
    fn rejects_short_passwords() {
        let err = validator().validate("Ab1!", &[]).unwrap_err();
        assert!(err.message.contains("at least 8 characters"));
    }

    #[test]
    fn rejects_missing_character_classes() {
        let v = validator();
        assert!(v.validate("lowercase-only-1!", &[]).is_err());
        assert!(v.validate("UPPERCASE-ONLY-1!", &[]).is_err());
        assert!(v.validate("NoDigitsHere!!", &[]).is_err());
        assert!(v.validate("NoSpecials123ab", &[]).is_err());
    }

    #[test]
    fn rejects_common_patterns() {
        assert!(validator().validate("Password1!", &[]).is_err());
    }

    #[test]
    fn user_inputs_weaken_the_estimate() {
        let v = validator();
        let password = "Xk9#mQv2$Lp8@Rw5";
        assert!(v.validate(password, &[]).is_ok());
        assert!(v.validate(password, &[password]).is_err());
    }

    #[test]
    fn rejects_reusing_the_old_password() {
        let v = validator();
        assert!(v.validate_not_same("Same!Pass1", "Same!Pass1").is_err());
        assert!(v.validate_not_same("Old!Pass1", "New!Pass2").is_ok());
    }
}
