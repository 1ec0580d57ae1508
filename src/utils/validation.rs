use crate::common::FieldError;
use crate::error::AppError;

/// 收集字段错误，结束时转换为校验错误
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, field: &str, value: &str, label: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors
                .push(FieldError::new(field, format!("{} is required", label)));
        }
        self
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if !value.trim().is_empty() && (len < min || len > max) {
            self.errors.push(FieldError::new(
                field,
                format!("Must be between {} and {} characters", min, max),
            ));
        }
        self
    }

    pub fn username(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.is_empty() && !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.errors.push(FieldError::new(
                field,
                "Only letters, numbers and underscores are allowed",
            ));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !value.is_empty() && !is_email(value) {
            self.errors
                .push(FieldError::new(field, "Enter a valid email address"));
        }
        self
    }

    pub fn password(&mut self, field: &str, value: &str) -> &mut Self {
        let has_letter = value.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        if value.len() < 8 || !has_letter || !has_digit {
            self.errors.push(FieldError::new(
                field,
                "Password must be at least 8 characters and contain a letter and a number",
            ));
        }
        self
    }

    pub fn non_negative(&mut self, field: &str, value: f64) -> &mut Self {
        if !value.is_finite() || value < 0.0 {
            self.errors
                .push(FieldError::new(field, "Must be zero or greater"));
        }
        self
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failing_field() {
        let result = Validator::new()
            .require("username", "", "Username")
            .email("email", "not-an-email")
            .password("password", "short")
            .finish();

        match result {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn accepts_valid_registration() {
        let result = Validator::new()
            .require("username", "u1", "Username")
            .username("username", "u1")
            .email("email", "u1@sathira.lk")
            .password("password", "P@ssw0rd1")
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_username_with_spaces() {
        assert!(Validator::new().username("username", "u 1").finish().is_err());
    }
}
