use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn email_error(email: &str) -> Option<FieldError> {
    if is_valid_email(email) {
        None
    } else {
        Some(FieldError {
            field: "email",
            message: "email must be a well-formed address".into(),
        })
    }
}

pub fn password_error(password: &str) -> Option<FieldError> {
    if password.len() >= MIN_PASSWORD_LEN {
        None
    } else {
        Some(FieldError {
            field: "password",
            message: format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        })
    }
}
