//! Input rules shared by registration and profile updates.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;

use crate::error::ApiError;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 30;
pub const PASSWORD_MIN_CHARS: usize = 6;

lazy_static! {
    static ref AVATAR_BASE: Url = Url::parse("https://placehold.co/100x100/F59E0B/FFFFFF").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalizes and validates an email address.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(email)
}

/// Trims and validates a display name.
pub fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Err(ApiError::validation(format!(
            "Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(ApiError::validation(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }
    Ok(())
}

/// Placeholder image labelled with the upper-cased first letter of the name,
/// or `U` when the name is empty.
pub fn avatar_url(name: &str) -> String {
    let letter = name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| "U".to_string());
    let mut url = AVATAR_BASE.clone();
    url.query_pairs_mut().append_pair("text", &letter);
    url.into()
}
