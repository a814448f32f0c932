//! Form input validation for user records.
//!
//! Pure functions, no IO. Rules are fixed and identical for create and
//! update; the first violated rule wins per field and submission is blocked
//! while any field carries an error.

use crate::api::UserInput;

pub const MSG_NAME_REQUIRED: &str = "名前は必須です";
pub const MSG_NAME_TOO_LONG: &str = "名前は100文字以内です";
pub const MSG_EMAIL_INVALID: &str = "有効なメールアドレスを入力してください";

/// Maximum name length, counted in characters (names are routinely non-ASCII).
pub const NAME_MAX_CHARS: usize = 100;

/// Per-field error messages. `None` means the field passed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Validate candidate user fields, producing a write payload on success or
/// the per-field messages on failure. Fields are checked independently.
pub fn validate_user_input(name: &str, email: &str) -> Result<UserInput, FieldErrors> {
    let errors = FieldErrors {
        name: check_name(name),
        email: check_email(email),
    };
    if errors.is_empty() {
        Ok(UserInput {
            name: name.to_string(),
            email: email.to_string(),
        })
    } else {
        Err(errors)
    }
}

fn check_name(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some(MSG_NAME_REQUIRED);
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Some(MSG_NAME_TOO_LONG);
    }
    None
}

fn check_email(email: &str) -> Option<&'static str> {
    if is_valid_email(email) { None } else { Some(MSG_EMAIL_INVALID) }
}

/// Standard email syntax: a restricted local part, then a dotted domain
/// whose last label is alphabetic and at least two characters. Deliberately
/// rejects dotless domains ("a@b").
fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-' | '\''))
    {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    for label in &labels {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }
    let tld = labels[labels.len() - 1];
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
