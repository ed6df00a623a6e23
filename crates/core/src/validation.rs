//! Input validation utilities.
//!
//! Field checks shared by the registry, ledgers, and authentication gate.
//! Every function validates the *trimmed* input and reports failures as a
//! field → message map so callers can surface them verbatim.

use crate::constants::{
    CONTACT_MAX_LEN, CONTACT_MIN_LEN, MIN_NAME_LEN, MIN_NOTES_LEN, MIN_PASSWORD_LEN,
    MIN_USERNAME_LEN,
};
use crate::error::{FieldErrors, HmsResult};

/// Validates patient `name` and `contact` together.
///
/// Mirrors the registration rules: name trimmed length >= 2, contact made
/// of digits, `+`, `-`, whitespace, and parentheses, 10 to 15 characters.
///
/// # Errors
///
/// Returns [`crate::HmsError::Validation`] naming each failing field.
/// On success yields the trimmed `(name, contact)` pair.
pub(crate) fn patient_fields(name: &str, contact: &str) -> HmsResult<(String, String)> {
    let mut errors = FieldErrors::new();

    let name = name.trim();
    // Character count, not byte length: a two-letter accented name is valid.
    if name.chars().count() < MIN_NAME_LEN {
        errors.push(
            "name",
            format!("name is required and must be at least {MIN_NAME_LEN} characters long"),
        );
    }

    let contact = contact.trim();
    if !contact_is_valid(contact) {
        errors.push(
            "contact",
            format!(
                "valid contact number is required ({CONTACT_MIN_LEN}-{CONTACT_MAX_LEN} digits)"
            ),
        );
    }

    errors.into_result()?;
    Ok((name.to_owned(), contact.to_owned()))
}

/// Returns true when `contact` matches `[0-9+\-\s()]{10,15}`.
fn contact_is_valid(contact: &str) -> bool {
    (CONTACT_MIN_LEN..=CONTACT_MAX_LEN).contains(&contact.len())
        && contact
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_whitespace() || matches!(b, b'+' | b'-' | b'(' | b')'))
}

/// Validates screening notes for a visit (trimmed length >= 10).
///
/// # Errors
///
/// Returns a validation error keyed on `screening_notes`. On success
/// yields the trimmed notes.
pub(crate) fn screening_notes(notes: &str) -> HmsResult<String> {
    let notes = notes.trim();
    if notes.chars().count() < MIN_NOTES_LEN {
        let mut errors = FieldErrors::new();
        errors.push(
            "screening_notes",
            format!(
                "screening notes are required and must be at least {MIN_NOTES_LEN} characters long"
            ),
        );
        errors.into_result()?;
    }
    Ok(notes.to_owned())
}

/// Structural email check: exactly one `@`, non-empty local part, and a
/// domain containing a dot. Not an RFC-complete parser; catches the inputs
/// staff actually mistype.
pub(crate) fn email_is_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let Some(domain) = parts.next() else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Validates the fields of a new staff account.
///
/// # Errors
///
/// Returns a validation error naming each failing field. On success yields
/// the trimmed `(username, name, email)` triple; the password is returned
/// untouched since whitespace may be significant.
pub(crate) fn staff_fields(
    username: &str,
    password: &str,
    name: &str,
    email: &str,
) -> HmsResult<(String, String, String)> {
    let mut errors = FieldErrors::new();

    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        errors.push(
            "username",
            format!("username must be at least {MIN_USERNAME_LEN} characters long"),
        );
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
    }

    let name = name.trim();
    if name.is_empty() {
        errors.push("name", "name is required");
    }

    let email = email.trim();
    if !email_is_valid(email) {
        errors.push("email", "a valid email address is required");
    }

    errors.into_result()?;
    Ok((username.to_owned(), name.to_owned(), email.to_owned()))
}
