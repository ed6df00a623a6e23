//! Constants used throughout the HMS core crate.
//!
//! This module centralises validation thresholds and identifier formats so
//! they stay consistent across the codebase.

/// Prefix for human-facing patient identifiers (`HMS-<year>-<suffix>`).
pub const UNIQUE_ID_PREFIX: &str = "HMS";

/// Inclusive lower bound of the random 4-digit unique-id suffix.
pub const SUFFIX_MIN: u16 = 1000;

/// Inclusive upper bound of the random 4-digit unique-id suffix.
pub const SUFFIX_MAX: u16 = 9999;

/// Minimum patient name length after trimming.
pub const MIN_NAME_LEN: usize = 2;

/// Contact number length bounds (digits, `+`, `-`, spaces, parens).
pub const CONTACT_MIN_LEN: usize = 10;
pub const CONTACT_MAX_LEN: usize = 15;

/// Minimum screening-notes length after trimming.
pub const MIN_NOTES_LEN: usize = 10;

/// Minimum staff username length after trimming.
pub const MIN_USERNAME_LEN: usize = 3;

/// Minimum staff password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Bearer-token validity window in hours.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Initial lifecycle status assigned to every new prescription.
pub const PRESCRIPTION_STATUS_PENDING: &str = "pending";
