//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into
//! services behind an `Arc`. Request handlers never read process-wide
//! environment variables, which keeps behaviour consistent across
//! multi-threaded runtimes and test harnesses.

use crate::constants::TOKEN_TTL_HOURS;
use crate::error::{FieldErrors, HmsResult};
use chrono::Duration;

/// Minimum accepted JWT secret length in bytes.
const MIN_SECRET_LEN: usize = 16;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    jwt_secret: String,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the JWT secret is shorter than 16
    /// bytes after trimming, or if the bcrypt cost falls outside the
    /// range the bcrypt algorithm accepts (4..=31).
    pub fn new(jwt_secret: String, token_ttl: Duration, bcrypt_cost: u32) -> HmsResult<Self> {
        let mut errors = FieldErrors::new();

        let jwt_secret = jwt_secret.trim().to_owned();
        if jwt_secret.len() < MIN_SECRET_LEN {
            errors.push(
                "jwt_secret",
                format!("secret must be at least {MIN_SECRET_LEN} bytes"),
            );
        }
        if !(4..=31).contains(&bcrypt_cost) {
            errors.push("bcrypt_cost", "bcrypt cost must be between 4 and 31");
        }
        if token_ttl <= Duration::zero() {
            errors.push("token_ttl", "token lifetime must be positive");
        }
        errors.into_result()?;

        Ok(Self {
            jwt_secret,
            token_ttl,
            bcrypt_cost,
        })
    }

    /// Convenience constructor using the stock 24-hour token lifetime and
    /// the bcrypt default cost.
    pub fn with_defaults(jwt_secret: String) -> HmsResult<Self> {
        Self::new(
            jwt_secret,
            Duration::hours(TOKEN_TTL_HOURS),
            bcrypt::DEFAULT_COST,
        )
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}
