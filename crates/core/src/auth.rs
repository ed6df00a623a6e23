//! Authentication gate: credential verification, bearer tokens, and role
//! checks.
//!
//! Tokens are HS256 JWTs carrying the account's primary key and role,
//! valid for 24 hours. There is no server-side revocation list; expiry is
//! the only termination path. That is the reproduced baseline of the
//! system this replaces, and it is a known trade-off: a production
//! deployment wanting stronger guarantees should shorten the TTL and add
//! refresh tokens or a revocation set.
//!
//! Passwords are stored only as salted bcrypt hashes and never appear in
//! any read path: [`AccountSummary`] is the sole shape handed out, and it
//! has no hash field at all.

use crate::config::CoreConfig;
use crate::error::{FieldErrors, HmsError, HmsResult};
use crate::store::AccountStore;
use crate::validation;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Closed set of staff roles. Authorization checks match exhaustively, so
/// adding a role is a compile-time-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Receptionist,
    Doctor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Receptionist => "receptionist",
            Role::Doctor => "doctor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role string outside the closed set.
#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "receptionist" => Ok(Role::Receptionist),
            "doctor" => Ok(Role::Doctor),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// A staff credential + identity record as persisted.
///
/// Deliberately not `Serialize`: the hash must never leave the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

/// The shape of an account on every read path. No password material.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl From<&StaffAccount> for AccountSummary {
    fn from(account: &StaffAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

/// Input for staff account registration. The password arrives in plain
/// text and is hashed before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewStaffAccount {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

/// The verified identity decoded from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub role: Role,
}

/// JWT claim set.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    sub: Uuid,
    role: Role,
    exp: i64,
}

/// Service guarding every mutating operation that requires staff
/// credentials.
#[derive(Clone)]
pub struct AuthGate {
    accounts: Arc<dyn AccountStore>,
    cfg: Arc<CoreConfig>,
}

impl AuthGate {
    pub fn new(accounts: Arc<dyn AccountStore>, cfg: Arc<CoreConfig>) -> Self {
        Self { accounts, cfg }
    }

    /// Verifies credentials and mints a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Unauthorized`] both for an unknown username and
    /// for a failed hash comparison, with no distinguishing signal, so the
    /// endpoint cannot be used to enumerate usernames.
    pub fn login(&self, username: &str, password: &str) -> HmsResult<(AccountSummary, String)> {
        let account = self
            .accounts
            .account_by_username(username.trim())
            .ok_or(HmsError::Unauthorized)?;

        let matches =
            bcrypt::verify(password, &account.password_hash).map_err(|_| HmsError::Unauthorized)?;
        if !matches {
            return Err(HmsError::Unauthorized);
        }

        let token = self.mint_token(&account)?;
        tracing::info!(username = %account.username, "login succeeded");
        Ok((AccountSummary::from(&account), token))
    }

    /// Registers a new staff account. Admin-only.
    ///
    /// The duplicate pre-check below is an optimisation for a friendlier
    /// error; the store's uniqueness constraint on username and email is
    /// the authoritative guard under concurrent registration.
    ///
    /// # Errors
    ///
    /// - [`HmsError::Unauthorized`] when the requester token is invalid.
    /// - [`HmsError::Forbidden`] when the requester is not an admin;
    ///   nothing is written in that case.
    /// - [`HmsError::Validation`] on field failures.
    /// - [`HmsError::Conflict`] when username or email is already taken.
    pub fn register(
        &self,
        requester_token: &str,
        new_account: NewStaffAccount,
    ) -> HmsResult<AccountSummary> {
        let identity = self.authenticate(requester_token)?;
        self.authorize(&identity, Role::Admin)?;

        let (username, name, email) = validation::staff_fields(
            &new_account.username,
            &new_account.password,
            &new_account.name,
            &new_account.email,
        )?;

        if self.accounts.account_by_username(&username).is_some() {
            return Err(HmsError::Conflict("username"));
        }

        let account = self.hash_and_build(username, &new_account.password, new_account.role, name, email)?;
        let summary = AccountSummary::from(&account);
        self.accounts
            .insert_account(account)
            .map_err(|violation| HmsError::Conflict(violation.field()))?;

        tracing::info!(username = %summary.username, role = %summary.role, "staff account registered");
        Ok(summary)
    }

    /// Verifies a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Unauthorized`] for any malformed, tampered, or
    /// expired token.
    pub fn authenticate(&self, token: &str) -> HmsResult<Identity> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret().as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| HmsError::Unauthorized)?;

        Ok(Identity {
            account_id: data.claims.sub,
            role: data.claims.role,
        })
    }

    /// Exact-match role check. There are no hierarchical roles: an admin
    /// does not implicitly pass a doctor-gated check.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Forbidden`] on a role mismatch.
    pub fn authorize(&self, identity: &Identity, required: Role) -> HmsResult<()> {
        match (identity.role, required) {
            (Role::Admin, Role::Admin)
            | (Role::Receptionist, Role::Receptionist)
            | (Role::Doctor, Role::Doctor) => Ok(()),
            _ => Err(HmsError::Forbidden),
        }
    }

    /// Resolves the account behind a token, for "who am I" lookups.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Unauthorized`] when the token is invalid or the
    /// account no longer exists.
    pub fn current_account(&self, token: &str) -> HmsResult<AccountSummary> {
        let identity = self.authenticate(token)?;
        let account = self
            .accounts
            .account(identity.account_id)
            .ok_or(HmsError::Unauthorized)?;
        Ok(AccountSummary::from(&account))
    }

    /// Creates the first admin account on an empty credential store.
    ///
    /// Used by process bootstrap so that staff registration (which
    /// requires an admin token) has a starting point.
    ///
    /// # Errors
    ///
    /// Returns [`HmsError::Conflict`] when any account already exists, or
    /// [`HmsError::Validation`] on field failures.
    pub fn seed_admin(
        &self,
        username: &str,
        password: &str,
        name: &str,
        email: &str,
    ) -> HmsResult<AccountSummary> {
        if self.accounts.account_count() > 0 {
            return Err(HmsError::Conflict("account"));
        }
        let (username, name, email) = validation::staff_fields(username, password, name, email)?;

        let account = self.hash_and_build(username, password, Role::Admin, name, email)?;
        let summary = AccountSummary::from(&account);
        self.accounts
            .insert_account(account)
            .map_err(|violation| HmsError::Conflict(violation.field()))?;

        tracing::info!(username = %summary.username, "seeded initial admin account");
        Ok(summary)
    }

    fn hash_and_build(
        &self,
        username: String,
        password: &str,
        role: Role,
        name: String,
        email: String,
    ) -> HmsResult<StaffAccount> {
        let password_hash = bcrypt::hash(password, self.cfg.bcrypt_cost())
            .map_err(|e| HmsError::Internal(format!("password hashing failed: {e}")))?;
        Ok(StaffAccount {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            name,
            email,
        })
    }

    fn mint_token(&self, account: &StaffAccount) -> HmsResult<String> {
        let expires_at = Utc::now() + self.cfg.token_ttl();
        let claims = Claims {
            sub: account.id,
            role: account.role,
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.cfg.jwt_secret().as_bytes()),
        )
        .map_err(|e| HmsError::Internal(format!("token minting failed: {e}")))
    }
}

/// Parse a role string against the closed enumeration, reporting the
/// failure as a field-level validation error.
pub fn parse_role(value: &str) -> HmsResult<Role> {
    Role::from_str(value).map_err(|e| {
        let mut errors = FieldErrors::new();
        errors.push("role", e.to_string());
        HmsError::Validation(errors)
    })
}
