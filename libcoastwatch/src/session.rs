//! Session persistence
//!
//! A session is the locally stored proof of authentication: a token and the
//! time it was issued. Both live in the [`LocalStore`] as separate entries
//! and are always written and removed together.

use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::error::{CoastwatchError, Result};
use crate::store::LocalStore;

pub const TOKEN_KEY: &str = "token";
pub const TIMESTAMP_KEY: &str = "usertokenTimestamp";
pub const USER_KEY: &str = "user";

/// How long a session stays valid after issuance
pub const SESSION_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// An authentication token and its issuance time
#[derive(Debug)]
pub struct Session {
    token: SecretString,
    issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            issued_at,
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Valid while `now - issued_at` is at most seven days
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        is_within_max_age(now.signed_duration_since(self.issued_at))
    }

    /// Time left before expiry; zero once expired
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        let left = chrono::Duration::seconds(SESSION_MAX_AGE_SECS)
            - now.signed_duration_since(self.issued_at);
        left.max(chrono::Duration::zero())
    }
}

/// The boundary is inclusive: exactly seven days old is still valid
pub fn is_within_max_age(elapsed: chrono::Duration) -> bool {
    elapsed <= chrono::Duration::seconds(SESSION_MAX_AGE_SECS)
}

/// Reads and writes the session entries of a [`LocalStore`]
#[derive(Clone)]
pub struct SessionStore {
    store: LocalStore,
}

impl SessionStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Persist `token` issued now
    pub fn save(&self, token: &str) -> Result<()> {
        self.save_at(token, Utc::now())
    }

    /// Persist `token` with an explicit issuance time
    pub fn save_at(&self, token: &str, issued_at: DateTime<Utc>) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CoastwatchError::InvalidInput(
                "Session token cannot be empty".to_string(),
            ));
        }
        let timestamp = issued_at.timestamp_millis().to_string();
        self.store
            .set_many(&[(TOKEN_KEY, token), (TIMESTAMP_KEY, timestamp.as_str())])?;
        tracing::debug!("Saved session issued at {}", issued_at);
        Ok(())
    }

    /// Load the stored session
    ///
    /// Returns `None` when either entry is missing, the token is empty, or
    /// the timestamp does not parse.
    pub fn load(&self) -> Result<Option<Session>> {
        let values = self.store.get_many(&[TOKEN_KEY, TIMESTAMP_KEY])?;
        let (Some(token), Some(timestamp)) = (&values[0], &values[1]) else {
            return Ok(None);
        };
        if token.is_empty() {
            return Ok(None);
        }
        let Some(issued_at) = parse_millis(timestamp) else {
            tracing::debug!("Ignoring session with unparsable timestamp {:?}", timestamp);
            return Ok(None);
        };
        Ok(Some(Session::new(token.clone(), issued_at)))
    }

    /// Load the session if it is still valid at `now`, purging it otherwise
    pub fn load_valid(&self, now: DateTime<Utc>) -> Result<Option<Session>> {
        match self.load()? {
            Some(session) if session.is_valid_at(now) => Ok(Some(session)),
            Some(session) => {
                tracing::info!(
                    "Session issued at {} has expired, clearing it",
                    session.issued_at()
                );
                self.clear()?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Remove token and timestamp together
    pub fn clear(&self) -> Result<()> {
        self.store.remove_many(&[TOKEN_KEY, TIMESTAMP_KEY])
    }

    /// Remove the session and the stored user record
    pub fn sign_out(&self) -> Result<()> {
        self.store.remove_many(&[TOKEN_KEY, TIMESTAMP_KEY, USER_KEY])
    }

    /// Store the serialized user record
    pub fn save_user(&self, user: &Value) -> Result<()> {
        self.store.set(USER_KEY, &user.to_string())
    }

    /// The `id` of the stored user record, if any
    ///
    /// Missing or malformed records are not an error.
    pub fn user_id(&self) -> Option<String> {
        let raw = match self.store.get(USER_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Could not read user record: {}", e);
                return None;
            }
        };

        let user: Value = match serde_json::from_str(&raw) {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!("Ignoring malformed user record: {}", e);
                return None;
            }
        };

        match user.get("id") {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    }
}

fn parse_millis(raw: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = raw.trim().parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}
