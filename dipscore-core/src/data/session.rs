//! Login handle passed explicitly into every analysis run.
//!
//! The engine never inspects credentials. It only holds the `Session`
//! produced by an `Authenticator` and checks that it is still valid.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("credentials are required (guest sessions are disabled)")]
    CredentialsRequired,

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Username and password. The password is kept in a `SecretString` and never
/// printed.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Opaque login handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Logged-in user, `None` for a guest session.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expiry| now < expiry)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

pub trait Authenticator: Send + Sync {
    /// Log in with `credentials`, or as a guest when `None`.
    fn login(&self, credentials: Option<&Credentials>) -> Result<Session, AuthError>;
}

/// Offline authenticator: accepts any non-blank username/password pair and
/// optionally guest logins.
#[derive(Debug, Clone)]
pub struct LocalAuthenticator {
    allow_guest: bool,
    ttl: Option<Duration>,
}

impl LocalAuthenticator {
    pub fn new(allow_guest: bool, ttl: Option<Duration>) -> Self {
        Self { allow_guest, ttl }
    }

    fn issue(&self, user: Option<&str>) -> Session {
        let issued_at = Utc::now();
        let mut hasher = blake3::Hasher::new();
        hasher.update(user.unwrap_or("guest").as_bytes());
        hasher.update(&issued_at.timestamp_micros().to_le_bytes());
        Session {
            token: hasher.finalize().to_hex().to_string(),
            user: user.map(str::to_string),
            issued_at,
            expires_at: self.ttl.map(|ttl| issued_at + ttl),
        }
    }
}

impl Default for LocalAuthenticator {
    fn default() -> Self {
        Self::new(true, Some(Duration::hours(8)))
    }
}

impl Authenticator for LocalAuthenticator {
    fn login(&self, credentials: Option<&Credentials>) -> Result<Session, AuthError> {
        match credentials {
            None if self.allow_guest => Ok(self.issue(None)),
            None => Err(AuthError::CredentialsRequired),
            Some(creds) => {
                if creds.username().trim().is_empty() {
                    return Err(AuthError::InvalidCredentials("username is blank".into()));
                }
                if creds.password().is_empty() {
                    return Err(AuthError::InvalidCredentials("password is blank".into()));
                }
                Ok(self.issue(Some(creds.username())))
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_session() -> Session {
    LocalAuthenticator::new(true, None)
        .login(None)
        .expect("guest login")
}
