//! Credential verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// Roles carried in the `role` claim of issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Checks a username/password pair against some identity source.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the principal for valid credentials, `None` otherwise.
    /// Implementations must not reveal which of the two fields was wrong.
    async fn verify(&self, username: &str, password: &str) -> Option<Principal>;
}

/// A single configured identity.
pub struct StaticCredentials {
    username: String,
    password: String,
    role: Role,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }

    /// The configured admin account
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.admin_username, &config.admin_password, Role::Admin)
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<Principal> {
        // Compare both fields every time so timing does not leak which one failed
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());

        if bool::from(user_ok & pass_ok) {
            Some(Principal::new(username, self.role))
        } else {
            None
        }
    }
}
