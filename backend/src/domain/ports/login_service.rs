//! Driving port for admin login and logout.
//!
//! Inbound adapters call this port to turn credentials into an authorized
//! admin identity without knowing which identity provider or store backs it.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials};

use super::IdentityHandle;

/// Domain use-case port for admin authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Sign in and confirm the identity holds the admin role.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<IdentityHandle, Error>;

    /// Revoke the provider-side session. Failures are logged, never returned.
    async fn sign_out(&self, identity: &IdentityHandle);
}
