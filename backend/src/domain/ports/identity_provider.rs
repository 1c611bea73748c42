//! Driven port for the external identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::LoginCredentials;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider rejected the email/password pair.
        InvalidCredentials => "invalid email or password",
        /// The provider refused the request for another reason (disabled
        /// account, throttling).
        Rejected { message: String } => "identity provider rejected the request: {message}",
        /// The provider could not be reached.
        Transport { message: String } => "identity provider request failed: {message}",
    }
}

/// Opaque handle for a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityHandle {
    /// Provider user id; also the key of the user document.
    pub uid: String,
    /// Email the identity signed in with.
    pub email: String,
}

/// Port for credential sign-in and sign-out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for an identity.
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentityHandle, IdentityProviderError>;

    /// End the provider-side session for `identity`.
    async fn sign_out(&self, identity: &IdentityHandle) -> Result<(), IdentityProviderError>;
}

/// Development provider accepting a single fixed account.
///
/// `admin@example.com` / `password` signs in as uid `admin`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

/// Email accepted by [`FixtureIdentityProvider`].
pub const FIXTURE_ADMIN_EMAIL: &str = "admin@example.com";
/// Uid returned by [`FixtureIdentityProvider`].
pub const FIXTURE_ADMIN_UID: &str = "admin";

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentityHandle, IdentityProviderError> {
        if credentials.email().eq_ignore_ascii_case(FIXTURE_ADMIN_EMAIL)
            && credentials.password() == "password"
        {
            Ok(IdentityHandle {
                uid: FIXTURE_ADMIN_UID.to_owned(),
                email: FIXTURE_ADMIN_EMAIL.to_owned(),
            })
        } else {
            Err(IdentityProviderError::invalid_credentials())
        }
    }

    async fn sign_out(&self, _identity: &IdentityHandle) -> Result<(), IdentityProviderError> {
        Ok(())
    }
}
