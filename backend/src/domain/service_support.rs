//! Internal helpers mapping port errors onto domain errors.

use crate::domain::Error;
use crate::domain::ports::{IdentityProviderError, RemoteStoreError};

/// Operator-facing message for a denied admin login.
pub const ACCESS_DENIED_MESSAGE: &str =
    "Access Denied: You are not authorized to access the admin dashboard.";

pub(crate) fn map_store_error(error: RemoteStoreError) -> Error {
    match error {
        RemoteStoreError::PermissionDenied { message } => {
            Error::forbidden(format!("remote store denied access: {message}"))
        }
        RemoteStoreError::Transport { message } => {
            Error::service_unavailable(format!("remote store unavailable: {message}"))
        }
        RemoteStoreError::Timeout { message } => {
            Error::service_unavailable(format!("remote store timed out: {message}"))
        }
        RemoteStoreError::Decode { message } => {
            Error::internal(format!("remote store payload unreadable: {message}"))
        }
    }
}

pub(crate) fn map_identity_error(error: IdentityProviderError) -> Error {
    match error {
        IdentityProviderError::InvalidCredentials => {
            Error::unauthorized("Invalid email or password")
        }
        IdentityProviderError::Rejected { message } => Error::unauthorized(message),
        IdentityProviderError::Transport { message } => {
            Error::service_unavailable(format!("identity provider unavailable: {message}"))
        }
    }
}
