//! Admin login: identity check followed by a role check against the store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{IdentityHandle, IdentityProvider, LoginService, RemoteStore, StorePath};
use crate::domain::service_support::{ACCESS_DENIED_MESSAGE, map_identity_error, map_store_error};
use crate::domain::{Error, LoginCredentials, RecordId, normalize_user};

/// Login service requiring `role == "admin"` on the user's store document.
#[derive(Clone)]
pub struct AdminLoginService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn RemoteStore>,
}

impl AdminLoginService {
    /// Wire the service to its collaborators.
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn RemoteStore>) -> Self {
        Self { identity, store }
    }

    async fn has_admin_role(&self, identity: &IdentityHandle) -> Result<bool, Error> {
        let Ok(id) = RecordId::parse(&identity.uid) else {
            warn!(uid = %identity.uid, "identity uid is not a valid store key");
            return Ok(false);
        };
        let path = StorePath::user(&id)
            .map_err(|err| Error::internal(format!("invalid user path: {err}")))?;
        let document = self.store.read(&path).await.map_err(map_store_error)?;
        let Some(bag) = document.as_object() else {
            return Ok(false);
        };
        Ok(normalize_user(id, bag).is_admin())
    }

    async fn revoke(&self, identity: &IdentityHandle) {
        if let Err(err) = self.identity.sign_out(identity).await {
            warn!(error = %err, uid = %identity.uid, "best-effort sign-out failed");
        }
    }
}

#[async_trait]
impl LoginService for AdminLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<IdentityHandle, Error> {
        let identity = self
            .identity
            .sign_in(credentials)
            .await
            .map_err(map_identity_error)?;

        match self.has_admin_role(&identity).await {
            Ok(true) => {
                info!(uid = %identity.uid, "admin signed in");
                Ok(identity)
            }
            Ok(false) => {
                warn!(uid = %identity.uid, "sign-in without admin role denied");
                self.revoke(&identity).await;
                Err(Error::forbidden(ACCESS_DENIED_MESSAGE))
            }
            Err(err) => {
                self.revoke(&identity).await;
                Err(err)
            }
        }
    }

    async fn sign_out(&self, identity: &IdentityHandle) {
        self.revoke(identity).await;
    }
}
