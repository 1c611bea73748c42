//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_provider;
mod login_service;
mod marker_slot;
mod remote_store;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FIXTURE_ADMIN_EMAIL, FIXTURE_ADMIN_UID, FixtureIdentityProvider, IdentityHandle,
    IdentityProvider, IdentityProviderError,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use marker_slot::MockMarkerSlot;
pub use marker_slot::{FixtureMarkerSlot, MarkerSlot, MarkerSlotError};
#[cfg(test)]
pub use remote_store::MockRemoteStore;
pub use remote_store::{
    RemoteStore, RemoteStoreError, SnapshotSink, StorePath, StorePathError, Subscription,
    TRANSACTIONS_COLLECTION, USERS_COLLECTION,
};
