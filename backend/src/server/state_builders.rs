//! Builders for the ports and HTTP state behind the server.

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::info;

use broker_admin::domain::ports::{
    FIXTURE_ADMIN_EMAIL, FIXTURE_ADMIN_UID, FixtureIdentityProvider, IdentityProvider,
    RemoteStore, Subscription,
};
use broker_admin::domain::{
    ADMIN_ROLE, AdminLoginService, DashboardService, SessionGate, UserDirectory,
    attach_live_updates,
};
use broker_admin::inbound::http::state::HttpState;
use broker_admin::outbound::firebase::{
    DEFAULT_IDENTITY_ENDPOINT, IdentityToolkitProvider, RealtimeDatabaseOptions,
    RealtimeDatabaseStore,
};
use broker_admin::outbound::memory_store::InMemoryRemoteStore;
use broker_admin::settings::AdminSettings;

/// Driven adapters selected from settings.
pub struct Ports {
    pub store: Arc<dyn RemoteStore>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Set when running on the in-memory store, so startup seeding can
    /// reach it.
    #[cfg_attr(
        not(feature = "demo-data"),
        expect(dead_code, reason = "read only by demo data seeding")
    )]
    pub memory: Option<InMemoryRemoteStore>,
}

/// Shared handler state plus the live update task feeding it.
///
/// Dropping `live_updates` stops the user collection from tracking the
/// store.
pub struct BuiltState {
    pub http_state: web::Data<HttpState>,
    pub live_updates: Subscription,
}

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {err}"))
}

/// Tree the development store starts with: the fixture admin and no
/// transactions.
fn development_tree() -> Value {
    json!({
        "users": {
            FIXTURE_ADMIN_UID: {
                "fullName": "Fixture Admin",
                "email": FIXTURE_ADMIN_EMAIL,
                "role": ADMIN_ROLE,
                "createdAt": 0
            }
        },
        "transactions": []
    })
}

/// Firebase adapters when configured, otherwise the in-memory store with the
/// fixture identity provider.
pub fn build_ports(settings: &AdminSettings) -> io::Result<Ports> {
    let Some(firebase) = settings
        .firebase()
        .map_err(|err| io_error("invalid settings", err))?
    else {
        info!(backend = "memory", "using in-memory store and fixture identity");
        let memory = InMemoryRemoteStore::with_tree(development_tree());
        return Ok(Ports {
            store: Arc::new(memory.clone()),
            identity: Arc::new(FixtureIdentityProvider),
            memory: Some(memory),
        });
    };

    let options = RealtimeDatabaseOptions {
        base_url: firebase.database_url.clone(),
        auth_token: firebase.auth_token.clone(),
        request_timeout: settings.request_timeout(),
        poll_interval: settings.poll_interval(),
    };
    let store = RealtimeDatabaseStore::new(options)
        .map_err(|err| io_error("failed to build database client", err))?;
    let endpoint = Url::parse(DEFAULT_IDENTITY_ENDPOINT)
        .map_err(|err| io_error("invalid identity endpoint", err))?;
    let identity = IdentityToolkitProvider::new(
        endpoint,
        firebase.api_key.clone(),
        settings.request_timeout(),
    )
    .map_err(|err| io_error("failed to build identity client", err))?;
    info!(
        backend = "firebase",
        database = %firebase.database_url,
        "using Firebase adapters"
    );
    Ok(Ports {
        store: Arc::new(store),
        identity: Arc::new(identity),
        memory: None,
    })
}

/// Wire services over `ports` and start tracking the users collection.
pub fn build_http_state(settings: &AdminSettings, ports: &Ports) -> io::Result<BuiltState> {
    let directory = Arc::new(UserDirectory::new());
    let live_updates = attach_live_updates(ports.store.as_ref(), Arc::clone(&directory))
        .map_err(|err| io_error("failed to subscribe to users", err))?;

    let dashboard = DashboardService::new(Arc::clone(&ports.store), directory)
        .with_policy(settings.reconciliation_policy())
        .with_recent_limit(settings.recent_limit());
    let login = AdminLoginService::new(Arc::clone(&ports.identity), Arc::clone(&ports.store));
    let gate = SessionGate::new(Arc::new(DefaultClock));
    let gate = match settings.session_max_age() {
        Some(max_age) => gate.with_max_age(max_age),
        None => gate,
    };

    Ok(BuiltState {
        http_state: web::Data::new(HttpState::new(
            Arc::new(login),
            Arc::new(dashboard),
            gate,
        )),
        live_updates,
    })
}
