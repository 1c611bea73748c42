//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see domain services,
//! so they stay testable against in-memory adapters.

use std::sync::Arc;

use crate::domain::ports::LoginService;
use crate::domain::{DashboardService, SessionGate};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Credential check plus admin-role authorization.
    pub login: Arc<dyn LoginService>,
    /// Dashboard, users and transactions use-cases.
    pub dashboard: Arc<DashboardService>,
    /// Marker-based gate run before every protected handler.
    pub gate: SessionGate,
}

impl HttpState {
    /// Bundle the services handlers depend on.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use broker_admin::domain::ports::FixtureIdentityProvider;
    /// use broker_admin::domain::{AdminLoginService, DashboardService, SessionGate, UserDirectory};
    /// use broker_admin::inbound::http::state::HttpState;
    /// use broker_admin::outbound::memory_store::InMemoryRemoteStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryRemoteStore::new());
    /// let login = AdminLoginService::new(Arc::new(FixtureIdentityProvider), store.clone());
    /// let dashboard = DashboardService::new(store, Arc::new(UserDirectory::new()));
    /// let state = HttpState::new(
    ///     Arc::new(login),
    ///     Arc::new(dashboard),
    ///     SessionGate::new(Arc::new(DefaultClock)),
    /// );
    /// let _gate = state.gate.clone();
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        dashboard: Arc<DashboardService>,
        gate: SessionGate,
    ) -> Self {
        Self {
            login,
            dashboard,
            gate,
        }
    }
}
