//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::{App, web};
use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use serde_json::{Value, json};

use crate::domain::ports::{FIXTURE_ADMIN_EMAIL, FixtureIdentityProvider};
use crate::domain::{AdminLoginService, DashboardService, SessionGate, UserDirectory};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory_store::InMemoryRemoteStore;

/// Build a session middleware configured for tests.
///
/// A fresh key per call; the `Secure` flag is off for plain HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Instant every test clock reports.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixed time")
}

/// Gate over a clock frozen at [`fixed_now`].
pub fn fixed_gate() -> SessionGate {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixed_now());
    SessionGate::new(Arc::new(clock))
}

/// The `session` cookie set on `response`.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Store holding an admin `admin` (the fixture identity), a plain user and
/// a few transactions.
pub fn seeded_store() -> InMemoryRemoteStore {
    InMemoryRemoteStore::with_tree(seed_tree())
}

/// Raw tree behind [`seeded_store`].
pub fn seed_tree() -> Value {
    json!({
        "users": {
            "admin": { "fullName": "Root", "email": "admin@example.com", "role": "admin", "createdAt": 1 },
            "u1": {
                "fullName": "Ana Lee",
                "email": "ana@broker.io",
                "country": "Chile",
                "balance": "$1,200.50",
                "profit": 40,
                "createdAt": 30
            },
            "u2": { "name": "Bo", "email": "bo@x.io", "accountBalance": 10, "createdAt": 20 }
        },
        "transactions": [
            null,
            { "userId": "u1", "type": "deposit", "amount": "$50", "timestamp": 10, "status": "completed", "description": "Wire in" },
            { "userId": "ghost", "type": "withdrawal", "amount": 5, "timestamp": 20, "status": "pending" }
        ]
    })
}

/// Handler state over `store` with the fixture identity provider.
pub fn state_over(store: InMemoryRemoteStore) -> HttpState {
    let store = Arc::new(store);
    let login = AdminLoginService::new(Arc::new(FixtureIdentityProvider), store.clone());
    let dashboard = DashboardService::new(store, Arc::new(UserDirectory::new()));
    HttpState::new(Arc::new(login), Arc::new(dashboard), fixed_gate())
}

/// App exposing the whole `/api/v1` surface over `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(state)).service(
        web::scope("/api/v1")
            .wrap(test_session_middleware())
            .configure(configure_api),
    )
}

/// Login request for the fixture admin.
pub fn admin_login_request() -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "email": FIXTURE_ADMIN_EMAIL, "password": "password" }))
}
