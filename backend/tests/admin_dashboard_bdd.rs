//! Behaviour tests for the admin dashboard API.
//!
//! Each scenario runs a real Actix server over the in-memory store, with the
//! fixture identity provider and live user updates attached, and drives it
//! through `reqwest` the way the dashboard front end would.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::{Cell, RefCell};
use std::net::TcpListener;
use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use broker_admin::Trace;
use broker_admin::domain::ports::{
    FIXTURE_ADMIN_EMAIL, FixtureIdentityProvider, StorePath, Subscription,
};
use broker_admin::domain::{
    ACCESS_DENIED_MESSAGE, AdminLoginService, DashboardService, SessionGate, TRACE_ID_HEADER,
    UNKNOWN_USER, UserDirectory, attach_live_updates,
};
use broker_admin::inbound::http::configure_api;
use broker_admin::inbound::http::state::HttpState;
use broker_admin::outbound::memory_store::InMemoryRemoteStore;
use mockable::DefaultClock;
use reqwest::Method;
use reqwest::header::SET_COOKIE;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

struct AdminWorld {
    runtime: Runtime,
    local: LocalSet,
    base_url: String,
    server: ServerHandle,
    store: InMemoryRemoteStore,
    client: reqwest::Client,
    live_updates: RefCell<Option<Subscription>>,
    session_cookie: RefCell<Option<String>>,
    last_status: Cell<Option<u16>>,
    last_trace_id: RefCell<Option<String>>,
    last_body: RefCell<Option<Value>>,
}

impl Drop for AdminWorld {
    fn drop(&mut self) {
        if let Some(subscription) = self.live_updates.borrow_mut().take() {
            subscription.unsubscribe();
        }
        let server = self.server.clone();
        self.local.block_on(&self.runtime, async move {
            server.stop(true).await;
        });
    }
}

fn seed_tree() -> Value {
    json!({
        "users": {
            "admin": { "fullName": "Root", "email": FIXTURE_ADMIN_EMAIL, "role": "admin", "createdAt": 1 },
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
            { "userId": "u1", "type": "deposit", "amount": "$50", "timestamp": 10, "description": "Wire in" },
            { "userId": "deleted-account", "type": "withdrawal", "amount": 5, "timestamp": 20 }
        ]
    })
}

fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_path("/".to_owned())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(CookieDuration::hours(2)))
        .build()
}

fn spawn_server(store: &InMemoryRemoteStore) -> Result<(String, ServerHandle, Subscription), String> {
    let directory = Arc::new(UserDirectory::new());
    let live_updates =
        attach_live_updates(store, Arc::clone(&directory)).map_err(|err| err.to_string())?;
    let shared = Arc::new(store.clone());
    let login = AdminLoginService::new(Arc::new(FixtureIdentityProvider), shared.clone());
    let dashboard = DashboardService::new(shared, directory);
    let state = web::Data::new(HttpState::new(
        Arc::new(login),
        Arc::new(dashboard),
        SessionGate::new(Arc::new(DefaultClock)),
    ));

    let key = Key::generate();
    let listener = TcpListener::bind("127.0.0.1:0").map_err(|err| err.to_string())?;
    let addr = listener.local_addr().map_err(|err| err.to_string())?;
    let server = HttpServer::new(move || {
        App::new().app_data(state.clone()).wrap(Trace).service(
            web::scope("/api/v1")
                .wrap(session_middleware(key.clone()))
                .configure(configure_api),
        )
    })
    .disable_signals()
    .workers(1)
    .listen(listener)
    .map_err(|err| err.to_string())?
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);
    Ok((format!("http://{addr}"), handle, live_updates))
}

#[fixture]
fn world() -> AdminWorld {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let local = LocalSet::new();
    let store = InMemoryRemoteStore::with_tree(seed_tree());
    let (base_url, server, live_updates) = local
        .block_on(&runtime, async { spawn_server(&store) })
        .expect("admin server");

    AdminWorld {
        runtime,
        local,
        base_url,
        server,
        store,
        client: reqwest::Client::new(),
        live_updates: RefCell::new(Some(live_updates)),
        session_cookie: RefCell::new(None),
        last_status: Cell::new(None),
        last_trace_id: RefCell::new(None),
        last_body: RefCell::new(None),
    }
}

/// Session cookie pair carried by `response`, `Some(None)` when it was
/// cleared and `None` when the response did not touch it.
fn updated_session_cookie(response: &reqwest::Response) -> Option<Option<String>> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find_map(|pair| pair.strip_prefix("session="))
        .map(|value| (!value.is_empty()).then(|| format!("session={value}")))
}

impl AdminWorld {
    fn send(&self, method: Method, path: &str, query: &[(&str, &str)], payload: Option<Value>) {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .query(query);
        if let Some(cookie) = self.session_cookie.borrow().clone() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(payload) = payload {
            request = request.json(&payload);
        }

        let (status, cookie, trace_id, body) = self.local.block_on(&self.runtime, async move {
            let response = request.send().await.expect("request");
            let status = response.status().as_u16();
            let cookie = updated_session_cookie(&response);
            let trace_id = response
                .headers()
                .get(TRACE_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let bytes = response.bytes().await.expect("response body");
            let body = (!bytes.is_empty())
                .then(|| serde_json::from_slice::<Value>(&bytes).expect("json body"));
            (status, cookie, trace_id, body)
        });

        if let Some(cookie) = cookie {
            self.session_cookie.replace(cookie);
        }
        self.last_status.set(Some(status));
        self.last_trace_id.replace(trace_id);
        self.last_body.replace(body);
    }

    fn sign_in(&self) {
        self.send(
            Method::POST,
            "/api/v1/login",
            &[],
            Some(json!({ "email": FIXTURE_ADMIN_EMAIL, "password": "password" })),
        );
    }

    fn body(&self) -> Value {
        self.last_body.borrow().clone().expect("response body")
    }

    /// Run the runtime briefly so the live update task sees store changes.
    fn settle(&self) {
        self.local.block_on(&self.runtime, tokio::task::yield_now());
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim_matches('"')
}

#[given("a running admin server")]
fn a_running_admin_server(world: &AdminWorld) {
    assert!(world.base_url.starts_with("http://"));
}

#[given("the admin has signed in")]
fn the_admin_has_signed_in(world: &AdminWorld) {
    world.sign_in();
    assert_eq!(world.last_status.get(), Some(200));
    assert!(world.session_cookie.borrow().is_some());
}

#[given("the admin account has lost its role")]
fn the_admin_account_has_lost_its_role(world: &AdminWorld) {
    let path = StorePath::from_segments(["users", "admin", "role"]).expect("role path");
    world.store.set(&path, json!("user"));
}

#[when("the admin signs in")]
fn the_admin_signs_in(world: &AdminWorld) {
    world.sign_in();
}

#[when("the client requests the dashboard")]
fn the_client_requests_the_dashboard(world: &AdminWorld) {
    world.send(Method::GET, "/api/v1/dashboard", &[], None);
}

#[when("the client renames user {id} to {name}")]
fn the_client_renames_user(world: &AdminWorld, id: String, name: String) {
    let path = format!("/api/v1/users/{}", unquote(&id));
    world.send(
        Method::PATCH,
        &path,
        &[],
        Some(json!({ "fullName": unquote(&name) })),
    );
    assert_eq!(world.last_status.get(), Some(200));
    world.settle();
}

#[when("the client searches users for {term}")]
fn the_client_searches_users(world: &AdminWorld, term: String) {
    world.send(Method::GET, "/api/v1/users", &[("search", unquote(&term))], None);
}

#[when("the client searches transactions for {term}")]
fn the_client_searches_transactions(world: &AdminWorld, term: String) {
    world.send(
        Method::GET,
        "/api/v1/transactions",
        &[("search", unquote(&term))],
        None,
    );
}

#[when("the client signs out")]
fn the_client_signs_out(world: &AdminWorld) {
    world.send(Method::POST, "/api/v1/logout", &[], None);
    assert_eq!(world.last_status.get(), Some(204));
}

#[then("the response is unauthorised with a login redirect")]
fn the_response_is_unauthorised_with_a_login_redirect(world: &AdminWorld) {
    assert_eq!(world.last_status.get(), Some(401));
    let body = world.body();
    assert_eq!(body["code"], json!("unauthorized"));
    assert_eq!(body["details"]["redirect"], json!("/"));
    let trace_id = world.last_trace_id.borrow().clone().expect("trace id header");
    assert_eq!(body["traceId"], json!(trace_id));
}

#[then("the dashboard reports {users} users and {transactions} transactions")]
fn the_dashboard_reports(world: &AdminWorld, users: u64, transactions: u64) {
    assert_eq!(world.last_status.get(), Some(200));
    let body = world.body();
    assert_eq!(body["stats"]["totalUsers"], json!(users));
    assert_eq!(body["stats"]["totalTransactions"], json!(transactions));
}

#[then("the total balance is {balance}")]
fn the_total_balance_is(world: &AdminWorld, balance: f64) {
    assert_eq!(world.body()["stats"]["totalBalance"].as_f64(), Some(balance));
}

#[then("the response is forbidden with the access denied message")]
fn the_response_is_forbidden(world: &AdminWorld) {
    assert_eq!(world.last_status.get(), Some(403));
    assert_eq!(world.body()["message"], json!(ACCESS_DENIED_MESSAGE));
    assert!(world.session_cookie.borrow().is_none());
}

#[then("the user listing holds only {id}")]
fn the_user_listing_holds_only(world: &AdminWorld, id: String) {
    assert_eq!(world.last_status.get(), Some(200));
    let body = world.body();
    let ids: Vec<&str> = body
        .as_array()
        .expect("user array")
        .iter()
        .filter_map(|user| user["id"].as_str())
        .collect();
    assert_eq!(ids, [unquote(&id)]);
}

#[then("every listed transaction belongs to {name}")]
fn every_listed_transaction_belongs_to(world: &AdminWorld, name: String) {
    assert_eq!(world.last_status.get(), Some(200));
    let body = world.body();
    let transactions = body.as_array().expect("transaction array");
    assert!(!transactions.is_empty());
    assert_eq!(unquote(&name), UNKNOWN_USER);
    assert!(
        transactions
            .iter()
            .all(|tx| tx["userName"] == json!(UNKNOWN_USER))
    );
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "Protected views redirect to login without a session"
)]
fn protected_views_redirect_to_login_without_a_session(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "The admin sees headline figures after signing in"
)]
fn the_admin_sees_headline_figures_after_signing_in(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "Accounts without the admin role are refused"
)]
fn accounts_without_the_admin_role_are_refused(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "Edits to a user show up in the listing"
)]
fn edits_to_a_user_show_up_in_the_listing(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "Transactions of deleted accounts resolve to Unknown User"
)]
fn transactions_of_deleted_accounts_resolve_to_unknown_user(world: AdminWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/admin_dashboard.feature",
    name = "Signing out ends the session"
)]
fn signing_out_ends_the_session(world: AdminWorld) {
    drop(world);
}
