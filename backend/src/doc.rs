//! OpenAPI document for the admin API.
//!
//! Registers every `/api/v1` handler, the health probes, the domain payload
//! schemas and the session cookie security scheme. Swagger UI serves it in
//! debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    DashboardOverview, DashboardStats, Error, ErrorCode, ResolvedTransaction, SessionMarker,
    TransactionKind, TransactionRecord, TransactionStatus, UserPatch, UserRecord,
};
use crate::inbound::http::auth::LoginRequest;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Broker admin API",
        description = "Admin dashboard over the broker's realtime store: stats, users and transactions behind an admin session."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::dashboard::dashboard_overview,
        crate::inbound::http::dashboard::dashboard_stats,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::transactions::list_transactions,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        LoginRequest,
        SessionMarker,
        DashboardStats,
        DashboardOverview,
        UserRecord,
        UserPatch,
        TransactionRecord,
        TransactionKind,
        TransactionStatus,
        ResolvedTransaction,
    )),
    tags(
        (name = "session", description = "Admin login, logout and session state"),
        (name = "dashboard", description = "Totals and recent activity"),
        (name = "users", description = "User records"),
        (name = "transactions", description = "Transaction records"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
