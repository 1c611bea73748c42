//! Dashboard home handlers.
//!
//! ```text
//! GET /api/v1/dashboard?search=ana
//! GET /api/v1/stats
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{DashboardOverview, DashboardStats, Error, SearchQuery};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Free-text search shared by the listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring; empty matches everything.
    #[serde(default)]
    pub search: String,
}

impl SearchParams {
    pub(crate) fn query(&self) -> SearchQuery {
        SearchQuery::new(&self.search)
    }
}

/// Stats, recent users, recent transactions and the compact user search.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(SearchParams),
    responses(
        (status = 200, description = "Dashboard overview", body = DashboardOverview),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 403, description = "Store denied access", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboardOverview"
)]
#[get("/dashboard")]
pub async fn dashboard_overview(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<DashboardOverview>> {
    session.require_admin(&state.gate)?;
    let overview = state.dashboard.overview(&params.query()).await;
    session.revoke_if_forbidden(&state.gate, overview).map(web::Json)
}

/// Headline totals.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Totals", body = DashboardStats),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "dashboardStats"
)]
#[get("/stats")]
pub async fn dashboard_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DashboardStats>> {
    session.require_admin(&state.gate)?;
    let stats = state.dashboard.stats().await;
    session.revoke_if_forbidden(&state.gate, stats).map(web::Json)
}
