//! Transactions API handler.
//!
//! ```text
//! GET /api/v1/transactions?search=wire&type=deposit
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use crate::domain::{Error, KindFilter, ResolvedTransaction, SearchQuery};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Filters for the transactions listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionParams {
    /// Matches the description or the resolved user name.
    #[serde(default)]
    pub search: String,
    /// `all` (default) or one of `deposit`, `withdrawal`, `profit`,
    /// `investment`.
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Transactions with their user's name, filtered by text and type.
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(TransactionParams),
    responses(
        (status = 200, description = "Matching transactions", body = [ResolvedTransaction]),
        (status = 400, description = "Unknown transaction type", body = Error),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["transactions"],
    operation_id = "listTransactions"
)]
#[get("/transactions")]
pub async fn list_transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<TransactionParams>,
) -> ApiResult<web::Json<Vec<ResolvedTransaction>>> {
    session.require_admin(&state.gate)?;
    let kinds = params.kind.parse::<KindFilter>().map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "type",
            "value": params.kind,
            "code": "invalid_type",
        }))
    })?;
    let transactions = state
        .dashboard
        .list_transactions(&SearchQuery::new(&params.search), kinds)
        .await;
    session
        .revoke_if_forbidden(&state.gate, transactions)
        .map(web::Json)
}
