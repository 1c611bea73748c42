//! Users API handlers.
//!
//! ```text
//! GET    /api/v1/users?search=ana
//! GET    /api/v1/users/{id}
//! PATCH  /api/v1/users/{id} {"fullName":"Ana Lee","balance":"$1,200.50"}
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, web};
use serde_json::{Value, json};

use crate::domain::{Error, RecordId, UserPatch, UserRecord};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dashboard::SearchParams;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn parse_user_id(raw: &str) -> Result<RecordId, Error> {
    RecordId::parse(raw).map_err(|err| {
        Error::invalid_request(format!("invalid user id: {err}")).with_details(json!({
            "field": "id",
            "value": raw,
            "code": "invalid_id",
        }))
    })
}

fn parse_patch(body: Value) -> Result<UserPatch, Error> {
    serde_json::from_value(body).map_err(|err| {
        Error::invalid_request(format!("invalid user patch: {err}"))
            .with_details(json!({ "code": "invalid_patch" }))
    })
}

/// Users filtered on name, email and country.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching users", body = [UserRecord]),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<Vec<UserRecord>>> {
    session.require_admin(&state.gate)?;
    let users = state.dashboard.list_users(&params.query()).await;
    session.revoke_if_forbidden(&state.gate, users).map(web::Json)
}

/// One user by id.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User document key")),
    responses(
        (status = 200, description = "User", body = UserRecord),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserRecord>> {
    session.require_admin(&state.gate)?;
    let id = parse_user_id(&path)?;
    let user = state.dashboard.get_user(&id).await;
    session.revoke_if_forbidden(&state.gate, user).map(web::Json)
}

/// Edit a user. Amounts are sanitized; role and password are not editable.
///
/// The local collection changes before the store confirms. A failed write
/// is reported, and the local change is kept or reverted per configuration.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User document key")),
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated user", body = UserRecord),
        (status = 400, description = "Malformed id or patch", body = Error),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 403, description = "Store denied the write", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<web::Json<UserRecord>> {
    session.require_admin(&state.gate)?;
    let id = parse_user_id(&path)?;
    let patch = parse_patch(payload.into_inner())?;
    let updated = state.dashboard.update_user(&id, &patch).await;
    session.revoke_if_forbidden(&state.gate, updated).map(web::Json)
}

/// Delete a user.
///
/// The user leaves the local collection immediately. If the store refuses,
/// the configured reconciliation policy decides whether the user comes back.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User document key")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "No valid admin session", body = Error),
        (status = 403, description = "Store denied the delete", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_admin(&state.gate)?;
    let id = parse_user_id(&path)?;
    let deleted = state.dashboard.delete_user(&id).await;
    session
        .revoke_if_forbidden(&state.gate, deleted)
        .map(|()| HttpResponse::NoContent().finish())
}
