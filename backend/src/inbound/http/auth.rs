//! Admin session handlers.
//!
//! ```text
//! POST /api/v1/login {"email":"admin@example.com","password":"password"}
//! POST /api/v1/logout
//! GET  /api/v1/session
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::IdentityHandle;
use crate::domain::{
    Error, INCOMPLETE_LOGIN_MESSAGE, LoginCredentials, LoginValidationError, SessionMarker,
    SessionState,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login form body. Missing fields count as blank.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_login_validation_error(err: &LoginValidationError) -> Error {
    Error::invalid_request(INCOMPLETE_LOGIN_MESSAGE).with_details(json!({
        "field": err.field(),
        "code": "missing_field",
    }))
}

/// Sign in an admin and persist the session marker.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionMarker,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "A field is blank", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 403, description = "Identity lacks the admin role", body = Error),
        (status = 503, description = "Identity provider or store unavailable", body = Error)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let credentials =
        LoginCredentials::try_from(&request).map_err(|err| map_login_validation_error(&err))?;
    let identity = state.login.authenticate(&credentials).await?;
    let marker = state
        .gate
        .establish(&session, &identity.email, &identity.uid)
        .map_err(|err| Error::internal(format!("failed to persist session: {err}")))?;
    Ok(HttpResponse::Ok().json(marker))
}

/// Clear the marker and revoke the provider session, best effort.
///
/// Always succeeds, even without a session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Signed out")),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, session: SessionContext) -> HttpResponse {
    if let SessionState::Authenticated(marker) = state.gate.check(&session) {
        state
            .login
            .sign_out(&IdentityHandle {
                uid: marker.uid,
                email: marker.email,
            })
            .await;
    }
    state.gate.end(&session);
    HttpResponse::NoContent().finish()
}

/// Current admin session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Active admin session", body = SessionMarker),
        (status = 401, description = "No valid session; details carry the redirect", body = Error)
    ),
    tags = ["session"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionMarker>> {
    session.require_admin(&state.gate).map(web::Json)
}
