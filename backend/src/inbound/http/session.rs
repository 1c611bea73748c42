//! Cookie-backed marker slot and the admin guard used by handlers.
//!
//! The marker lives under a single session key in the private session
//! cookie. Handlers never touch the Actix session directly; they call
//! [`SessionContext::require_admin`] before doing any work.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde_json::json;

use crate::domain::ports::{MarkerSlot, MarkerSlotError};
use crate::domain::{Error, ErrorCode, SessionGate, SessionMarker, SessionState};

/// Session key holding the JSON-encoded admin marker.
pub(crate) const MARKER_KEY: &str = "admin";

/// Path the client should return to when the session is not valid.
pub const LOGIN_REDIRECT: &str = "/";

/// Thin wrapper exposing the Actix session as a [`MarkerSlot`].
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap an Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Run the gate and turn a rejection into `401 Unauthorized`.
    ///
    /// The error carries `{"redirect": "/"}` so clients know to show the
    /// login screen.
    pub fn require_admin(&self, gate: &SessionGate) -> Result<SessionMarker, Error> {
        match gate.check(self) {
            SessionState::Authenticated(marker) => Ok(marker),
            SessionState::Unauthenticated(rejection) => {
                Err(Error::unauthorized("login required").with_details(json!({
                    "redirect": LOGIN_REDIRECT,
                    "reason": rejection.to_string(),
                })))
            }
        }
    }

    /// Drop the marker when `result` is an authorization denial.
    pub fn revoke_if_forbidden<T>(
        &self,
        gate: &SessionGate,
        result: Result<T, Error>,
    ) -> Result<T, Error> {
        if let Err(err) = &result {
            if err.code() == ErrorCode::Forbidden {
                gate.end(self);
            }
        }
        result
    }
}

impl MarkerSlot for SessionContext {
    fn read(&self) -> Result<Option<String>, MarkerSlotError> {
        self.0
            .get::<String>(MARKER_KEY)
            .map_err(|err| MarkerSlotError::unavailable(err.to_string()))
    }

    fn write(&self, value: &str) -> Result<(), MarkerSlotError> {
        self.0
            .insert(MARKER_KEY, value)
            .map_err(|err| MarkerSlotError::unavailable(err.to_string()))
    }

    fn clear(&self) {
        self.0.remove(MARKER_KEY);
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
