//! Session gate guarding the admin surface.
//!
//! The gate trusts a locally persisted [`SessionMarker`] and never calls out
//! to the network when deciding. It only guards the admin surface; the
//! remote store still has to enforce its own access rules.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::ports::{MarkerSlot, MarkerSlotError};

/// Proof of an admin login, persisted as JSON in the marker slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionMarker {
    pub is_admin: bool,
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "admin")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub issued_at: Option<DateTime<Utc>>,
}

/// Why a marker did not authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No marker stored.
    Missing,
    /// Marker text was not valid marker JSON.
    Unparsable,
    /// Marker did not carry `isAdmin: true`.
    NotAdmin,
    /// Marker is older than the configured maximum age.
    Expired,
    /// The slot itself could not be read.
    SlotUnavailable,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Missing => "no session marker",
            Self::Unparsable => "session marker is unparsable",
            Self::NotAdmin => "session marker lacks admin rights",
            Self::Expired => "session marker expired",
            Self::SlotUnavailable => "session storage unavailable",
        };
        f.write_str(text)
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A valid admin marker is present.
    Authenticated(SessionMarker),
    /// Protected views must redirect to login.
    Unauthenticated(Rejection),
}

impl SessionState {
    /// Whether protected views may render.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Synchronous read-decide gate over a [`MarkerSlot`].
///
/// Every rejected read clears the slot, so a corrupt marker heals itself on
/// the next check.
#[derive(Clone)]
pub struct SessionGate {
    clock: Arc<dyn Clock>,
    max_age: Option<TimeDelta>,
}

impl SessionGate {
    /// Gate with no marker expiry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            max_age: None,
        }
    }

    /// Reject markers issued longer ago than `max_age`.
    ///
    /// Markers written without `issuedAt` are still accepted.
    #[must_use]
    pub fn with_max_age(mut self, max_age: TimeDelta) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Decide whether the marker in `slot` authenticates.
    pub fn check<S>(&self, slot: &S) -> SessionState
    where
        S: MarkerSlot + ?Sized,
    {
        match self.evaluate(slot) {
            Ok(marker) => SessionState::Authenticated(marker),
            Err(rejection) => {
                if rejection == Rejection::Missing {
                    debug!("no session marker present");
                } else {
                    warn!(reason = %rejection, "discarding session marker");
                }
                slot.clear();
                SessionState::Unauthenticated(rejection)
            }
        }
    }

    fn evaluate<S>(&self, slot: &S) -> Result<SessionMarker, Rejection>
    where
        S: MarkerSlot + ?Sized,
    {
        let raw = slot
            .read()
            .map_err(|err| {
                warn!(error = %err, "session marker read failed");
                Rejection::SlotUnavailable
            })?
            .ok_or(Rejection::Missing)?;
        let marker: SessionMarker =
            serde_json::from_str(&raw).map_err(|_| Rejection::Unparsable)?;
        if !marker.is_admin {
            return Err(Rejection::NotAdmin);
        }
        if let (Some(max_age), Some(issued_at)) = (self.max_age, marker.issued_at) {
            if self.clock.utc() - issued_at > max_age {
                return Err(Rejection::Expired);
            }
        }
        Ok(marker)
    }

    /// Persist an admin marker for a freshly authorized identity.
    pub fn establish<S>(
        &self,
        slot: &S,
        email: &str,
        uid: &str,
    ) -> Result<SessionMarker, MarkerSlotError>
    where
        S: MarkerSlot + ?Sized,
    {
        let marker = SessionMarker {
            is_admin: true,
            email: email.to_owned(),
            uid: uid.to_owned(),
            issued_at: Some(self.clock.utc()),
        };
        let encoded = serde_json::to_string(&marker)
            .map_err(|err| MarkerSlotError::unavailable(err.to_string()))?;
        slot.write(&encoded)?;
        Ok(marker)
    }

    /// Drop the marker.
    pub fn end<S>(&self, slot: &S)
    where
        S: MarkerSlot + ?Sized,
    {
        slot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{FixtureMarkerSlot, MockMarkerSlot};
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid fixed time")
    }

    #[fixture]
    fn gate() -> SessionGate {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(now());
        SessionGate::new(Arc::new(clock))
    }

    fn marker_json(value: serde_json::Value) -> FixtureMarkerSlot {
        FixtureMarkerSlot::holding(value.to_string())
    }

    #[rstest]
    fn admin_marker_authenticates(gate: SessionGate) {
        let slot = marker_json(json!({ "isAdmin": true, "email": "a@b.c", "uid": "u1" }));
        let state = gate.check(&slot);
        assert!(state.is_authenticated());
        assert!(slot.read().expect("read").is_some());
    }

    #[rstest]
    #[case(FixtureMarkerSlot::default(), Rejection::Missing)]
    #[case(FixtureMarkerSlot::holding("{not json"), Rejection::Unparsable)]
    #[case(FixtureMarkerSlot::holding(r#"{"isAdmin":"true","email":"","uid":""}"#), Rejection::Unparsable)]
    #[case(FixtureMarkerSlot::holding(r#"{"isAdmin":false,"email":"a","uid":"b"}"#), Rejection::NotAdmin)]
    fn invalid_markers_redirect_and_clear(
        gate: SessionGate,
        #[case] slot: FixtureMarkerSlot,
        #[case] expected: Rejection,
    ) {
        assert_eq!(gate.check(&slot), SessionState::Unauthenticated(expected));
        assert_eq!(slot.read(), Ok(None));
    }

    #[rstest]
    fn expired_markers_are_rejected(gate: SessionGate) {
        let gate = gate.with_max_age(TimeDelta::minutes(30));
        let stale = now() - TimeDelta::minutes(31);
        let slot = marker_json(json!({
            "isAdmin": true, "email": "a@b.c", "uid": "u1", "issuedAt": stale
        }));
        assert_eq!(gate.check(&slot), SessionState::Unauthenticated(Rejection::Expired));
        assert_eq!(slot.read(), Ok(None));
    }

    #[rstest]
    fn markers_without_issue_time_ignore_max_age(gate: SessionGate) {
        let gate = gate.with_max_age(TimeDelta::minutes(30));
        let slot = marker_json(json!({ "isAdmin": true, "email": "a@b.c", "uid": "u1" }));
        assert!(gate.check(&slot).is_authenticated());
    }

    #[rstest]
    fn establish_writes_a_readable_marker(gate: SessionGate) {
        let slot = FixtureMarkerSlot::default();
        let marker = gate.establish(&slot, "a@b.c", "u1").expect("establish");
        assert_eq!(marker.issued_at, Some(now()));
        assert_eq!(gate.check(&slot), SessionState::Authenticated(marker));
        gate.end(&slot);
        assert_eq!(slot.read(), Ok(None));
    }

    #[rstest]
    fn unreadable_slot_is_treated_as_logged_out(gate: SessionGate) {
        let mut slot = MockMarkerSlot::new();
        slot.expect_read()
            .returning(|| Err(MarkerSlotError::unavailable("cookie jar gone")));
        slot.expect_clear().times(1).return_const(());
        assert_eq!(
            gate.check(&slot),
            SessionState::Unauthenticated(Rejection::SlotUnavailable)
        );
    }
}
