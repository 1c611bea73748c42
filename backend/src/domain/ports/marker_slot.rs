//! Port for the single persisted slot holding the admin session marker.
//!
//! Reads and writes are synchronous: the session gate decides without
//! waiting on anything.

use std::sync::{Mutex, PoisonError};

use super::define_port_error;

define_port_error! {
    /// Errors raised by marker slot adapters.
    pub enum MarkerSlotError {
        /// The backing storage could not be read or written.
        Unavailable { message: String } => "session marker storage unavailable: {message}",
    }
}

/// String-keyed slot holding the JSON-encoded session marker.
#[cfg_attr(test, mockall::automock)]
pub trait MarkerSlot {
    /// Raw marker text, if any.
    fn read(&self) -> Result<Option<String>, MarkerSlotError>;

    /// Replace the marker text.
    fn write(&self, value: &str) -> Result<(), MarkerSlotError>;

    /// Remove the marker.
    fn clear(&self);
}

/// Process-local slot used by tests and offline tooling.
#[derive(Debug, Default)]
pub struct FixtureMarkerSlot(Mutex<Option<String>>);

impl FixtureMarkerSlot {
    /// Slot pre-filled with `value`.
    pub fn holding(value: impl Into<String>) -> Self {
        Self(Mutex::new(Some(value.into())))
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MarkerSlot for FixtureMarkerSlot {
    fn read(&self) -> Result<Option<String>, MarkerSlotError> {
        Ok(self.slot().clone())
    }

    fn write(&self, value: &str) -> Result<(), MarkerSlotError> {
        *self.slot() = Some(value.to_owned());
        Ok(())
    }

    fn clear(&self) {
        self.slot().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn fixture_slot_round_trips_and_clears() {
        let slot = FixtureMarkerSlot::default();
        assert_eq!(slot.read(), Ok(None));
        slot.write("{}").expect("write");
        assert_eq!(slot.read(), Ok(Some("{}".to_owned())));
        slot.clear();
        assert_eq!(slot.read(), Ok(None));
    }
}
