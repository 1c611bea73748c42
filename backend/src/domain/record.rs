//! Identifier and timestamp primitives shared by user and transaction records.

use std::fmt;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Characters the realtime store refuses inside a key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// Validation errors returned by [`RecordId::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordIdError {
    /// Identifier was empty or whitespace.
    Empty,
    /// Identifier contained a character the store reserves.
    ForbiddenCharacter(char),
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "record id must not be empty"),
            Self::ForbiddenCharacter(c) => write!(f, "record id must not contain '{c}'"),
        }
    }
}

impl std::error::Error for RecordIdError {}

/// Opaque record identifier: the remote document key, or a synthesized
/// positional index for list-shaped snapshots.
///
/// Identifiers produced by normalization are taken verbatim. Identifiers that
/// arrive from callers go through [`RecordId::parse`] so they are safe to
/// splice into a store path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a key taken from a snapshot.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Validate an identifier supplied by a caller.
    ///
    /// # Examples
    /// ```
    /// use broker_admin::domain::{RecordId, RecordIdError};
    ///
    /// assert!(RecordId::parse("-Nx81ab").is_ok());
    /// assert_eq!(RecordId::parse("a/b"), Err(RecordIdError::ForbiddenCharacter('/')));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, RecordIdError> {
        if raw.trim().is_empty() {
            return Err(RecordIdError::Empty);
        }
        if let Some(c) = raw.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c)) {
            return Err(RecordIdError::ForbiddenCharacter(c));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp-like value used only for ordering.
///
/// Upstream documents mix epoch milliseconds with date strings; the raw form
/// is kept so it serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Numeric value, conventionally epoch milliseconds.
    Number(f64),
    /// Textual value: numeric text or an RFC 3339 / ISO date.
    Text(String),
}

impl Timestamp {
    /// Read a timestamp from a raw field, ignoring shapes that cannot order.
    pub fn from_value(raw: &Value) -> Option<Self> {
        match raw {
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) if !s.is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Numeric ordering key in epoch milliseconds; `0.0` when unparsable.
    pub fn ordering_key(&self) -> f64 {
        match self {
            Self::Number(n) if n.is_finite() => *n,
            Self::Number(_) => 0.0,
            Self::Text(text) => text_ordering_key(text),
        }
    }
}

fn text_ordering_key(text: &str) -> f64 {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        return if n.is_finite() { n } else { 0.0 };
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return millis(parsed.timestamp_millis());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map_or(0.0, |dt| millis(dt.and_utc().timestamp_millis()));
    }
    0.0
}

#[expect(
    clippy::cast_precision_loss,
    reason = "epoch milliseconds stay far below 2^53"
)]
fn millis(value: i64) -> f64 {
    value as f64
}
