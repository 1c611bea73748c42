//! Broker transaction record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::record::{RecordId, Timestamp};

/// Movement category of a transaction.
///
/// Upstream values are matched case-insensitively; anything else lands on
/// [`TransactionKind::Unknown`] instead of failing normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Profit,
    Investment,
    Unknown,
}

impl TransactionKind {
    /// Map an upstream value onto a known kind.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "deposit" => Self::Deposit,
            "withdrawal" => Self::Withdrawal,
            "profit" => Self::Profit,
            "investment" => Self::Investment,
            _ => Self::Unknown,
        }
    }

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Profit => "profit",
            Self::Investment => "investment",
            Self::Unknown => "unknown",
        }
    }
}

/// Settlement status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Unknown,
}

impl TransactionStatus {
    /// Map an upstream value onto a known status.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

/// Normalized transaction.
///
/// `user_id` references a [`super::UserRecord`] by id; the reference is not
/// enforced and may dangle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[schema(value_type = String, example = "0")]
    pub id: RecordId,
    #[schema(example = "u1")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    #[schema(value_type = Option<String>)]
    pub timestamp: Option<Timestamp>,
    pub status: TransactionStatus,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl TransactionRecord {
    /// Empty record for `id`, as produced from an empty field bag.
    #[cfg(test)]
    fn empty(id: RecordId) -> Self {
        Self {
            id,
            user_id: String::new(),
            kind: TransactionKind::Unknown,
            amount: 0.0,
            timestamp: None,
            status: TransactionStatus::Unknown,
            description: None,
            extra: Map::new(),
        }
    }
}
