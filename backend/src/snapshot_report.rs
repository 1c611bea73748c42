//! Offline dashboard report over raw snapshot files.
//!
//! Runs the same normalizer, aggregator and search as the live dashboard on
//! snapshot JSON exported from the store, without any network access.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::ports::{TRANSACTIONS_COLLECTION, USERS_COLLECTION};
use crate::domain::{
    ADAPTER_VERSION, DashboardStats, KindFilter, ResolvedTransaction, SearchQuery, SortKey,
    TransactionRecord, UserRecord, UserSearchFields, filter_transactions, filter_users,
    normalize_transactions, normalize_users, recent, summarize,
};

/// Errors raised while loading snapshot files.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A snapshot file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A snapshot file is not JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the raw collections come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// One file holding the database root with both collections.
    Tree(PathBuf),
    /// Separate collection files; a missing transactions file means none.
    Collections {
        users: PathBuf,
        transactions: Option<PathBuf>,
    },
}

/// Raw `users` and `transactions` snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSnapshots {
    pub users: Value,
    pub transactions: Value,
}

impl SnapshotSource {
    /// Read and parse the referenced files.
    pub fn load(&self) -> Result<RawSnapshots, ReportError> {
        match self {
            Self::Tree(path) => {
                let mut root = read_json(path)?;
                Ok(RawSnapshots {
                    users: take_child(&mut root, USERS_COLLECTION),
                    transactions: take_child(&mut root, TRANSACTIONS_COLLECTION),
                })
            }
            Self::Collections {
                users,
                transactions,
            } => Ok(RawSnapshots {
                users: read_json(users)?,
                transactions: match transactions {
                    Some(path) => read_json(path)?,
                    None => Value::Null,
                },
            }),
        }
    }
}

fn read_json(path: &Path) -> Result<Value, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ReportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn take_child(root: &mut Value, key: &str) -> Value {
    root.as_object_mut()
        .and_then(|children| children.remove(key))
        .unwrap_or(Value::Null)
}

/// Report printed by `snapshot-report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    pub adapter_version: u32,
    pub stats: DashboardStats,
    pub recent_users: Vec<UserRecord>,
    pub recent_transactions: Vec<TransactionRecord>,
    pub matching_users: Vec<UserRecord>,
    pub matching_transactions: Vec<ResolvedTransaction>,
}

/// Normalize both snapshots and derive the dashboard figures.
///
/// # Examples
/// ```
/// use broker_admin::domain::{KindFilter, SearchQuery};
/// use broker_admin::snapshot_report::{RawSnapshots, build_report};
/// use serde_json::json;
///
/// let raw = RawSnapshots {
///     users: json!({ "u1": { "name": "Ana", "balance": "$1,000" } }),
///     transactions: json!([null, { "userId": "u1", "type": "deposit", "amount": 5 }]),
/// };
/// let report = build_report(&raw, &SearchQuery::default(), KindFilter::All, 5);
/// assert_eq!(report.stats.total_balance, 1000.0);
/// assert_eq!(report.matching_transactions[0].user_name, "Ana");
/// ```
pub fn build_report(
    raw: &RawSnapshots,
    search: &SearchQuery,
    kinds: KindFilter,
    limit: usize,
) -> SnapshotReport {
    let users = normalize_users(&raw.users);
    let transactions = normalize_transactions(&raw.transactions);
    SnapshotReport {
        adapter_version: ADAPTER_VERSION,
        stats: summarize(&users, &transactions),
        recent_users: recent(&users, &SortKey::user_created(), limit),
        recent_transactions: recent(&transactions, &SortKey::transaction_time(), limit),
        matching_users: filter_users(&users, search, UserSearchFields::LISTING, None),
        matching_transactions: filter_transactions(&transactions, &users, search, kinds),
    }
}
