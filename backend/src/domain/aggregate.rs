//! Summary statistics and "recent N" projections over normalized records.

use serde::Serialize;
use utoipa::ToSchema;

use super::record::Timestamp;
use super::transaction::TransactionRecord;
use super::user::UserRecord;

/// Headline figures shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_balance: f64,
    pub total_profit: f64,
    pub total_transactions: usize,
}

/// Compute dashboard totals from sanitized records.
///
/// Profit uses `total_profit`, which the normalizer already backfills from
/// the legacy `profit` key.
pub fn summarize(users: &[UserRecord], transactions: &[TransactionRecord]) -> DashboardStats {
    DashboardStats {
        total_users: users.len(),
        total_balance: stable_sum(users.iter().map(|user| user.balance)),
        total_profit: stable_sum(users.iter().map(|user| user.total_profit)),
        total_transactions: transactions.len(),
    }
}

/// Sum that does not depend on the order values arrive in.
///
/// Floating-point addition is not associative, so values are put into a
/// canonical order before adding.
pub fn stable_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Records exposing timestamp-like fields by upstream name.
pub trait Timestamped {
    /// Timestamp stored under `name`, if any.
    fn timestamp_field(&self, name: &str) -> Option<Timestamp>;
}

impl Timestamped for UserRecord {
    fn timestamp_field(&self, name: &str) -> Option<Timestamp> {
        match name {
            "createdAt" => self.created_at.clone(),
            other => self.extra.get(other).and_then(Timestamp::from_value),
        }
    }
}

impl Timestamped for TransactionRecord {
    fn timestamp_field(&self, name: &str) -> Option<Timestamp> {
        match name {
            "timestamp" => self.timestamp.clone(),
            other => self.extra.get(other).and_then(Timestamp::from_value),
        }
    }
}

/// Ordered candidate fields used to sort a "recent" projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    candidates: Vec<String>,
}

impl SortKey {
    /// Sort by the first of `candidates` present on each record.
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    /// Users: account creation, then a legacy `timestamp` field.
    pub fn user_created() -> Self {
        Self::new(["createdAt", "timestamp"])
    }

    /// Transactions: the normalized transaction time.
    pub fn transaction_time() -> Self {
        Self::new(["timestamp", "date", "createdAt"])
    }

    /// Numeric ordering value for `record`; `0.0` when no candidate is set.
    pub fn ordering_key<T: Timestamped>(&self, record: &T) -> f64 {
        self.candidates
            .iter()
            .find_map(|name| record.timestamp_field(name))
            .map_or(0.0, |timestamp| timestamp.ordering_key())
    }
}

/// Newest `limit` records, leaving `records` untouched.
///
/// The sort is stable and descending, so ties keep their original relative
/// order and records without a timestamp come last.
///
/// # Examples
/// ```
/// use broker_admin::domain::{normalize_transactions, recent, SortKey};
/// use serde_json::json;
///
/// let txs = normalize_transactions(&json!([
///     { "description": "old", "timestamp": 1 },
///     { "description": "new", "timestamp": 9 },
///     { "description": "undated" }
/// ]));
/// let newest = recent(&txs, &SortKey::transaction_time(), 2);
/// let labels: Vec<_> = newest.iter().map(|t| t.description.as_deref()).collect();
/// assert_eq!(labels, [Some("new"), Some("old")]);
/// ```
pub fn recent<T>(records: &[T], key: &SortKey, limit: usize) -> Vec<T>
where
    T: Timestamped + Clone,
{
    let mut keyed: Vec<(f64, &T)> = records
        .iter()
        .map(|record| (key.ordering_key(record), record))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| b.total_cmp(a));
    keyed
        .into_iter()
        .take(limit)
        .map(|(_, record)| record.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{normalize_transactions, normalize_users};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn users() -> Vec<UserRecord> {
        normalize_users(&json!({
            "u1": { "fullName": "Ana", "balance": "$1,200.50", "totalProfit": 300, "createdAt": 10 },
            "u2": { "fullName": "Bo", "accountBalance": 50, "profit": "20", "createdAt": "1970-01-01T00:00:00.030Z" },
            "u3": { "fullName": "Cy", "balance": "junk", "timestamp": 20 },
            "u4": { "fullName": "Di" }
        }))
    }

    #[rstest]
    fn single_user_scenario() {
        let users = normalize_users(&json!({
            "u1": { "fullName": "Ana Lee", "balance": "$1,200.50", "totalProfit": 300 }
        }));
        let stats = summarize(&users, &[]);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_balance, 1200.5);
        assert_eq!(stats.total_profit, 300.0);
        assert_eq!(stats.total_transactions, 0);
    }

    #[rstest]
    fn totals_use_sanitized_fields(users: Vec<UserRecord>) {
        let txs = normalize_transactions(&json!([{ "amount": 1 }, null, { "amount": 2 }]));
        let stats = summarize(&users, &txs);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_balance, 1250.5);
        assert_eq!(stats.total_profit, 320.0);
        assert_eq!(stats.total_transactions, 2);
    }

    #[rstest]
    fn totals_do_not_depend_on_insertion_order() {
        let values = [0.1, 1e16, 0.2, -1e16, 0.3, 7.25, -0.05];
        let forward = stable_sum(values);
        let mut reversed = values;
        reversed.reverse();
        let mut rotated = values;
        rotated.rotate_left(3);
        assert_eq!(stable_sum(reversed).to_bits(), forward.to_bits());
        assert_eq!(stable_sum(rotated).to_bits(), forward.to_bits());
    }

    #[rstest]
    fn recent_users_sort_by_candidate_chain(users: Vec<UserRecord>) {
        let newest = recent(&users, &SortKey::user_created(), 10);
        let ids: Vec<_> = newest.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, ["u2", "u3", "u1", "u4"]);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(4)]
    #[case(9)]
    fn recent_is_a_prefix_of_the_full_sort(users: Vec<UserRecord>, #[case] limit: usize) {
        let key = SortKey::user_created();
        let full = recent(&users, &key, users.len());
        let prefix = recent(&users, &key, limit);
        assert!(prefix.len() <= limit);
        assert_eq!(prefix.as_slice(), &full[..prefix.len()]);
        let keys: Vec<_> = prefix.iter().map(|u| key.ordering_key(u)).collect();
        assert!(keys.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[rstest]
    fn ties_keep_original_order() {
        let txs = normalize_transactions(&json!([
            { "description": "a", "timestamp": 5 },
            { "description": "b" },
            { "description": "c", "timestamp": 5 },
            { "description": "d" }
        ]));
        let ordered = recent(&txs, &SortKey::transaction_time(), 4);
        let labels: Vec<_> = ordered
            .iter()
            .map(|t| t.description.clone().unwrap_or_default())
            .collect();
        assert_eq!(labels, ["a", "c", "b", "d"]);
    }

    #[rstest]
    fn recent_leaves_source_untouched(users: Vec<UserRecord>) {
        let before = users.clone();
        let _ = recent(&users, &SortKey::user_created(), 2);
        assert_eq!(users, before);
    }

    #[rstest]
    #[case(json!({ "createdAt": 5 }), 5.0)]
    #[case(json!({ "timestamp": "12" }), 12.0)]
    #[case(json!({ "createdAt": "not a date", "timestamp": 99 }), 0.0)]
    #[case(json!({}), 0.0)]
    fn user_ordering_keys(#[case] bag: Value, #[case] expected: f64) {
        let users = normalize_users(&json!({ "u": bag }));
        assert_eq!(SortKey::user_created().ordering_key(&users[0]), expected);
    }
}
