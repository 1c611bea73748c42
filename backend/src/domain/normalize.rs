//! Adapter from schemaless remote snapshots to typed records.
//!
//! Upstream documents drift: the same logical field shows up under several
//! names, amounts arrive as decorated strings, and collections are sometimes
//! stored as positional arrays with holes. Every fallback rule lives in the
//! [`USER_FIELD_CHAINS`] and [`TRANSACTION_FIELD_CHAINS`] tables below; bump
//! [`ADAPTER_VERSION`] when a rule changes.
//!
//! Normalization never fails. Malformed input degrades to empty collections
//! and default field values.

use serde_json::{Map, Value};
use tracing::warn;

use super::record::{RecordId, Timestamp};
use super::sanitize::sanitize_amount;
use super::transaction::{TransactionKind, TransactionRecord, TransactionStatus};
use super::user::UserRecord;

/// Revision of the field-chain tables.
pub const ADAPTER_VERSION: u32 = 1;

/// Ordered list of upstream keys consulted for one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChain {
    /// Logical field name on the record.
    pub field: &'static str,
    /// Upstream keys, most preferred first.
    pub sources: &'static [&'static str],
}

const fn chain(field: &'static str, sources: &'static [&'static str]) -> FieldChain {
    FieldChain { field, sources }
}

/// Field chains applied to user documents.
pub const USER_FIELD_CHAINS: &[FieldChain] = &[
    chain("fullName", &["fullName", "fullname", "username", "name"]),
    chain("email", &["email"]),
    chain("country", &["country"]),
    chain("phone", &["phone"]),
    chain("image", &["image"]),
    chain("balance", &["balance", "accountBalance"]),
    chain("totalProfit", &["totalProfit", "profit"]),
    chain("totalDeposit", &["totalDeposit"]),
    chain("totalWithdrawal", &["totalWithdrawal"]),
    chain("totalInvestment", &["totalInvestment"]),
    chain("firstLogin", &["firstLogin"]),
    chain("referer", &["referer"]),
    chain("role", &["role"]),
    chain("password", &["password"]),
    chain("createdAt", &["createdAt"]),
];

/// Field chains applied to transaction documents.
pub const TRANSACTION_FIELD_CHAINS: &[FieldChain] = &[
    chain("userId", &["userId", "uid"]),
    chain("type", &["type"]),
    chain("amount", &["amount"]),
    chain("timestamp", &["timestamp", "date", "createdAt"]),
    chain("status", &["status"]),
    chain("description", &["description"]),
];

/// Split a raw snapshot into `(id, field bag)` pairs.
///
/// Objects yield one entry per key. Arrays drop falsy slots first and then
/// number the survivors from zero. `null` is an empty collection; any other
/// scalar is logged and treated as empty. Entries that are not objects keep
/// their slot with an empty field bag.
///
/// # Examples
/// ```
/// use broker_admin::domain::snapshot_entries;
/// use serde_json::json;
///
/// let entries = snapshot_entries(&json!([null, { "amount": 5 }, 0, { "amount": 7 }]));
/// let ids: Vec<_> = entries.iter().map(|(id, _)| id.as_str()).collect();
/// assert_eq!(ids, ["0", "1"]);
/// ```
pub fn snapshot_entries(raw: &Value) -> Vec<(RecordId, Map<String, Value>)> {
    match raw {
        Value::Object(entries) => entries
            .iter()
            .map(|(key, bag)| (RecordId::new(key.as_str()), field_bag(bag)))
            .collect(),
        Value::Array(slots) => slots
            .iter()
            .filter(|slot| !is_falsy(slot))
            .enumerate()
            .map(|(index, bag)| (RecordId::new(index.to_string()), field_bag(bag)))
            .collect(),
        Value::Null => Vec::new(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            warn!(shape = shape_name(raw), "snapshot is not a collection; treating as empty");
            Vec::new()
        }
    }
}

/// Normalize a raw `users` snapshot.
pub fn normalize_users(raw: &Value) -> Vec<UserRecord> {
    snapshot_entries(raw)
        .into_iter()
        .map(|(id, bag)| normalize_user(id, &bag))
        .collect()
}

/// Normalize a raw `transactions` snapshot.
pub fn normalize_transactions(raw: &Value) -> Vec<TransactionRecord> {
    snapshot_entries(raw)
        .into_iter()
        .map(|(id, bag)| normalize_transaction(id, &bag))
        .collect()
}

/// Build a user from one document's field bag.
pub fn normalize_user(id: RecordId, bag: &Map<String, Value>) -> UserRecord {
    let fields = Fields::new(bag, USER_FIELD_CHAINS);
    UserRecord {
        id,
        full_name: fields.text("fullName").unwrap_or_default(),
        email: fields.text("email").unwrap_or_default(),
        country: fields.text("country").unwrap_or_default(),
        phone: fields.text("phone").unwrap_or_default(),
        image: fields.text("image").unwrap_or_default(),
        balance: fields.amount("balance"),
        total_profit: fields.amount("totalProfit"),
        total_deposit: fields.amount("totalDeposit"),
        total_withdrawal: fields.amount("totalWithdrawal"),
        total_investment: fields.amount("totalInvestment"),
        first_login: fields.flag("firstLogin"),
        referer: fields.text("referer"),
        role: fields.text("role"),
        password: fields.text("password"),
        created_at: fields.timestamp("createdAt"),
        extra: fields.unmapped(),
    }
}

/// Build a transaction from one document's field bag.
pub fn normalize_transaction(id: RecordId, bag: &Map<String, Value>) -> TransactionRecord {
    let fields = Fields::new(bag, TRANSACTION_FIELD_CHAINS);
    TransactionRecord {
        id,
        user_id: fields.text("userId").unwrap_or_default(),
        kind: fields
            .text("type")
            .map_or(TransactionKind::Unknown, |raw| TransactionKind::parse(&raw)),
        amount: fields.amount("amount"),
        timestamp: fields.timestamp("timestamp"),
        status: fields
            .text("status")
            .map_or(TransactionStatus::Unknown, |raw| TransactionStatus::parse(&raw)),
        description: fields.text("description"),
        extra: fields.unmapped(),
    }
}

/// Field lookups over one document, driven by a chain table.
struct Fields<'a> {
    bag: &'a Map<String, Value>,
    table: &'static [FieldChain],
}

impl<'a> Fields<'a> {
    fn new(bag: &'a Map<String, Value>, table: &'static [FieldChain]) -> Self {
        Self { bag, table }
    }

    fn sources(&self, field: &str) -> &'static [&'static str] {
        self.table
            .iter()
            .find(|chain| chain.field == field)
            .map(|chain| chain.sources)
            .unwrap_or_default()
    }

    fn candidates(&self, field: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let bag = self.bag;
        self.sources(field)
            .iter()
            .filter_map(move |key| bag.get(*key))
            .filter(|value| !value.is_null())
    }

    /// First non-empty textual value; numbers are rendered as text.
    fn text(&self, field: &str) -> Option<String> {
        self.candidates(field).find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }

    /// First present value, sanitized.
    fn amount(&self, field: &str) -> f64 {
        self.candidates(field)
            .next()
            .map_or(0.0, sanitize_amount)
    }

    fn flag(&self, field: &str) -> bool {
        match self.candidates(field).next() {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn timestamp(&self, field: &str) -> Option<Timestamp> {
        self.candidates(field).find_map(Timestamp::from_value)
    }

    /// Fields no chain claims. `id` is dropped because the key is canonical.
    fn unmapped(&self) -> Map<String, Value> {
        self.bag
            .iter()
            .filter(|(key, _)| key.as_str() != "id" && !self.is_mapped(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn is_mapped(&self, key: &str) -> bool {
        self.table
            .iter()
            .any(|chain| chain.sources.contains(&key))
    }
}

fn field_bag(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
