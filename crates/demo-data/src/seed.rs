//! Generated snapshot container.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Raw collections produced for one seed.
///
/// `users` is keyed by uid the way a real-time database stores documents.
/// `transactions` is an array that may hold `null` slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoSnapshot {
    /// User documents keyed by uid.
    pub users: Map<String, Value>,
    /// Transaction documents, holes included.
    pub transactions: Vec<Value>,
}

impl DemoSnapshot {
    /// Number of user documents.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of non-null transaction slots.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.iter().filter(|slot| !slot.is_null()).count()
    }

    /// Raw `users` collection.
    #[must_use]
    pub fn users_value(&self) -> Value {
        Value::Object(self.users.clone())
    }

    /// Raw `transactions` collection.
    #[must_use]
    pub fn transactions_value(&self) -> Value {
        Value::Array(self.transactions.clone())
    }

    /// Database root holding both collections.
    #[must_use]
    pub fn into_tree(self) -> Value {
        json!({
            "users": Value::Object(self.users),
            "transactions": Value::Array(self.transactions),
        })
    }
}
