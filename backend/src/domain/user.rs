//! Broker user record and the partial edit payload applied to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::record::{RecordId, Timestamp};
use super::sanitize::deserialize_sanitized_amount;

/// Normalized broker user.
///
/// ## Invariants
/// - `id` is the remote document key and never changes for that key.
/// - Every monetary field is finite.
/// - `password` is kept for write-back only and never serialized.
///
/// Fields the normalizer does not map survive in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[schema(value_type = String, example = "u1")]
    pub id: RecordId,
    #[schema(example = "Ana Lee")]
    pub full_name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    pub country: String,
    pub phone: String,
    pub image: String,
    #[schema(example = 1200.5)]
    pub balance: f64,
    pub total_profit: f64,
    pub total_deposit: f64,
    pub total_withdrawal: f64,
    pub total_investment: f64,
    pub first_login: bool,
    pub referer: Option<String>,
    pub role: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    #[schema(value_type = Option<String>)]
    pub created_at: Option<Timestamp>,
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Empty record for `id`, as produced from an empty field bag.
    #[cfg(test)]
    fn empty(id: RecordId) -> Self {
        Self {
            id,
            full_name: String::new(),
            email: String::new(),
            country: String::new(),
            phone: String::new(),
            image: String::new(),
            balance: 0.0,
            total_profit: 0.0,
            total_deposit: 0.0,
            total_withdrawal: 0.0,
            total_investment: 0.0,
            first_login: false,
            referer: None,
            role: None,
            password: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    /// Whether the record carries the administrative role.
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Apply an edit in place. Absent patch fields leave the record untouched.
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        let text_fields = [
            (&mut self.full_name, &patch.full_name),
            (&mut self.email, &patch.email),
            (&mut self.country, &patch.country),
            (&mut self.phone, &patch.phone),
            (&mut self.image, &patch.image),
        ];
        for (target, value) in text_fields {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        let amount_fields = [
            (&mut self.balance, patch.balance),
            (&mut self.total_profit, patch.total_profit),
            (&mut self.total_deposit, patch.total_deposit),
            (&mut self.total_withdrawal, patch.total_withdrawal),
            (&mut self.total_investment, patch.total_investment),
        ];
        for (target, value) in amount_fields {
            if let Some(value) = value {
                *target = value;
            }
        }

        if let Some(first_login) = patch.first_login {
            self.first_login = first_login;
        }
        if let Some(referer) = &patch.referer {
            self.referer = Some(referer.clone());
        }
    }
}

/// Role value that grants access to the admin surface.
pub const ADMIN_ROLE: &str = "admin";

/// Partial user edit accepted from operators.
///
/// Amounts go through the sanitizer on the way in, so `"$1,000"` lands as
/// `1000.0`. The role and password are not editable through this payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_sanitized_amount")]
    #[schema(value_type = Option<f64>)]
    pub balance: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_sanitized_amount")]
    #[schema(value_type = Option<f64>)]
    pub total_profit: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_sanitized_amount")]
    #[schema(value_type = Option<f64>)]
    pub total_deposit: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_sanitized_amount")]
    #[schema(value_type = Option<f64>)]
    pub total_withdrawal: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_sanitized_amount")]
    #[schema(value_type = Option<f64>)]
    pub total_investment: Option<f64>,
    #[serde(default)]
    pub first_login: Option<bool>,
    #[serde(default)]
    pub referer: Option<String>,
}

impl UserPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.to_fields().is_empty()
    }

    /// Field map sent to the remote store, keyed by upstream field names.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        let text = [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("country", &self.country),
            ("phone", &self.phone),
            ("image", &self.image),
            ("referer", &self.referer),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                fields.insert(key.to_owned(), Value::String(value.clone()));
            }
        }
        let amounts = [
            ("balance", self.balance),
            ("totalProfit", self.total_profit),
            ("totalDeposit", self.total_deposit),
            ("totalWithdrawal", self.total_withdrawal),
            ("totalInvestment", self.total_investment),
        ];
        for (key, value) in amounts {
            if let Some(value) = value {
                fields.insert(key.to_owned(), Value::from(value));
            }
        }
        if let Some(first_login) = self.first_login {
            fields.insert("firstLogin".to_owned(), Value::Bool(first_login));
        }
        fields
    }
}
