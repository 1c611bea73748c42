//! Case-insensitive substring search over normalized records.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

use super::transaction::{TransactionKind, TransactionRecord};
use super::user::UserRecord;

/// Number of users shown in the dashboard's compact list.
pub const COMPACT_USER_LIMIT: usize = 4;

/// Label shown for transactions whose user cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Lowercased search needle. An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Build a query from raw operator input.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().to_lowercase())
    }

    /// Whether this query matches every record.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `haystack` contains the needle, ignoring case.
    pub fn matches(&self, haystack: &str) -> bool {
        self.is_empty() || haystack.to_lowercase().contains(&self.0)
    }

    fn matches_any<'a>(&self, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
        self.is_empty() || haystacks.into_iter().any(|haystack| self.matches(haystack))
    }
}

/// User fields consulted by [`filter_users`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSearchFields {
    /// Also match against the country.
    pub include_country: bool,
}

impl UserSearchFields {
    /// Name and email only, as used by the dashboard's compact list.
    pub const COMPACT: Self = Self {
        include_country: false,
    };
    /// Name, email and country, as used by the users listing.
    pub const LISTING: Self = Self {
        include_country: true,
    };
}

/// Users matching `query`, in their original order, truncated to `limit`.
pub fn filter_users(
    users: &[UserRecord],
    query: &SearchQuery,
    fields: UserSearchFields,
    limit: Option<usize>,
) -> Vec<UserRecord> {
    users
        .iter()
        .filter(|user| {
            let country = fields.include_country.then_some(user.country.as_str());
            query.matches_any(
                [Some(user.full_name.as_str()), Some(user.email.as_str()), country]
                    .into_iter()
                    .flatten(),
            )
        })
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Transaction kind selector for the listing view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindFilter {
    /// Every kind, including unrecognized ones.
    #[default]
    All,
    /// Exactly one kind.
    Only(TransactionKind),
}

impl KindFilter {
    fn admits(self, kind: TransactionKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == kind,
        }
    }
}

/// Error returned when a kind filter names an unknown kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFilterError(String);

impl fmt::Display for KindFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown transaction type '{}'; expected all, deposit, withdrawal, profit or investment",
            self.0
        )
    }
}

impl std::error::Error for KindFilterError {}

impl FromStr for KindFilter {
    type Err = KindFilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") || raw.trim().is_empty() {
            return Ok(Self::All);
        }
        match TransactionKind::parse(raw) {
            TransactionKind::Unknown => Err(KindFilterError(raw.to_owned())),
            kind => Ok(Self::Only(kind)),
        }
    }
}

/// Transactions paired with the display name of the user they reference.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransaction {
    #[serde(flatten)]
    pub transaction: TransactionRecord,
    pub user_name: String,
}

/// Transactions whose description or resolved user name matches `query`
/// and whose kind passes `kinds`.
///
/// Dangling user references resolve to [`UNKNOWN_USER`], which is itself
/// searchable.
pub fn filter_transactions(
    transactions: &[TransactionRecord],
    users: &[UserRecord],
    query: &SearchQuery,
    kinds: KindFilter,
) -> Vec<ResolvedTransaction> {
    let names: HashMap<&str, &str> = users
        .iter()
        .map(|user| (user.id.as_str(), user.full_name.as_str()))
        .collect();

    transactions
        .iter()
        .filter(|tx| kinds.admits(tx.kind))
        .filter_map(|tx| {
            let user_name = names
                .get(tx.user_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_USER);
            let description = tx.description.as_deref().unwrap_or_default();
            query
                .matches_any([description, user_name])
                .then(|| ResolvedTransaction {
                    transaction: tx.clone(),
                    user_name: user_name.to_owned(),
                })
        })
        .collect()
}
