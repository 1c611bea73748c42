//! Domain core of the broker admin backend.
//!
//! Purpose: turn weakly typed remote snapshots into typed records, derive
//! dashboard figures from them, and gate the admin surface. Nothing here
//! knows about HTTP or a concrete store.
//!
//! Public surface:
//! - Normalization (`normalize_users`, `normalize_transactions`) and the
//!   amount sanitizer (`sanitize_amount`).
//! - Aggregation (`summarize`, `recent`) and search (`filter_users`,
//!   `filter_transactions`).
//! - The session gate (`SessionGate`) and its marker.
//! - Services driving the ports: `AdminLoginService`, `DashboardService`.
//! - Error (alias to `error::Error`) and ErrorCode for API responses.

pub mod aggregate;
pub mod auth;
pub mod dashboard_service;
pub mod error;
pub mod login_service;
pub mod normalize;
pub mod ports;
pub mod record;
pub mod sanitize;
pub mod search;
pub mod session;
mod service_support;
pub mod trace_id;
pub mod transaction;
pub mod user;

pub use self::aggregate::{DashboardStats, SortKey, Timestamped, recent, stable_sum, summarize};
pub use self::auth::{INCOMPLETE_LOGIN_MESSAGE, LoginCredentials, LoginValidationError};
pub use self::dashboard_service::{
    DEFAULT_RECENT_LIMIT, DashboardOverview, DashboardService, ReconciliationPolicy,
    UserDirectory, attach_live_updates,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::login_service::AdminLoginService;
pub use self::normalize::{
    ADAPTER_VERSION, FieldChain, TRANSACTION_FIELD_CHAINS, USER_FIELD_CHAINS,
    normalize_transaction, normalize_transactions, normalize_user, normalize_users,
    snapshot_entries,
};
pub use self::record::{RecordId, RecordIdError, Timestamp};
pub use self::sanitize::{deserialize_sanitized_amount, sanitize_amount, sanitize_amount_text};
pub use self::search::{
    COMPACT_USER_LIMIT, KindFilter, KindFilterError, ResolvedTransaction, SearchQuery,
    UNKNOWN_USER, UserSearchFields, filter_transactions, filter_users,
};
pub use self::service_support::ACCESS_DENIED_MESSAGE;
pub use self::session::{Rejection, SessionGate, SessionMarker, SessionState};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::transaction::{TransactionKind, TransactionRecord, TransactionStatus};
pub use self::user::{ADMIN_ROLE, UserPatch, UserRecord};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use broker_admin::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
