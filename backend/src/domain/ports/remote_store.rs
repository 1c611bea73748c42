//! Driven port for the remote realtime document store.
//!
//! Paths address either a whole collection (`users`) or one document
//! (`users/{id}`). Reads return the raw JSON tree exactly as stored; shaping
//! it into records is the normalizer's job.

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::domain::RecordId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by remote store adapters.
    pub enum RemoteStoreError {
        /// The store could not be reached or answered with a server error.
        Transport { message: String } => "remote store request failed: {message}",
        /// The store refused the operation for the configured credentials.
        PermissionDenied { message: String } => "remote store denied access: {message}",
        /// The request exceeded the configured timeout.
        Timeout { message: String } => "remote store request timed out: {message}",
        /// The store answered with a body that is not JSON.
        Decode { message: String } => "remote store payload could not be decoded: {message}",
    }
}

/// Collection holding user documents.
pub const USERS_COLLECTION: &str = "users";
/// Collection holding transaction documents.
pub const TRANSACTIONS_COLLECTION: &str = "transactions";

/// Validation errors for [`StorePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorePathError {
    /// A segment was empty.
    EmptySegment,
    /// A segment contained a reserved character.
    InvalidSegment(String),
}

impl fmt::Display for StorePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySegment => write!(f, "store path segments must not be empty"),
            Self::InvalidSegment(segment) => {
                write!(f, "store path segment '{segment}' contains a reserved character")
            }
        }
    }
}

impl std::error::Error for StorePathError {}

/// Slash-separated location in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath(String);

impl StorePath {
    /// Path of the `users` collection.
    pub fn users() -> Self {
        Self(USERS_COLLECTION.to_owned())
    }

    /// Path of the `transactions` collection.
    pub fn transactions() -> Self {
        Self(TRANSACTIONS_COLLECTION.to_owned())
    }

    /// Path of one user document.
    pub fn user(id: &RecordId) -> Result<Self, StorePathError> {
        Self::from_segments([USERS_COLLECTION, id.as_str()])
    }

    /// Build a path from individual segments.
    ///
    /// # Examples
    /// ```
    /// use broker_admin::domain::ports::{StorePath, StorePathError};
    ///
    /// let path = StorePath::from_segments(["users", "u1"]).unwrap();
    /// assert_eq!(path.as_str(), "users/u1");
    /// assert_eq!(
    ///     StorePath::from_segments(["users", "a.b"]),
    ///     Err(StorePathError::InvalidSegment("a.b".into())),
    /// );
    /// ```
    pub fn from_segments<'a>(
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, StorePathError> {
        let mut joined = String::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(StorePathError::EmptySegment);
            }
            if RecordId::parse(segment).is_err() {
                return Err(StorePathError::InvalidSegment(segment.to_owned()));
            }
            if !joined.is_empty() {
                joined.push('/');
            }
            joined.push_str(segment);
        }
        if joined.is_empty() {
            return Err(StorePathError::EmptySegment);
        }
        Ok(Self(joined))
    }

    /// Slash-joined path text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Individual segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback receiving every full snapshot delivered by a subscription.
pub type SnapshotSink = Box<dyn Fn(Value) + Send + Sync + 'static>;

/// Handle to a live subscription. Delivery stops when it is dropped.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Tie the subscription's lifetime to a delivery task.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Subscription with nothing behind it.
    pub fn detached() -> Self {
        Self { task: None }
    }

    /// Stop delivery.
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    /// Whether delivery is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Port for reading and mutating the remote document tree.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Point-in-time copy of the subtree at `path`; `Value::Null` when absent.
    async fn read(&self, path: &StorePath) -> Result<Value, RemoteStoreError>;

    /// Merge `fields` into the document at `path`.
    async fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteStoreError>;

    /// Delete the subtree at `path`.
    async fn remove(&self, path: &StorePath) -> Result<(), RemoteStoreError>;

    /// Deliver the current snapshot at `path` and a fresh full snapshot after
    /// every change, until the returned handle is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    fn subscribe(
        &self,
        path: &StorePath,
        sink: SnapshotSink,
    ) -> Result<Subscription, RemoteStoreError>;
}
