//! Dashboard use-cases: overview, listings and optimistic user edits.
//!
//! Users live in a shared [`UserDirectory`] that a live subscription keeps in
//! step with the store by wholesale replacement. Edits and deletes hit the
//! directory first and the store second; what happens to the local change
//! when the store call fails is decided by [`ReconciliationPolicy`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::domain::ports::{RemoteStore, RemoteStoreError, StorePath, Subscription};
use crate::domain::search::ResolvedTransaction;
use crate::domain::service_support::map_store_error;
use crate::domain::{
    COMPACT_USER_LIMIT, DashboardStats, Error, KindFilter, RecordId, SearchQuery, SortKey,
    TransactionRecord, UserPatch, UserRecord, UserSearchFields, filter_transactions, filter_users,
    normalize_transactions, normalize_users, recent, summarize,
};

/// Length of the dashboard's "recent" lists unless configured otherwise.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// What to do with an optimistic local change when the store rejects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// Leave the local change in place; local and remote may diverge.
    #[default]
    KeepLocal,
    /// Undo the local change.
    Revert,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: Vec<UserRecord>,
    loaded: bool,
}

/// Process-wide user collection shared by handlers and the live feed.
#[derive(Debug, Default)]
pub struct UserDirectory {
    state: RwLock<DirectoryState>,
}

impl UserDirectory {
    /// Empty, not yet loaded directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current users, or `None` before the first load.
    pub fn snapshot(&self) -> Option<Vec<UserRecord>> {
        let state = self.read();
        state.loaded.then(|| state.users.clone())
    }

    /// Replace the whole collection.
    pub fn replace(&self, users: Vec<UserRecord>) {
        let mut state = self.write();
        state.users = users;
        state.loaded = true;
    }

    /// Replace the whole collection from a raw snapshot.
    pub fn replace_from_snapshot(&self, raw: &Value) {
        let users = normalize_users(raw);
        debug!(count = users.len(), "user directory replaced from snapshot");
        self.replace(users);
    }

    /// Look up one user.
    pub fn get(&self, id: &RecordId) -> Option<UserRecord> {
        self.read().users.iter().find(|user| &user.id == id).cloned()
    }

    /// Remove a user, returning its position and value.
    pub fn remove(&self, id: &RecordId) -> Option<(usize, UserRecord)> {
        let mut state = self.write();
        let index = state.users.iter().position(|user| &user.id == id)?;
        Some((index, state.users.remove(index)))
    }

    /// Put a removed user back, unless a newer snapshot already has it.
    pub fn restore(&self, index: usize, user: UserRecord) {
        let mut state = self.write();
        if state.users.iter().any(|existing| existing.id == user.id) {
            return;
        }
        let index = index.min(state.users.len());
        state.users.insert(index, user);
    }

    /// Apply `patch` to a user, returning the record before and after.
    pub fn apply(&self, id: &RecordId, patch: &UserPatch) -> Option<(UserRecord, UserRecord)> {
        let mut state = self.write();
        let user = state.users.iter_mut().find(|user| &user.id == id)?;
        let before = user.clone();
        user.apply_patch(patch);
        Some((before, user.clone()))
    }

    /// Undo an edit, unless a newer snapshot has changed the user since.
    pub fn revert(&self, before: UserRecord, after: &UserRecord) {
        let mut state = self.write();
        if let Some(user) = state.users.iter_mut().find(|user| **user == *after) {
            *user = before;
        }
    }
}

/// Keep `directory` in step with the store's `users` collection.
///
/// Every delivery replaces the collection outright; a slow snapshot that
/// lands after a fresher one wins.
pub fn attach_live_updates(
    store: &dyn RemoteStore,
    directory: Arc<UserDirectory>,
) -> Result<Subscription, RemoteStoreError> {
    let subscription = store.subscribe(
        &StorePath::users(),
        Box::new(move |snapshot: Value| directory.replace_from_snapshot(&snapshot)),
    )?;
    info!("live user updates attached");
    Ok(subscription)
}

/// Everything the dashboard home renders.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub recent_users: Vec<UserRecord>,
    pub recent_transactions: Vec<TransactionRecord>,
    /// Compact user list filtered by the dashboard search box.
    pub matching_users: Vec<UserRecord>,
}

/// Dashboard use-cases over the remote store.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn RemoteStore>,
    directory: Arc<UserDirectory>,
    policy: ReconciliationPolicy,
    recent_limit: usize,
}

impl DashboardService {
    /// Service sharing `directory` with any live feed.
    pub fn new(store: Arc<dyn RemoteStore>, directory: Arc<UserDirectory>) -> Self {
        Self {
            store,
            directory,
            policy: ReconciliationPolicy::default(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// Choose how failed remote writes reconcile with local state.
    #[must_use]
    pub fn with_policy(mut self, policy: ReconciliationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Length of the "recent" lists.
    #[must_use]
    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    /// Fresh users straight from the store.
    pub async fn fetch_users(&self) -> Result<Vec<UserRecord>, Error> {
        let raw = self
            .store
            .read(&StorePath::users())
            .await
            .map_err(map_store_error)?;
        Ok(normalize_users(&raw))
    }

    /// Fresh transactions straight from the store.
    pub async fn fetch_transactions(&self) -> Result<Vec<TransactionRecord>, Error> {
        let raw = self
            .store
            .read(&StorePath::transactions())
            .await
            .map_err(map_store_error)?;
        Ok(normalize_transactions(&raw))
    }

    /// The local user collection, loading it once if nothing has yet.
    async fn local_users(&self) -> Result<Vec<UserRecord>, Error> {
        if let Some(users) = self.directory.snapshot() {
            return Ok(users);
        }
        let users = self.fetch_users().await?;
        self.directory.replace(users.clone());
        Ok(users)
    }

    /// Totals over freshly fetched collections.
    pub async fn stats(&self) -> Result<DashboardStats, Error> {
        let (users, transactions) =
            tokio::try_join!(self.fetch_users(), self.fetch_transactions())?;
        Ok(summarize(&users, &transactions))
    }

    /// Stats, recent activity and the compact user search in one call.
    pub async fn overview(&self, search: &SearchQuery) -> Result<DashboardOverview, Error> {
        let (users, transactions) =
            tokio::try_join!(self.fetch_users(), self.fetch_transactions())?;
        Ok(DashboardOverview {
            stats: summarize(&users, &transactions),
            recent_users: recent(&users, &SortKey::user_created(), self.recent_limit),
            recent_transactions: recent(
                &transactions,
                &SortKey::transaction_time(),
                self.recent_limit,
            ),
            matching_users: filter_users(
                &users,
                search,
                UserSearchFields::COMPACT,
                Some(COMPACT_USER_LIMIT),
            ),
        })
    }

    /// Users listing filtered on name, email and country.
    pub async fn list_users(&self, search: &SearchQuery) -> Result<Vec<UserRecord>, Error> {
        let users = self.local_users().await?;
        Ok(filter_users(&users, search, UserSearchFields::LISTING, None))
    }

    /// One user from the local collection.
    pub async fn get_user(&self, id: &RecordId) -> Result<UserRecord, Error> {
        self.local_users().await?;
        self.directory
            .get(id)
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    /// Apply an edit locally, then write the changed fields to the store.
    pub async fn update_user(&self, id: &RecordId, patch: &UserPatch) -> Result<UserRecord, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request("patch must change at least one field"));
        }
        let path = user_path(id)?;
        self.local_users().await?;
        let (before, after) = self
            .directory
            .apply(id, patch)
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))?;

        if let Err(err) = self.store.update(&path, patch.to_fields()).await {
            warn!(error = %err, user = %id, policy = ?self.policy, "remote user update failed");
            if self.policy == ReconciliationPolicy::Revert {
                self.directory.revert(before, &after);
            }
            return Err(map_store_error(err));
        }
        info!(user = %id, "user updated");
        Ok(after)
    }

    /// Remove a user locally, then delete it from the store.
    pub async fn delete_user(&self, id: &RecordId) -> Result<(), Error> {
        let path = user_path(id)?;
        self.local_users().await?;
        let (index, removed) = self
            .directory
            .remove(id)
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))?;

        if let Err(err) = self.store.remove(&path).await {
            warn!(error = %err, user = %id, policy = ?self.policy, "remote user delete failed");
            if self.policy == ReconciliationPolicy::Revert {
                self.directory.restore(index, removed);
            }
            return Err(map_store_error(err));
        }
        info!(user = %id, "user deleted");
        Ok(())
    }

    /// Transactions with resolved user names, filtered by text and kind.
    pub async fn list_transactions(
        &self,
        search: &SearchQuery,
        kinds: KindFilter,
    ) -> Result<Vec<ResolvedTransaction>, Error> {
        let (users, transactions) =
            tokio::try_join!(self.local_users(), self.fetch_transactions())?;
        Ok(filter_transactions(&transactions, &users, search, kinds))
    }
}

fn user_path(id: &RecordId) -> Result<StorePath, Error> {
    StorePath::user(id).map_err(|err| Error::invalid_request(format!("invalid user id: {err}")))
}
