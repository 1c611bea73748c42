//! In-process document tree implementing the remote store port.
//!
//! Used for local development, demo data and tests. Semantics mirror the
//! realtime database closely enough for the dashboard: reads of a missing
//! path yield `null`, updates merge fields (a `null` field deletes the key),
//! and subscribers get the subtree again whenever it changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::debug;

use crate::domain::ports::{RemoteStore, RemoteStoreError, SnapshotSink, StorePath, Subscription};

struct Inner {
    tree: RwLock<Value>,
    revision: watch::Sender<u64>,
    read_only: AtomicBool,
}

/// Shared in-memory store. Clones see the same tree.
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::with_tree(Value::Object(Map::new()))
    }
}

impl InMemoryRemoteStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a whole tree.
    pub fn with_tree(tree: Value) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                tree: RwLock::new(tree),
                revision,
                read_only: AtomicBool::new(false),
            }),
        }
    }

    /// Replace the subtree at `path`.
    pub fn set(&self, path: &StorePath, value: Value) {
        self.mutate(|tree| {
            if let Some(slot) = node_mut(tree, path) {
                *slot = value;
            }
        });
    }

    /// Copy of the whole tree.
    pub fn tree(&self) -> Value {
        self.inner
            .tree
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refuse every write with a permission error, as locked-down store
    /// rules would.
    pub fn set_read_only(&self, read_only: bool) {
        self.inner.read_only.store(read_only, Ordering::SeqCst);
    }

    fn ensure_writable(&self, path: &StorePath) -> Result<(), RemoteStoreError> {
        if self.inner.read_only.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::permission_denied(format!(
                "writes to {path} are not allowed"
            )));
        }
        Ok(())
    }

    fn mutate(&self, change: impl FnOnce(&mut Value)) {
        {
            let mut tree = self
                .inner
                .tree
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            change(&mut tree);
        }
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    fn read_now(&self, path: &StorePath) -> Value {
        let tree = self
            .inner
            .tree
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        node(&tree, path).cloned().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn read(&self, path: &StorePath) -> Result<Value, RemoteStoreError> {
        Ok(self.read_now(path))
    }

    async fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteStoreError> {
        self.ensure_writable(path)?;
        self.mutate(|tree| {
            let Some(target) = node_mut(tree, path) else {
                return;
            };
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(document) = target {
                for (key, value) in fields {
                    if value.is_null() {
                        document.remove(&key);
                    } else {
                        document.insert(key, value);
                    }
                }
            }
        });
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> Result<(), RemoteStoreError> {
        self.ensure_writable(path)?;
        self.mutate(|tree| remove_node(tree, path));
        Ok(())
    }

    fn subscribe(
        &self,
        path: &StorePath,
        sink: SnapshotSink,
    ) -> Result<Subscription, RemoteStoreError> {
        let store = self.clone();
        let path = path.clone();
        let mut changes = self.inner.revision.subscribe();
        let task = tokio::spawn(async move {
            let mut last = None;
            loop {
                let snapshot = store.read_now(&path);
                if last.as_ref() != Some(&snapshot) {
                    debug!(path = %path, "delivering in-memory snapshot");
                    sink(snapshot.clone());
                    last = Some(snapshot);
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        });
        Ok(Subscription::from_task(task))
    }
}

fn node<'a>(tree: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments().try_fold(tree, |current, segment| match current {
        Value::Object(children) => children.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Walk to `path`, creating missing children.
///
/// Existing array slots are entered by index so sibling entries survive;
/// any other value in the way becomes an object.
fn node_mut<'a>(tree: &'a mut Value, path: &StorePath) -> Option<&'a mut Value> {
    path.segments()
        .try_fold(tree, |current, segment| child_mut(current, segment))
}

fn child_mut<'a>(parent: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    let slot = match &*parent {
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .filter(|index| *index < items.len()),
        _ => None,
    };
    if let Some(index) = slot {
        return match parent {
            Value::Array(items) => items.get_mut(index),
            _ => None,
        };
    }
    if !parent.is_object() {
        *parent = into_object(std::mem::take(parent));
    }
    match parent {
        Value::Object(children) => Some(children.entry(segment).or_insert(Value::Null)),
        _ => None,
    }
}

/// Arrays keep their non-null slots keyed by index; scalars are dropped.
fn into_object(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .filter(|(_, item)| !item.is_null())
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        Value::Object(children) => Value::Object(children),
        _ => Value::Object(Map::new()),
    }
}

fn existing_child_mut<'a>(parent: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match parent {
        Value::Object(children) => children.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

/// Delete the node at `path`. Array slots are nulled rather than shifted so
/// the remaining entries keep their positions.
fn remove_node(tree: &mut Value, path: &StorePath) {
    let segments: Vec<&str> = path.segments().collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let parent = parents
        .iter()
        .try_fold(tree, |current, segment| existing_child_mut(current, segment));
    match parent {
        Some(Value::Object(children)) => {
            children.remove(*leaf);
        }
        Some(Value::Array(items)) => {
            if let Some(slot) = leaf.parse::<usize>().ok().and_then(|index| items.get_mut(index)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}
