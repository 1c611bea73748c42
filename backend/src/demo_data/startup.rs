//! Startup seeding of the in-memory store.

use std::path::PathBuf;

use demo_data::{GenerationError, RegistryError, SeedRegistry, generate_demo_snapshot};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::demo_data::config::DemoDataSettings;
use crate::domain::RecordId;
use crate::domain::ports::{StorePath, StorePathError};
use crate::outbound::memory_store::InMemoryRemoteStore;

/// Errors returned while executing startup seeding.
#[derive(Debug, Error)]
pub enum StartupSeedingError {
    /// Registry loading or lookup failed.
    #[error("registry error at {path}: {source}")]
    Registry {
        /// Path to the registry file.
        path: PathBuf,
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// Snapshot generation failed.
    #[error("demo data generation error: {0}")]
    Generation(#[from] GenerationError),
    /// A generated uid is not a valid document key.
    #[error("generated uid is not a valid key: {0}")]
    InvalidKey(#[from] StorePathError),
    /// Seed name must not be empty.
    #[error("seed name must not be empty")]
    EmptySeedName,
}

/// What a successful seeding run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSeedOutcome {
    pub seed_key: String,
    pub user_count: usize,
    pub transaction_count: usize,
}

/// Seed the in-memory store when enabled.
///
/// Generated users are added next to whatever the store already holds unless
/// `replace_users` is set, in which case the `users` collection is replaced.
/// The `transactions` collection is always replaced. Without an in-memory
/// store (the server talks to a real database) seeding is skipped.
///
/// # Examples
///
/// ```rust,no_run
/// use broker_admin::demo_data::{DemoDataSettings, seed_demo_data_on_startup};
/// use broker_admin::outbound::memory_store::InMemoryRemoteStore;
///
/// let settings = DemoDataSettings::default();
/// let store = InMemoryRemoteStore::new();
/// let outcome = seed_demo_data_on_startup(&settings, Some(&store)).expect("seeding");
/// assert!(outcome.is_none());
/// ```
pub fn seed_demo_data_on_startup(
    settings: &DemoDataSettings,
    store: Option<&InMemoryRemoteStore>,
) -> Result<Option<DemoSeedOutcome>, StartupSeedingError> {
    if !settings.enabled() {
        info!(reason = "disabled", "demo data seeding skipped");
        return Ok(None);
    }

    let seed_name = settings.seed_name();
    if seed_name.is_empty() {
        return Err(StartupSeedingError::EmptySeedName);
    }

    let Some(store) = store else {
        warn!(
            seed_key = seed_name,
            "demo data seeding enabled but a remote database is configured; skipping"
        );
        return Ok(None);
    };

    let registry_path = settings.registry_path();
    let registry_error = |source| StartupSeedingError::Registry {
        path: registry_path.clone(),
        source,
    };
    let registry = SeedRegistry::from_file(&registry_path).map_err(registry_error)?;
    let seed_def = registry.find_seed(seed_name).map_err(registry_error)?;
    let snapshot = generate_demo_snapshot(&registry, &settings.tailor(seed_def))?;

    let outcome = DemoSeedOutcome {
        seed_key: seed_name.to_owned(),
        user_count: snapshot.user_count(),
        transaction_count: snapshot.transaction_count(),
    };
    if settings.replace_users() {
        store.set(&StorePath::users(), snapshot.users_value());
    } else {
        for (uid, document) in &snapshot.users {
            store.set(&StorePath::user(&RecordId::new(uid.as_str()))?, document.clone());
        }
    }
    store.set(
        &StorePath::transactions(),
        Value::Array(snapshot.transactions),
    );

    info!(
        seed_key = %outcome.seed_key,
        replace_users = settings.replace_users(),
        user_count = outcome.user_count,
        transaction_count = outcome.transaction_count,
        "demo data seeding applied"
    );
    Ok(Some(outcome))
}
