//! Settings for seeding the in-memory store with generated broker data.

use std::path::PathBuf;

use demo_data::SeedDefinition;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_SEED_NAME: &str = "quiet-ledger";

/// Registry shipped with the backend fixtures.
fn bundled_registry() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo-data/seeds.json")
}

/// `DEMO_DATA_*` settings read at startup.
///
/// Counts override the chosen seed's registry entry. The RNG seed is kept,
/// so overridden runs are still deterministic.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DEMO_DATA")]
pub struct DemoDataSettings {
    /// Seed the store when the server starts.
    pub enabled: Option<bool>,
    /// Registry entry to generate from.
    pub seed_name: Option<String>,
    /// Number of users to generate instead of the registry's.
    pub user_count: Option<usize>,
    /// Number of transactions to generate instead of the registry's.
    pub transaction_count: Option<usize>,
    /// Drop stored users instead of adding generated ones next to them.
    pub replace_users: Option<bool>,
    /// Seed registry file.
    pub registry_path: Option<PathBuf>,
}

impl DemoDataSettings {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub fn seed_name(&self) -> &str {
        self.seed_name.as_deref().unwrap_or(DEFAULT_SEED_NAME).trim()
    }

    pub fn replace_users(&self) -> bool {
        self.replace_users.unwrap_or(false)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.registry_path.clone().unwrap_or_else(bundled_registry)
    }

    /// Apply the count overrides to a registry entry.
    pub fn tailor(&self, seed: &SeedDefinition) -> SeedDefinition {
        let seed = self
            .user_count
            .map_or_else(|| seed.clone(), |count| seed.with_user_count(count));
        match self.transaction_count {
            Some(count) => seed.with_transaction_count(count),
            None => seed,
        }
    }
}
