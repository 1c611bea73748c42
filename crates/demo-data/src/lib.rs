//! Deterministic demo snapshots for the broker admin dashboard.
//!
//! This crate produces raw `users` and `transactions` collections shaped like
//! the documents a real-time database holds after years of schema drift:
//! mixed name keys, currency strings for balances, `profit` in place of
//! `totalProfit` and holes in the transaction array. It does not depend on
//! the backend so the backend can depend on it.
//!
//! # Example
//!
//! ```
//! use demo_data::{SeedRegistry, generate_demo_snapshot};
//!
//! let json = r#"{
//!     "version": 1,
//!     "countries": ["Chile", "Kenya"],
//!     "seeds": [{"name": "test-seed", "seed": 42, "userCount": 3, "transactionCount": 4}]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed_def = registry.find_seed("test-seed").expect("seed exists");
//! let snapshot = generate_demo_snapshot(&registry, seed_def).expect("generation succeeds");
//!
//! assert_eq!(snapshot.user_count(), 3);
//! ```

mod error;
mod generator;
mod money;
mod registry;
mod seed;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_demo_snapshot;
pub use money::format_currency;
pub use registry::{SeedDefinition, SeedRegistry};
pub use seed::DemoSnapshot;
