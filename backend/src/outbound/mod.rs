//! Outbound adapters implementing the domain's driven ports.
//!
//! - [`memory_store`]: in-process document tree for development, demo data
//!   and tests.
//! - [`firebase`]: REST adapters for the Realtime Database and Identity
//!   Toolkit.
//!
//! Adapters translate between wire formats and port types; they hold no
//! business rules.

pub mod firebase;
pub mod memory_store;
