//! Broker admin backend library.
//!
//! The `domain` module holds the record normalizer, amount sanitizer,
//! aggregator, search engine and session gate. `inbound` exposes them over
//! HTTP, `outbound` talks to the remote document store and identity
//! provider.

#[cfg(feature = "demo-data")]
pub mod demo_data;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
pub mod snapshot_report;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
