//! Firebase REST adapters.
//!
//! Thin HTTP implementations of the `RemoteStore` (Realtime Database) and
//! `IdentityProvider` (Identity Toolkit) ports.

mod dto;
mod identity;
mod rtdb;

pub use identity::{DEFAULT_IDENTITY_ENDPOINT, IdentityToolkitProvider};
pub use rtdb::{RealtimeDatabaseOptions, RealtimeDatabaseStore};

use std::time::Duration;

use reqwest::Client;

fn build_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let builder = Client::builder();
    match timeout {
        Some(timeout) => builder.timeout(timeout).build(),
        None => builder.build(),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
