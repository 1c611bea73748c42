//! Realtime Database adapter over the REST API.
//!
//! Every document is addressable as `{base}/{path}.json`. Reads are `GET`,
//! field updates are `PATCH` and deletes are `DELETE`. The REST API has no
//! push channel usable from here without server-sent events, so
//! subscriptions poll and deliver when the snapshot changes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::{Map, Value};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use super::{body_preview, build_client, dto};
use crate::domain::ports::{RemoteStore, RemoteStoreError, SnapshotSink, StorePath, Subscription};

/// Connection options for [`RealtimeDatabaseStore`].
#[derive(Debug, Clone)]
pub struct RealtimeDatabaseOptions {
    /// Database root, e.g. `https://project-default-rtdb.firebaseio.com`.
    pub base_url: Url,
    /// Database secret or ID token sent as the `auth` query parameter.
    pub auth_token: Option<String>,
    /// Per-request timeout.
    pub request_timeout: Option<Duration>,
    /// Interval between subscription polls.
    pub poll_interval: Duration,
}

impl RealtimeDatabaseOptions {
    /// Options with no credentials, no timeout and a five second poll.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            auth_token: None,
            request_timeout: None,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// `RemoteStore` backed by a Firebase Realtime Database.
#[derive(Clone)]
pub struct RealtimeDatabaseStore {
    client: Client,
    options: RealtimeDatabaseOptions,
}

impl RealtimeDatabaseStore {
    /// Build an adapter with its own HTTP client.
    pub fn new(options: RealtimeDatabaseOptions) -> Result<Self, RemoteStoreError> {
        let client = build_client(options.request_timeout)
            .map_err(|err| RemoteStoreError::transport(err.to_string()))?;
        Ok(Self { client, options })
    }

    fn document_url(&self, path: &StorePath) -> Result<Url, RemoteStoreError> {
        document_url(&self.options.base_url, path, self.options.auth_token.as_deref())
    }

    async fn send(
        &self,
        method: Method,
        path: &StorePath,
        body: Option<&Map<String, Value>>,
    ) -> Result<Vec<u8>, RemoteStoreError> {
        let url = self.document_url(path)?;
        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        debug!(%method, path = %path, status = status.as_u16(), "realtime database request completed");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl RemoteStore for RealtimeDatabaseStore {
    async fn read(&self, path: &StorePath) -> Result<Value, RemoteStoreError> {
        let body = self.send(Method::GET, path, None).await?;
        decode_snapshot(&body)
    }

    async fn update(
        &self,
        path: &StorePath,
        fields: Map<String, Value>,
    ) -> Result<(), RemoteStoreError> {
        self.send(Method::PATCH, path, Some(&fields)).await.map(drop)
    }

    async fn remove(&self, path: &StorePath) -> Result<(), RemoteStoreError> {
        self.send(Method::DELETE, path, None).await.map(drop)
    }

    fn subscribe(
        &self,
        path: &StorePath,
        sink: SnapshotSink,
    ) -> Result<Subscription, RemoteStoreError> {
        // Fail fast on a path that can never be fetched.
        self.document_url(path)?;
        let store = self.clone();
        let path = path.clone();
        let task = tokio::spawn(async move {
            let mut ticks = interval(store.options.poll_interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Value> = None;
            loop {
                ticks.tick().await;
                match store.read(&path).await {
                    Ok(snapshot) if last.as_ref() != Some(&snapshot) => {
                        sink(snapshot.clone());
                        last = Some(snapshot);
                    }
                    Ok(_) => {}
                    Err(error) => {
                        warn!(error = %error, path = %path, "realtime database poll failed");
                    }
                }
            }
        });
        Ok(Subscription::from_task(task))
    }
}

fn document_url(
    base: &Url,
    path: &StorePath,
    auth_token: Option<&str>,
) -> Result<Url, RemoteStoreError> {
    let root = base.as_str().trim_end_matches('/');
    let mut url = Url::parse(&format!("{root}/{}.json", path.as_str()))
        .map_err(|err| RemoteStoreError::transport(format!("invalid database url: {err}")))?;
    if let Some(token) = auth_token {
        url.query_pairs_mut().append_pair("auth", token);
    }
    Ok(url)
}

fn decode_snapshot(body: &[u8]) -> Result<Value, RemoteStoreError> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|err| {
        RemoteStoreError::decode(format!("{err}; body: {}", body_preview(body)))
    })
}

fn map_transport_error(error: reqwest::Error) -> RemoteStoreError {
    if error.is_timeout() {
        RemoteStoreError::timeout(error.to_string())
    } else {
        RemoteStoreError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteStoreError {
    let detail = dto::error_message(body).unwrap_or_else(|| body_preview(body));
    let message = format!("status {}: {detail}", status.as_u16());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RemoteStoreError::permission_denied(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteStoreError::timeout(message)
        }
        _ => RemoteStoreError::transport(message),
    }
}
