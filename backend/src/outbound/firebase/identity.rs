//! Identity Toolkit adapter for email/password sign-in.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::{body_preview, build_client, dto};
use crate::domain::LoginCredentials;
use crate::domain::ports::{IdentityHandle, IdentityProvider, IdentityProviderError};

/// Public Identity Toolkit REST endpoint.
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1/";

const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "INVALID_PASSWORD",
    "EMAIL_NOT_FOUND",
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_EMAIL",
];

/// `IdentityProvider` calling `accounts:signInWithPassword`.
#[derive(Clone)]
pub struct IdentityToolkitProvider {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl IdentityToolkitProvider {
    /// Build a provider for `api_key` against `endpoint`.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, IdentityProviderError> {
        let client =
            build_client(timeout).map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    fn sign_in_url(&self) -> Result<Url, IdentityProviderError> {
        let mut url = self
            .endpoint
            .join("./accounts:signInWithPassword")
            .map_err(|err| IdentityProviderError::transport(format!("invalid endpoint: {err}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<IdentityHandle, IdentityProviderError> {
        let request = dto::SignInRequestDto {
            email: credentials.email(),
            password: credentials.password(),
            return_secure_token: true,
        };
        let response = self
            .client
            .post(self.sign_in_url()?)
            .json(&request)
            .send()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| IdentityProviderError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, &body));
        }
        let payload: dto::SignInResponseDto = serde_json::from_slice(&body).map_err(|err| {
            IdentityProviderError::transport(format!(
                "unexpected sign-in response: {err}; body: {}",
                body_preview(&body)
            ))
        })?;
        debug!(uid = %payload.local_id, "identity toolkit sign-in succeeded");
        Ok(IdentityHandle {
            uid: payload.local_id,
            email: payload
                .email
                .unwrap_or_else(|| credentials.email().to_owned()),
        })
    }

    async fn sign_out(&self, identity: &IdentityHandle) -> Result<(), IdentityProviderError> {
        // Password sessions are not revocable over REST; the ID token is
        // simply discarded.
        debug!(uid = %identity.uid, "identity toolkit sign-out is local only");
        Ok(())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityProviderError {
    if status.is_server_error() {
        return IdentityProviderError::transport(format!(
            "status {}: {}",
            status.as_u16(),
            body_preview(body)
        ));
    }
    let Some(message) = dto::error_message(body) else {
        return IdentityProviderError::rejected(format!(
            "status {}: {}",
            status.as_u16(),
            body_preview(body)
        ));
    };
    // Messages look like `CODE` or `CODE : human readable detail`.
    let code = message.split(':').next().unwrap_or_default().trim();
    if CREDENTIAL_ERROR_CODES.contains(&code) {
        IdentityProviderError::invalid_credentials()
    } else {
        IdentityProviderError::rejected(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn error_body(message: &str) -> Vec<u8> {
        serde_json::json!({ "error": { "code": 400, "message": message } })
            .to_string()
            .into_bytes()
    }

    #[rstest]
    #[case("INVALID_PASSWORD")]
    #[case("EMAIL_NOT_FOUND")]
    #[case("INVALID_LOGIN_CREDENTIALS")]
    #[case("INVALID_EMAIL")]
    fn credential_codes_are_invalid_credentials(#[case] code: &str) {
        let err = map_status_error(StatusCode::BAD_REQUEST, &error_body(code));
        assert!(matches!(err, IdentityProviderError::InvalidCredentials));
    }

    #[test]
    fn other_codes_are_rejections_with_detail() {
        let err = map_status_error(
            StatusCode::BAD_REQUEST,
            &error_body("TOO_MANY_ATTEMPTS_TRY_LATER : Access temporarily disabled"),
        );
        match err {
            IdentityProviderError::Rejected { message } => {
                assert!(message.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_transport_failures() {
        let err = map_status_error(StatusCode::SERVICE_UNAVAILABLE, b"upstream down");
        assert!(matches!(err, IdentityProviderError::Transport { .. }));
    }

    #[rstest]
    #[case(
        DEFAULT_IDENTITY_ENDPOINT,
        "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=k-1"
    )]
    #[case(
        "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1/",
        "http://127.0.0.1:9099/identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=k-1"
    )]
    fn sign_in_url_keeps_endpoint_path_and_key(#[case] endpoint: &str, #[case] expected: &str) {
        let endpoint = Url::parse(endpoint).expect("endpoint");
        let provider = IdentityToolkitProvider::new(endpoint, "k-1", None).expect("provider");
        let url = provider.sign_in_url().expect("url");
        assert_eq!(url.as_str(), expected);
    }
}
