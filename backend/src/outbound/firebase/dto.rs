//! Wire types for the Identity Toolkit and Realtime Database REST APIs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignInRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignInResponseDto {
    pub(super) local_id: String,
    #[serde(default)]
    pub(super) email: Option<String>,
}

/// Google API error envelope: `{"error": {"code": 400, "message": "..."}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

/// The Realtime Database reports errors as `{"error": "Permission denied"}`,
/// Identity Toolkit as an object; accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ErrorBodyDto {
    Detailed { message: String },
    Plain(String),
}

impl ErrorBodyDto {
    pub(super) fn message(&self) -> &str {
        match self {
            Self::Detailed { message } | Self::Plain(message) => message.as_str(),
        }
    }
}

pub(super) fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .map(|envelope| envelope.error.message().to_owned())
}
