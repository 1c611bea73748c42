//! Server settings loaded via OrthoConfig.
//!
//! Every field can come from `BROKER_ADMIN_*` environment variables, the
//! command line or a configuration file. Accessors apply the defaults and
//! parse the raw values into the types the server needs.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroize;

use crate::domain::{DEFAULT_RECENT_LIMIT, ReconciliationPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for settings validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate a missing session key.
    Debug,
    /// Release builds require a real key unless ephemeral keys are allowed.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while turning raw settings into server configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A value is present but cannot be parsed.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the session key file failed.
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session key file is too short for release builds.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// `SameSite=None` requires secure cookies.
    #[error("same_site=None requires cookie_secure")]
    InsecureSameSiteNone,
    /// Only one of the Firebase database URL and API key was given.
    #[error("firebase_database_url and firebase_api_key must be set together")]
    PartialFirebase,
}

/// Broker admin server settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BROKER_ADMIN")]
pub struct AdminSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// File holding the cookie signing key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a generated key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub allow_ephemeral_key: bool,
    /// Mark the session cookie `Secure`. Defaults to true.
    pub cookie_secure: Option<bool>,
    /// `SameSite` policy for the session cookie.
    pub same_site: Option<String>,
    /// Reject session markers older than this many minutes.
    pub session_max_age_minutes: Option<u32>,
    /// Realtime Database root, e.g. `https://demo.firebaseio.com/`.
    pub firebase_database_url: Option<String>,
    /// Web API key for the identity endpoint.
    pub firebase_api_key: Option<String>,
    /// Database auth token appended to every request.
    pub firebase_auth_token: Option<String>,
    /// Seconds between live update polls.
    pub poll_interval_secs: Option<u64>,
    /// Per-request timeout in seconds for remote calls.
    pub request_timeout_secs: Option<u64>,
    /// Length of the recent users and recent transactions lists.
    pub recent_limit: Option<usize>,
    /// Undo optimistic edits when the store rejects the write.
    pub revert_on_failure: Option<bool>,
}

/// Remote endpoints for the Firebase adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub database_url: Url,
    pub api_key: String,
    pub auth_token: Option<String>,
}

/// Cookie session settings.
pub struct SessionSettings {
    /// Signing key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// Configured `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

impl AdminSettings {
    /// Address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::Invalid {
            name: "bind_addr",
            value: raw.to_owned(),
            expected: "host:port",
        })
    }

    /// Path of the session key file.
    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH))
    }

    /// Maximum marker age, if configured. Zero disables the check.
    pub fn session_max_age(&self) -> Option<TimeDelta> {
        self.session_max_age_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| TimeDelta::minutes(i64::from(minutes)))
    }

    /// Interval between live update polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
        )
    }

    /// Timeout applied to each remote request.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Length of the recent lists.
    pub fn recent_limit(&self) -> usize {
        self.recent_limit.unwrap_or(DEFAULT_RECENT_LIMIT)
    }

    /// What to do with an optimistic edit the store rejected.
    pub fn reconciliation_policy(&self) -> ReconciliationPolicy {
        if self.revert_on_failure.unwrap_or(false) {
            ReconciliationPolicy::Revert
        } else {
            ReconciliationPolicy::KeepLocal
        }
    }

    /// Firebase endpoints, or `None` to run on the in-memory store.
    pub fn firebase(&self) -> Result<Option<FirebaseSettings>, SettingsError> {
        let url = non_blank(self.firebase_database_url.as_deref());
        let api_key = non_blank(self.firebase_api_key.as_deref());
        match (url, api_key) {
            (None, None) => Ok(None),
            (Some(url), Some(api_key)) => {
                let database_url = Url::parse(url).map_err(|_| SettingsError::Invalid {
                    name: "firebase_database_url",
                    value: url.to_owned(),
                    expected: "absolute URL",
                })?;
                Ok(Some(FirebaseSettings {
                    database_url,
                    api_key: api_key.to_owned(),
                    auth_token: non_blank(self.firebase_auth_token.as_deref()).map(str::to_owned),
                }))
            }
            _ => Err(SettingsError::PartialFirebase),
        }
    }

    /// Resolve cookie settings and load the signing key.
    pub fn session(&self, mode: BuildMode) -> Result<SessionSettings, SettingsError> {
        let cookie_secure = self.cookie_secure.unwrap_or(true);
        let same_site = self.same_site_policy(mode, cookie_secure)?;
        let key = load_session_key(&self.session_key_file(), mode, self.allow_ephemeral_key)?;
        Ok(SessionSettings {
            key,
            cookie_secure,
            same_site,
        })
    }

    fn same_site_policy(
        &self,
        mode: BuildMode,
        cookie_secure: bool,
    ) -> Result<SameSite, SettingsError> {
        let Some(value) = self.same_site.as_deref() else {
            return Ok(if mode.is_debug() {
                SameSite::Lax
            } else {
                SameSite::Strict
            });
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => Err(SettingsError::InsecureSameSiteNone),
            _ => Err(SettingsError::Invalid {
                name: "same_site",
                value: value.to_owned(),
                expected: SAMESITE_EXPECTED,
            }),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn load_session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SettingsError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SettingsError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary session key (dev only)"
                );
                Ok(Key::generate())
            } else {
                Err(SettingsError::KeyRead {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "BROKER_ADMIN_BIND_ADDR",
        "BROKER_ADMIN_FIREBASE_DATABASE_URL",
        "BROKER_ADMIN_FIREBASE_API_KEY",
        "BROKER_ADMIN_RECENT_LIMIT",
        "BROKER_ADMIN_REVERT_ON_FAILURE",
        "BROKER_ADMIN_SESSION_MAX_AGE_MINUTES",
    ];

    fn blank() -> AdminSettings {
        AdminSettings {
            bind_addr: None,
            session_key_file: None,
            allow_ephemeral_key: false,
            cookie_secure: None,
            same_site: None,
            session_max_age_minutes: None,
            firebase_database_url: None,
            firebase_api_key: None,
            firebase_auth_token: None,
            poll_interval_secs: None,
            request_timeout_secs: None,
            recent_limit: None,
            revert_on_failure: None,
        }
    }

    fn load_from_empty_args() -> AdminSettings {
        AdminSettings::load_from_iter([OsString::from("broker-admin")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.recent_limit(), DEFAULT_RECENT_LIMIT);
        assert_eq!(settings.reconciliation_policy(), ReconciliationPolicy::KeepLocal);
        assert!(settings.session_max_age().is_none());
        assert!(settings.firebase().expect("no firebase").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("BROKER_ADMIN_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "BROKER_ADMIN_FIREBASE_DATABASE_URL",
                Some("https://demo.firebaseio.com/".to_owned()),
            ),
            ("BROKER_ADMIN_FIREBASE_API_KEY", Some("key".to_owned())),
            ("BROKER_ADMIN_RECENT_LIMIT", Some("3".to_owned())),
            ("BROKER_ADMIN_REVERT_ON_FAILURE", Some("true".to_owned())),
            ("BROKER_ADMIN_SESSION_MAX_AGE_MINUTES", Some("30".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("addr"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.recent_limit(), 3);
        assert_eq!(settings.reconciliation_policy(), ReconciliationPolicy::Revert);
        assert_eq!(settings.session_max_age(), Some(TimeDelta::minutes(30)));
        let firebase = settings.firebase().expect("valid").expect("configured");
        assert_eq!(firebase.database_url.as_str(), "https://demo.firebaseio.com/");
        assert_eq!(firebase.api_key, "key");
    }

    #[rstest]
    #[case("true", ReconciliationPolicy::Revert)]
    #[case("false", ReconciliationPolicy::KeepLocal)]
    fn revert_flag_selects_the_policy(#[case] flag: &str, #[case] expected: ReconciliationPolicy) {
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "BROKER_ADMIN_REVERT_ON_FAILURE").then(|| flag.to_owned());
            (name, value)
        }));

        assert_eq!(load_from_empty_args().reconciliation_policy(), expected);
    }

    #[rstest]
    #[case(Some("https://demo.firebaseio.com/"), None)]
    #[case(None, Some("key"))]
    fn firebase_needs_both_url_and_key(#[case] url: Option<&str>, #[case] key: Option<&str>) {
        let settings = AdminSettings {
            firebase_database_url: url.map(str::to_owned),
            firebase_api_key: key.map(str::to_owned),
            ..blank()
        };
        assert!(matches!(
            settings.firebase(),
            Err(SettingsError::PartialFirebase)
        ));
    }

    #[rstest]
    fn malformed_bind_addr_is_reported() {
        let settings = AdminSettings {
            bind_addr: Some("nowhere".to_owned()),
            ..blank()
        };
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::Invalid { name: "bind_addr", .. })
        ));
    }

    #[rstest]
    #[case(None, true, BuildMode::Debug, SameSite::Lax)]
    #[case(None, true, BuildMode::Release, SameSite::Strict)]
    #[case(Some("none"), true, BuildMode::Release, SameSite::None)]
    #[case(Some("STRICT"), false, BuildMode::Debug, SameSite::Strict)]
    fn same_site_policy_resolves(
        #[case] raw: Option<&str>,
        #[case] secure: bool,
        #[case] mode: BuildMode,
        #[case] expected: SameSite,
    ) {
        let settings = AdminSettings {
            same_site: raw.map(str::to_owned),
            ..blank()
        };
        assert_eq!(
            settings.same_site_policy(mode, secure).expect("policy"),
            expected
        );
    }

    #[rstest]
    fn same_site_none_requires_secure_cookies() {
        let settings = AdminSettings {
            same_site: Some("None".to_owned()),
            cookie_secure: Some(false),
            ..blank()
        };
        assert!(matches!(
            settings.session(BuildMode::Debug),
            Err(SettingsError::InsecureSameSiteNone)
        ));
    }

    #[rstest]
    fn release_builds_need_a_key_unless_ephemeral_is_allowed() {
        let missing = std::env::temp_dir().join("broker-admin-missing-session-key");
        let strict = AdminSettings {
            session_key_file: Some(missing.clone()),
            ..blank()
        };
        assert!(matches!(
            strict.session(BuildMode::Release),
            Err(SettingsError::KeyRead { .. })
        ));

        let relaxed = AdminSettings {
            session_key_file: Some(missing),
            allow_ephemeral_key: true,
            ..blank()
        };
        assert!(relaxed.session(BuildMode::Release).is_ok());
    }

    #[rstest]
    fn short_keys_are_rejected_in_release_builds() {
        let path = std::env::temp_dir().join("broker-admin-short-session-key");
        std::fs::write(&path, b"short").expect("write key");
        let settings = AdminSettings {
            session_key_file: Some(path.clone()),
            ..blank()
        };
        let result = settings.session(BuildMode::Release);
        std::fs::remove_file(&path).expect("remove key");
        assert!(matches!(
            result,
            Err(SettingsError::KeyTooShort { length: 5, .. })
        ));
    }
}
