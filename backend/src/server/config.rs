//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};

use broker_admin::settings::SessionSettings;

/// Cookie lifetime when no marker age limit is configured.
const DEFAULT_SESSION_TTL: Duration = Duration::hours(2);

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) session_ttl: Duration,
}

impl ServerConfig {
    /// Construct a server configuration from resolved session settings.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        let SessionSettings {
            key,
            cookie_secure,
            same_site,
        } = session;
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Match the cookie lifetime to the marker age limit.
    #[must_use]
    pub fn with_session_ttl(mut self, minutes: Option<u32>) -> Self {
        if let Some(minutes) = minutes.filter(|minutes| *minutes > 0) {
            self.session_ttl = Duration::minutes(i64::from(minutes));
        }
        self
    }
}
