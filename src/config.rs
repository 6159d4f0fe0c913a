//! Client configuration, resolved once per client instance and treated as
//! immutable afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error;

/// Redirect-following policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Never follow redirects; 3xx responses are returned as data.
    Never,
    /// Follow up to the engine's default limit (10).
    #[default]
    Normal,
    /// Follow aggressively (limit 50).
    Always,
}

impl RedirectPolicy {
    #[must_use]
    pub(crate) fn max_redirects(self) -> u32 {
        match self {
            RedirectPolicy::Never => 0,
            RedirectPolicy::Normal => 10,
            RedirectPolicy::Always => 50,
        }
    }
}

/// Cookie acceptance policy, applied by the pluggable [`CookieStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookiePolicy {
    /// No cookie handling at all.
    #[default]
    None,
    /// Store and replay every cookie.
    All,
    /// Store only cookies set by the request origin.
    OriginOnly,
}

/// Pluggable cookie storage. The client only delegates: it asks for a
/// `Cookie` header before dispatch and hands over `Set-Cookie` values
/// after; all storage semantics live behind this trait.
pub trait CookieStore: Send + Sync {
    /// Cookie header value to attach for this URL, if any.
    fn cookies_for(&self, url: &url::Url) -> Option<String>;

    /// Record `Set-Cookie` values received from `url`.
    fn store(&self, url: &url::Url, set_cookie: &[String]);
}

/// Preferred HTTP protocol version. Advisory: the transport engine may
/// not support the preference and falls back to HTTP/1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersionPref {
    #[default]
    Http11,
    Http2,
}

/// TLS options forwarded to the transport engine.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Disable certificate verification. Testing escape hatch only.
    pub danger_accept_invalid_certs: bool,
    /// PEM-encoded client certificate chain for mutual TLS.
    pub client_cert_pem: Option<Vec<u8>>,
    /// PEM-encoded client private key for mutual TLS.
    pub client_key_pem: Option<Vec<u8>>,
}

/// Configuration for a client instance. Shared, reused across requests,
/// and never mutated after construction.
#[derive(Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Option<Duration>,
    pub redirect_policy: RedirectPolicy,
    pub proxy: Option<String>,
    pub tls: TlsOptions,
    pub version: HttpVersionPref,
    pub cookie_policy: CookiePolicy,
    pub cookie_store: Option<Arc<dyn CookieStore>>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            redirect_policy: RedirectPolicy::default(),
            proxy: None,
            tls: TlsOptions::default(),
            version: HttpVersionPref::default(),
            cookie_policy: CookiePolicy::default(),
            cookie_store: None,
            user_agent: concat!("paloma/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Validates the configuration before a client is built from it.
    pub fn validate(&self) -> crate::Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(error::config("connect timeout must be greater than zero"));
        }
        if self.connect_timeout > Duration::from_secs(300) {
            return Err(error::config("connect timeout must not exceed 5 minutes"));
        }
        if let Some(timeout) = self.request_timeout {
            if timeout.is_zero() {
                return Err(error::config("request timeout must be greater than zero"));
            }
            if timeout > Duration::from_secs(3600) {
                return Err(error::config("request timeout must not exceed 1 hour"));
            }
        }
        if self.user_agent.is_empty() {
            return Err(error::config("user agent cannot be empty"));
        }
        if self.cookie_policy != CookiePolicy::None && self.cookie_store.is_none() {
            return Err(error::config(
                "cookie policy requires a cookie store implementation",
            ));
        }
        if self.tls.client_cert_pem.is_some() != self.tls.client_key_pem.is_some() {
            return Err(error::config(
                "client certificate and key must be provided together",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("redirect_policy", &self.redirect_policy)
            .field("proxy", &self.proxy)
            .field("version", &self.version)
            .field("cookie_policy", &self.cookie_policy)
            .field("has_cookie_store", &self.cookie_store.is_some())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        ClientConfig::default().validate().expect("default config is valid");
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let config = ClientConfig {
            connect_timeout: Duration::ZERO,
            ..ClientConfig::default()
        };
        let err = config.validate().expect_err("must fail");
        assert_eq!(err.kind(), crate::error::Kind::InvalidConfig);
    }

    #[test]
    fn cookie_policy_without_store_is_rejected() {
        let config = ClientConfig {
            cookie_policy: CookiePolicy::All,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
