// client_builder.rs
//! Builder pattern for constructing Arkime clients with validation

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::client_http::ArkimeClient;
use crate::constants::*;
use crate::error::ArkimeError;
use crate::models::ClientConfig;

type Result<T> = std::result::Result<T, ArkimeError>;

/// Builder for creating Arkime HTTP clients
///
/// # Examples
///
/// ```no_run
/// use arkime::ClientBuilder;
///
/// let client = ClientBuilder::new()
///     .base_url("https://arkime.example.com:8005")
///     .ssl_ca_cert("/path/to/ca.pem")
///     .build()?;
/// # Ok::<(), arkime::ArkimeError>(())
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    ssl_ca_cert: Option<String>,
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: HashMap<String, String>,
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from `ARKIME_URL` and `ARKIME_CA_CERT`
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(url) = env::var(ENV_ARKIME_URL) {
            if !url.is_empty() {
                builder = builder.base_url(url);
            }
        }
        if let Ok(path) = env::var(ENV_ARKIME_CA_CERT) {
            if !path.is_empty() {
                builder = builder.ssl_ca_cert(path);
            }
        }
        builder
    }

    /// Base URL relative request urls are resolved against
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the SSL CA certificate path for server verification
    pub fn ssl_ca_cert(mut self, path: impl Into<String>) -> Self {
        self.ssl_ca_cert = Some(path.into());
        self
    }

    /// Skip TLS certificate verification
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Transport timeout. Unset by default.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Header sent with every request unless the request sets it itself
    pub fn default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Validate the configuration before building
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.base_url {
            let parsed = url::Url::parse(url)
                .map_err(|e| ArkimeError::ConfigurationError(format!("Invalid URL '{}': {}", url, e)))?;
            if parsed.cannot_be_a_base() {
                return Err(ArkimeError::ConfigurationError(format!("URL '{}' cannot be a base", url)));
            }
        }

        if let Some(path) = &self.ssl_ca_cert {
            if !Path::new(path).exists() {
                return Err(ArkimeError::FileNotFound(format!("CA certificate not found: {}", path)));
            }
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ArkimeError::ConfigurationError("Timeout must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Consume the builder into a plain configuration
    pub fn into_config(self) -> Result<ClientConfig> {
        self.validate()?;

        Ok(ClientConfig {
            base_url: self.base_url,
            ssl_ca_cert: self.ssl_ca_cert,
            accept_invalid_certs: self.accept_invalid_certs,
            timeout: self.timeout,
            user_agent: self.user_agent,
            default_headers: self.default_headers,
        })
    }

    /// Build the HTTP client
    pub fn build(self) -> Result<Arc<ArkimeClient>> {
        ArkimeClient::new(self.into_config()?)
    }
}
