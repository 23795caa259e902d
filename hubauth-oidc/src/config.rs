use std::sync::Arc;
use std::time::Duration;

use hubauth_core::config::settings::{DEFAULT_CALLBACK_URL, DEFAULT_DISCOVERY_TIMEOUT_SECS};
use hubauth_core::config::OidcSettings;
use hubauth_core::Provider;

/// Configuration handed to the OIDC operation module.
///
/// Built once at startup and never mutated. Cloning is cheap: the storage
/// provider is shared, not copied, so every module built from the same
/// config sees the same stores.
#[derive(Clone)]
pub struct OperationConfig {
    /// Base URL of the OIDC issuer. Discovery fetches
    /// `{oidc_provider_url}/.well-known/openid-configuration`.
    pub oidc_provider_url: String,
    /// Storage backend for transient OAuth state.
    pub provider: Arc<dyn Provider>,
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI sent with authorization and token requests.
    pub callback_url: String,
    /// Upper bound on each outbound call to the identity provider.
    pub discovery_timeout: Duration,
}

impl OperationConfig {
    /// Create a config with the two required fields; everything else takes
    /// its default (empty client credentials, 10s timeout).
    pub fn new(oidc_provider_url: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            oidc_provider_url: oidc_provider_url.into(),
            provider,
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: DEFAULT_CALLBACK_URL.to_string(),
            discovery_timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
        }
    }

    /// Build from the `oidc.*` section of the service configuration.
    pub fn from_settings(settings: &OidcSettings, provider: Arc<dyn Provider>) -> Self {
        Self::new(settings.provider_url.clone(), provider)
            .with_client(settings.client_id.clone(), settings.client_secret.clone())
            .with_callback_url(settings.callback_url.clone())
            .with_discovery_timeout(Duration::from_secs(settings.discovery_timeout_secs))
    }

    pub fn with_client(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client_id = id.into();
        self.client_secret = secret.into();
        self
    }

    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = url.into();
        self
    }

    /// Must be non-zero; [`Operation::new`](crate::Operation::new) rejects
    /// `Duration::ZERO` as a configuration error.
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for OperationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationConfig")
            .field("oidc_provider_url", &self.oidc_provider_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("discovery_timeout", &self.discovery_timeout)
            .finish_non_exhaustive()
    }
}
