//! OIDC operation module for hub-auth.
//!
//! At construction the module discovers the configured OpenID provider
//! (`{url}/.well-known/openid-configuration`), then exposes two endpoints:
//!
//! - `GET /oauth2/request?scope=...` redirects the user agent to the
//!   provider's authorization endpoint.
//! - `GET /oauth2/callback?state=...&code=...` exchanges the authorization
//!   code for tokens.
//!
//! # Example
//!
//! ```ignore
//! use hubauth_core::{Controller, MemProvider, ModuleRegistry};
//! use hubauth_oidc::{AuthOperations, OperationConfig};
//!
//! let config = OperationConfig::new("https://idp.example.com", MemProvider::shared())
//!     .with_client("hub", "secret");
//! let registry = ModuleRegistry::new().with(AuthOperations);
//! let controller = Controller::new(&config, &registry).await?;
//! ```

pub mod config;
pub mod discovery;

mod handlers;
mod state;

use std::sync::Arc;

use hubauth_core::error::ModuleError;
use hubauth_core::{Handler, OperationModule};
use tracing::info;
use url::Url;

pub use config::OperationConfig;
pub use discovery::{DiscoveryError, ProviderMetadata};
pub use handlers::{CALLBACK_PATH, REQUEST_PATH};
pub use state::STATE_STORE_NAME;

use handlers::OperationState;

/// Name this module reports to the controller.
pub const MODULE_NAME: &str = "hub-auth-rest";

/// The OIDC module as registered with a
/// [`ModuleRegistry`](hubauth_core::ModuleRegistry).
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthOperations;

impl OperationModule<OperationConfig> for AuthOperations {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn construct(&self, config: &OperationConfig) -> Result<Vec<Handler>, ModuleError> {
        Ok(Operation::new(config).await?.rest_handlers())
    }
}

/// A discovered provider plus the state the REST handlers need.
pub struct Operation {
    metadata: ProviderMetadata,
    state: Arc<OperationState>,
}

impl Operation {
    /// Validate `config`, run discovery and open the state store.
    ///
    /// Exactly one discovery request is made, bounded by
    /// `config.discovery_timeout`. A zero timeout is a configuration error.
    pub async fn new(config: &OperationConfig) -> Result<Self, ModuleError> {
        if config.discovery_timeout.is_zero() {
            return Err(ModuleError::configuration(
                "discovery timeout must be greater than zero",
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.discovery_timeout)
            .build()
            .map_err(|e| {
                ModuleError::configuration(format!("failed to build HTTP client: {e}"))
                    .with_source(e)
            })?;

        let metadata = discovery::discover(&http, &config.oidc_provider_url).await?;

        let authorization_endpoint = Url::parse(&metadata.authorization_endpoint).map_err(|e| {
            DiscoveryError::InvalidDocument {
                url: discovery::discovery_url(&config.oidc_provider_url),
                reason: format!("authorization_endpoint is not a URL: {e}"),
            }
        })?;

        let states = state::StateStore::open(config.provider.as_ref()).map_err(|e| {
            ModuleError::configuration(format!("failed to open store '{STATE_STORE_NAME}': {e}"))
                .with_source(e)
        })?;

        info!(
            issuer = %metadata.issuer,
            authorization_endpoint = %metadata.authorization_endpoint,
            token_endpoint = %metadata.token_endpoint,
            "OIDC provider discovered"
        );

        Ok(Self {
            state: Arc::new(OperationState {
                http,
                authorization_endpoint,
                token_endpoint: metadata.token_endpoint.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                callback_url: config.callback_url.clone(),
                states,
            }),
            metadata,
        })
    }

    /// The provider's discovery document.
    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    /// The authorization request and callback handlers, in that order.
    pub fn rest_handlers(&self) -> Vec<Handler> {
        vec![
            Handler::get(REQUEST_PATH, handlers::create_auth_request, self.state.clone()),
            Handler::get(CALLBACK_PATH, handlers::handle_auth_callback, self.state.clone()),
        ]
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("issuer", &self.metadata.issuer)
            .finish_non_exhaustive()
    }
}
