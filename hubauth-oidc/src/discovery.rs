//! OpenID Connect provider discovery.
//!
//! Fetches `{issuer}/.well-known/openid-configuration` once at startup and
//! checks that the provider can serve this module: the document is complete,
//! its issuer matches the configured URL, and it signs ID tokens with RS256.

use hubauth_core::error::{ErrorKind, ModuleError};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Signing algorithm every provider must offer.
pub const REQUIRED_SIGNING_ALG: &str = "RS256";

/// The subset of the discovery document this module relies on.
///
/// Every field is required; a document missing one is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub jwks_uri: String,
    pub userinfo_endpoint: String,
    pub id_token_signing_alg_values_supported: Vec<String>,
}

/// Why discovery failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The configured provider URL cannot be used. Detected before any
    /// network call.
    InvalidUrl { url: String, reason: String },
    /// The provider did not answer within the configured timeout.
    Timeout { url: String },
    /// Connection-level failure (DNS, refused, TLS, ...).
    Request { url: String, reason: String },
    /// The provider answered with a non-2xx status.
    Status { url: String, status: u16 },
    /// The body is not JSON or lacks a required field.
    InvalidDocument { url: String, reason: String },
    /// The document's `issuer` differs from the configured URL.
    IssuerMismatch { expected: String, found: String },
    /// `RS256` is not among the advertised ID token signing algorithms.
    UnsupportedAlgorithm { supported: Vec<String> },
}

impl DiscoveryError {
    /// URL problems are configuration mistakes; everything else is the
    /// provider's fault.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::InvalidUrl { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Discovery,
        }
    }
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidUrl { url, reason } => {
                write!(f, "invalid OIDC provider URL '{url}': {reason}")
            }
            DiscoveryError::Timeout { url } => write!(f, "timed out fetching {url}"),
            DiscoveryError::Request { url, reason } => {
                write!(f, "failed to fetch {url}: {reason}")
            }
            DiscoveryError::Status { url, status } => {
                write!(f, "{url} returned HTTP {status}")
            }
            DiscoveryError::InvalidDocument { url, reason } => {
                write!(f, "invalid discovery document at {url}: {reason}")
            }
            DiscoveryError::IssuerMismatch { expected, found } => {
                write!(f, "issuer mismatch: expected '{expected}', got '{found}'")
            }
            DiscoveryError::UnsupportedAlgorithm { supported } => write!(
                f,
                "provider does not support {REQUIRED_SIGNING_ALG} ID tokens (supported: {})",
                supported.join(", ")
            ),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<DiscoveryError> for ModuleError {
    fn from(err: DiscoveryError) -> Self {
        ModuleError::new(err.kind(), err.to_string()).with_source(err)
    }
}

/// Check the provider URL syntactically: absolute http(s), with a host, no
/// query or fragment.
pub fn validate_provider_url(raw: &str) -> Result<Url, DiscoveryError> {
    let invalid = |reason: &str| DiscoveryError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.trim().is_empty() {
        return Err(invalid("URL is empty"));
    }

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }
    if url.query().is_some() {
        return Err(invalid("URL must not have a query string"));
    }
    if url.fragment().is_some() {
        return Err(invalid("URL must not have a fragment"));
    }

    Ok(url)
}

/// Discovery endpoint for an issuer base URL.
pub fn discovery_url(provider_url: &str) -> String {
    format!("{}{WELL_KNOWN_PATH}", provider_url.trim_end_matches('/'))
}

/// Fetch and validate the provider's discovery document.
///
/// The provider URL is checked first; an invalid one fails with
/// [`DiscoveryError::InvalidUrl`] before any request is sent. No retries:
/// a single failed attempt is reported as is. The timeout is whatever
/// `client` was built with.
pub async fn discover(
    client: &reqwest::Client,
    provider_url: &str,
) -> Result<ProviderMetadata, DiscoveryError> {
    validate_provider_url(provider_url)?;
    let url = discovery_url(provider_url);

    debug!(%url, "Fetching OIDC discovery document");
    let result = fetch(client, &url).await.and_then(|metadata| {
        check_issuer(provider_url, &metadata)?;
        check_algorithms(&metadata)?;
        Ok(metadata)
    });

    if let Err(err) = &result {
        warn!(%url, error = %err, "OIDC discovery failed");
    }
    result
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<ProviderMetadata, DiscoveryError> {
    let transport = |e: reqwest::Error| {
        if e.is_timeout() {
            DiscoveryError::Timeout {
                url: url.to_string(),
            }
        } else {
            DiscoveryError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|e| DiscoveryError::InvalidDocument {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn check_issuer(provider_url: &str, metadata: &ProviderMetadata) -> Result<(), DiscoveryError> {
    if metadata.issuer.trim_end_matches('/') != provider_url.trim_end_matches('/') {
        return Err(DiscoveryError::IssuerMismatch {
            expected: provider_url.to_string(),
            found: metadata.issuer.clone(),
        });
    }
    Ok(())
}

fn check_algorithms(metadata: &ProviderMetadata) -> Result<(), DiscoveryError> {
    let supported = &metadata.id_token_signing_alg_values_supported;
    if !supported.iter().any(|alg| alg == REQUIRED_SIGNING_ALG) {
        return Err(DiscoveryError::UnsupportedAlgorithm {
            supported: supported.clone(),
        });
    }
    Ok(())
}
