//! Typed view over [`HubAuthConfig`] for the settings the service reads at
//! startup.

use super::{ConfigError, HubAuthConfig};

pub const DEFAULT_HOST_URL: &str = "0.0.0.0:8080";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:8080/oauth2/callback";
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Settings for the OIDC operation module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcSettings {
    /// Base URL of the OIDC issuer (`oidc.provider.url`).
    pub provider_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with the provider.
    pub callback_url: String,
    /// Upper bound on the discovery round-trip, in seconds.
    pub discovery_timeout_secs: u64,
}

/// Everything the bootstrap binary needs from configuration.
///
/// Keys:
/// - `host.url` (default `0.0.0.0:8080`)
/// - `log.level`, `log.format` (`pretty` | `json`)
/// - `oidc.provider.url` (required)
/// - `oidc.client.id`, `oidc.client.secret`
/// - `oidc.callback.url`
/// - `oidc.discovery.timeout` (seconds, default 10, must be > 0)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub host_url: String,
    pub log: LogSettings,
    pub oidc: OidcSettings,
}

impl ServiceSettings {
    pub fn from_config(config: &HubAuthConfig) -> Result<Self, ConfigError> {
        let format = match config.get_or("log.format", "pretty".to_string())?.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid {
                    key: "log.format".into(),
                    reason: format!("unknown format '{other}', expected 'pretty' or 'json'"),
                })
            }
        };

        let discovery_timeout_secs =
            config.get_or("oidc.discovery.timeout", DEFAULT_DISCOVERY_TIMEOUT_SECS)?;
        if discovery_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "oidc.discovery.timeout".into(),
                reason: "must be at least one second".into(),
            });
        }

        Ok(Self {
            host_url: config.get_or("host.url", DEFAULT_HOST_URL.to_string())?,
            log: LogSettings {
                level: config.get_or("log.level", "info".to_string())?,
                format,
            },
            oidc: OidcSettings {
                provider_url: config.get("oidc.provider.url")?,
                client_id: config.get_or("oidc.client.id", String::new())?,
                client_secret: config.get_or("oidc.client.secret", String::new())?,
                callback_url: config
                    .get_or("oidc.callback.url", DEFAULT_CALLBACK_URL.to_string())?,
                discovery_timeout_secs,
            },
        })
    }
}
