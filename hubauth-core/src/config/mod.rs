mod loader;
pub mod secrets;
pub mod settings;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use secrets::{DefaultSecretResolver, SecretResolver};
pub use settings::{LogFormat, LogSettings, OidcSettings, ServiceSettings};
pub use value::{ConfigValue, FromConfigValue};

/// Environment variables with this prefix overlay file values.
pub const ENV_PREFIX: &str = "HUBAUTH_";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// A value was present but unusable.
    Invalid { key: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, reason } => {
                write!(f, "Invalid config value for '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raw service configuration: dot-separated keys mapped to values.
///
/// Resolution order (lowest to highest priority):
/// 1. `hub-auth.yaml`
/// 2. `hub-auth-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. `${...}` placeholders in string values are resolved
/// 5. `HUBAUTH_*` environment variables (`HUBAUTH_OIDC_PROVIDER_URL`
///    overrides `oidc.provider.url`). Placeholders on keys overridden here
///    are skipped.
///
/// Profile is determined by: `HUBAUTH_PROFILE` env var > argument.
#[derive(Debug, Clone)]
pub struct HubAuthConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl HubAuthConfig {
    /// Load configuration for the given profile from the current working
    /// directory, with a custom secret resolver.
    pub fn load_with_resolver(
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."), profile, resolver)
    }

    /// Load configuration for the given profile (default resolver: env + file).
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_with_resolver(profile, &DefaultSecretResolver)
    }

    /// Load configuration files from `dir` instead of the working directory.
    pub fn load_from_dir(
        dir: &Path,
        profile: &str,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, ConfigError> {
        let active_profile = std::env::var(format!("{ENV_PREFIX}PROFILE"))
            .unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();

        loader::load_yaml_file(&dir.join("hub-auth.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("hub-auth-{active_profile}.yaml")),
            &mut values,
        )?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        let overlay: HashMap<String, String> = std::env::vars()
            .filter_map(|(env_key, env_val)| {
                loader::env_key_to_config_key(&env_key).map(|key| (key, env_val))
            })
            .collect();

        // Overridden values are never resolved, so a placeholder on a key the
        // environment replaces cannot fail the load.
        values.retain(|key, _| !overlay.contains_key(key));
        resolve_string_values(&mut values, resolver)?;

        for (key, env_val) in overlay {
            values.insert(key, ConfigValue::String(env_val));
        }

        Ok(Self {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(Self {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, returning `default` when the key is missing.
    ///
    /// A present value of the wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.get(key) {
            Err(ConfigError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }
}

/// Resolve `${...}` placeholders in all string values of the config map.
fn resolve_string_values(
    values: &mut HashMap<String, ConfigValue>,
    resolver: &dyn SecretResolver,
) -> Result<(), ConfigError> {
    for value in values.values_mut() {
        if let ConfigValue::String(s) = value {
            if s.contains("${") {
                *s = secrets::resolve_placeholders(s, resolver)?;
            }
        }
    }
    Ok(())
}
