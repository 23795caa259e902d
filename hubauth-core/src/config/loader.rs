use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::{ConfigError, ENV_PREFIX};

/// Load a YAML file into `values`. A missing file is not an error.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten("", &yaml, values);
    Ok(())
}

/// Flatten a YAML tree into dot-separated keys. Later loads overwrite
/// earlier ones key by key, which is what makes profile files partial
/// overrides.
fn flatten(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, ConfigValue>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let segment = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => format!("{other:?}"),
                };
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}.{segment}")
                };
                flatten(&key, v, out);
            }
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}

/// `HUBAUTH_OIDC_PROVIDER_URL` -> `oidc.provider.url`. Variables without the
/// prefix, and the profile selector itself, are ignored.
pub(crate) fn env_key_to_config_key(env_key: &str) -> Option<String> {
    let rest = env_key.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() || rest == "PROFILE" {
        return None;
    }
    Some(rest.to_lowercase().replace('_', "."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_dotted_keys() {
        assert_eq!(
            env_key_to_config_key("HUBAUTH_OIDC_PROVIDER_URL").as_deref(),
            Some("oidc.provider.url")
        );
        assert_eq!(env_key_to_config_key("HUBAUTH_PROFILE"), None);
        assert_eq!(env_key_to_config_key("HUBAUTH_"), None);
        assert_eq!(env_key_to_config_key("PATH"), None);
    }

    #[test]
    fn nested_mapping_flattens() {
        let mut values = HashMap::new();
        load_yaml_str("oidc:\n  provider:\n    url: http://idp\n", &mut values).unwrap();
        assert!(matches!(
            values.get("oidc.provider.url"),
            Some(ConfigValue::String(s)) if s == "http://idp"
        ));
    }
}
