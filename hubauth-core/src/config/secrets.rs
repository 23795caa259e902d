use super::ConfigError;

/// Trait for secret resolution backends.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError>;
}

/// Default resolver: env vars and file references.
///
/// - `${VAR_NAME}` / `${env:VAR_NAME}` read an environment variable
/// - `${file:/path/to/secret}` reads a file (trimmed)
///
/// Used mostly for `oidc.client.secret`, which should never sit in a YAML
/// file in plain text.
pub struct DefaultSecretResolver;

impl SecretResolver for DefaultSecretResolver {
    fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
        let reference = reference.trim();
        if let Some(path) = reference.strip_prefix("file:") {
            let path = path.trim();
            std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|e| ConfigError::Load(format!("Secret file '{path}': {e}")))
        } else {
            let var = reference.strip_prefix("env:").unwrap_or(reference).trim();
            std::env::var(var).map_err(|_| ConfigError::NotFound(format!("env:{var}")))
        }
    }
}

/// Resolve every `${...}` placeholder in `value`.
pub fn resolve_placeholders(
    value: &str,
    resolver: &dyn SecretResolver,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ConfigError::Load(format!("Unclosed placeholder in: {value}")))?;
        out.push_str(&resolver.resolve(&after[..end])?);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapResolver;

    impl SecretResolver for MapResolver {
        fn resolve(&self, reference: &str) -> Result<String, ConfigError> {
            match reference {
                "HOST" => Ok("idp.example.com".into()),
                "PORT" => Ok("8443".into()),
                other => Err(ConfigError::NotFound(other.into())),
            }
        }
    }

    #[test]
    fn resolves_multiple_placeholders() {
        let result = resolve_placeholders("https://${HOST}:${PORT}/realms/x", &MapResolver).unwrap();
        assert_eq!(result, "https://idp.example.com:8443/realms/x");
    }

    #[test]
    fn plain_value_untouched() {
        assert_eq!(resolve_placeholders("plain", &MapResolver).unwrap(), "plain");
    }

    #[test]
    fn unclosed_placeholder_fails() {
        assert!(resolve_placeholders("${HOST", &MapResolver).is_err());
    }

    #[test]
    fn unknown_reference_fails() {
        assert!(matches!(
            resolve_placeholders("${NOPE}", &MapResolver),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn file_reference_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("client-secret");
        std::fs::write(&secret, "s3cr3t\n").unwrap();

        let value = format!("${{file:{}}}", secret.display());
        let result = resolve_placeholders(&value, &DefaultSecretResolver).unwrap();
        assert_eq!(result, "s3cr3t");
    }
}
