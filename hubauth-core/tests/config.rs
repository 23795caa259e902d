use hubauth_core::config::{
    ConfigError, ConfigValue, DefaultSecretResolver, HubAuthConfig, LogFormat, ServiceSettings,
};

const FULL: &str = r#"
host:
  url: "127.0.0.1:9090"
log:
  level: debug
  format: json
oidc:
  provider:
    url: "https://idp.example.com"
  client:
    id: hub-auth
    secret: s3cr3t
  callback:
    url: "https://hub.example.com/oauth2/callback"
  discovery:
    timeout: 3
"#;

#[test]
fn typed_settings_from_yaml() {
    let config = HubAuthConfig::from_yaml_str(FULL, "test").unwrap();
    let settings = ServiceSettings::from_config(&config).unwrap();

    assert_eq!(settings.host_url, "127.0.0.1:9090");
    assert_eq!(settings.log.level, "debug");
    assert_eq!(settings.log.format, LogFormat::Json);
    assert_eq!(settings.oidc.provider_url, "https://idp.example.com");
    assert_eq!(settings.oidc.client_id, "hub-auth");
    assert_eq!(settings.oidc.client_secret, "s3cr3t");
    assert_eq!(settings.oidc.callback_url, "https://hub.example.com/oauth2/callback");
    assert_eq!(settings.oidc.discovery_timeout_secs, 3);
}

#[test]
fn defaults_apply_when_only_provider_is_set() {
    let config =
        HubAuthConfig::from_yaml_str("oidc:\n  provider:\n    url: http://localhost:4444\n", "test")
            .unwrap();
    let settings = ServiceSettings::from_config(&config).unwrap();

    assert_eq!(settings.host_url, "0.0.0.0:8080");
    assert_eq!(settings.log.format, LogFormat::Pretty);
    assert_eq!(settings.oidc.client_id, "");
    assert_eq!(settings.oidc.callback_url, "http://localhost:8080/oauth2/callback");
    assert_eq!(settings.oidc.discovery_timeout_secs, 10);
}

#[test]
fn missing_provider_url_is_reported() {
    let config = HubAuthConfig::from_yaml_str("host:\n  url: x\n", "test").unwrap();
    let err = ServiceSettings::from_config(&config).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref key) if key == "oidc.provider.url"));
}

#[test]
fn zero_timeout_is_invalid() {
    let mut config = HubAuthConfig::from_yaml_str(FULL, "test").unwrap();
    config.set("oidc.discovery.timeout", ConfigValue::Integer(0));
    let err = ServiceSettings::from_config(&config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "oidc.discovery.timeout"));
}

#[test]
fn unknown_log_format_is_invalid() {
    let mut config = HubAuthConfig::from_yaml_str(FULL, "test").unwrap();
    config.set("log.format", ConfigValue::String("xml".into()));
    assert!(matches!(
        ServiceSettings::from_config(&config),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn wrong_type_is_not_silently_defaulted() {
    let mut config = HubAuthConfig::from_yaml_str(FULL, "test").unwrap();
    config.set("oidc.discovery.timeout", ConfigValue::String("soon".into()));
    assert!(matches!(
        config.get_or("oidc.discovery.timeout", 10u64),
        Err(ConfigError::TypeMismatch { .. })
    ));
}

#[test]
fn lists_and_comma_separated_strings() {
    let mut config = HubAuthConfig::from_yaml_str("scopes:\n  - openid\n  - profile\n", "test").unwrap();
    let scopes: Vec<String> = config.get("scopes").unwrap();
    assert_eq!(scopes, vec!["openid", "profile"]);

    config.set("scopes", ConfigValue::String("openid, email".into()));
    let scopes: Vec<String> = config.get("scopes").unwrap();
    assert_eq!(scopes, vec!["openid", "email"]);
}

#[test]
fn empty_config_has_no_keys() {
    let config = HubAuthConfig::empty();
    assert!(!config.contains_key("oidc.provider.url"));
    assert_eq!(config.profile(), "test");
}

#[test]
fn invalid_yaml_is_a_load_error() {
    let err = HubAuthConfig::from_yaml_str("oidc: [unclosed", "test").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn profile_file_overrides_base_and_env_overlays_both() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("hub-auth.yaml"),
        "oidc:\n  provider:\n    url: http://base\n  client:\n    id: base-client\ntestonly:\n  marker: file\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("hub-auth-staging.yaml"),
        "oidc:\n  provider:\n    url: http://staging\n",
    )
    .unwrap();

    std::env::set_var("HUBAUTH_TESTONLY_MARKER", "env");
    let config =
        HubAuthConfig::load_from_dir(dir.path(), "staging", &DefaultSecretResolver).unwrap();
    std::env::remove_var("HUBAUTH_TESTONLY_MARKER");

    assert_eq!(config.profile(), "staging");
    assert_eq!(config.get::<String>("oidc.provider.url").unwrap(), "http://staging");
    assert_eq!(config.get::<String>("oidc.client.id").unwrap(), "base-client");
    assert_eq!(config.get::<String>("testonly.marker").unwrap(), "env");
}

#[test]
fn placeholders_resolve_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let secret = dir.path().join("secret");
    std::fs::write(&secret, "from-file\n").unwrap();
    std::fs::write(
        dir.path().join("hub-auth.yaml"),
        format!(
            "oidc:\n  client:\n    secret: \"${{file:{}}}\"\n",
            secret.display()
        ),
    )
    .unwrap();

    let config = HubAuthConfig::load_from_dir(dir.path(), "dev", &DefaultSecretResolver).unwrap();
    assert_eq!(config.get::<String>("oidc.client.secret").unwrap(), "from-file");
}
