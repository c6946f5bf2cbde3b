use super::data::{Config, SettingKey};
use super::defaults::{
    ConfigOverrides, BASE_URL_ENV, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
use super::io::ConfigError;
use std::collections::HashMap;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set(SettingKey::Model, "gpt-4o").expect("set model");
    config
        .set(SettingKey::BaseUrl, "http://localhost:8080/v1/")
        .expect("set base url");
    config.save_to_path(&config_path).expect("save failed");

    let mut loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded.model.as_deref(), Some("gpt-4o"));
    assert_eq!(loaded.base_url.as_deref(), Some("http://localhost:8080/v1"));

    assert!(loaded.unset(SettingKey::Model));
    assert!(!loaded.unset(SettingKey::Model));
    loaded.save_to_path(&config_path).expect("second save failed");

    let reloaded = Config::load_from_path(&config_path).expect("reload failed");
    assert_eq!(reloaded.model, None);
    assert_eq!(reloaded.base_url.as_deref(), Some("http://localhost:8080/v1"));
}

#[test]
fn invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "model = [unterminated").expect("write");

    let err = Config::load_from_path(&config_path).expect_err("should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
}

#[test]
fn setting_keys_accept_underscores_and_case() {
    assert_eq!(SettingKey::parse("Base_URL").unwrap(), SettingKey::BaseUrl);
    assert_eq!(
        SettingKey::parse("system-prompt").unwrap(),
        SettingKey::SystemPrompt
    );
    assert!(matches!(
        SettingKey::parse("temperature"),
        Err(ConfigError::UnknownKey(key)) if key == "temperature"
    ));
}

#[test]
fn theme_must_be_known() {
    let mut config = Config::default();
    config.set(SettingKey::Theme, "LIGHT").expect("light theme");
    assert_eq!(config.theme.as_deref(), Some("light"));

    let err = config.set(SettingKey::Theme, "solarized").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "theme", .. }));
    assert_eq!(config.theme.as_deref(), Some("light"));
}

#[test]
fn empty_values_are_rejected() {
    let mut config = Config::default();
    assert!(config.set(SettingKey::Model, "   ").is_err());
    assert_eq!(config.model, None);
}

#[test]
fn resolve_falls_back_to_defaults() {
    let settings = Config::default().resolve_with_env(&ConfigOverrides::default(), env_from(&[]));
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    assert_eq!(settings.model, DEFAULT_MODEL);
    assert_eq!(settings.api_key_env, DEFAULT_API_KEY_ENV);
    assert_eq!(settings.api_key, None);
    assert_eq!(settings.theme, "dark");
    assert_eq!(settings.system_prompt, None);
}

#[test]
fn resolve_prefers_cli_then_env_then_file() {
    let config = Config {
        base_url: Some("http://file/v1".into()),
        model: Some("file-model".into()),
        ..Default::default()
    };

    let env = env_from(&[(BASE_URL_ENV, "http://env/v1/")]);
    let settings = config.resolve_with_env(&ConfigOverrides::default(), env);
    assert_eq!(settings.base_url, "http://env/v1");
    assert_eq!(settings.model, "file-model");

    let overrides = ConfigOverrides {
        model: Some("cli-model".into()),
        base_url: Some("http://cli/v1".into()),
    };
    let env = env_from(&[(BASE_URL_ENV, "http://env/v1")]);
    let settings = config.resolve_with_env(&overrides, env);
    assert_eq!(settings.base_url, "http://cli/v1");
    assert_eq!(settings.model, "cli-model");

    let settings = config.resolve_with_env(&ConfigOverrides::default(), env_from(&[]));
    assert_eq!(settings.base_url, "http://file/v1");
}

#[test]
fn api_key_is_read_from_configured_variable() {
    let config = Config {
        api_key_env: Some("LOCAL_LLM_KEY".into()),
        system_prompt: Some("  ".into()),
        ..Default::default()
    };
    let env = env_from(&[("LOCAL_LLM_KEY", "sk-local"), (DEFAULT_API_KEY_ENV, "sk-openai")]);
    let settings = config.resolve_with_env(&ConfigOverrides::default(), env);
    assert_eq!(settings.api_key.as_deref(), Some("sk-local"));
    assert_eq!(settings.system_prompt, None);
}
