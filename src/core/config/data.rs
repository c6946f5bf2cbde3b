use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::io::ConfigError;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Label shown in the title bar (e.g., "OpenAI", "Local")
    pub provider_name: Option<String>,
    /// Root of an OpenAI-compatible API, without the `/chat/completions` suffix
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Sent ahead of every conversation when set
    pub system_prompt: Option<String>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
}

/// Keys accepted by `parley set` and `parley unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ProviderName,
    BaseUrl,
    Model,
    ApiKeyEnv,
    SystemPrompt,
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::ProviderName,
        SettingKey::BaseUrl,
        SettingKey::Model,
        SettingKey::ApiKeyEnv,
        SettingKey::SystemPrompt,
        SettingKey::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::ProviderName => "provider-name",
            SettingKey::BaseUrl => "base-url",
            SettingKey::Model => "model",
            SettingKey::ApiKeyEnv => "api-key-env",
            SettingKey::SystemPrompt => "system-prompt",
            SettingKey::Theme => "theme",
        }
    }

    pub fn parse(key: &str) -> Result<Self, ConfigError> {
        let normalized = key.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))
    }
}

impl Config {
    fn slot_mut(&mut self, key: SettingKey) -> &mut Option<String> {
        match key {
            SettingKey::ProviderName => &mut self.provider_name,
            SettingKey::BaseUrl => &mut self.base_url,
            SettingKey::Model => &mut self.model,
            SettingKey::ApiKeyEnv => &mut self.api_key_env,
            SettingKey::SystemPrompt => &mut self.system_prompt,
            SettingKey::Theme => &mut self.theme,
        }
    }

    pub fn get(&self, key: SettingKey) -> Option<&str> {
        match key {
            SettingKey::ProviderName => self.provider_name.as_deref(),
            SettingKey::BaseUrl => self.base_url.as_deref(),
            SettingKey::Model => self.model.as_deref(),
            SettingKey::ApiKeyEnv => self.api_key_env.as_deref(),
            SettingKey::SystemPrompt => self.system_prompt.as_deref(),
            SettingKey::Theme => self.theme.as_deref(),
        }
    }

    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: key.as_str(),
                message: "value must not be empty".to_string(),
            });
        }

        let value = match key {
            SettingKey::Theme => {
                let theme = value.to_ascii_lowercase();
                if theme != "dark" && theme != "light" {
                    return Err(ConfigError::InvalidValue {
                        key: key.as_str(),
                        message: format!("unknown theme '{value}' (expected dark or light)"),
                    });
                }
                theme
            }
            SettingKey::BaseUrl => value.trim_end_matches('/').to_string(),
            _ => value.to_string(),
        };

        *self.slot_mut(key) = Some(value);
        Ok(())
    }

    /// Returns `true` when a value was actually removed.
    pub fn unset(&mut self, key: SettingKey) -> bool {
        self.slot_mut(key).take().is_some()
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
