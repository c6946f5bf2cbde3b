use crate::core::config::data::Config;

pub const DEFAULT_PROVIDER_NAME: &str = "OpenAI";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_THEME: &str = "dark";

/// Environment variable that overrides the configured base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Values given on the command line; these win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Settings after applying command line, environment, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub provider_name: String,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub system_prompt: Option<String>,
    pub theme: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Resolve effective settings using the process environment.
    pub fn resolve(&self, overrides: &ConfigOverrides) -> ResolvedSettings {
        self.resolve_with_env(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve_with_env<F>(&self, overrides: &ConfigOverrides, env: F) -> ResolvedSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = non_blank(overrides.base_url.clone())
            .or_else(|| non_blank(env(BASE_URL_ENV)))
            .or_else(|| non_blank(self.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = non_blank(overrides.model.clone())
            .or_else(|| non_blank(self.model.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_key_env = non_blank(self.api_key_env.clone())
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = non_blank(env(&api_key_env));

        ResolvedSettings {
            provider_name: non_blank(self.provider_name.clone())
                .unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string()),
            base_url,
            model,
            api_key_env,
            api_key,
            system_prompt: non_blank(self.system_prompt.clone()),
            theme: non_blank(self.theme.clone()).unwrap_or_else(|| DEFAULT_THEME.to_string()),
        }
    }
}
