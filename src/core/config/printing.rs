use crate::core::config::data::{Config, SettingKey};
use crate::core::config::defaults::ResolvedSettings;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        for key in SettingKey::ALL {
            match self.get(key) {
                Some(value) => println!("  {}: {}", key.as_str(), value),
                None => println!("  {}: (unset)", key.as_str()),
            }
        }
    }
}

impl ResolvedSettings {
    pub fn print_effective(&self) {
        println!("Effective settings:");
        println!("  provider-name: {}", self.provider_name);
        println!("  base-url: {}", self.base_url);
        println!("  model: {}", self.model);
        let key_state = if self.api_key.is_some() {
            "set"
        } else {
            "not set"
        };
        println!("  api-key-env: {} ({key_state})", self.api_key_env);
        match &self.system_prompt {
            Some(prompt) => println!("  system-prompt: {prompt}"),
            None => println!("  system-prompt: (none)"),
        }
        println!("  theme: {}", self.theme);
    }
}
