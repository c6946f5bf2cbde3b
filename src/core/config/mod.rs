pub mod data;
pub mod defaults;
pub mod io;
pub mod printing;

pub use data::{path_display, Config, SettingKey};
pub use defaults::{ConfigOverrides, ResolvedSettings};
pub use io::ConfigError;

#[cfg(test)]
pub mod tests;
