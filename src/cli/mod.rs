//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::config::{Config, ConfigOverrides, SettingKey};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_file_logging;


#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "A single-view terminal chat client for OpenAI-compatible APIs")]
#[command(
    long_about = "Parley is a full-screen terminal chat client. Replies stream in as they are \
generated; the transcript lives only as long as the session.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    API key (the variable name can be changed with 'parley set api-key-env')\n\
  OPENAI_BASE_URL   Custom API base URL (optional, defaults to https://api.openai.com/v1)\n\
  PARLEY_LOG        Filter for --debug-log output (defaults to parley=debug)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Esc               Interrupt the reply being streamed\n\
  Up/Down/Mouse     Scroll through the conversation\n\
  Ctrl+L            Start a new conversation\n\
  Ctrl+C            Quit the application\n\n\
Commands:\n\
  /help             Show commands and key bindings\n\
  /clear            Start a new conversation\n\
  /quit             Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for this session
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// API base URL for this session
    #[arg(short = 'u', long = "base-url", global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to the given file
    #[arg(long = "debug-log", global = true, value_name = "PATH")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set a configuration value, or show the configuration when no value is given
    Set {
        /// One of provider-name, base-url, model, api-key-env, system-prompt, theme
        key: String,
        /// Value to set (can be multiple words, e.g. for system-prompt)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Show the configuration file and the settings in effect
    Config,
    /// Show version and build information
    Version,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if let Some(path) = &args.debug_log {
        init_file_logging(path)?;
    }

    let overrides = args.overrides();
    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            run_chat(config.resolve(&overrides)).await
        }
        Commands::Set { key, value } => {
            let key = SettingKey::parse(&key)?;
            let mut config = Config::load()?;
            if value.is_empty() {
                config.print_all();
                return Ok(());
            }
            let value = value.join(" ");
            config.set(key, &value)?;
            config.save()?;
            println!("✅ Set {} to: {}", key.as_str(), value.trim());
            Ok(())
        }
        Commands::Unset { key } => {
            let key = SettingKey::parse(&key)?;
            let mut config = Config::load()?;
            if config.unset(key) {
                config.save()?;
                println!("✅ Unset {}", key.as_str());
            } else {
                println!("{} was not set", key.as_str());
            }
            Ok(())
        }
        Commands::Config => {
            let config = Config::load()?;
            println!(
                "Config file: {}",
                crate::core::config::path_display(Config::get_config_path())
            );
            config.print_all();
            println!();
            config.resolve(&overrides).print_effective();
            Ok(())
        }
        Commands::Version => {
            print_version_info();
            Ok(())
        }
    }
}

fn print_version_info() {
    println!("parley {}", env!("CARGO_PKG_VERSION"));
    let describe = option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown");
    let sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown");
    println!("  git: {describe} ({sha})");
    if let Some(timestamp) = option_env!("VERGEN_BUILD_TIMESTAMP") {
        println!("  built: {timestamp}");
    }
    if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
        println!("  rustc: {rustc}");
    }
    if let Some(target) = option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
        println!("  target: {target}");
    }
}
