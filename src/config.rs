//! Configuration management for the fence language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Settings file locations
//! - Logger initialisation

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::settings::SettingsPriority;

/// File name of the workspace settings layer
pub const WORKSPACE_SETTINGS_FILE: &str = ".fence-ls.toml";

/// Arguments shared by every binary
#[derive(Debug, Clone, clap::Args)]
pub struct CommonArgs {
    /// Settings file applied on top of every other layer
    #[arg(long, help = "Settings TOML file with the highest priority")]
    pub settings: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Command-line arguments for the fence language server
#[derive(Debug, Parser)]
#[command(name = "fence-ls")]
#[command(about = "Language server for fenced code blocks in markdown documents")]
#[command(version)]
pub struct Args {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings file named on the command line
    pub explicit_settings: Option<PathBuf>,
    /// `~/.config/fence-ls/settings.toml` or the platform equivalent
    pub user_settings: Option<PathBuf>,
    /// `.fence-ls.toml` in the working directory
    pub workspace_settings: Option<PathBuf>,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        Self::from_common(args.common)
    }

    pub fn from_common(common: CommonArgs) -> Result<Self> {
        let user_settings = dirs::config_dir().map(|dir| dir.join("fence-ls").join("settings.toml"));
        let workspace_settings = Some(std::env::current_dir()?.join(WORKSPACE_SETTINGS_FILE));

        Ok(Config {
            explicit_settings: common.settings,
            user_settings,
            workspace_settings,
            log_level: common.log_level,
        })
    }

    /// Settings file locations with their priorities, lowest first
    pub fn settings_sources(&self) -> Vec<(SettingsPriority, PathBuf)> {
        [
            (SettingsPriority::UserGlobal, &self.user_settings),
            (SettingsPriority::Workspace, &self.workspace_settings),
            (SettingsPriority::Explicit, &self.explicit_settings),
        ]
        .into_iter()
        .filter_map(|(priority, path)| path.clone().map(|p| (priority, p)))
        .collect()
    }

    /// Initialise `env_logger`; `RUST_LOG` takes precedence over `--log-level`
    pub fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            log::debug!("Logger already initialised: {}", e);
        }
    }
}
