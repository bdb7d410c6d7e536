//! Lint Settings
//!
//! Layered TOML settings, per-document modelines and live reload.

pub mod manager;
pub mod modeline;
pub mod schema;

pub use manager::{SettingsLayer, SettingsManager, SettingsPriority};
pub use modeline::{detect_disabled_rules, settings_for_document};
pub use schema::{LintSettings, SettingsFile};
