//! Settings Schema Types
//!
//! File-level types mirror the TOML layout with every key optional, so a
//! layer only overrides what it names. [`LintSettings`] is the resolved form
//! the engine reads.

use serde::Deserialize;

use crate::validation::Severity;

/// Root settings file structure (matches TOML)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettingsFile {
    pub rules: RulesSection,
    pub document: DocumentSection,
    pub languages: LanguagesSection,
}

/// `[rules]` toggles for the formatting checks
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesSection {
    pub require_language: Option<bool>,
    pub blank_line_before_fence: Option<bool>,
    pub blank_line_after_fence: Option<bool>,
}

/// `[document]` options
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentSection {
    pub skip_frontmatter: Option<bool>,
    pub formatting_severity: Option<Severity>,
}

/// `[languages]` offered when completing a fence's language tag
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanguagesSection {
    /// Replaces the list from lower layers
    pub known: Option<Vec<String>>,
    /// Appended to the list from lower layers
    pub extra: Option<Vec<String>>,
}

/// Resolved lint settings
#[derive(Debug, Clone, PartialEq)]
pub struct LintSettings {
    pub require_language: bool,
    pub blank_line_before_fence: bool,
    pub blank_line_after_fence: bool,
    pub skip_frontmatter: bool,
    pub formatting_severity: Severity,
    pub known_languages: Vec<String>,
}

impl Default for LintSettings {
    /// Hard-coded defaults, used when the embedded settings cannot be parsed
    fn default() -> Self {
        Self {
            require_language: true,
            blank_line_before_fence: true,
            blank_line_after_fence: true,
            skip_frontmatter: true,
            formatting_severity: Severity::Warning,
            known_languages: ["bash", "json", "markdown", "python", "rust", "text", "yaml"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LintSettings {
    /// Overlay a settings file on top of these settings
    pub fn apply(&mut self, file: &SettingsFile) {
        if let Some(value) = file.rules.require_language {
            self.require_language = value;
        }
        if let Some(value) = file.rules.blank_line_before_fence {
            self.blank_line_before_fence = value;
        }
        if let Some(value) = file.rules.blank_line_after_fence {
            self.blank_line_after_fence = value;
        }
        if let Some(value) = file.document.skip_frontmatter {
            self.skip_frontmatter = value;
        }
        if let Some(value) = file.document.formatting_severity {
            self.formatting_severity = value;
        }
        if let Some(known) = &file.languages.known {
            self.known_languages = known.clone();
        }
        if let Some(extra) = &file.languages.extra {
            for language in extra {
                if !self.known_languages.contains(language) {
                    self.known_languages.push(language.clone());
                }
            }
        }
    }
}
