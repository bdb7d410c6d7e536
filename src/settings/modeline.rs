//! Per-document modelines
//!
//! A document can switch off formatting rules for itself with an HTML comment
//! near its top or bottom:
//!
//! ```text
//! <!-- fence-ls: disable=missing-language,blank-line-after-fence -->
//! ```
//!
//! Structural checks cannot be disabled.

use std::sync::LazyLock;

use regex::Regex;

use crate::settings::LintSettings;
use crate::validation::Rule;

static MODELINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*fence-ls:\s*disable\s*=\s*([\w,\s-]+?)\s*-->")
        .expect("modeline pattern is valid")
});

/// Number of lines checked at each end of the document
const MODELINE_SCAN_LINES: usize = 5;

/// Rules named by the document's modeline, if it has one
pub fn detect_disabled_rules(content: &str) -> Vec<Rule> {
    let lines: Vec<&str> = content.lines().collect();
    let check_lines: Vec<&str> = if lines.len() <= MODELINE_SCAN_LINES * 2 {
        lines
    } else {
        let mut check = Vec::new();
        check.extend_from_slice(&lines[..MODELINE_SCAN_LINES]);
        check.extend_from_slice(&lines[lines.len() - MODELINE_SCAN_LINES..]);
        check
    };

    for line in check_lines {
        if let Some(captures) = MODELINE_RE.captures(line) {
            return captures[1]
                .split(',')
                .filter_map(|code| rule_from_code(code.trim()))
                .collect();
        }
    }

    Vec::new()
}

fn rule_from_code(code: &str) -> Option<Rule> {
    match code {
        "missing-language" => Some(Rule::MissingLanguage),
        "blank-line-before-fence" => Some(Rule::BlankLineBeforeFence),
        "blank-line-after-fence" => Some(Rule::BlankLineAfterFence),
        _ => {
            log::debug!("Ignoring unknown or non-optional rule '{}' in modeline", code);
            None
        }
    }
}

/// Settings for one document: the shared settings minus its modeline's rules
pub fn settings_for_document(settings: &LintSettings, content: &str) -> LintSettings {
    let mut effective = settings.clone();
    for rule in detect_disabled_rules(content) {
        match rule {
            Rule::MissingLanguage => effective.require_language = false,
            Rule::BlankLineBeforeFence => effective.blank_line_before_fence = false,
            Rule::BlankLineAfterFence => effective.blank_line_after_fence = false,
            Rule::UnclosedBlock | Rule::AmbiguousFence | Rule::ClosingFenceText => {}
        }
    }
    effective
}
