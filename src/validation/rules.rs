//! Formatting Rule Set
//!
//! Per-marker checks that run whether or not the block structure is sound:
//! an opening fence found before a never-closed block is still checked.

use crate::parser::{ClassifiedLine, LineKind};
use crate::settings::LintSettings;
use crate::validation::engine::Rule;
use crate::validation::state_machine::{FenceRole, FenceTrace};

/// A single formatting violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub rule: Rule,
    pub message: String,
}

/// Check tagging and spacing of every opening and closing fence
pub fn check_formatting(
    lines: &[ClassifiedLine<'_>],
    trace: &FenceTrace,
    settings: &LintSettings,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for &(line_number, role) in &trace.roles {
        let idx = line_number - 1;
        let Some(marker) = lines.get(idx).and_then(|l| l.marker()) else {
            continue;
        };

        match role {
            FenceRole::Opening => {
                if settings.require_language && marker.language_tag.is_empty() {
                    findings.push(Finding {
                        line: line_number,
                        rule: Rule::MissingLanguage,
                        message: format!("Missing language on opening fence, line {}", line_number),
                    });
                }

                // The closing frontmatter delimiter counts as a separator
                let needs_blank = idx > 0
                    && lines
                        .get(idx - 1)
                        .is_some_and(|prev| !matches!(prev.kind, LineKind::Blank | LineKind::Frontmatter));
                if settings.blank_line_before_fence && needs_blank {
                    findings.push(Finding {
                        line: line_number,
                        rule: Rule::BlankLineBeforeFence,
                        message: format!(
                            "Missing blank line before opening fence, line {}",
                            line_number
                        ),
                    });
                }
            }
            FenceRole::Closing => {
                let needs_blank = lines
                    .get(idx + 1)
                    .is_some_and(|next| next.kind != LineKind::Blank);
                if settings.blank_line_after_fence && needs_blank {
                    findings.push(Finding {
                        line: line_number,
                        rule: Rule::BlankLineAfterFence,
                        message: format!(
                            "Missing blank line after closing fence, line {}",
                            line_number
                        ),
                    });
                }
            }
            FenceRole::Inert | FenceRole::Ambiguous => {}
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::classify_document;
    use crate::validation::state_machine::trace_fences;

    fn findings(text: &str, settings: &LintSettings) -> Vec<Finding> {
        let lines = classify_document(text, settings.skip_frontmatter);
        let trace = trace_fences(&lines);
        check_formatting(&lines, &trace, settings)
    }

    fn rules(text: &str) -> Vec<(usize, Rule)> {
        findings(text, &LintSettings::default())
            .into_iter()
            .map(|f| (f.line, f.rule))
            .collect()
    }

    #[test]
    fn test_well_spaced_block() {
        assert!(rules("Intro\n\n```rust\nlet x = 1;\n```\n\nOutro").is_empty());
    }

    #[test]
    fn test_first_and_last_lines_are_exempt() {
        assert!(rules("```rust\nlet x = 1;\n```").is_empty());
    }

    #[test]
    fn test_missing_blank_before_opening() {
        assert_eq!(
            rules("Intro\n```rust\nlet x = 1;\n```"),
            vec![(2, Rule::BlankLineBeforeFence)]
        );
    }

    #[test]
    fn test_missing_blank_after_closing() {
        assert_eq!(
            rules("```rust\nlet x = 1;\n```\nOutro"),
            vec![(3, Rule::BlankLineAfterFence)]
        );
    }

    #[test]
    fn test_missing_language() {
        let result = findings("```\ncode\n```", &LintSettings::default());

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].rule, Rule::MissingLanguage);
        assert_eq!(result[0].message, "Missing language on opening fence, line 1");
    }

    #[test]
    fn test_opening_after_frontmatter_is_exempt() {
        assert!(rules("---\ntitle: x\n---\n```yaml\na: b\n```").is_empty());
    }

    #[test]
    fn test_unclosed_opening_is_still_checked() {
        assert_eq!(
            rules("Intro\n```\nnever closed"),
            vec![(2, Rule::MissingLanguage), (2, Rule::BlankLineBeforeFence)]
        );
    }

    #[test]
    fn test_ambiguous_markers_get_no_findings() {
        // Line 3 would otherwise need a blank line before it
        assert!(rules("```python\nx = 1\n```bash\ny = 2").is_empty());
    }

    #[test]
    fn test_disabled_rules() {
        let settings = LintSettings {
            require_language: false,
            blank_line_before_fence: false,
            blank_line_after_fence: false,
            ..LintSettings::default()
        };
        assert!(findings("Intro\n```\ncode\n```\nOutro", &settings).is_empty());
    }
}
