//! End-to-end behaviour of the fence scan on whole documents
use fence_language_server::validation::DiagnosticKind;
use fence_language_server::{LintSettings, Rule, Severity, scan, scan_with};

const UNCLOSED_MARKDOWN_FIXTURE: &str = include_str!("fixtures/unclosed_markdown_fence.md");

#[test]
fn test_fenceless_document_is_clean() {
    let text = "# Decision\n\nWe adopt the shared template.\n\n- one\n- two\n";
    let result = scan(text);

    assert!(result.is_empty());
    assert!(!result.has_errors());
}

#[test]
fn test_well_formed_tagged_pair_is_clean() {
    let text = "Intro\n\n```rust\nfn main() {}\n```\n\nOutro\n";
    assert!(scan(text).is_empty());
}

#[test]
fn test_scan_is_idempotent() {
    assert_eq!(scan(UNCLOSED_MARKDOWN_FIXTURE), scan(UNCLOSED_MARKDOWN_FIXTURE));
}

#[test]
fn test_single_unclosed_opener() {
    let text = "Intro\n\n```python\nprint('hi')\nmore prose\n";
    let result = scan(text);

    let unclosed: Vec<_> = result
        .iter()
        .filter(|d| d.rule == Rule::UnclosedBlock)
        .collect();
    assert_eq!(unclosed.len(), 1);
    assert_eq!(unclosed[0].line_number, 3);
    assert_eq!(unclosed[0].message, "Unclosed code block starting at line 3");
    assert_eq!(unclosed[0].severity, Severity::Error);
    assert_eq!(unclosed[0].root_cause_line, None);
    assert!(result.has_errors());
}

#[test]
fn test_cascade_is_attributed_to_root_cause() {
    // Unclosed at 3, tagged marker at 5, bare marker at 7
    let text = "Intro\n\n```python\nx = 1\n```bash\nls\n```\n";
    let result = scan(text);

    assert_eq!(result.len(), 2);

    let unclosed = &result.diagnostics[0];
    assert_eq!(unclosed.line_number, 3);
    assert_eq!(unclosed.rule, Rule::UnclosedBlock);

    let explanation = &result.diagnostics[1];
    assert_eq!(explanation.line_number, 5);
    assert_eq!(explanation.rule, Rule::AmbiguousFence);
    assert_eq!(explanation.root_cause_line, Some(3));
    assert!(explanation.message.contains("appears to be a new opening fence"));
    assert!(explanation.message.contains("was never closed"));
    assert!(explanation.message.contains("interpreted as part of the unclosed block"));

    assert!(!result.iter().any(|d| d.rule == Rule::ClosingFenceText));
}

#[test]
fn test_unclosed_markdown_fixture() {
    let result = scan(UNCLOSED_MARKDOWN_FIXTURE);

    assert!(result.len() >= 2);
    assert!(result.iter().any(|d| d.line_number == 18
        && d.message == "Unclosed code block starting at line 18"));
    assert!(
        result
            .iter()
            .any(|d| d.rule == Rule::AmbiguousFence && d.root_cause_line == Some(18))
    );
    assert!(
        !result
            .iter()
            .any(|d| d.message.to_lowercase().contains("extra text"))
    );
}

#[test]
fn test_missing_blank_line_before_is_formatting_only() {
    let text = "Intro\n```rust\nfn main() {}\n```\n";
    let result = scan(text);

    let formatting: Vec<_> = result
        .iter()
        .filter(|d| d.kind() == DiagnosticKind::Formatting)
        .collect();
    assert_eq!(formatting.len(), 1);
    assert_eq!(formatting[0].line_number, 2);
    assert_eq!(formatting[0].severity, Severity::Warning);
    assert_eq!(
        formatting[0].message,
        "Missing blank line before opening fence, line 2"
    );
    assert_eq!(
        result
            .iter()
            .filter(|d| d.kind() == DiagnosticKind::Structural)
            .count(),
        0
    );
    assert!(!result.has_errors());
}

#[test]
fn test_missing_language_is_single_formatting_diagnostic() {
    let text = "Intro\n\n```\ncode\n```\n";
    let result = scan(text);

    assert_eq!(result.len(), 1);
    assert_eq!(result.diagnostics[0].rule, Rule::MissingLanguage);
    assert_eq!(result.diagnostics[0].kind(), DiagnosticKind::Formatting);
    assert_eq!(
        result.diagnostics[0].message,
        "Missing language on opening fence, line 3"
    );
}

#[test]
fn test_missing_blank_line_after_closing_fence() {
    let text = "```rust\nlet x = 1;\n```\nProse right after.\n";
    let result = scan(text);

    assert_eq!(result.len(), 1);
    assert_eq!(result.diagnostics[0].rule, Rule::BlankLineAfterFence);
    assert_eq!(result.diagnostics[0].line_number, 3);
}

#[test]
fn test_diagnostics_sorted_by_line() {
    let text = "Intro\n```\na\n```\ntext\n```python\nb\n```bash\n";
    let result = scan(text);

    let lines: Vec<usize> = result.iter().map(|d| d.line_number).collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
}

#[test]
fn test_frontmatter_is_not_a_fence_and_counts_as_separator() {
    let text = "---\ntitle: Memo\n---\n```rust\nlet x = 1;\n```\n";
    assert!(scan(text).is_empty());
}

#[test]
fn test_longer_fence_nests_shorter_fences() {
    let text = "Intro\n\n````markdown\n```rust\nlet x = 1;\n```\n````\n";
    assert!(scan(text).is_empty());
}

#[test]
fn test_inline_triple_backticks_are_not_fences() {
    let text = "Use ```code``` sparingly.\n\n```code``` at line start\n";
    assert!(scan(text).is_empty());
}

#[test]
fn test_crlf_line_endings() {
    let text = "Intro\r\n\r\n```rust\r\nfn main() {}\r\n```\r\n\r\nOutro\r\n";
    assert!(scan(text).is_empty());

    let unclosed = scan("Intro\r\n\r\n```rust\r\nfn main() {}\r\n");
    assert_eq!(unclosed.len(), 1);
    assert_eq!(unclosed.diagnostics[0].line_number, 3);
}

#[test]
fn test_block_closed_later_explains_without_claiming_unclosed() {
    let text = "Intro\n\n```markdown\n```text\nhello\n```\n```\n";
    let result = scan(text);

    assert_eq!(result.len(), 1);
    let explanation = &result.diagnostics[0];
    assert_eq!(explanation.line_number, 4);
    assert_eq!(explanation.root_cause_line, Some(3));
    assert!(explanation.message.contains("closes at line 7"));
    assert!(!explanation.message.contains("never closed"));
}

#[test]
fn test_disabled_formatting_rules_and_severity() {
    let settings = LintSettings {
        require_language: false,
        blank_line_before_fence: false,
        ..LintSettings::default()
    };
    let text = "Intro\n```\ncode\n```\n";
    assert!(scan_with(text, &settings).is_empty());

    let settings = LintSettings {
        formatting_severity: Severity::Info,
        ..LintSettings::default()
    };
    let result = scan_with(text, &settings);
    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|d| d.severity == Severity::Info));
}

#[test]
fn test_entirely_open_document() {
    let result = scan("```");
    assert_eq!(result.len(), 2);
    assert_eq!(result.diagnostics[0].rule, Rule::UnclosedBlock);
    assert_eq!(result.diagnostics[1].rule, Rule::MissingLanguage);
}

#[test]
fn test_cascade_inside_unclosed_longer_fence() {
    let text = "Intro\n\n````markdown\n# Memo\n```text\nout\n```\n\nMore prose\n";
    let result = scan(text);

    assert_eq!(result.len(), 2);
    assert_eq!(result.diagnostics[0].rule, Rule::UnclosedBlock);
    assert_eq!(result.diagnostics[0].line_number, 3);

    let explanation = &result.diagnostics[1];
    assert_eq!(explanation.line_number, 5);
    assert_eq!(explanation.rule, Rule::AmbiguousFence);
    assert_eq!(explanation.root_cause_line, Some(3));
    assert!(explanation.message.contains("was never closed"));
}
