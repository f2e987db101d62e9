//! Export artifacts: plain-text summary, Markdown, and HTML reports.
//!
//! The plain-text summary is the clipboard form. The Markdown and HTML
//! reports are self-contained documents embedding both sides and the change
//! summary. All three sort change records by path so output is
//! deterministic regardless of key iteration order.

use std::fmt::Write as _;

use crate::diff::{ChangeRecord, ChangeSummary};

/// Inputs shared by every report form.
pub struct ReportInputs<'a> {
    /// Display label of the original side.
    pub left_label: &'a str,
    /// Display label of the modified side.
    pub right_label: &'a str,
    /// Text of the original document as displayed.
    pub original: &'a str,
    /// Text of the modified document as displayed.
    pub modified: &'a str,
}

fn display_path(record: &ChangeRecord) -> &str {
    if record.path.is_empty() {
        "(document root)"
    } else {
        &record.path
    }
}

fn value_text(value: &Option<serde_json::Value>) -> String {
    value.as_ref().map_or_else(String::new, |v| v.to_string())
}

/// Renders the plain-text change summary.
///
/// ```
/// # use serde_json::json;
/// use jcv_core::diff::ChangeSummary;
/// use jcv_core::report::text_summary;
///
/// let summary = ChangeSummary::between(&json!({"a": 1}), &json!({"a": 2}));
/// let text = text_summary(&summary);
/// assert!(text.contains("~ a: 1 -> 2"));
/// ```
#[must_use]
pub fn text_summary(summary: &ChangeSummary) -> String {
    let mut summary = summary.clone();
    summary.sort_by_path();

    if summary.is_empty() {
        return "No differences found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} change(s): {} added, {} modified, {} deleted",
        summary.len(),
        summary.added.len(),
        summary.modified.len(),
        summary.deleted.len()
    );
    out.push('\n');
    for record in &summary.added {
        let _ = writeln!(out, "+ {} = {}", display_path(record), value_text(&record.new_value));
    }
    for record in &summary.modified {
        let _ = writeln!(
            out,
            "~ {}: {} -> {}",
            display_path(record),
            value_text(&record.old_value),
            value_text(&record.new_value)
        );
    }
    for record in &summary.deleted {
        let _ = writeln!(out, "- {} = {}", display_path(record), value_text(&record.old_value));
    }
    out
}

/// Renders a self-contained Markdown report.
#[must_use]
pub fn markdown_report(inputs: &ReportInputs<'_>, summary: &ChangeSummary) -> String {
    let mut out = String::new();
    out.push_str("# Comparison report\n\n");
    let _ = writeln!(out, "## Summary\n\n```\n{}```", text_summary(summary));
    let _ = writeln!(out, "\n## Original ({})\n", label_or_default(inputs.left_label));
    let _ = writeln!(out, "```json\n{}\n```", inputs.original.trim_end());
    let _ = writeln!(out, "\n## Modified ({})\n", label_or_default(inputs.right_label));
    let _ = writeln!(out, "```json\n{}\n```", inputs.modified.trim_end());
    out
}

/// Renders a self-contained HTML report. All embedded text is escaped.
#[must_use]
pub fn html_report(inputs: &ReportInputs<'_>, summary: &ChangeSummary) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Comparison report</title>\n");
    out.push_str(
        "<style>body{font-family:sans-serif;margin:2em}pre{background:#f4f4f4;\
         padding:1em;overflow:auto}</style>\n</head>\n<body>\n",
    );
    out.push_str("<h1>Comparison report</h1>\n");
    let _ = writeln!(out, "<h2>Summary</h2>\n<pre>{}</pre>", escape_html(&text_summary(summary)));
    let _ = writeln!(
        out,
        "<h2>Original ({})</h2>\n<pre>{}</pre>",
        escape_html(label_or_default(inputs.left_label)),
        escape_html(inputs.original)
    );
    let _ = writeln!(
        out,
        "<h2>Modified ({})</h2>\n<pre>{}</pre>",
        escape_html(label_or_default(inputs.right_label)),
        escape_html(inputs.modified)
    );
    out.push_str("</body>\n</html>\n");
    out
}

fn label_or_default(label: &str) -> &str {
    if label.is_empty() {
        "untitled"
    } else {
        label
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
