use super::{EvaluationResult, IssueCounters};
use crate::client::{BuildClassifier, IssuesResponse};
use crate::fields::Fields;

/// Line separator in the persisted build description.
pub const HTML_LINE_BREAK: &str = "<br/>\n";

/// Human-readable failure report. Line order and the omission rules are
/// relied upon by tools that parse build descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    lines: Vec<String>,
}

/// Everything the report needs from one evaluated build.
pub struct ReportInput<'a> {
    pub app_name: &'a str,
    pub app_view_url: &'a str,
    pub target: BuildClassifier,
    pub baseline: BuildClassifier,
    pub counters: IssueCounters,
}

impl<'a> ReportInput<'a> {
    /// Prefer what the service echoed back, fall back to the configured values.
    pub fn from_response(response: &'a IssuesResponse, fields: &'a Fields) -> Self {
        let target = response.echoed_target();
        let baseline = response.echoed_baseline();
        ReportInput {
            app_name: response
                .app_name
                .as_deref()
                .unwrap_or_else(|| fields.app_name()),
            app_view_url: response.app_view_url.as_deref().unwrap_or_default(),
            target: BuildClassifier {
                name: target.name.or_else(|| fields.target_build.clone()),
                version: target.version.or_else(|| fields.target_version.clone()),
            },
            baseline: BuildClassifier {
                name: baseline.name.or_else(|| fields.baseline_build.clone()),
                version: baseline.version.or_else(|| fields.baseline_version.clone()),
            },
            counters: response.issues_count,
        }
    }
}

impl FailureReport {
    pub fn generate(input: &ReportInput<'_>, fields: &Fields, result: &EvaluationResult) -> Self {
        let mut lines = Vec::new();

        if result.has_issue_count_breach() {
            lines.push(format!(
                "Build failed because QRebel found regressions in {}",
                input.app_name
            ));
        } else {
            lines.push(format!(
                "Build failed by QRebel Plugin because Performance Gate thresholds were exceeded in {}",
                input.app_name
            ));
        }

        lines.push("TARGET".to_string());
        push_build_lines(&mut lines, &input.target);

        if fields.comparison_strategy.uses_baseline() {
            lines.push("BASELINE".to_string());
            push_build_lines(&mut lines, &input.baseline);
        }

        lines.push(format!("Slow Requests: {}", input.counters.slow_request_count));
        lines.push(format!("Excessive IO: {}", input.counters.excessive_io_count));
        lines.push(format!("Exceptions: {}", input.counters.exception_count));

        let limit = fields.allowances.sla_global_limit;
        if limit > 0 {
            lines.push(format!(
                "SLA global limit (ms): {} ms | slowest endpoint time(ms): {} ms",
                limit, result.slowest_duration
            ));
        }
        lines.push(format!(
            "For full report check your <a href= {} >dashboard</a>.",
            input.app_view_url
        ));

        FailureReport { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn as_html(&self) -> String {
        self.lines.join(HTML_LINE_BREAK)
    }

    pub fn as_text(&self) -> String {
        self.lines.join("\n")
    }
}

fn push_build_lines(lines: &mut Vec<String>, build: &BuildClassifier) {
    lines.push(format!(" build: {}", build.name.as_deref().unwrap_or_default()));
    if let Some(version) = build.version.as_deref().filter(|v| !v.trim().is_empty()) {
        lines.push(format!(" version: {}", version));
    }
}

/// Append the report to an existing description, `<br/>`-separated.
pub fn append_description(existing: Option<&str>, report_html: &str) -> String {
    match existing {
        Some(initial) if !initial.is_empty() => format!("{}<br/>{}", initial, report_html),
        _ => report_html.to_string(),
    }
}
