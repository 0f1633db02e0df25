use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::client::QRebelClient;
use crate::config::{request_timeout, StepConfig};
use crate::error::{GateError, GateResult};
use crate::fields::Fields;
use crate::gate::evaluator::evaluate;
use crate::gate::report::{append_description, FailureReport, ReportInput};
use crate::gate::request::{build_issues_query, validate_mandatory};
use crate::gate::{Breach, EvaluationResult};
use crate::host::{BuildHost, BuildResult};

/// Result of one successful pass through the pipeline.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub evaluation: EvaluationResult,
    pub report: Option<FailureReport>,
}

/// One gate invocation for one build: validate, optionally promote the
/// baseline, fetch issues, evaluate, report.
pub struct StepPerformer {
    fields: Fields,
    client_version: String,
    update_default_baseline: bool,
    timeout: Duration,
}

impl StepPerformer {
    pub fn new(fields: Fields, client_version: impl Into<String>) -> Self {
        Self {
            fields,
            client_version: client_version.into(),
            update_default_baseline: false,
            timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn from_config(config: &StepConfig) -> GateResult<Self> {
        let timeout = request_timeout(config.timeout_secs)?;
        let fields = Fields::resolve_from_env(config)?;
        Ok(Self::new(fields, config.client_version.as_str())
            .with_update_default_baseline(config.update_default_baseline)
            .with_timeout(timeout))
    }

    pub fn with_update_default_baseline(mut self, enabled: bool) -> Self {
        self.update_default_baseline = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub async fn perform<H: BuildHost>(&self, host: &mut H) -> GateResult<Verdict> {
        let fields = &self.fields;
        host.log(&format!("AppName: {}", fields.app_name()));
        host.log(&format!("Baseline Build: {}", fields.baseline_build.as_deref().unwrap_or_default()));
        host.log(&format!("Baseline Version: {}", fields.baseline_version.as_deref().unwrap_or_default()));
        host.log(&format!("Target Build: {}", fields.target_build.as_deref().unwrap_or_default()));
        host.log(&format!("Target Version: {}", fields.target_version.as_deref().unwrap_or_default()));

        validate_mandatory(fields)?;
        let query = build_issues_query(fields, &self.client_version)?;

        // validate_mandatory guarantees these are present.
        let app_name = fields.app_name();
        let api_token = fields.api_token.as_deref().unwrap_or_default();
        let server_url = fields.server_url.as_deref().unwrap_or_default();
        let client = QRebelClient::new(server_url, self.timeout)?;

        if self.update_default_baseline {
            if let Some(baseline) = fields.baseline_build.as_deref() {
                host.log(&format!("Setting default baseline to {}", baseline));
                client
                    .set_default_baseline(api_token, app_name, baseline, fields.baseline_version.as_deref())
                    .await?;
            } else {
                warn!("No baseline build configured, default baseline left unchanged");
            }
        }

        host.log(&format!("[QRebel] ---> GET {}", client.issues_url(app_name, &query)?));
        let response = client.get_issues(api_token, app_name, &query).await?;

        let evaluation = evaluate(&response.issues_count, &response.latencies(), &fields.allowances);
        if !evaluation.failed {
            info!("No performance regressions in {}", app_name);
            host.log(&format!("QRebel found no performance regressions in {}", app_name));
            return Ok(Verdict {
                evaluation,
                report: None,
            });
        }

        for reason in evaluation.reasons() {
            warn!("{}", reason);
        }
        host.set_result(BuildResult::Failure);
        let report = FailureReport::generate(
            &ReportInput::from_response(&response, fields),
            fields,
            &evaluation,
        );
        let description = append_description(host.description().as_deref(), &report.as_html());
        host.set_description(&description)?;
        host.log(&report.as_text());

        Ok(Verdict {
            evaluation,
            report: Some(report),
        })
    }
}

/// What happened to the build, including fatal errors.
#[derive(Debug)]
pub struct StepOutcome {
    pub result: BuildResult,
    pub verdict: Option<Verdict>,
    pub error: Option<GateError>,
}

impl StepOutcome {
    pub fn exit_code(&self) -> i32 {
        match &self.error {
            Some(err) => err.exit_code(),
            None => self.result.exit_code(),
        }
    }

    pub fn summary(&self, app_name: Option<&str>) -> GateSummary {
        let evaluation = self.verdict.as_ref().map(|v| &v.evaluation);
        GateSummary {
            result: self.result,
            app_name: app_name.map(String::from),
            failed: self.result == BuildResult::Failure,
            reasons: evaluation.map(EvaluationResult::reasons).unwrap_or_default(),
            breaches: evaluation.map(|e| e.breaches.clone()).unwrap_or_default(),
            slowest_duration_ms: evaluation.map(|e| e.slowest_duration),
            error: self.error.as_ref().map(ToString::to_string),
            evaluated_at: Utc::now(),
        }
    }
}

/// Machine-readable outcome written by `--summary-json`.
#[derive(Debug, Clone, Serialize)]
pub struct GateSummary {
    pub result: BuildResult,
    pub app_name: Option<String>,
    pub failed: bool,
    pub reasons: Vec<String>,
    pub breaches: Vec<Breach>,
    pub slowest_duration_ms: Option<u64>,
    pub error: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

pub fn write_summary(path: &Path, summary: &GateSummary) -> GateResult<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Run the step and fold every fatal error into a failed build.
pub async fn run_step<H: BuildHost>(performer: &StepPerformer, host: &mut H) -> StepOutcome {
    match performer.perform(host).await {
        Ok(verdict) => StepOutcome {
            result: host.result(),
            verdict: Some(verdict),
            error: None,
        },
        Err(err) => fail_build(host, err),
    }
}

/// Mark the build failed and surface `err` verbatim in the build log.
pub fn fail_build<H: BuildHost>(host: &mut H, err: GateError) -> StepOutcome {
    error!("QRebel step failed: {}", err);
    host.log(&err.to_string());
    host.set_result(BuildResult::Failure);
    StepOutcome {
        result: BuildResult::Failure,
        verdict: None,
        error: Some(err),
    }
}
