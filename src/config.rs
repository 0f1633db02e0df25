use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GateError, GateResult};
use crate::settings::GateSettings;

/// Fails a CI build when QRebel reports performance regressions.
#[derive(Parser, Debug, Clone)]
#[command(name = "qrebel-gate", version)]
pub struct CliArgs {
    /// Settings file (JSON); CLI options override its values
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Also write diagnostics to this file
    #[arg(short = 'l', long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Query QRebel for the target build and fail on regressions
    Check(CheckArgs),
    /// Verify the server URL, API token and application name
    TestConnection(ConnectionArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Application name as registered in QRebel
    #[arg(long = "app-name")]
    pub app_name: Option<String>,

    /// QRebel API token
    #[arg(long = "api-token")]
    pub api_token: Option<String>,

    /// QRebel server URL
    #[arg(long = "server-url")]
    pub server_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Target build name (required)
    #[arg(long = "target-build")]
    pub target_build: Option<String>,

    #[arg(long = "target-version")]
    pub target_version: Option<String>,

    /// Baseline build name (required with BASELINE strategy)
    #[arg(long = "baseline-build")]
    pub baseline_build: Option<String>,

    #[arg(long = "baseline-version")]
    pub baseline_version: Option<String>,

    /// BASELINE, DEFAULT_BASELINE or THRESHOLD
    #[arg(long = "comparison-strategy")]
    pub comparison_strategy: Option<String>,

    #[arg(long = "slow-requests-allowed")]
    pub slow_requests_allowed: Option<u64>,

    #[arg(long = "excessive-io-allowed")]
    pub excessive_io_allowed: Option<u64>,

    #[arg(long = "exceptions-allowed")]
    pub exceptions_allowed: Option<u64>,

    /// Global latency limit in ms; 0 disables it
    #[arg(long = "sla-global-limit")]
    pub sla_global_limit: Option<u64>,

    /// Issue types to request: DURATION, IO, EXCEPTIONS
    #[arg(long = "issue-type", value_delimiter = ',')]
    pub issue_types: Vec<String>,

    /// Build parameter used for placeholder resolution (KEY=VALUE)
    #[arg(short = 'p', long = "param")]
    pub params: Vec<String>,

    /// Promote the baseline build to the service's default baseline first
    #[arg(long = "update-default-baseline")]
    pub update_default_baseline: bool,

    /// File holding the build description; the failure report is appended
    #[arg(long = "description-file")]
    pub description_file: Option<PathBuf>,

    /// Write a JSON summary of the outcome to this file
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout-secs", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

// Request constants
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const AUTHORIZATION_HEADER: &str = "authorization";

pub const TIMEOUT_ZERO: &str = "Request timeout must be at least one second";

/// Request timeout from a configured number of seconds. Zero is rejected
/// rather than turned into an immediate timeout.
pub fn request_timeout(secs: u64) -> GateResult<Duration> {
    if secs == 0 {
        return Err(GateError::config(TIMEOUT_ZERO));
    }
    Ok(Duration::from_secs(secs))
}

// Placeholder constants
pub const MAX_PLACEHOLDER_DEPTH: usize = 8;

// Settings constants
pub const SETTINGS_DIR_NAME: &str = "qrebel-gate";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Unresolved step configuration: CLI values layered over the settings file.
/// String fields may still contain `$NAME` placeholders.
#[derive(Debug, Clone, Default)]
pub struct StepConfig {
    pub app_name: Option<String>,
    pub target_build: Option<String>,
    pub target_version: Option<String>,
    pub baseline_build: Option<String>,
    pub baseline_version: Option<String>,
    pub api_token: Option<String>,
    pub server_url: Option<String>,
    pub comparison_strategy: Option<String>,
    pub slow_requests_allowed: u64,
    pub excessive_io_allowed: u64,
    pub exceptions_allowed: u64,
    pub sla_global_limit: u64,
    pub issue_types: Vec<String>,
    pub params: Vec<String>,
    pub update_default_baseline: bool,
    pub description_file: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Sent as `jenkinsPluginVersion`; fixed for the life of the process.
    pub client_version: String,
}

impl StepConfig {
    pub fn from_sources(args: CheckArgs, settings: GateSettings, client_version: &str) -> Self {
        let issue_types = if args.issue_types.is_empty() {
            settings.issue_types.unwrap_or_default()
        } else {
            args.issue_types
        };

        let mut params = settings.params.unwrap_or_default();
        params.extend(args.params);

        StepConfig {
            app_name: args.connection.app_name.or(settings.app_name),
            target_build: args.target_build.or(settings.target_build),
            target_version: args.target_version.or(settings.target_version),
            baseline_build: args.baseline_build.or(settings.baseline_build),
            baseline_version: args.baseline_version.or(settings.baseline_version),
            api_token: args.connection.api_token.or(settings.api_token),
            server_url: args.connection.server_url.or(settings.server_url),
            comparison_strategy: args.comparison_strategy.or(settings.comparison_strategy),
            slow_requests_allowed: args
                .slow_requests_allowed
                .or(settings.slow_requests_allowed)
                .unwrap_or(0),
            excessive_io_allowed: args
                .excessive_io_allowed
                .or(settings.excessive_io_allowed)
                .unwrap_or(0),
            exceptions_allowed: args
                .exceptions_allowed
                .or(settings.exceptions_allowed)
                .unwrap_or(0),
            sla_global_limit: args
                .sla_global_limit
                .or(settings.sla_global_limit)
                .unwrap_or(0),
            issue_types,
            params,
            update_default_baseline: args.update_default_baseline
                || settings.update_default_baseline.unwrap_or(false),
            description_file: args.description_file.or(settings.description_file),
            summary_json: args.summary_json,
            timeout_secs: args
                .timeout_secs
                .or(settings.timeout_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            client_version: client_version.to_string(),
        }
    }
}

/// Connection-only settings for `test-connection`.
pub fn connection_from_sources(args: ConnectionArgs, settings: &GateSettings) -> ConnectionArgs {
    ConnectionArgs {
        app_name: args.app_name.or_else(|| settings.app_name.clone()),
        api_token: args.api_token.or_else(|| settings.api_token.clone()),
        server_url: args.server_url.or_else(|| settings.server_url.clone()),
    }
}
