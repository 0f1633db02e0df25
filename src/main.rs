use clap::Parser;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use qrebel_gate::client;
use qrebel_gate::config::{
    self, CliArgs, Command, ConnectionArgs, StepConfig, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use qrebel_gate::error::GateResult;
use qrebel_gate::host::ConsoleHost;
use qrebel_gate::settings::{self, GateSettings};
use qrebel_gate::step::{fail_build, run_step, write_summary, StepPerformer};

const DEFAULT_LOG_FILTER: &str = "qrebel_gate=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let log_guard = init_tracing(args.log_file.as_deref())?;

    let code = run(args).await?;

    // process::exit skips destructors; flush the file log first.
    drop(log_guard);
    std::process::exit(code);
}

async fn run(args: CliArgs) -> anyhow::Result<i32> {
    // Computed once and handed to the request builder as configuration.
    let client_version = env!("CARGO_PKG_VERSION");
    info!("Starting qrebel-gate v{}", client_version);

    let settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            return Ok(e.exit_code());
        }
    };

    match args.command {
        Command::Check(check) => {
            let config = StepConfig::from_sources(check, settings, client_version);
            let mut host = match ConsoleHost::new(config.description_file.clone()) {
                Ok(host) => host,
                Err(e) => {
                    error!("Cannot read build description: {}", e);
                    println!("Cannot read build description: {}", e);
                    return Ok(e.exit_code());
                }
            };

            let (outcome, app_name) = match StepPerformer::from_config(&config) {
                Ok(performer) => {
                    let outcome = run_step(&performer, &mut host).await;
                    (outcome, performer.fields().app_name.clone())
                }
                Err(e) => (fail_build(&mut host, e), None),
            };

            if let Some(path) = &config.summary_json {
                write_summary(path, &outcome.summary(app_name.as_deref()))?;
            }
            info!("Build result: {}", outcome.result);
            Ok(outcome.exit_code())
        }
        Command::TestConnection(connection) => {
            let connection = config::connection_from_sources(connection, &settings);
            match test_connection(&connection, &settings).await {
                Ok(()) => {
                    println!("Success");
                    Ok(0)
                }
                Err(e) => {
                    println!("{}", e);
                    Ok(e.exit_code())
                }
            }
        }
    }
}

async fn test_connection(connection: &ConnectionArgs, settings: &GateSettings) -> GateResult<()> {
    let timeout =
        config::request_timeout(settings.timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))?;
    client::check_connection(
        connection.app_name.as_deref(),
        connection.api_token.as_deref(),
        connection.server_url.as_deref(),
        timeout,
    )
    .await
}

fn load_settings(explicit: Option<&Path>) -> GateResult<GateSettings> {
    match explicit {
        Some(path) => settings::load_settings(path),
        None => Ok(settings::default_settings_path()
            .map(|path| settings::load_settings_or_default(&path))
            .unwrap_or_default()),
    }
}

fn init_tracing(
    log_file: Option<&Path>,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    // Diagnostics go to stderr; stdout is the build log.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {:?}", path))?;
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
