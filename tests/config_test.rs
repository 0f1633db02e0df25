use clap::Parser;
use std::path::PathBuf;

use qrebel_gate::config::*;
use qrebel_gate::settings::GateSettings;

fn check_args(argv: &[&str]) -> CheckArgs {
    let mut full = vec!["qrebel-gate", "check"];
    full.extend_from_slice(argv);
    match CliArgs::try_parse_from(full).unwrap().command {
        Command::Check(args) => args,
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_defaults() {
    assert_eq!(DEFAULT_REQUEST_TIMEOUT_SECS, 60);
    assert_eq!(AUTHORIZATION_HEADER, "authorization");

    let config = StepConfig::from_sources(check_args(&[]), GateSettings::default(), "0.1.0");
    assert!(config.app_name.is_none());
    assert!(config.comparison_strategy.is_none());
    assert_eq!(config.slow_requests_allowed, 0);
    assert_eq!(config.sla_global_limit, 0);
    assert!(config.issue_types.is_empty());
    assert!(!config.update_default_baseline);
    assert_eq!(config.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(config.client_version, "0.1.0");
}

#[test]
fn test_check_args_parse() {
    let args = check_args(&[
        "--app-name",
        "foobar",
        "--target-build",
        "$BUILD_TAG",
        "--comparison-strategy",
        "THRESHOLD",
        "--slow-requests-allowed",
        "15",
        "--sla-global-limit",
        "3771",
        "--issue-type",
        "DURATION,IO",
        "--issue-type",
        "EXCEPTIONS",
        "-p",
        "BUILD_TAG=2.0.6RC3",
        "--update-default-baseline",
        "--description-file",
        "/tmp/description.html",
    ]);

    assert_eq!(args.connection.app_name.as_deref(), Some("foobar"));
    assert_eq!(args.target_build.as_deref(), Some("$BUILD_TAG"));
    assert_eq!(args.slow_requests_allowed, Some(15));
    assert_eq!(args.sla_global_limit, Some(3771));
    assert_eq!(args.issue_types, vec!["DURATION", "IO", "EXCEPTIONS"]);
    assert_eq!(args.params, vec!["BUILD_TAG=2.0.6RC3"]);
    assert!(args.update_default_baseline);
    assert_eq!(args.description_file, Some(PathBuf::from("/tmp/description.html")));
}

#[test]
fn test_negative_allowance_rejected_by_cli() {
    let parsed = CliArgs::try_parse_from(["qrebel-gate", "check", "--exceptions-allowed", "-1"]);
    assert!(parsed.is_err());
}

#[test]
fn test_cli_overrides_settings() {
    let settings = GateSettings {
        app_name: Some("from-file".to_string()),
        server_url: Some("https://qrebel.example.com".to_string()),
        slow_requests_allowed: Some(3),
        exceptions_allowed: Some(7),
        issue_types: Some(vec!["IO".to_string()]),
        params: Some(vec!["A=1".to_string()]),
        update_default_baseline: Some(true),
        timeout_secs: Some(5),
        ..GateSettings::default()
    };
    let args = check_args(&["--app-name", "from-cli", "--slow-requests-allowed", "9", "-p", "B=2"]);
    let config = StepConfig::from_sources(args, settings, "0.1.0");

    assert_eq!(config.app_name.as_deref(), Some("from-cli"));
    assert_eq!(config.server_url.as_deref(), Some("https://qrebel.example.com"));
    assert_eq!(config.slow_requests_allowed, 9);
    assert_eq!(config.exceptions_allowed, 7);
    assert_eq!(config.issue_types, vec!["IO"]);
    assert_eq!(config.params, vec!["A=1", "B=2"]);
    assert!(config.update_default_baseline);
    assert_eq!(config.timeout_secs, 5);
}

#[test]
fn test_connection_from_sources() {
    let settings = GateSettings {
        api_token: Some("file-token".to_string()),
        server_url: Some("https://qrebel.example.com".to_string()),
        ..GateSettings::default()
    };
    let parsed = CliArgs::try_parse_from(["qrebel-gate", "test-connection", "--app-name", "foobar"]).unwrap();
    let Command::TestConnection(args) = parsed.command else {
        panic!("expected test-connection");
    };
    let connection = connection_from_sources(args, &settings);
    assert_eq!(connection.app_name.as_deref(), Some("foobar"));
    assert_eq!(connection.api_token.as_deref(), Some("file-token"));
    assert_eq!(connection.server_url.as_deref(), Some("https://qrebel.example.com"));
}

#[test]
fn test_global_options_after_subcommand() {
    let parsed = CliArgs::try_parse_from([
        "qrebel-gate",
        "check",
        "--config",
        "/etc/qrebel.json",
        "--log-file",
        "gate.log",
    ])
    .unwrap();
    assert_eq!(parsed.config, Some(PathBuf::from("/etc/qrebel.json")));
    assert_eq!(parsed.log_file, Some(PathBuf::from("gate.log")));
}

#[test]
fn test_zero_timeout_rejected() {
    let parsed = CliArgs::try_parse_from(["qrebel-gate", "check", "--timeout-secs", "0"]);
    assert!(parsed.is_err());
    assert_eq!(check_args(&["--timeout-secs", "1"]).timeout_secs, Some(1));

    // A zero coming from the settings file is caught when the timeout is built.
    let settings = GateSettings {
        timeout_secs: Some(0),
        ..GateSettings::default()
    };
    let config = StepConfig::from_sources(check_args(&[]), settings, "0.1.0");
    let err = request_timeout(config.timeout_secs).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.to_string(), TIMEOUT_ZERO);
    assert_eq!(
        request_timeout(DEFAULT_REQUEST_TIMEOUT_SECS).unwrap(),
        std::time::Duration::from_secs(60)
    );
}
