//! Tests for `src/logging.rs`.

use messenger_gateway::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    // Only one global subscriber can be installed per process, so the result
    // is not asserted; the directory is created before installation.
    let _result = messenger_gateway::logging::init_production(&logs_dir);
    assert!(logs_dir.exists(), "logs directory should be created");
}

#[test]
fn second_production_init_reports_existing_subscriber() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let _first = messenger_gateway::logging::init_production(tmp.path());
    let second = messenger_gateway::logging::init_production(tmp.path());
    assert!(second.is_err(), "a global subscriber is already installed");
}

#[test]
fn cli_init_tolerates_existing_subscriber() {
    messenger_gateway::logging::init_cli();
    messenger_gateway::logging::init_cli();
}

#[test]
fn log_file_name_matches_binary() {
    assert_eq!(
        messenger_gateway::logging::LOG_FILE_NAME,
        "messenger-gateway.log"
    );
}
