//! Configuration and input pipeline tests
//!
//! Drives the builder the way the CLI does: YAML configuration, JSON or
//! JSON Lines input, sessions and summary serialized back to JSON.

use callscope_common::{parse_records, CallscopeConfig, Error, OptionOverrides};
use callscope_session::{FailureCode, SessionBuilder, SessionSummary};
use integration_tests::{init_test_logging, TestResult};

const DRIVE_LOG: &str = r#"
{"time": "10:00:00.000", "message": "CM_SERVICE_REQUEST", "callId": "1"}
{"time": "10:00:00.500", "message": "RRC_CONNECTION_SETUP_COMPLETE", "callId": "1"}
{"time": "10:00:01.000", "type": "MEASUREMENT", "level": -84, "properties": {"EcNo": "-6.5"}, "callId": "1"}
{"time": "10:00:01.200", "message": "CONNECT", "callId": "1"}

{"time": "10:00:02.000", "message": "SETUP", "properties": {"IMSI": "001010000000009"}}
{"time": "10:00:04.500", "message": "RRC_CONNECTION_REJECT", "properties": {"IMSI": "001010000000009"}}
{"time": "10:00:20.000", "message": "RADIO LINK FAILURE", "callId": "1"}
{"time": "garbage", "message": "CM_SERVICE_REQUEST", "callId": "3"}
{"message": "CM_SERVICE_REQUEST", "callId": "4"}
"#;

#[test]
fn test_jsonl_drive_log_end_to_end() -> TestResult {
    init_test_logging();

    let records = parse_records(DRIVE_LOG)?;
    assert_eq!(records.len(), 9);

    let options = CallscopeConfig::default().session_options()?;
    let sessions = SessionBuilder::new(options).build(&records);
    assert_eq!(sessions.len(), 2);

    let call = &sessions[0];
    assert!(call.drop);
    assert_eq!(call.radio_measurements_timeline.len(), 1);
    assert_eq!(call.radio_measurements_timeline[0].rscp, Some(-84.0));
    assert_eq!(call.radio_measurements_timeline[0].ecno, Some(-6.5));

    let rejected = &sessions[1];
    assert_eq!(rejected.imsi.as_deref(), Some("001010000000009"));
    assert_eq!(
        rejected.failure_reason.as_ref().map(|r| r.code),
        Some(FailureCode::RrcFailure)
    );

    let summary = SessionSummary::from_sessions(&sessions);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.drops, 1);
    assert_eq!(summary.call_setup_success, 1);
    assert_eq!(summary.setup_failures, 1);
    assert_eq!(summary.failure_codes.get(&FailureCode::RrcFailure), Some(&1));

    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["setupFailures"], 1);
    assert_eq!(json["failureCodes"]["RRC_FAILURE"], 1);
    assert_eq!(json["successRate"], 50.0);
    Ok(())
}

#[test]
fn test_json_array_input() -> TestResult {
    let records = parse_records(
        r#"[
            {"time": "2024-05-01T10:00:00Z", "event": "CM Service Request", "tid": 77},
            {"time": "2024-05-01T10:00:03Z", "event": "Connect", "tid": 77},
            {"time": "2024-05-01T10:00:09Z", "event": "Disconnect", "tid": 77},
            {"time": "2024-05-01T10:00:09.300Z", "message": "RRC Connection Release", "tid": 77, "rrc_rel_cause": "normal"}
        ]"#,
    )?;
    let sessions = SessionBuilder::default().build(&records);
    assert_eq!(sessions.len(), 1);
    let s = &sessions[0];
    assert_eq!(s.call_transaction_id.as_deref(), Some("77"));
    assert!(s.call_setup_success);
    assert_eq!(s.duration_ms, Some(9_300));
    assert_eq!(s.start_time, "2024-05-01T10:00:00Z");
    Ok(())
}

#[test]
fn test_null_properties_do_not_reject_the_input() -> TestResult {
    let records = parse_records(
        r#"[
            {"time": "2024-01-01T00:00:00Z", "message": "CM_SERVICE_REQUEST", "callId": "p", "properties": null},
            {"time": "2024-01-01T00:00:01Z", "message": "CONNECT", "callId": "p", "properties": null},
            {"time": "2024-01-01T00:00:06Z", "message": "DISCONNECT | RELEASE", "callId": "p"}
        ]"#,
    )?;
    assert_eq!(records.len(), 3);
    assert!(records[0].properties.is_empty());

    let sessions = SessionBuilder::default().build(&records);
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].call_setup_success);
    assert_eq!(sessions[0].records_count, 3);
    Ok(())
}

#[test]
fn test_yaml_config_changes_thresholds() -> TestResult {
    let config = CallscopeConfig::from_yaml(
        "log_level: debug\nsession:\n  minValidAttemptMs: 500\n  time_window_ms: 45000\n",
    )?;
    let options = config.session_options()?;
    assert_eq!(options.min_valid_attempt_ms, 500);
    assert_eq!(options.time_window_ms, 45_000);

    let records = parse_records(
        "{\"time\": \"10:00:00\", \"message\": \"SETUP\", \"callId\": \"s\"}\n\
         {\"time\": \"10:00:00.800\", \"message\": \"RRC_CONNECTION_REJECT\", \"callId\": \"s\"}\n",
    )?;
    let sessions = SessionBuilder::new(options).build(&records);
    assert!(sessions[0].setup_failure);
    assert!(!sessions[0].ignored);
    assert_eq!(sessions[0].time_window_ms, 45_000);
    Ok(())
}

#[test]
fn test_cli_overrides_win_over_file() -> TestResult {
    let mut config = CallscopeConfig::from_yaml("session:\n  time_window_ms: 45000\n")?;
    let cli = OptionOverrides {
        time_window_ms: Some(10_000.0),
        ..OptionOverrides::default()
    };
    config.session = config.session.merged_with(&cli);
    assert_eq!(config.session_options()?.time_window_ms, 10_000);
    Ok(())
}

#[test]
fn test_negative_threshold_is_rejected() {
    let config = CallscopeConfig::from_yaml("session:\n  rrc_nas_follow_ms: -1\n").unwrap();
    assert!(matches!(config.session_options(), Err(Error::Config(_))));
}

#[test]
fn test_malformed_line_reports_line_number() {
    let err = parse_records("{\"time\": \"10:00:00\"}\n\n{not json}\n").unwrap_err();
    assert!(matches!(err, Error::InvalidRecord { line: 3, .. }));
}
