//! Correlation integration tests
//!
//! Identity extraction across fields, properties and free text, routing of
//! anonymous records, and interleaved calls from different UEs.

use callscope_common::{Record, SessionOptions};
use callscope_session::{EndTrigger, SessionBuilder, StartTrigger};
use integration_tests::{build_default, init_test_logging, single_session, time_at, CallScript};

#[test]
fn test_interleaved_calls_are_separated() {
    init_test_logging();

    let mut records = CallScript::with_call_id("1")
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(2_000, "CONNECT")
        .msg(9_000, "DISCONNECT | RELEASE")
        .records();
    records.extend(
        CallScript::with_call_id("2")
            .msg(1_000, "SETUP")
            .msg(4_000, "CM SERVICE REJECT")
            .records(),
    );

    let sessions = build_default(&records);
    assert_eq!(sessions.len(), 2);

    // ids follow creation order, not input order
    assert_eq!(sessions[0].call_transaction_id.as_deref(), Some("1"));
    assert_eq!(sessions[0].session_id, 1);
    assert!(sessions[0].call_setup_success);
    assert_eq!(sessions[0].end_trigger, Some(EndTrigger::DisconnectRelease));

    assert_eq!(sessions[1].call_transaction_id.as_deref(), Some("2"));
    assert_eq!(sessions[1].session_id, 2);
    assert!(sessions[1].setup_failure);
    assert_eq!(sessions[1].end_trigger, Some(EndTrigger::CmServiceReject));
}

#[test]
fn test_anonymous_records_join_the_only_active_call() {
    let records = CallScript::with_call_id("solo")
        .msg(0, "CM_SERVICE_REQUEST")
        .records()
        .into_iter()
        .chain(CallScript::anonymous().msg(1_000, "CONNECT").records())
        .chain(CallScript::anonymous().msg(6_000, "RADIO LINK FAILURE").records())
        .collect::<Vec<_>>();

    let s = single_session(&records);
    assert_eq!(s.records_count, 3);
    assert!(s.drop);
    assert_eq!(s.end_trigger, Some(EndTrigger::RadioLinkFailure));
}

#[test]
fn test_anonymous_records_stay_apart_when_ambiguous() {
    let mut records = CallScript::with_call_id("a").msg(0, "CM_SERVICE_REQUEST").records();
    records.extend(CallScript::with_call_id("b").msg(100, "CM_SERVICE_REQUEST").records());
    records.extend(CallScript::anonymous().msg(1_000, "CONNECT").records());

    let sessions = build_default(&records);
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| !s.evidence.has_connect));
    assert!(sessions.iter().all(|s| s.records_count == 1));
}

#[test]
fn test_anonymous_call_on_its_own_key() {
    let records = CallScript::anonymous()
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(1_000, "CONNECT")
        .release(4_000, "Normal")
        .records();
    let s = single_session(&records);
    assert_eq!(s.call_transaction_id, None);
    assert!(s.call_setup_success);
    assert_eq!(s.end_trigger, Some(EndTrigger::RrcConnectionReleaseNormal));
}

#[test]
fn test_subscriber_identity_key() {
    let records = CallScript::with_subscriber("001010123456789", "BEEF01")
        .msg(0, "SETUP")
        .msg(2_500, "CALL REJECT")
        .records();
    let s = single_session(&records);
    assert_eq!(s.imsi.as_deref(), Some("001010123456789"));
    assert_eq!(s.tmsi.as_deref(), Some("BEEF01"));
    assert_eq!(s.call_transaction_id, None);
    assert_eq!(s.end_trigger, Some(EndTrigger::CallReject));
}

#[test]
fn test_identity_from_properties_and_free_text() {
    let records = vec![
        Record::at(time_at(0))
            .with_message("CM_SERVICE_REQUEST")
            .with_property("Transaction ID", "tx-9"),
        Record::at(time_at(1_000))
            .with_message("CONNECT")
            .with_details("Call ID: tx-9 imsi=001010000000042"),
        Record::at(time_at(3_000))
            .with_message("DISCONNECT | RELEASE")
            .with_field("TID", "tx-9"),
    ];
    let s = single_session(&records);
    assert_eq!(s.call_transaction_id.as_deref(), Some("tx-9"));
    assert_eq!(s.imsi.as_deref(), Some("001010000000042"));
    assert_eq!(s.records_count, 3);
    assert_eq!(s.end_trigger, Some(EndTrigger::DisconnectRelease));
}

#[test]
fn test_placeholder_ids_are_ignored() {
    let records = vec![
        Record::at(time_at(0))
            .with_message("CM_SERVICE_REQUEST")
            .with_field("callId", "N/A")
            .with_field("imsi", "001010000000007"),
        Record::at(time_at(1_000))
            .with_message("CONNECT")
            .with_field("callId", "unknown")
            .with_field("imsi", "001010000000007"),
    ];
    let s = single_session(&records);
    assert_eq!(s.call_transaction_id, None);
    assert_eq!(s.imsi.as_deref(), Some("001010000000007"));
    assert!(s.evidence.has_connect);
}

#[test]
fn test_later_ids_backfill_but_never_overwrite() {
    let records = vec![
        Record::at(time_at(0))
            .with_message("CM_SERVICE_REQUEST")
            .with_field("callId", "c-1"),
        Record::at(time_at(500))
            .with_message("RRC_CONNECTION_SETUP_COMPLETE")
            .with_field("callId", "c-1")
            .with_property("TMSI", "0A0B0C"),
    ];
    let s = single_session(&records);
    assert_eq!(s.tmsi.as_deref(), Some("0A0B0C"));
    assert_eq!(s.call_transaction_id.as_deref(), Some("c-1"));
}

#[test]
fn test_rrc_request_pending_per_key() {
    // The RRC request of UE "a" must not backdate the call of UE "b"
    let mut records = CallScript::with_call_id("a").msg(0, "RRC_CONNECTION_REQUEST").records();
    records.extend(CallScript::with_call_id("b").msg(3_000, "CM_SERVICE_REQUEST").records());

    let s = single_session(&records);
    assert_eq!(s.call_transaction_id.as_deref(), Some("b"));
    assert_eq!(s.start_trigger, StartTrigger::CmServiceRequest);
    assert_eq!(s.start_time, time_at(3_000));
}

#[test]
fn test_window_splits_repeated_attempts() {
    let records = CallScript::with_call_id("w")
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(1_000, "CONNECT")
        .msg(45_000, "CM_SERVICE_REQUEST")
        .msg(46_000, "CONNECT")
        .records();

    let sessions = build_default(&records);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].end_trigger, Some(EndTrigger::TimeWindowExceeded));
    assert_eq!(sessions[0].end_time, time_at(1_000));
    assert!(!sessions[0].drop);
    assert_eq!(sessions[1].start_time, time_at(45_000));
    assert_eq!(sessions[1].end_trigger, Some(EndTrigger::EndOfInput));
}

#[test]
fn test_wider_window_keeps_one_session() {
    let records = CallScript::with_call_id("w")
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(1_000, "CONNECT")
        .msg(45_000, "DISCONNECT | RELEASE")
        .records();

    let options = SessionOptions {
        time_window_ms: 60_000,
        ..SessionOptions::default()
    };
    let sessions = SessionBuilder::new(options).build(&records);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].end_trigger, Some(EndTrigger::DisconnectRelease));
    assert_eq!(sessions[0].time_window_ms, 60_000);
}
