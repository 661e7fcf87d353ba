//! Semantic classification of signaling records
//!
//! Decoders disagree on spelling (`RRC_CONNECTION_SETUP_COMPLETE` vs
//! `RRC Connection Setup Complete`), so protocol events are recognised by
//! keyword over an uppercase "message envelope" built from every free-text
//! field. Release causes are read separately into a "cause envelope".
//!
//! [`classify`] is pure: it returns one immutable [`Semantics`] value per
//! record and never touches session or key state.

use std::sync::LazyLock;

use callscope_common::Record;
use regex::Regex;

static WORD_SETUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSETUP\b").expect("valid word regex"));
static WORD_CONNECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCONNECT\b").expect("valid word regex"));
static WORD_DISCONNECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDISCONNECT\b").expect("valid word regex"));
static WORD_RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bRELEASE\b").expect("valid word regex"));

/// Protocol events recognised on one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Semantics {
    /// CM Service Request (MO call attempt)
    pub is_cm_service_request: bool,
    /// CC Setup, mobile originated or terminated
    pub is_setup_mo_mt: bool,
    /// RRC Connection Request
    pub is_rrc_connection_request: bool,
    /// RANAP RAB Assignment Request
    pub is_rab_assignment_request: bool,
    /// CC Call Proceeding
    pub is_call_proceeding: bool,
    /// Any NAS call-control message
    pub is_nas_call_control: bool,
    /// RRC Connection Setup Complete
    pub is_rrc_setup_complete: bool,
    /// RAB Assignment Complete
    pub is_rab_assign_complete: bool,
    /// RRC Connection Reject
    pub is_rrc_connection_reject: bool,
    /// RAB Assignment Failure
    pub is_rab_assignment_failure: bool,
    /// CC Connect
    pub is_connect: bool,
    /// CC Disconnect
    pub is_disconnect: bool,
    /// Generic release (CC Release, Release Complete)
    pub is_release: bool,
    /// RRC Connection Release
    pub is_rrc_release: bool,
    /// Radio link failure
    pub is_rlf: bool,
    /// Iu(-CS) release
    pub is_iu_release: bool,
    /// CM Service Reject
    pub is_cm_service_reject: bool,
    /// Call Reject
    pub is_call_reject: bool,
    /// RAB release
    pub is_rab_release: bool,
    /// Handover failure (intra or inter-RAT)
    pub is_ho_failure: bool,
    /// Release cause reads as normal
    pub is_normal_cause: bool,
    /// Release cause reads as abnormal
    pub is_abnormal_cause: bool,
    /// RRC release with a normal cause
    pub is_rrc_release_normal: bool,
    /// RRC release with an abnormal cause
    pub is_rrc_release_abnormal: bool,
    /// Iu release with an abnormal cause
    pub is_iu_release_abnormal: bool,
}

impl Semantics {
    /// Any release flavour: generic, RRC or Iu.
    pub fn is_any_release(&self) -> bool {
        self.is_release || self.is_rrc_release || self.is_iu_release
    }
}

/// Uppercase `event | message | details | Message | Event` envelope.
pub fn message_envelope(record: &Record) -> String {
    let message_prop = record.property_text("Message");
    let event_prop = record.property_text("Event");
    [
        record.event_text(),
        record.message_text(),
        record.details_text(),
        message_prop.as_deref(),
        event_prop.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::to_uppercase)
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Uppercase RRC and CS release causes, space separated.
pub fn cause_envelope(record: &Record) -> String {
    let rrc = record
        .rrc_rel_cause
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| record.property_text("RRC Release Cause"))
        .or_else(|| record.property_text("rrc_rel_cause"))
        .unwrap_or_default();
    let cs = record
        .cs_rel_cause
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| record.property_text("CS Release Cause"))
        .or_else(|| record.property_text("cs_rel_cause"))
        .unwrap_or_default();
    format!("{rrc} {cs}").to_uppercase()
}

/// Classifies one record.
pub fn classify(record: &Record) -> Semantics {
    classify_envelopes(&message_envelope(record), &cause_envelope(record))
}

/// Classifies prebuilt envelopes; both are expected uppercase.
pub fn classify_envelopes(msg: &str, cause: &str) -> Semantics {
    let has = |s: &str| msg.contains(s);
    let has_any = |items: &[&str]| items.iter().any(|s| msg.contains(s));

    let is_cm_service_request = has_any(&["CM_SERVICE_REQUEST", "CM SERVICE REQUEST"]);
    let is_setup_mo_mt = WORD_SETUP.is_match(msg)
        && !has_any(&["SETUP_COMPLETE", "RRC_CONNECTION_SETUP", "RRC SETUP"]);
    let is_rrc_connection_request = has_any(&["RRC_CONNECTION_REQUEST", "RRC CONNECTION REQUEST"]);
    let is_rab_assignment_request = has_any(&[
        "RAB_ASSIGNMENT_REQUEST",
        "RAB ASSIGNMENT REQUEST",
        "RAB_ASSIGNMENT_REQ",
    ]);
    let is_call_proceeding = has_any(&["CALL_PROCEEDING", "CALL PROCEEDING"]);
    let is_nas_call_control = is_cm_service_request
        || is_setup_mo_mt
        || is_call_proceeding
        || has("CC ")
        || has("CALL CONTROL");

    let is_rrc_release = has_any(&["RRC_CONNECTION_RELEASE", "RRC CONNECTION RELEASE"]);
    let is_iu_release = has_any(&["IU RELEASE", "IU-CS RELEASE", "IUCS RELEASE"]);

    let is_normal_cause = cause.contains("NORMAL");
    let is_abnormal_cause = ["ABNORMAL", "FAIL", "ERROR", "RLF"]
        .iter()
        .any(|s| cause.contains(s));

    Semantics {
        is_cm_service_request,
        is_setup_mo_mt,
        is_rrc_connection_request,
        is_rab_assignment_request,
        is_call_proceeding,
        is_nas_call_control,
        is_rrc_setup_complete: has_any(&[
            "RRC_CONNECTION_SETUP_COMPLETE",
            "RRC CONNECTION SETUP COMPLETE",
        ]),
        is_rab_assign_complete: has_any(&[
            "RAB_ASSIGNMENT_COMPLETE",
            "RAB ASSIGNMENT COMPLETE",
            "RAB ASSIGN COMPLETE",
        ]),
        is_rrc_connection_reject: has_any(&["RRC_CONNECTION_REJECT", "RRC CONNECTION REJECT"]),
        is_rab_assignment_failure: has_any(&[
            "RAB_ASSIGNMENT_FAILURE",
            "RAB ASSIGNMENT FAILURE",
            "RAB ASSIGN FAIL",
        ]),
        is_connect: WORD_CONNECT.is_match(msg)
            && !has("RRC_CONNECTION")
            && !has("SETUP_COMPLETE"),
        is_disconnect: WORD_DISCONNECT.is_match(msg),
        is_release: WORD_RELEASE.is_match(msg),
        is_rrc_release,
        is_rlf: has_any(&["RADIO LINK FAILURE", "RLF"]),
        is_iu_release,
        is_cm_service_reject: has_any(&["CM_SERVICE_REJECT", "CM SERVICE REJECT"]),
        is_call_reject: has_any(&["CALL_REJECT", "CALL REJECT"]),
        is_rab_release: has("RAB RELEASE"),
        is_ho_failure: has_any(&[
            "HANDOVER FAILURE",
            "HO FAILURE",
            "HO_FAIL",
            "HOF",
            "INTER-RAT HO FAILURE",
            "IRAT HO FAILURE",
        ]),
        is_normal_cause,
        is_abnormal_cause,
        is_rrc_release_normal: is_rrc_release && is_normal_cause,
        is_rrc_release_abnormal: is_rrc_release && is_abnormal_cause,
        is_iu_release_abnormal: is_iu_release && is_abnormal_cause,
    }
}
