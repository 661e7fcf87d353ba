//! Reconstructed call sessions
//!
//! A [`Session`] aggregates every record correlated to one call attempt:
//! identities, time span, RRC and RAB timelines, radio measurements, the
//! lifecycle state and, once ended, the outcome classification.
//!
//! - `machine` - Start decisions, lifecycle moves and end rules
//! - `outcome` - End finalization and failure reasons

pub mod machine;
pub mod outcome;

use std::fmt;

use callscope_common::{parse_time_ms, Record, TimeMs};
use serde::{Deserialize, Serialize};

use crate::identity::Identifiers;
use crate::rrc::{rrc_state_of, UeRrcState};

pub use machine::{decide_end, decide_start, EndDecision, StartDecision};
pub use outcome::{classify_failure, FailureCode, FailureReason};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Attempt detected, nothing confirmed yet
    #[default]
    CallAttempt,
    /// RRC Connection Setup Complete seen
    RrcConnected,
    /// CS RAB assigned
    RabEstablished,
    /// CONNECT seen
    ActiveCall,
    /// DISCONNECT seen
    Releasing,
    /// Final, immutable
    Ended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::CallAttempt => write!(f, "CALL_ATTEMPT"),
            SessionState::RrcConnected => write!(f, "RRC_CONNECTED"),
            SessionState::RabEstablished => write!(f, "RAB_ESTABLISHED"),
            SessionState::ActiveCall => write!(f, "ACTIVE_CALL"),
            SessionState::Releasing => write!(f, "RELEASING"),
            SessionState::Ended => write!(f, "ENDED"),
        }
    }
}

/// What opened a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartTrigger {
    CmServiceRequest,
    Setup,
    RabAssignmentRequest,
    CallProceeding,
    /// RRC Connection Request followed by NAS call control
    RrcConnectionRequestPlusNasCc,
    /// A start group fired without a more specific trigger
    StartFallback,
}

/// What closed a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndTrigger {
    TimeWindowExceeded,
    RadioLinkFailure,
    IuReleaseAbnormal,
    RrcConnectionReleaseAbnormal,
    HandoverFailureRelease,
    MscReleaseWithoutDisconnect,
    RrcConnectionReleaseNormal,
    CmServiceReject,
    CallReject,
    RabRelease,
    IuRelease,
    DisconnectRelease,
    ReturnToIdle,
    UnexpectedIdleTransition,
    /// Still open after the last record
    EndOfInput,
}

/// Final end label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndType {
    Normal,
    Drop,
    CallSetupFailure,
    IgnoredShortAttempt,
    IncompleteOrOngoing,
}

/// One entry of the RRC state timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrcStateEntry {
    pub time: String,
    pub state: UeRrcState,
}

/// Phase of a RAB lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RabPhase {
    Start,
    Update,
    End,
}

/// RAB setup, modification or release seen during the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RabEvent {
    pub time: String,
    pub phase: RabPhase,
    pub event: String,
    pub detail: Option<String>,
}

impl RabEvent {
    /// RAB event carried by a record, if its name mentions RAB.
    pub fn from_record(record: &Record) -> Option<Self> {
        let message_prop = record.property_text("Message");
        let source = record
            .event_text()
            .or(record.message_text())
            .or(message_prop.as_deref())?
            .to_uppercase();
        if !source.contains("RAB") {
            return None;
        }

        let has_any = |words: &[&str]| words.iter().any(|w| source.contains(w));
        let phase = if has_any(&["RELEASE", "REMOVE", "DELETE"]) {
            RabPhase::End
        } else if has_any(&["SETUP", "ASSIGN", "ESTABLISH", "ADD"]) {
            RabPhase::Start
        } else {
            RabPhase::Update
        };

        Some(Self {
            time: record.time_text().to_string(),
            phase,
            event: record
                .event_text()
                .or(record.message_text())
                .unwrap_or("RAB Event")
                .to_string(),
            detail: record.message_text().or(record.details_text()).map(str::to_string),
        })
    }
}

/// Radio conditions sampled from one measurement record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSample {
    pub time: String,
    pub rscp: Option<f64>,
    pub rsrp: Option<f64>,
    pub ecno: Option<f64>,
    pub rsrq: Option<f64>,
    pub rssi: Option<f64>,
    pub bler_dl: Option<f64>,
    pub bler_ul: Option<f64>,
    pub freq: Option<f64>,
}

impl MeasurementSample {
    /// Sample from a `MEASUREMENT` record carrying at least one numeric value.
    pub fn from_record(record: &Record) -> Option<Self> {
        if !record.is_measurement() {
            return None;
        }
        let field = |k: &str| record.field_number(k);
        let prop = |k: &str| record.property_number(k);

        let sample = Self {
            time: record.time_text().to_string(),
            rscp: field("level")
                .or_else(|| prop("Serving RSCP"))
                .or_else(|| prop("RSCP")),
            rsrp: prop("Serving RSRP").or_else(|| prop("RSRP")),
            ecno: field("ecno")
                .or_else(|| prop("EcNo"))
                .or_else(|| prop("Serving EcNo")),
            rsrq: prop("RSRQ"),
            rssi: field("rssi").or_else(|| prop("RSSI")),
            bler_dl: field("bler_dl").or_else(|| prop("BLER DL")),
            bler_ul: field("bler_ul").or_else(|| prop("BLER UL")),
            freq: field("freq").or_else(|| prop("Freq")),
        };
        sample.has_signal().then_some(sample)
    }

    fn has_signal(&self) -> bool {
        [
            self.rscp,
            self.rsrp,
            self.ecno,
            self.rsrq,
            self.rssi,
            self.bler_dl,
            self.bler_ul,
            self.freq,
        ]
        .iter()
        .any(Option::is_some)
    }
}

/// Protocol evidence accumulated over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub has_connect: bool,
    pub disconnect_seen: bool,
    pub normal_clearing_seen: bool,
    pub saw_rrc_setup_complete: bool,
    pub saw_rrc_connection_reject: bool,
    pub saw_cm_service_reject: bool,
    pub saw_call_reject: bool,
    pub saw_rab_assignment_failure: bool,
    pub saw_rab_release_before_connect: bool,
    pub saw_rlf_before_connect: bool,
    pub has_cs_rab: bool,
}

/// One reconstructed call session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Sequential id, 1-based, in creation order
    pub session_id: u64,
    pub call_transaction_id: Option<String>,
    pub imsi: Option<String>,
    pub tmsi: Option<String>,
    /// Earliest contributing record time
    pub start_time: String,
    /// Latest contributing record time
    pub end_time: String,
    #[serde(skip)]
    pub(crate) start_ms: Option<TimeMs>,
    #[serde(skip)]
    pub(crate) end_ms: Option<TimeMs>,
    pub rrc_states: Vec<RrcStateEntry>,
    pub rab_lifecycle: Vec<RabEvent>,
    pub radio_measurements_timeline: Vec<MeasurementSample>,
    pub records_count: usize,
    pub state: SessionState,
    pub start_trigger: StartTrigger,
    pub end_trigger: Option<EndTrigger>,
    pub end_type: Option<EndType>,
    #[serde(flatten)]
    pub evidence: Evidence,
    pub attempt_started: bool,
    pub drop: bool,
    pub setup_failure: bool,
    pub call_failed: bool,
    pub call_setup_success: bool,
    pub ignored: bool,
    pub incomplete: bool,
    pub failure_reason: Option<FailureReason>,
    pub duration_ms: Option<TimeMs>,
    /// Gap limit in force when the session was built
    pub time_window_ms: TimeMs,
}

impl Session {
    /// Opens a session at `start_time`.
    pub fn new(
        session_id: u64,
        start_time: impl Into<String>,
        ids: &Identifiers,
        start_trigger: StartTrigger,
        time_window_ms: TimeMs,
    ) -> Self {
        let start_time = start_time.into();
        let start_ms = parse_time_ms(&start_time);
        Self {
            session_id,
            call_transaction_id: ids.call_id.clone(),
            imsi: ids.imsi.clone(),
            tmsi: ids.tmsi.clone(),
            end_time: start_time.clone(),
            start_time,
            start_ms,
            end_ms: start_ms,
            rrc_states: Vec::new(),
            rab_lifecycle: Vec::new(),
            radio_measurements_timeline: Vec::new(),
            records_count: 0,
            state: SessionState::CallAttempt,
            start_trigger,
            end_trigger: None,
            end_type: None,
            evidence: Evidence::default(),
            attempt_started: true,
            drop: false,
            setup_failure: false,
            call_failed: false,
            call_setup_success: false,
            ignored: false,
            incomplete: false,
            failure_reason: None,
            duration_ms: None,
            time_window_ms,
        }
    }

    /// Returns true once the session has been ended.
    pub fn is_ended(&self) -> bool {
        self.state == SessionState::Ended
    }

    /// Normalized end time.
    pub fn end_ms(&self) -> Option<TimeMs> {
        self.end_ms
    }

    /// Normalized start time.
    pub fn start_ms(&self) -> Option<TimeMs> {
        self.start_ms
    }

    /// Folds one record into the session aggregates.
    ///
    /// Ids are backfilled but never overwritten; the time span widens to
    /// cover the record. Ended sessions are left untouched.
    pub fn append(&mut self, record: &Record, ids: &Identifiers) {
        if self.is_ended() {
            return;
        }
        backfill(&mut self.call_transaction_id, &ids.call_id);
        backfill(&mut self.imsi, &ids.imsi);
        backfill(&mut self.tmsi, &ids.tmsi);

        self.records_count += 1;

        let time = record.time_text();
        if let Some(ms) = parse_time_ms(time) {
            if self.start_ms.map_or(true, |start| ms < start) {
                self.start_ms = Some(ms);
                self.start_time = time.to_string();
            }
            if self.end_ms.map_or(true, |end| ms > end) {
                self.end_ms = Some(ms);
                self.end_time = time.to_string();
            }
        }

        if let Some(state) = rrc_state_of(record) {
            if self.rrc_states.last().map(|e| e.state) != Some(state) {
                self.rrc_states.push(RrcStateEntry {
                    time: time.to_string(),
                    state,
                });
            }
        }

        if let Some(rab) = RabEvent::from_record(record) {
            self.rab_lifecycle.push(rab);
        }
        if let Some(sample) = MeasurementSample::from_record(record) {
            self.radio_measurements_timeline.push(sample);
        }
    }

    pub(crate) fn move_to(&mut self, state: SessionState) {
        self.state = state;
    }
}

fn backfill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}
