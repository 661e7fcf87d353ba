//! Session end finalization
//!
//! Ending is idempotent: the first end wins and the session is frozen.
//! A connected call is always a setup success (it may still be a drop).
//! An attempt that never connected is exactly one of ignored (too short),
//! incomplete (too long) or a setup failure with a classified reason.

use std::fmt;

use callscope_common::time::non_negative_span;
use callscope_common::{parse_time_ms, SessionOptions};
use serde::{Deserialize, Serialize};

use super::machine::EndDecision;
use super::{EndType, Session, SessionState};

/// Setup failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// RRC Connection Reject without setup complete
    RrcFailure,
    /// CM Service Reject together with Call Reject
    CoreNasReject,
    /// RAB assignment failure and RAB release before connect
    RabSetupFailure,
    /// Radio link failure before connect
    EarlyRadioFailure,
    UnknownFailure,
}

impl FailureCode {
    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FailureCode::RrcFailure => "RRC Failure",
            FailureCode::CoreNasReject => "Core / NAS Reject",
            FailureCode::RabSetupFailure => "RAB Setup Failure",
            FailureCode::EarlyRadioFailure => "Early Radio Failure",
            FailureCode::UnknownFailure => "Unknown Failure",
        }
    }

    /// Typical network-side cause.
    pub fn cause(&self) -> &'static str {
        match self {
            FailureCode::RrcFailure => "overage / access congestion",
            FailureCode::CoreNasReject => "authentication, MSC congestion, no circuit",
            FailureCode::RabSetupFailure => "code shortage, power congestion",
            FailureCode::EarlyRadioFailure => "very poor RSCP / EcNo",
            FailureCode::UnknownFailure => "unclassified call setup failure",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::RrcFailure => write!(f, "RRC_FAILURE"),
            FailureCode::CoreNasReject => write!(f, "CORE_NAS_REJECT"),
            FailureCode::RabSetupFailure => write!(f, "RAB_SETUP_FAILURE"),
            FailureCode::EarlyRadioFailure => write!(f, "EARLY_RADIO_FAILURE"),
            FailureCode::UnknownFailure => write!(f, "UNKNOWN_FAILURE"),
        }
    }
}

/// Classified setup failure attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub code: FailureCode,
    pub label: String,
    pub cause: String,
}

impl From<FailureCode> for FailureReason {
    fn from(code: FailureCode) -> Self {
        Self {
            code,
            label: code.label().to_string(),
            cause: code.cause().to_string(),
        }
    }
}

/// Failure reason for a session, first matching rule wins.
///
/// Only setup failures that never connected have a reason.
pub fn classify_failure(session: &Session) -> Option<FailureReason> {
    let ev = &session.evidence;
    if !session.setup_failure || ev.has_connect {
        return None;
    }
    let code = if ev.saw_rrc_connection_reject && !ev.saw_rrc_setup_complete {
        FailureCode::RrcFailure
    } else if ev.saw_cm_service_reject && ev.saw_call_reject {
        FailureCode::CoreNasReject
    } else if ev.saw_rab_assignment_failure && ev.saw_rab_release_before_connect {
        FailureCode::RabSetupFailure
    } else if ev.saw_rlf_before_connect {
        FailureCode::EarlyRadioFailure
    } else {
        FailureCode::UnknownFailure
    };
    Some(code.into())
}

impl Session {
    /// Ends the session and classifies its outcome.
    ///
    /// `at` moves the end time when it parses. Returns false, changing
    /// nothing, if the session had already ended.
    pub fn end(&mut self, at: Option<&str>, decision: EndDecision, options: &SessionOptions) -> bool {
        if self.is_ended() {
            return false;
        }
        if decision.normal_clearing {
            self.evidence.normal_clearing_seen = true;
        }
        self.state = SessionState::Ended;
        if let Some((time, ms)) = at.and_then(|t| parse_time_ms(t).map(|ms| (t, ms))) {
            self.end_time = time.to_string();
            self.end_ms = Some(ms);
        }

        self.end_trigger = Some(decision.trigger);
        self.end_type = Some(decision.end_type);
        self.drop = decision.drop;
        self.call_failed = false;
        self.call_setup_success = false;
        self.failure_reason = None;
        self.duration_ms = non_negative_span(self.start_ms, self.end_ms);

        if self.evidence.has_connect {
            self.call_setup_success = true;
            self.setup_failure = false;
        } else if self.attempt_started {
            self.drop = false;
            match self.duration_ms {
                Some(d) if d < options.min_valid_attempt_ms => {
                    self.ignored = true;
                    self.end_type = Some(EndType::IgnoredShortAttempt);
                }
                Some(d) if d > options.max_setup_window_ms => {
                    self.incomplete = true;
                    self.end_type = Some(EndType::IncompleteOrOngoing);
                }
                _ => {
                    self.setup_failure = true;
                    self.call_failed = true;
                    self.end_type = Some(EndType::CallSetupFailure);
                    self.failure_reason = classify_failure(self);
                }
            }
        }

        tracing::debug!(
            session_id = self.session_id,
            trigger = ?decision.trigger,
            end_type = ?self.end_type,
            drop = self.drop,
            success = self.call_setup_success,
            duration_ms = ?self.duration_ms,
            "session ended"
        );
        true
    }
}
