//! Session state machine
//!
//! Pure decision functions driving one session through its lifecycle:
//!
//! ```text
//! CALL_ATTEMPT -> RRC_CONNECTED -> RAB_ESTABLISHED -> ACTIVE_CALL -> RELEASING
//!       \______________\________________\________________\____________\-> ENDED
//! ```
//!
//! The builder owns the per-key bookkeeping and calls into this module for
//! each record: [`decide_start`] when the key has no session, then
//! [`apply_evidence`] and [`decide_end`] on the bound session.
//!
//! End rules are evaluated in a fixed order and the first match wins. Radio
//! failures come first so an RLF is never masked by a release in the same
//! record.

use callscope_common::{SessionOptions, TimeMs};

use super::{EndTrigger, EndType, Session, SessionState, StartTrigger};
use crate::rrc::PendingRrcRequest;
use crate::semantic::Semantics;

/// Outcome of the start check for a record on a key without session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartDecision {
    pub trigger: StartTrigger,
    /// Session start, backdated to the RRC request when one led to the start
    pub start_time: String,
}

/// How a session is to be ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndDecision {
    pub trigger: EndTrigger,
    pub end_type: EndType,
    pub drop: bool,
    /// Marks normal call clearing before finalization
    pub normal_clearing: bool,
}

impl EndDecision {
    /// Normal, non-drop end.
    pub fn normal(trigger: EndTrigger) -> Self {
        Self {
            trigger,
            end_type: EndType::Normal,
            drop: false,
            normal_clearing: false,
        }
    }

    /// Normal end that also records normal call clearing.
    pub fn cleared(trigger: EndTrigger) -> Self {
        Self {
            normal_clearing: true,
            ..Self::normal(trigger)
        }
    }

    /// Setup failure end.
    pub fn setup_failure(trigger: EndTrigger) -> Self {
        Self {
            trigger,
            end_type: EndType::CallSetupFailure,
            drop: false,
            normal_clearing: false,
        }
    }

    /// A drop for connected calls that were not cleared normally,
    /// a setup failure otherwise.
    pub fn per_connection(trigger: EndTrigger, session: &Session) -> Self {
        let abnormal_after_connect =
            session.evidence.has_connect && !session.evidence.normal_clearing_seen;
        if abnormal_after_connect {
            Self {
                trigger,
                end_type: EndType::Drop,
                drop: true,
                normal_clearing: false,
            }
        } else {
            Self::setup_failure(trigger)
        }
    }
}

/// Decides whether a record opens a session.
///
/// An RRC Connection Request followed within `rrc_nas_follow_ms` by NAS call
/// control takes precedence and backdates the start to the request. Primary
/// (CM Service Request, SETUP) and secondary (RAB Assignment Request, Call
/// Proceeding) triggers need the key to have been idle-like.
pub fn decide_start(
    sem: &Semantics,
    was_idle: bool,
    pending: Option<&PendingRrcRequest>,
    record_ms: Option<TimeMs>,
    record_time: &str,
    options: &SessionOptions,
) -> Option<StartDecision> {
    let follows_rrc_request = match (pending, record_ms) {
        (Some(p), Some(ms)) if sem.is_nas_call_control => {
            ms >= p.ms && ms - p.ms <= options.rrc_nas_follow_ms
        }
        _ => false,
    };
    let primary = was_idle && (sem.is_cm_service_request || sem.is_setup_mo_mt);
    let secondary = was_idle && (sem.is_rab_assignment_request || sem.is_call_proceeding);

    if let (true, Some(p)) = (follows_rrc_request, pending) {
        return Some(StartDecision {
            trigger: StartTrigger::RrcConnectionRequestPlusNasCc,
            start_time: p.time.clone(),
        });
    }
    if !primary && !secondary {
        return None;
    }

    let trigger = if primary && sem.is_cm_service_request {
        StartTrigger::CmServiceRequest
    } else if primary && sem.is_setup_mo_mt {
        StartTrigger::Setup
    } else if secondary && sem.is_rab_assignment_request {
        StartTrigger::RabAssignmentRequest
    } else if secondary && sem.is_call_proceeding {
        StartTrigger::CallProceeding
    } else {
        StartTrigger::StartFallback
    };
    Some(StartDecision {
        trigger,
        start_time: record_time.to_string(),
    })
}

/// Returns true when the record comes more than `time_window_ms` after the
/// session's last record.
pub fn window_expired(session: &Session, record_ms: Option<TimeMs>, time_window_ms: TimeMs) -> bool {
    match (record_ms, session.end_ms()) {
        (Some(rec), Some(end)) => rec - end > time_window_ms,
        _ => false,
    }
}

/// Records evidence flags and moves the lifecycle state.
///
/// "Before connect" evidence is judged against the state prior to this
/// record.
pub fn apply_evidence(session: &mut Session, sem: &Semantics, idle_now: bool) {
    if session.is_ended() {
        return;
    }
    let ev = &mut session.evidence;
    if sem.is_rrc_setup_complete {
        ev.saw_rrc_setup_complete = true;
    }
    if sem.is_rrc_connection_reject {
        ev.saw_rrc_connection_reject = true;
    }
    if sem.is_cm_service_reject {
        ev.saw_cm_service_reject = true;
    }
    if sem.is_call_reject {
        ev.saw_call_reject = true;
    }
    if sem.is_rab_assignment_failure {
        ev.saw_rab_assignment_failure = true;
    }
    if sem.is_rab_release && !ev.has_connect {
        ev.saw_rab_release_before_connect = true;
    }
    if sem.is_rlf && !ev.has_connect {
        ev.saw_rlf_before_connect = true;
    }
    if sem.is_rab_assign_complete {
        ev.has_cs_rab = true;
    }
    if sem.is_connect {
        ev.has_connect = true;
    }
    if sem.is_disconnect {
        ev.disconnect_seen = true;
    }

    let ev = session.evidence;
    if sem.is_rrc_setup_complete {
        session.move_to(SessionState::RrcConnected);
    }
    if sem.is_rab_assign_complete {
        session.move_to(SessionState::RabEstablished);
    }
    if sem.is_connect {
        session.move_to(SessionState::ActiveCall);
    }
    if sem.is_disconnect {
        session.move_to(SessionState::Releasing);
    }
    if ev.has_cs_rab && !idle_now && !ev.has_connect {
        session.move_to(SessionState::RabEstablished);
    }
    tracing::trace!(session_id = session.session_id, state = %session.state, "session state");
}

/// End rule matching the record, if any. First match wins.
pub fn decide_end(session: &Session, sem: &Semantics, was_idle: bool, idle_now: bool) -> Option<EndDecision> {
    let ev = &session.evidence;
    let connected = ev.has_connect;

    let decision = if sem.is_rlf {
        EndDecision::per_connection(EndTrigger::RadioLinkFailure, session)
    } else if sem.is_iu_release_abnormal {
        EndDecision::per_connection(EndTrigger::IuReleaseAbnormal, session)
    } else if sem.is_rrc_release_abnormal {
        EndDecision::per_connection(EndTrigger::RrcConnectionReleaseAbnormal, session)
    } else if sem.is_ho_failure && sem.is_any_release() {
        EndDecision::per_connection(EndTrigger::HandoverFailureRelease, session)
    } else if connected && sem.is_iu_release && !ev.disconnect_seen && !ev.normal_clearing_seen {
        EndDecision {
            trigger: EndTrigger::MscReleaseWithoutDisconnect,
            end_type: EndType::Drop,
            drop: true,
            normal_clearing: false,
        }
    } else if sem.is_rrc_release_normal || (sem.is_rrc_release && ev.disconnect_seen) {
        EndDecision::cleared(EndTrigger::RrcConnectionReleaseNormal)
    } else if sem.is_cm_service_reject && !connected {
        EndDecision::setup_failure(EndTrigger::CmServiceReject)
    } else if sem.is_call_reject {
        EndDecision::setup_failure(EndTrigger::CallReject)
    } else if sem.is_rab_release && !connected {
        EndDecision::setup_failure(EndTrigger::RabRelease)
    } else if sem.is_iu_release && !connected {
        EndDecision::setup_failure(EndTrigger::IuRelease)
    } else if sem.is_disconnect && sem.is_release {
        EndDecision::cleared(EndTrigger::DisconnectRelease)
    } else if !was_idle && idle_now {
        if ev.disconnect_seen || sem.is_release || sem.is_rrc_release_normal {
            EndDecision::normal(EndTrigger::ReturnToIdle)
        } else {
            EndDecision::per_connection(EndTrigger::UnexpectedIdleTransition, session)
        }
    } else {
        return None;
    };
    Some(decision)
}
