//! callscope session engine
//!
//! Reconstructs per-call sessions from a time-ordered stream of decoded RAN
//! signaling and measurement records. It provides:
//!
//! - Identity extraction and correlation keys (call id, IMSI, TMSI)
//! - Semantic classification of signaling messages and release causes
//! - Per-key RRC state tracking
//! - The session state machine, end rules and failure classification
//! - The session repository and outcome summary
//!
//! ```no_run
//! use callscope_common::{Record, SessionOptions};
//! use callscope_session::build_sessions;
//!
//! let records = vec![
//!     Record::at("10:00:00").with_message("CM_SERVICE_REQUEST").with_field("callId", "1"),
//!     Record::at("10:00:01").with_message("CONNECT").with_field("callId", "1"),
//! ];
//! let sessions = build_sessions(&records, &SessionOptions::default());
//! assert!(sessions[0].call_setup_success);
//! ```

pub mod builder;
pub mod identity;
pub mod repository;
pub mod rrc;
pub mod semantic;
pub mod session;


pub use builder::{build_sessions, SessionBuilder};
pub use identity::{extract_identifiers, CorrelationKey, Identifiers};
pub use repository::{SessionHandle, SessionRepository, SessionSummary};
pub use rrc::{KeyContext, KeyId, KeyTracker, UeRrcState};
pub use semantic::{classify, Semantics};
pub use session::{
    EndTrigger, EndType, Evidence, FailureCode, FailureReason, MeasurementSample, RabEvent,
    RabPhase, RrcStateEntry, Session, SessionState, StartTrigger,
};
