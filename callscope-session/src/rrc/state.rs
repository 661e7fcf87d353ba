//! UE RRC state as observed in drive-test logs
//!
//! UMTS exports report the classic 3GPP TS 25.331 states; LTE/NR exports
//! report connected/inactive. Both vocabularies are accepted.
//!
//! # Idle-like states
//!
//! | State | Idle-like | Notes |
//! |-------|-----------|-------|
//! | IDLE | yes | no RRC connection |
//! | CELL_PCH / URA_PCH | yes | paging only, no dedicated channel |
//! | CELL_FACH | no | common channel |
//! | CELL_DCH / CONNECTED | no | dedicated resources |
//! | INACTIVE | no | suspended context |
//!
//! A call attempt may only start from an idle-like state.

use std::fmt;

use callscope_common::Record;
use serde::{Deserialize, Serialize};

use crate::identity::normalize_id;

/// RRC state of the UE under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UeRrcState {
    /// IDLE: no RRC connection
    #[default]
    Idle,
    /// CELL_DCH: dedicated channel
    CellDch,
    /// CELL_FACH: forward access channel
    CellFach,
    /// CELL_PCH: cell paging channel
    CellPch,
    /// URA_PCH: URA paging channel
    UraPch,
    /// CONNECTED (LTE/NR)
    Connected,
    /// INACTIVE (NR)
    Inactive,
}

impl UeRrcState {
    /// Parses a state label, case-insensitively. Unknown labels are `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IDLE" => Some(UeRrcState::Idle),
            "CELL_DCH" => Some(UeRrcState::CellDch),
            "CELL_FACH" => Some(UeRrcState::CellFach),
            "CELL_PCH" => Some(UeRrcState::CellPch),
            "URA_PCH" => Some(UeRrcState::UraPch),
            "CONNECTED" => Some(UeRrcState::Connected),
            "INACTIVE" => Some(UeRrcState::Inactive),
            _ => None,
        }
    }

    /// Returns true for IDLE, CELL_PCH and URA_PCH.
    pub fn is_idle_like(&self) -> bool {
        matches!(self, UeRrcState::Idle | UeRrcState::CellPch | UeRrcState::UraPch)
    }
}

impl fmt::Display for UeRrcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UeRrcState::Idle => write!(f, "IDLE"),
            UeRrcState::CellDch => write!(f, "CELL_DCH"),
            UeRrcState::CellFach => write!(f, "CELL_FACH"),
            UeRrcState::CellPch => write!(f, "CELL_PCH"),
            UeRrcState::UraPch => write!(f, "URA_PCH"),
            UeRrcState::Connected => write!(f, "CONNECTED"),
            UeRrcState::Inactive => write!(f, "INACTIVE"),
        }
    }
}

/// Explicit state from `RRC State` (record, then properties) or `rrcState`.
///
/// The first non-empty candidate is taken; if it is not a known state the
/// record has no explicit state.
pub fn explicit_rrc_state(record: &Record) -> Option<UeRrcState> {
    let candidate = record
        .field_text("RRC State")
        .or_else(|| record.property_text("RRC State"))
        .or_else(|| record.field_text("rrcState"))?;
    normalize_id(&candidate).and_then(|s| UeRrcState::parse(&s))
}

/// State implied by the message name, for records without an explicit state.
pub fn infer_rrc_state(record: &Record) -> Option<UeRrcState> {
    let message_prop = record.property_text("Message");
    let msg = record
        .message_text()
        .or(message_prop.as_deref())
        .unwrap_or("")
        .to_uppercase();

    if msg.contains("RRC_CONNECTION_RELEASE") || msg.contains("RRC RELEASE") {
        Some(UeRrcState::Idle)
    } else if msg.contains("CELL_UPDATE") {
        Some(UeRrcState::CellFach)
    } else if msg.contains("PAGING") {
        Some(UeRrcState::CellPch)
    } else if msg.contains("RRC_CONNECTION_SETUP") || msg.contains("RADIO_BEARER_SETUP") {
        Some(UeRrcState::Connected)
    } else {
        None
    }
}

/// RRC state reported by a record: explicit value first, then keywords.
pub fn rrc_state_of(record: &Record) -> Option<UeRrcState> {
    explicit_rrc_state(record).or_else(|| infer_rrc_state(record))
}
