//! RRC state tracking
//!
//! - `state` - UE RRC states and how records report them
//! - `tracker` - Per-correlation-key contexts

pub mod state;
pub mod tracker;

pub use state::{explicit_rrc_state, infer_rrc_state, rrc_state_of, UeRrcState};
pub use tracker::{KeyContext, KeyId, KeyTracker, PendingRrcRequest};
