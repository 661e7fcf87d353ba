//! Per-key context tracking
//!
//! Every correlation key seen during one build gets a [`KeyContext`] holding
//! the last known RRC state, the session currently bound to it and a pending
//! RRC Connection Request waiting for its NAS call control message.
//!
//! Contexts live in an arena and are addressed by [`KeyId`], assigned in
//! order of first sight.

use std::collections::HashMap;

use callscope_common::TimeMs;

use super::state::UeRrcState;
use crate::identity::CorrelationKey;
use crate::repository::SessionHandle;

/// Arena index of a key context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(usize);

impl KeyId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// RRC Connection Request seen while idle, not yet followed by NAS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRrcRequest {
    /// Normalized request time
    pub ms: TimeMs,
    /// Request time as it appeared in the log
    pub time: String,
}

/// State tracked for one correlation key.
#[derive(Debug, Clone)]
pub struct KeyContext {
    /// Key this context belongs to
    pub key: CorrelationKey,
    /// Last known RRC state
    pub ue_rrc_state: UeRrcState,
    /// Session currently bound to this key
    pub active_session: Option<SessionHandle>,
    /// RRC request awaiting NAS call control
    pub pending_rrc_request: Option<PendingRrcRequest>,
}

impl KeyContext {
    /// Creates an idle context without session.
    pub fn new(key: CorrelationKey) -> Self {
        Self {
            key,
            ue_rrc_state: UeRrcState::Idle,
            active_session: None,
            pending_rrc_request: None,
        }
    }

    /// Applies a state reported by a record and returns the previous state.
    pub fn update_rrc(&mut self, reported: Option<UeRrcState>) -> UeRrcState {
        let prev = self.ue_rrc_state;
        if let Some(state) = reported {
            self.ue_rrc_state = state;
        }
        prev
    }

    /// Returns true if a session is bound to this key.
    pub fn has_active_session(&self) -> bool {
        self.active_session.is_some()
    }

    /// Binds a freshly created session; any pending request is consumed.
    pub fn bind(&mut self, session: SessionHandle) {
        self.active_session = Some(session);
        self.pending_rrc_request = None;
    }

    /// Releases the bound session, if any.
    pub fn unbind(&mut self) -> Option<SessionHandle> {
        self.active_session.take()
    }

    /// Records an RRC Connection Request, replacing an older one.
    pub fn set_pending_request(&mut self, ms: TimeMs, time: impl Into<String>) {
        self.pending_rrc_request = Some(PendingRrcRequest {
            ms,
            time: time.into(),
        });
    }
}

/// Arena of key contexts for one build.
#[derive(Debug, Default)]
pub struct KeyTracker {
    index: HashMap<CorrelationKey, KeyId>,
    contexts: Vec<KeyContext>,
}

impl KeyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the context for a key, creating it on first sight.
    pub fn find_or_create(&mut self, key: &CorrelationKey) -> KeyId {
        if let Some(id) = self.index.get(key) {
            return *id;
        }
        let id = KeyId(self.contexts.len());
        self.contexts.push(KeyContext::new(key.clone()));
        self.index.insert(key.clone(), id);
        id
    }

    /// Resolves the key a record is routed to.
    ///
    /// An anonymous record joins the only identified key with a bound
    /// session; with zero or several candidates it stays anonymous.
    pub fn resolve(&mut self, key: &CorrelationKey) -> KeyId {
        if key.is_anonymous() {
            let mut candidates = self
                .contexts
                .iter()
                .enumerate()
                .filter(|(_, ctx)| !ctx.key.is_anonymous() && ctx.has_active_session());
            if let (Some((idx, ctx)), None) = (candidates.next(), candidates.next()) {
                tracing::trace!(key = %ctx.key, "anonymous record bound to active key");
                return KeyId(idx);
            }
        }
        self.find_or_create(key)
    }

    /// Context by id.
    pub fn get(&self, id: KeyId) -> &KeyContext {
        &self.contexts[id.0]
    }

    /// Mutable context by id.
    pub fn get_mut(&mut self, id: KeyId) -> &mut KeyContext {
        &mut self.contexts[id.0]
    }

    /// Number of keys seen.
    pub(crate) fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Unbinds every active session, in key order.
    pub fn drain_active(&mut self) -> Vec<SessionHandle> {
        self.contexts
            .iter_mut()
            .filter_map(KeyContext::unbind)
            .collect()
    }
}
