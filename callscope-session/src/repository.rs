//! Session repository and outcome summary
//!
//! The repository owns every session created during a build, in creation
//! order. Keys refer to their bound session through a [`SessionHandle`].

use std::collections::BTreeMap;

use callscope_common::TimeMs;
use serde::{Deserialize, Serialize};

use crate::identity::Identifiers;
use crate::session::{FailureCode, Session, StartTrigger};

/// Index of a session in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(usize);

impl SessionHandle {
    /// Handle for the session at `index`.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Ordered store of reconstructed sessions.
#[derive(Debug, Default)]
pub struct SessionRepository {
    sessions: Vec<Session>,
}

impl SessionRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with the next sequential id.
    pub fn create(
        &mut self,
        start_time: impl Into<String>,
        ids: &Identifiers,
        trigger: StartTrigger,
        time_window_ms: TimeMs,
    ) -> SessionHandle {
        let handle = SessionHandle(self.sessions.len());
        let session_id = self.sessions.len() as u64 + 1;
        self.sessions
            .push(Session::new(session_id, start_time, ids, trigger, time_window_ms));
        handle
    }

    /// Session by handle.
    pub fn get(&self, handle: SessionHandle) -> &Session {
        &self.sessions[handle.0]
    }

    /// Mutable session by handle.
    pub fn get_mut(&mut self, handle: SessionHandle) -> &mut Session {
        &mut self.sessions[handle.0]
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session has been created.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All sessions, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    /// Consumes the repository, returning the sessions in creation order.
    pub fn into_sessions(self) -> Vec<Session> {
        self.sessions
    }
}

/// Outcome counts over a set of sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total: usize,
    pub call_setup_success: usize,
    pub drops: usize,
    pub setup_failures: usize,
    pub ignored: usize,
    pub incomplete: usize,
    /// Setup failures by failure code
    pub failure_codes: BTreeMap<FailureCode, usize>,
    /// Share of non-ignored attempts that connected, in percent
    pub success_rate: Option<f64>,
}

impl SessionSummary {
    /// Counts outcomes of the given sessions.
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut summary = sessions.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total += 1;
            acc.call_setup_success += usize::from(s.call_setup_success);
            acc.drops += usize::from(s.drop);
            acc.setup_failures += usize::from(s.setup_failure);
            acc.ignored += usize::from(s.ignored);
            acc.incomplete += usize::from(s.incomplete);
            if let Some(reason) = &s.failure_reason {
                *acc.failure_codes.entry(reason.code).or_default() += 1;
            }
            acc
        });
        let attempts = summary.total - summary.ignored;
        summary.success_rate =
            (attempts > 0).then(|| summary.call_setup_success as f64 * 100.0 / attempts as f64);
        summary
    }
}
