//! Session builder
//!
//! Folds a batch of records into sessions. Records without a usable time
//! are dropped; the rest are stably sorted by time and processed one by one:
//!
//! 1. extract identifiers and resolve the correlation key
//! 2. update the key's RRC state
//! 3. end the bound session if the record falls outside its time window
//! 4. remember an RRC Connection Request seen while idle
//! 5. start a session if the key has none and a start trigger fires
//! 6. aggregate the record into the bound session and apply the end rules
//!
//! Sessions still open after the last record are ended as `END_OF_INPUT`.
//! All state is local to one [`SessionBuilder::build`] call.

use callscope_common::{parse_time_ms, Record, SessionOptions, TimeMs};

use crate::identity::extract_identifiers;
use crate::repository::SessionRepository;
use crate::rrc::{rrc_state_of, KeyTracker};
use crate::semantic::classify;
use crate::session::machine::{apply_evidence, window_expired};
use crate::session::{decide_end, decide_start, EndDecision, EndTrigger, Session};

/// Reconstructs sessions with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    options: SessionOptions,
}

impl SessionBuilder {
    /// Creates a builder.
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    /// Options in force.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Builds sessions from records, in creation order.
    pub fn build(&self, records: &[Record]) -> Vec<Session> {
        let ordered = order_records(records);
        let mut run = BuildRun::new(&self.options);
        for (record, ms) in ordered {
            run.process(record, ms);
        }
        run.finish()
    }
}

/// Builds sessions from records with the given options.
pub fn build_sessions(records: &[Record], options: &SessionOptions) -> Vec<Session> {
    SessionBuilder::new(*options).build(records)
}

/// Drops records without a parseable time and stably sorts the rest.
fn order_records(records: &[Record]) -> Vec<(&Record, TimeMs)> {
    let mut ordered: Vec<_> = records
        .iter()
        .filter_map(|record| match parse_time_ms(record.time_text()) {
            Some(ms) => Some((record, ms)),
            None => {
                tracing::trace!(time = record.time_text(), "dropping record without usable time");
                None
            }
        })
        .collect();
    ordered.sort_by_key(|(_, ms)| *ms);
    ordered
}

/// State of one build.
struct BuildRun<'a> {
    options: &'a SessionOptions,
    tracker: KeyTracker,
    repo: SessionRepository,
}

impl<'a> BuildRun<'a> {
    fn new(options: &'a SessionOptions) -> Self {
        Self {
            options,
            tracker: KeyTracker::new(),
            repo: SessionRepository::new(),
        }
    }

    fn process(&mut self, record: &Record, ms: TimeMs) {
        let ids = extract_identifiers(record);
        let key_id = self.tracker.resolve(&ids.correlation_key());
        let sem = classify(record);

        let ctx = self.tracker.get_mut(key_id);
        let prev = ctx.update_rrc(rrc_state_of(record));
        let was_idle = prev.is_idle_like();
        let idle_now = ctx.ue_rrc_state.is_idle_like();

        if let Some(handle) = ctx.active_session {
            let session = self.repo.get_mut(handle);
            if window_expired(session, Some(ms), self.options.time_window_ms) {
                tracing::debug!(
                    session_id = session.session_id,
                    key = %ctx.key,
                    last = %session.end_time,
                    now = record.time_text(),
                    "time window exceeded"
                );
                session.end(None, EndDecision::normal(EndTrigger::TimeWindowExceeded), self.options);
                ctx.unbind();
            }
        }

        if !ctx.has_active_session() && was_idle && sem.is_rrc_connection_request {
            ctx.set_pending_request(ms, record.time_text());
        }

        if !ctx.has_active_session() {
            let start = decide_start(
                &sem,
                was_idle,
                ctx.pending_rrc_request.as_ref(),
                Some(ms),
                record.time_text(),
                self.options,
            );
            if let Some(start) = start {
                let handle = self.repo.create(
                    start.start_time,
                    &ids,
                    start.trigger,
                    self.options.time_window_ms,
                );
                tracing::debug!(
                    session_id = self.repo.get(handle).session_id,
                    key = %ctx.key,
                    trigger = ?start.trigger,
                    "session started"
                );
                ctx.bind(handle);
            }
        }

        let Some(handle) = ctx.active_session else {
            return;
        };
        let session = self.repo.get_mut(handle);
        session.append(record, &ids);
        apply_evidence(session, &sem, idle_now);
        if let Some(decision) = decide_end(session, &sem, was_idle, idle_now) {
            session.end(Some(record.time_text()), decision, self.options);
            ctx.unbind();
        }
    }

    fn finish(mut self) -> Vec<Session> {
        for handle in self.tracker.drain_active() {
            self.repo
                .get_mut(handle)
                .end(None, EndDecision::normal(EndTrigger::EndOfInput), self.options);
        }
        tracing::debug!(
            sessions = self.repo.len(),
            keys = self.tracker.len(),
            "session build complete"
        );
        self.repo.into_sessions()
    }
}
