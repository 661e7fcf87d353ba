//! Test utility functions for integration tests
//!
//! Provides common utilities for test setup, logging, and assertions.

use callscope_common::{Record, SessionOptions};
use callscope_session::{build_sessions, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Initialize logging for tests with optional filter
///
/// Uses RUST_LOG environment variable if set, otherwise defaults to "info"
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Builds sessions with default options
pub fn build_default(records: &[Record]) -> Vec<Session> {
    build_sessions(records, &SessionOptions::default())
}

/// Builds with default options and returns the only session
///
/// Panics if the records do not produce exactly one session.
pub fn single_session(records: &[Record]) -> Session {
    let mut sessions = build_default(records);
    assert_eq!(
        sessions.len(),
        1,
        "expected one session, got {}: {:#?}",
        sessions.len(),
        sessions
    );
    sessions.remove(0)
}
