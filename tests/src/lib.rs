//! Integration test framework for callscope
#![allow(missing_docs)]
//!
//! This crate provides record fixtures and helpers for end-to-end tests of
//! session reconstruction.
//!
//! # Components
//!
//! - [`test_fixtures`] - Scripted signaling streams and reference scenarios
//! - [`test_utils`] - Logging setup and assertion helpers
//!
//! # Test Categories
//!
//! 1. **Call Scenarios** - Complete calls from attempt to release
//! 2. **Correlation** - Identity extraction, anonymous routing, interleaved calls
//! 3. **Config Pipeline** - YAML configuration and JSON input through the builder

pub mod test_fixtures;
pub mod test_utils;

pub use test_fixtures::{time_at, CallScript, BASE_TIME_MS};
pub use test_utils::{build_default, init_test_logging, single_session, TestResult};
