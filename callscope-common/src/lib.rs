//! Common types and utilities for callscope
//!
//! This crate provides the normalized input record, time normalization,
//! configuration and logging shared by the session engine and the CLI.

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod time;
pub mod types;

pub use config::{CallscopeConfig, OptionOverrides, SessionOptions};
pub use error::Error;
pub use input::{load_records, parse_records};
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use time::{parse_time_ms, TimeMs};
pub use types::{value_number, value_text, Properties, Record, MEASUREMENT_TYPE};
