//! Error types for callscope

use thiserror::Error;

/// Error types for the callscope library.
///
/// Session reconstruction itself never fails; these errors come from the
/// surfaces around it (configuration and record input).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing errors for whole documents.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A single malformed line in a JSON Lines input.
    #[error("Invalid record on line {line}: {source}")]
    InvalidRecord {
        /// 1-based line number in the input
        line: usize,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}
