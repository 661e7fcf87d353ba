//! Record input loading
//!
//! Accepts either a JSON array of records or JSON Lines (one record per
//! line). Blank lines in JSON Lines input are skipped.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::types::Record;

/// Parses records from a JSON array or JSON Lines document.
///
/// # Example
/// ```
/// use callscope_common::input::parse_records;
///
/// let array = parse_records(r#"[{"time": "10:00:00", "message": "SETUP"}]"#).unwrap();
/// let lines = parse_records("{\"time\": \"10:00:00\"}\n\n{\"time\": \"10:00:01\"}\n").unwrap();
/// assert_eq!(array.len(), 1);
/// assert_eq!(lines.len(), 2);
/// ```
pub fn parse_records(content: &str) -> Result<Vec<Record>, Error> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|source| Error::InvalidRecord { line: idx + 1, source })?;
        records.push(record);
    }
    Ok(records)
}

/// Reads and parses a record file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, Error> {
    let contents = fs::read_to_string(path)?;
    parse_records(&contents)
}
