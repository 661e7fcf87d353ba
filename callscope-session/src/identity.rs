//! Identity extraction and correlation keys
//!
//! Records rarely carry a clean "call #N" marker. Identity is pieced together
//! from whichever of call/transaction id, IMSI and TMSI the decoder exposed,
//! either as a field, as a property, or buried in free text.

use std::fmt;
use std::sync::LazyLock;

use callscope_common::{value_text, Properties, Record};
use regex::Regex;

/// Normalized key names (lowercase, alphanumerics only) carrying a call id,
/// in precedence order.
const CALL_ID_KEYS: &[&str] = &["callid", "callidentifier", "transactionid", "transid", "tid"];
const IMSI_KEYS: &[&str] = &["imsi"];
const TMSI_KEYS: &[&str] = &["tmsi"];

static CALL_ID_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:call\s*id|trans(?:action)?\s*id|tid)\s*[:=]\s*([A-Za-z0-9_-]+)")
        .expect("valid call id regex")
});
static IMSI_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bimsi\s*[:=]\s*([0-9]{5,20})\b").expect("valid imsi regex")
});
static TMSI_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\btmsi\s*[:=]\s*([A-Fa-f0-9]{4,16})\b").expect("valid tmsi regex")
});

/// Identity signals found on one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identifiers {
    /// Call or transaction id
    pub call_id: Option<String>,
    /// Permanent subscriber identity
    pub imsi: Option<String>,
    /// Temporary subscriber identity
    pub tmsi: Option<String>,
}

impl Identifiers {
    /// Correlation key by priority: call id, IMSI+TMSI, IMSI, TMSI, anonymous.
    pub fn correlation_key(&self) -> CorrelationKey {
        match (&self.call_id, &self.imsi, &self.tmsi) {
            (Some(call_id), _, _) => CorrelationKey::Call(call_id.clone()),
            (None, Some(imsi), Some(tmsi)) => CorrelationKey::ImsiTmsi(imsi.clone(), tmsi.clone()),
            (None, Some(imsi), None) => CorrelationKey::Imsi(imsi.clone()),
            (None, None, Some(tmsi)) => CorrelationKey::Tmsi(tmsi.clone()),
            (None, None, None) => CorrelationKey::Anonymous,
        }
    }
}

/// Key under which records are correlated into one session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrelationKey {
    /// `CALL:<callId>`
    Call(String),
    /// `IMSI:<imsi>|TMSI:<tmsi>`
    ImsiTmsi(String, String),
    /// `IMSI:<imsi>`
    Imsi(String),
    /// `TMSI:<tmsi>`
    Tmsi(String),
    /// `__ANON__`, records without any identity signal
    Anonymous,
}

impl CorrelationKey {
    /// Returns true for the anonymous key.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, CorrelationKey::Anonymous)
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationKey::Call(id) => write!(f, "CALL:{id}"),
            CorrelationKey::ImsiTmsi(imsi, tmsi) => write!(f, "IMSI:{imsi}|TMSI:{tmsi}"),
            CorrelationKey::Imsi(imsi) => write!(f, "IMSI:{imsi}"),
            CorrelationKey::Tmsi(tmsi) => write!(f, "TMSI:{tmsi}"),
            CorrelationKey::Anonymous => write!(f, "__ANON__"),
        }
    }
}

/// Trims an id candidate; empty, `N/A` and `UNKNOWN` are not ids.
pub fn normalize_id(value: &str) -> Option<String> {
    let txt = value.trim();
    if txt.is_empty() || txt.eq_ignore_ascii_case("N/A") || txt.eq_ignore_ascii_case("UNKNOWN") {
        return None;
    }
    Some(txt.to_string())
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First usable value whose normalized key is in `keys`, honouring key order.
pub fn read_key_by_pattern(map: &Properties, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|wanted| {
        map.iter()
            .filter(|(k, _)| normalize_key(k) == *wanted)
            .find_map(|(_, v)| value_text(v).as_deref().and_then(normalize_id))
    })
}

fn extract_from_text(text: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| normalize_id(m.as_str()))
}

fn free_text(record: &Record) -> String {
    let message_prop = record.property_text("Message");
    [record.details_text(), record.message_text(), message_prop.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" | ")
}

fn extract_one(record: &Record, text: &str, keys: &[&str], pattern: &Regex) -> Option<String> {
    read_key_by_pattern(&record.fields, keys)
        .or_else(|| read_key_by_pattern(&record.properties, keys))
        .or_else(|| extract_from_text(text, pattern))
}

/// Extracts call id, IMSI and TMSI from a record.
///
/// Direct fields win over properties, which win over free text.
pub fn extract_identifiers(record: &Record) -> Identifiers {
    let text = free_text(record);
    Identifiers {
        call_id: extract_one(record, &text, CALL_ID_KEYS, &CALL_ID_TEXT),
        imsi: extract_one(record, &text, IMSI_KEYS, &IMSI_TEXT),
        tmsi: extract_one(record, &text, TMSI_KEYS, &TMSI_TEXT),
    }
}
