//! Test fixtures and record builders
//!
//! Provides scripted signaling streams for one call and the reference
//! scenarios used across the integration tests.

use callscope_common::{Record, TimeMs};

/// Base time of all scripts: 10:00:00.000
pub const BASE_TIME_MS: TimeMs = 10 * 3_600_000;

/// Formats `BASE_TIME_MS + offset_ms` as `HH:MM:SS.mmm`
pub fn time_at(offset_ms: TimeMs) -> String {
    let ms = BASE_TIME_MS + offset_ms;
    let (h, rest) = (ms / 3_600_000, ms % 3_600_000);
    let (m, rest) = (rest / 60_000, rest % 60_000);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, rest / 1000, rest % 1000)
}

/// Signaling script for one UE
///
/// Every record gets the script's identity as direct fields.
#[derive(Debug, Clone, Default)]
pub struct CallScript {
    call_id: Option<String>,
    imsi: Option<String>,
    tmsi: Option<String>,
    records: Vec<Record>,
}

impl CallScript {
    /// Script whose records carry a call id
    pub fn with_call_id(call_id: &str) -> Self {
        Self {
            call_id: Some(call_id.to_string()),
            ..Self::default()
        }
    }

    /// Script whose records carry IMSI and TMSI
    pub fn with_subscriber(imsi: &str, tmsi: &str) -> Self {
        Self {
            imsi: Some(imsi.to_string()),
            tmsi: Some(tmsi.to_string()),
            ..Self::default()
        }
    }

    /// Script whose records carry no identity
    pub fn anonymous() -> Self {
        Self::default()
    }

    fn stamp(&self, record: Record) -> Record {
        let mut record = record;
        if let Some(id) = &self.call_id {
            record = record.with_field("callId", id.as_str());
        }
        if let Some(imsi) = &self.imsi {
            record = record.with_field("imsi", imsi.as_str());
        }
        if let Some(tmsi) = &self.tmsi {
            record = record.with_field("tmsi", tmsi.as_str());
        }
        record
    }

    /// Adds a signaling message at `offset_ms`
    pub fn msg(mut self, offset_ms: TimeMs, message: &str) -> Self {
        let record = self.stamp(Record::at(time_at(offset_ms)).with_message(message));
        self.records.push(record);
        self
    }

    /// Adds an RRC Connection Release with a release cause
    pub fn release(mut self, offset_ms: TimeMs, cause: &str) -> Self {
        let record = self.stamp(
            Record::at(time_at(offset_ms))
                .with_message("RRC_CONNECTION_RELEASE")
                .with_rrc_cause(cause),
        );
        self.records.push(record);
        self
    }

    /// Adds a prebuilt record; identity fields are added to it
    pub fn record(mut self, record: Record) -> Self {
        let record = self.stamp(record);
        self.records.push(record);
        self
    }

    /// Finished records, in script order
    pub fn records(self) -> Vec<Record> {
        self.records
    }
}

/// Scenario A: successful call with normal release
pub fn scenario_successful_call() -> Vec<Record> {
    CallScript::with_call_id("A-1")
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(500, "RRC_CONNECTION_SETUP_COMPLETE")
        .msg(900, "RAB_ASSIGNMENT_COMPLETE")
        .msg(1_200, "CONNECT")
        .msg(5_000, "DISCONNECT")
        .release(5_200, "Normal")
        .records()
}

/// Scenario B: RRC Connection Request followed by NAS call control
pub fn scenario_rrc_then_nas() -> Vec<Record> {
    CallScript::with_call_id("B-1")
        .msg(0, "RRC_CONNECTION_REQUEST")
        .msg(4_000, "CM_SERVICE_REQUEST")
        .records()
}

/// Scenario C/D: SETUP rejected after `reject_after_ms`
pub fn scenario_rrc_reject(reject_after_ms: TimeMs) -> Vec<Record> {
    CallScript::with_call_id("CD-1")
        .msg(0, "SETUP")
        .msg(reject_after_ms, "RRC_CONNECTION_REJECT")
        .records()
}

/// Scenario E: connected call lost to radio link failure
pub fn scenario_radio_link_failure() -> Vec<Record> {
    CallScript::with_call_id("E-1")
        .msg(0, "CM_SERVICE_REQUEST")
        .msg(1_000, "CONNECT")
        .msg(20_000, "RADIO LINK FAILURE")
        .records()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_at() {
        assert_eq!(time_at(0), "10:00:00.000");
        assert_eq!(time_at(5_200), "10:00:05.200");
        assert_eq!(time_at(61_001), "10:01:01.001");
    }

    #[test]
    fn test_script_stamps_identity() {
        let records = CallScript::with_subscriber("001010000000001", "BEEF01")
            .msg(0, "SETUP")
            .records();
        assert_eq!(records[0].field_text("imsi").as_deref(), Some("001010000000001"));
        assert_eq!(records[0].field_text("tmsi").as_deref(), Some("BEEF01"));
        assert_eq!(records[0].field_text("callId"), None);
    }
}
