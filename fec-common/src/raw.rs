//! Raw partition catalogue
//!
//! One `RawSource` per FEC endpoint the ingester pulls. The source decides the
//! endpoint path, query, pagination style and the partition file name; the
//! warehouse parses file names back into sources to route records.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Key under which each raw record carries its provenance
pub const META_KEY: &str = "_meta";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawSource {
    Candidates,
    Committees,
    CandidateHistory,
    CandidateCommittees,
    CommitteeReports,
    ScheduleA,
    ReceiptsBySize,
    ReceiptsByState,
    ReceiptsByEmployer,
    ScheduleB,
    ScheduleE,
}

/// Which kind of id a source is fetched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Candidate,
    Committee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Detail lookup, one request
    Single,
    Offset,
    Keyset,
}

impl RawSource {
    pub const ALL: [RawSource; 11] = [
        RawSource::Candidates,
        RawSource::Committees,
        RawSource::CandidateHistory,
        RawSource::CandidateCommittees,
        RawSource::CommitteeReports,
        RawSource::ScheduleA,
        RawSource::ReceiptsBySize,
        RawSource::ReceiptsByState,
        RawSource::ReceiptsByEmployer,
        RawSource::ScheduleB,
        RawSource::ScheduleE,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RawSource::Candidates => "candidates",
            RawSource::Committees => "committees",
            RawSource::CandidateHistory => "candidate_history",
            RawSource::CandidateCommittees => "candidate_committees",
            RawSource::CommitteeReports => "committee_reports",
            RawSource::ScheduleA => "schedule_a",
            RawSource::ReceiptsBySize => "receipts_by_size",
            RawSource::ReceiptsByState => "receipts_by_state",
            RawSource::ReceiptsByEmployer => "receipts_by_employer",
            RawSource::ScheduleB => "schedule_b",
            RawSource::ScheduleE => "schedule_e",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.key() == key)
    }

    pub fn subject(self) -> Subject {
        match self {
            RawSource::Candidates
            | RawSource::CandidateHistory
            | RawSource::CandidateCommittees
            | RawSource::ScheduleE => Subject::Candidate,
            _ => Subject::Committee,
        }
    }

    pub fn paging(self) -> Paging {
        match self {
            RawSource::Candidates | RawSource::Committees => Paging::Single,
            RawSource::ScheduleA | RawSource::ScheduleB | RawSource::ScheduleE => Paging::Keyset,
            _ => Paging::Offset,
        }
    }

    /// Dimension sources are written once per entity, not per cycle
    pub fn is_dimension(self) -> bool {
        self.paging() == Paging::Single
    }

    pub fn path(self, id: &str) -> String {
        match self {
            RawSource::Candidates => format!("/candidate/{}/", id),
            RawSource::Committees => format!("/committee/{}/", id),
            RawSource::CandidateHistory => format!("/candidate/{}/history/", id),
            RawSource::CandidateCommittees => format!("/candidate/{}/committees/", id),
            RawSource::CommitteeReports => format!("/committee/{}/reports/", id),
            RawSource::ScheduleA => "/schedules/schedule_a/".to_string(),
            RawSource::ReceiptsBySize => "/schedules/schedule_a/by_size/".to_string(),
            RawSource::ReceiptsByState => "/schedules/schedule_a/by_state/".to_string(),
            RawSource::ReceiptsByEmployer => "/schedules/schedule_a/by_employer/".to_string(),
            RawSource::ScheduleB => "/schedules/schedule_b/".to_string(),
            RawSource::ScheduleE => "/schedules/schedule_e/".to_string(),
        }
    }

    pub fn params(self, id: &str, cycle: u16) -> Vec<(String, String)> {
        let p = |k: &str, v: &str| (k.to_string(), v.to_string());
        let cycle = cycle.to_string();
        match self {
            RawSource::Candidates | RawSource::Committees => Vec::new(),
            RawSource::CandidateHistory
            | RawSource::CandidateCommittees
            | RawSource::CommitteeReports => vec![p("cycle", &cycle)],
            RawSource::ScheduleA => vec![
                p("committee_id", id),
                p("two_year_transaction_period", &cycle),
                p("sort", "-contribution_receipt_date"),
            ],
            RawSource::ReceiptsBySize | RawSource::ReceiptsByState | RawSource::ReceiptsByEmployer => {
                vec![p("committee_id", id), p("cycle", &cycle)]
            }
            RawSource::ScheduleB => vec![
                p("committee_id", id),
                p("two_year_transaction_period", &cycle),
                p("sort", "-disbursement_date"),
            ],
            RawSource::ScheduleE => vec![
                p("candidate_id", id),
                p("cycle", &cycle),
                p("sort", "-expenditure_date"),
            ],
        }
    }

    /// `candidates.ndjson` or `schedule_a_C00000001_2026.ndjson`
    pub fn file_name(self, id: &str, cycle: u16) -> String {
        if self.is_dimension() {
            format!("{}.ndjson", self.key())
        } else {
            format!("{}_{}_{}.ndjson", self.key(), id, cycle)
        }
    }
}

/// A partition file name parsed back into its source and scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFileName {
    pub source: RawSource,
    pub entity_id: Option<String>,
    pub cycle: Option<u16>,
}

impl RawFileName {
    pub fn parse(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".ndjson")?;

        if let Some(source) = RawSource::from_key(stem).filter(|s| s.is_dimension()) {
            return Some(Self {
                source,
                entity_id: None,
                cycle: None,
            });
        }

        let (rest, cycle) = stem.rsplit_once('_')?;
        let cycle: u16 = cycle.parse().ok()?;
        let (prefix, id) = rest.rsplit_once('_')?;
        let source = RawSource::from_key(prefix).filter(|s| !s.is_dimension())?;

        Some(Self {
            source,
            entity_id: Some(id.to_string()),
            cycle: Some(cycle),
        })
    }
}

/// Provenance stamped onto every raw record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub source: RawSource,
    pub fetched_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl RecordMeta {
    /// Returns the record with `_meta` attached; non-objects are wrapped
    pub fn stamp(&self, record: &Value) -> Value {
        let meta = json!(self);
        match record {
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert(META_KEY.to_string(), meta);
                Value::Object(map)
            }
            other => json!({ "value": other, META_KEY: meta }),
        }
    }

    pub fn read(record: &Value) -> Option<Self> {
        record
            .get(META_KEY)
            .and_then(|m| serde_json::from_value(m.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_round_trip_through_parse() {
        for source in RawSource::ALL {
            let name = source.file_name("C00000001", 2026);
            let parsed = RawFileName::parse(&name).unwrap();
            assert_eq!(parsed.source, source, "{}", name);
            if !source.is_dimension() {
                assert_eq!(parsed.entity_id.as_deref(), Some("C00000001"));
                assert_eq!(parsed.cycle, Some(2026));
            }
        }
    }

    #[test]
    fn test_parse_rejects_unknown_files() {
        assert!(RawFileName::parse("_SUCCESS").is_none());
        assert!(RawFileName::parse("notes.txt").is_none());
        assert!(RawFileName::parse("mystery_C00000001_2026.ndjson").is_none());
        assert!(RawFileName::parse("schedule_a_C00000001_20x6.ndjson").is_none());
    }

    #[test]
    fn test_paging_styles() {
        assert_eq!(RawSource::ScheduleA.paging(), Paging::Keyset);
        assert_eq!(RawSource::ScheduleE.paging(), Paging::Keyset);
        assert_eq!(RawSource::CommitteeReports.paging(), Paging::Offset);
        assert_eq!(RawSource::ReceiptsBySize.paging(), Paging::Offset);
        assert_eq!(RawSource::Candidates.paging(), Paging::Single);
    }

    #[test]
    fn test_schedule_e_is_fetched_per_candidate() {
        assert_eq!(RawSource::ScheduleE.subject(), Subject::Candidate);
        let params = RawSource::ScheduleE.params("H6WA10123", 2026);
        assert!(params.contains(&("candidate_id".to_string(), "H6WA10123".to_string())));
    }

    #[test]
    fn test_stamp_and_read_meta() {
        let meta = RecordMeta {
            source: RawSource::ScheduleA,
            fetched_on: "2026-10-19".to_string(),
            cycle: Some(2026),
            entity_id: Some("C00000001".to_string()),
        };
        let stamped = meta.stamp(&json!({"sub_id": "1"}));
        assert_eq!(stamped["sub_id"], "1");
        assert_eq!(RecordMeta::read(&stamped), Some(meta));
    }
}
