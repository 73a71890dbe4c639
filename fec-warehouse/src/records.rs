//! Raw partition loading
//!
//! Every `*.ndjson` file is routed by its name; records keep their `_meta`
//! provenance, falling back to what the file name says when a line has none.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use fec_common::layout::Partition;
use fec_common::ndjson::read_ndjson;
use fec_common::raw::{RawFileName, RawSource, RecordMeta, META_KEY};
use fec_common::Result;

/// One raw record with its provenance
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub source: RawSource,
    pub entity_id: Option<String>,
    pub cycle: Option<u16>,
    pub value: Value,
}

impl RawRecord {
    /// Trimmed, non-empty string field; numbers are rendered
    pub fn text(&self, key: &str) -> Option<String> {
        text(&self.value, key)
    }

    /// First present string field among `keys`
    pub fn text_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Numeric field; numeric strings are accepted
    pub fn number(&self, key: &str) -> Option<f64> {
        number(&self.value, key)
    }

    pub fn number_any(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.value.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "y" | "yes" => Some(true),
                "false" | "f" | "n" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// The record's own cycle field, else the cycle it was fetched for
    pub fn cycle_or_meta(&self, keys: &[&str]) -> Option<u16> {
        keys.iter()
            .find_map(|k| self.number(k))
            .map(|n| n as u16)
            .filter(|c| *c > 0)
            .or(self.cycle)
    }

    /// Record body without `_meta`, for content-based de-duplication
    pub fn content_key(&self) -> String {
        match &self.value {
            Value::Object(map) => {
                let mut body = map.clone();
                body.remove(META_KEY);
                Value::Object(body).to_string()
            }
            other => other.to_string(),
        }
    }
}

pub fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub fn number(value: &Value, key: &str) -> Option<f64> {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// All records of one partition, grouped by source in file order
#[derive(Debug, Default)]
pub struct RawBatch {
    records: BTreeMap<RawSource, Vec<RawRecord>>,
}

impl RawBatch {
    pub fn load(partition: &Partition) -> Result<Self> {
        let mut batch = RawBatch::default();
        for path in partition.record_files()? {
            batch.load_file(&path)?;
        }
        debug!(
            partition = %partition.path.display(),
            records = batch.len(),
            "Raw partition loaded"
        );
        Ok(batch)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let Some(file) = RawFileName::parse(name) else {
            warn!(file = %path.display(), "Unrecognized raw file, ignoring");
            return Ok(());
        };

        let rows = read_ndjson(path)?;
        let bucket = self.records.entry(file.source).or_default();
        for value in rows {
            let meta = RecordMeta::read(&value);
            bucket.push(RawRecord {
                source: file.source,
                entity_id: meta
                    .as_ref()
                    .and_then(|m| m.entity_id.clone())
                    .or_else(|| file.entity_id.clone()),
                cycle: meta.as_ref().and_then(|m| m.cycle).or(file.cycle),
                value,
            });
        }
        Ok(())
    }

    pub fn get(&self, source: RawSource) -> &[RawRecord] {
        self.records.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn push(&mut self, record: RawRecord) {
        self.records.entry(record.source).or_default().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fec_common::layout::DataLayout;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_routes_files_and_keeps_meta() {
        let dir = TempDir::new().unwrap();
        let partition = DataLayout::new(dir.path()).partition(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        partition.ensure_exists().unwrap();
        std::fs::write(
            partition.path.join("schedule_a_C00000001_2026.ndjson"),
            "{\"sub_id\":\"1\"}\nnot json\n{\"sub_id\":\"2\",\"_meta\":{\"source\":\"schedule_a\",\"fetched_on\":\"2026-10-19\",\"cycle\":2024,\"entity_id\":\"C00000009\"}}\n",
        )
        .unwrap();
        std::fs::write(partition.path.join("notes.ndjson"), "{}\n").unwrap();

        let batch = RawBatch::load(&partition).unwrap();
        let rows = batch.get(RawSource::ScheduleA);

        assert_eq!(batch.len(), 2);
        assert_eq!(rows[0].entity_id.as_deref(), Some("C00000001"));
        assert_eq!(rows[0].cycle, Some(2026));
        assert_eq!(rows[1].entity_id.as_deref(), Some("C00000009"));
        assert_eq!(rows[1].cycle, Some(2024));
        assert!(batch.get(RawSource::ScheduleB).is_empty());
    }

    #[test]
    fn test_field_accessors() {
        let r = RawRecord {
            source: RawSource::ScheduleA,
            entity_id: None,
            cycle: Some(2026),
            value: json!({"amount": "12.5", "name": "  Jane ", "is_individual": true, "blank": " "}),
        };
        assert_eq!(r.number("amount"), Some(12.5));
        assert_eq!(r.text("name").as_deref(), Some("Jane"));
        assert_eq!(r.text("blank"), None);
        assert_eq!(r.flag("is_individual"), Some(true));
        assert_eq!(r.number_any(&["missing", "amount"]), Some(12.5));
        assert_eq!(r.cycle_or_meta(&["two_year_transaction_period"]), Some(2026));
    }

    #[test]
    fn test_content_key_ignores_meta() {
        let a = RawRecord {
            source: RawSource::ScheduleB,
            entity_id: None,
            cycle: None,
            value: json!({"x": 1, "_meta": {"fetched_on": "2026-10-18"}}),
        };
        let b = RawRecord {
            value: json!({"x": 1, "_meta": {"fetched_on": "2026-10-19"}}),
            ..a.clone()
        };
        assert_eq!(a.content_key(), b.content_key());
    }
}
