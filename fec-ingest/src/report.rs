//! Run summary

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use fec_common::raw::RawSource;

/// One entity/cycle whose remaining sources were not fetched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySkip {
    pub entity_id: String,
    pub cycle: Option<u16>,
    pub source: RawSource,
    pub reason: String,
}

/// A page walk stopped by the page cap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Truncation {
    pub entity_id: String,
    pub cycle: u16,
    pub source: RawSource,
    pub pages: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub partition: PathBuf,
    /// Lines appended this run, by file name
    pub files: BTreeMap<String, usize>,
    pub skipped: Vec<EntitySkip>,
    pub truncated: Vec<Truncation>,
}

impl IngestReport {
    pub fn new(partition: PathBuf) -> Self {
        Self {
            partition,
            ..Self::default()
        }
    }

    pub fn add_lines(&mut self, file: &str, lines: usize) {
        if lines > 0 {
            *self.files.entry(file.to_string()).or_default() += lines;
        }
    }

    pub fn skip(&mut self, entity_id: &str, cycle: Option<u16>, source: RawSource, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(
            entity_id = %entity_id,
            cycle = ?cycle,
            source = source.key(),
            reason = %reason,
            "Skipping entity"
        );
        self.skipped.push(EntitySkip {
            entity_id: entity_id.to_string(),
            cycle,
            source,
            reason,
        });
    }

    pub fn total_lines(&self) -> usize {
        self.files.values().sum()
    }

    pub fn log_summary(&self) {
        info!(
            partition = %self.partition.display(),
            files = self.files.len(),
            records = self.total_lines(),
            skipped = self.skipped.len(),
            truncated = self.truncated.len(),
            "Ingest complete"
        );
        for t in &self.truncated {
            warn!(
                entity_id = %t.entity_id,
                cycle = t.cycle,
                source = t.source.key(),
                pages = t.pages,
                "Page cap reached; remaining pages left for a later run"
            );
        }
    }
}
