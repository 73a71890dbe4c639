//! Page sink that appends stamped records to a partition file

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use fec_common::api::PageSink;
use fec_common::designation::role_of;
use fec_common::ndjson::append_ndjson;
use fec_common::raw::RecordMeta;
use fec_common::Result;

/// Appends every page on arrival; optionally notes linked campaign committees
pub struct PartitionSink {
    path: Option<PathBuf>,
    meta: RecordMeta,
    written: usize,
    links: Option<BTreeSet<String>>,
}

impl PartitionSink {
    pub fn new(path: PathBuf, meta: RecordMeta) -> Self {
        Self {
            path: Some(path),
            meta,
            written: 0,
            links: None,
        }
    }

    /// Writes nothing, only collects links
    pub fn links_only(meta: RecordMeta) -> Self {
        Self {
            path: None,
            meta,
            written: 0,
            links: Some(BTreeSet::new()),
        }
    }

    /// Also collect principal/authorized `committee_id`s from the rows
    pub fn collecting_links(mut self) -> Self {
        self.links = Some(BTreeSet::new());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn take_links(&mut self) -> BTreeSet<String> {
        self.links.take().unwrap_or_default()
    }
}

impl PageSink for PartitionSink {
    fn accept(&mut self, rows: &[Value]) -> Result<()> {
        if let Some(links) = self.links.as_mut() {
            for row in rows {
                if !role_of(row).is_campaign() {
                    continue;
                }
                if let Some(id) = row.get("committee_id").and_then(Value::as_str) {
                    links.insert(id.trim().to_ascii_uppercase());
                }
            }
        }

        if let Some(path) = &self.path {
            let stamped: Vec<Value> = rows.iter().map(|r| self.meta.stamp(r)).collect();
            self.written += append_ndjson(path, &stamped)?;
        }
        Ok(())
    }
}
