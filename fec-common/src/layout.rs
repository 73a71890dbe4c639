//! Data root layout
//!
//! ```text
//! <root>/raw/<YYYY-MM-DD>/*.ndjson   append-only partitions (+ _SUCCESS marker)
//! <root>/warehouse/*.jsonl           normalized tables
//! <root>/site/*.json                 site bundles
//! ```

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::Result;

pub const RAW_DIR: &str = "raw";
pub const WAREHOUSE_DIR: &str = "warehouse";
pub const SITE_DIR: &str = "site";
/// Written when an ingest run finishes; removed when one starts
pub const COMPLETE_MARKER: &str = "_SUCCESS";

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_root(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    pub fn partition(&self, date: NaiveDate) -> Partition {
        Partition {
            date,
            path: self.raw_root().join(date.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn warehouse_dir(&self) -> PathBuf {
        self.root.join(WAREHOUSE_DIR)
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join(SITE_DIR)
    }

    /// Dated partition directories, oldest first; other entries are ignored
    pub fn partitions(&self) -> Result<Vec<Partition>> {
        let raw = self.raw_root();
        if !raw.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        for entry in std::fs::read_dir(&raw)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if let Some(date) = name
                .to_str()
                .and_then(|n| NaiveDate::parse_from_str(n, "%Y-%m-%d").ok())
            {
                out.push(Partition {
                    date,
                    path: entry.path(),
                });
            }
        }
        out.sort_by_key(|p| p.date);
        Ok(out)
    }
}

/// One dated raw partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub date: NaiveDate,
    pub path: PathBuf,
}

impl Partition {
    pub fn ensure_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.path)?;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.path.join(COMPLETE_MARKER).exists()
    }

    pub fn mark_complete(&self) -> Result<()> {
        std::fs::write(self.path.join(COMPLETE_MARKER), b"")?;
        Ok(())
    }

    pub fn clear_complete(&self) -> Result<()> {
        let marker = self.path.join(COMPLETE_MARKER);
        if marker.exists() {
            std::fs::remove_file(marker)?;
        }
        Ok(())
    }

    /// `*.ndjson` files sorted by name
    pub fn record_files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map(|x| x == "ndjson").unwrap_or(false))
            .collect();
        files.sort();
        Ok(files)
    }

    /// No record file holds any bytes
    pub fn is_empty(&self) -> Result<bool> {
        for file in self.record_files()? {
            if std::fs::metadata(&file)?.len() > 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_partitions_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path());
        std::fs::create_dir_all(layout.raw_root().join("2026-10-02")).unwrap();
        std::fs::create_dir_all(layout.raw_root().join("2026-09-30")).unwrap();
        std::fs::create_dir_all(layout.raw_root().join("scratch")).unwrap();
        std::fs::write(layout.raw_root().join("2026-10-05"), b"not a dir").unwrap();

        let parts = layout.partitions().unwrap();
        let dates: Vec<_> = parts.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date("2026-09-30"), date("2026-10-02")]);
    }

    #[test]
    fn test_missing_raw_root_is_no_partitions() {
        let tmp = TempDir::new().unwrap();
        let layout = DataLayout::new(tmp.path().join("absent"));
        assert!(layout.partitions().unwrap().is_empty());
    }

    #[test]
    fn test_completion_marker_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let part = DataLayout::new(tmp.path()).partition(date("2026-10-19"));
        part.ensure_exists().unwrap();

        assert!(!part.is_complete());
        part.mark_complete().unwrap();
        assert!(part.is_complete());
        part.clear_complete().unwrap();
        assert!(!part.is_complete());
        part.clear_complete().unwrap();
    }

    #[test]
    fn test_emptiness_ignores_marker_and_empty_files() {
        let tmp = TempDir::new().unwrap();
        let part = DataLayout::new(tmp.path()).partition(date("2026-10-19"));
        part.ensure_exists().unwrap();
        part.mark_complete().unwrap();
        std::fs::write(part.path.join("schedule_a_C00000001_2026.ndjson"), b"").unwrap();
        assert!(part.is_empty().unwrap());

        std::fs::write(part.path.join("committees.ndjson"), b"{}\n").unwrap();
        assert!(!part.is_empty().unwrap());
        assert_eq!(part.record_files().unwrap().len(), 2);
    }
}
