//! Site bundle build
//!
//! Everything written except `manifest.json`'s `generated_at` is a pure
//! function of the warehouse tables and target config. `build_id` hashes the
//! bundle content in a fixed order, so it changes only when the data does.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use fec_common::config::TargetConfig;
use fec_common::layout::DataLayout;
use fec_common::ndjson::write_json_atomic;
use fec_common::settings::BundleSettings;
use fec_common::Result;
use fec_warehouse::WarehouseTables;

use crate::candidates::{build_candidates, CandidateIndex};
use crate::committees::build_committees;
use crate::details::CandidateDetails;

pub const COMMITTEES_FILE: &str = "committees.json";
pub const CANDIDATES_FILE: &str = "candidates.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CANDIDATE_DETAILS_DIR: &str = "candidates";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    pub generated_at: String,
    pub build_id: String,
    pub committees: Vec<String>,
    pub candidates: Vec<String>,
}

/// One output file, relative to the site directory
struct SiteFile {
    path: PathBuf,
    body: Value,
}

/// SHA-256 over each file's relative path and compact JSON body
fn content_hash(files: &[SiteFile]) -> Result<String> {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        hasher.update(serde_json::to_vec(&file.body)?);
        hasher.update([0u8]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct BundleBuilder {
    layout: DataLayout,
    settings: BundleSettings,
}

impl BundleBuilder {
    pub fn new(layout: DataLayout, settings: BundleSettings) -> Self {
        Self { layout, settings }
    }

    /// Every site file in write order
    fn site_files(&self, tables: &WarehouseTables, config: &TargetConfig) -> Result<(Vec<SiteFile>, Vec<String>, Vec<String>)> {
        let committees = build_committees(&tables.metrics, self.settings.top_donors);
        let candidates = build_candidates(tables, config, self.settings.top_donors);

        let mut files = vec![
            SiteFile {
                path: PathBuf::from(COMMITTEES_FILE),
                body: serde_json::to_value(&committees)?,
            },
            SiteFile {
                path: PathBuf::from(CANDIDATES_FILE),
                body: serde_json::to_value(&candidates)?,
            },
        ];

        let index = CandidateIndex::new(tables, config);
        for candidate_id in candidates.keys() {
            let Some(selection) = index.select(candidate_id) else { continue };
            let details = CandidateDetails::build(tables, &selection, &self.settings);
            for (name, body) in details.files()? {
                files.push(SiteFile {
                    path: Path::new(CANDIDATE_DETAILS_DIR).join(candidate_id).join(name),
                    body,
                });
            }
        }

        Ok((
            files,
            committees.into_keys().collect(),
            candidates.into_keys().collect(),
        ))
    }

    /// Read the warehouse, write every bundle and the manifest
    ///
    /// A missing warehouse table fails before anything is written.
    pub fn build(&self, config: &TargetConfig, generated_at: &str) -> Result<Manifest> {
        let tables = WarehouseTables::load(&self.layout.warehouse_dir())?;
        info!(
            committees = tables.metrics.len(),
            candidates = tables.candidates.len(),
            "Warehouse loaded"
        );

        let (files, committees, candidates) = self.site_files(&tables, config)?;
        let manifest = Manifest {
            generated_at: generated_at.to_string(),
            build_id: content_hash(&files)?,
            committees,
            candidates,
        };

        let site = self.layout.site_dir();
        let details = site.join(CANDIDATE_DETAILS_DIR);
        // Candidates that dropped out must not leave stale detail files
        if details.exists() {
            std::fs::remove_dir_all(&details)?;
        }

        for file in &files {
            debug!(file = %file.path.display(), "Writing bundle");
            write_json_atomic(&site.join(&file.path), &file.body)?;
        }
        write_json_atomic(&site.join(MANIFEST_FILE), &manifest)?;

        info!(
            build_id = %manifest.build_id,
            committees = manifest.committees.len(),
            candidates = manifest.candidates.len(),
            files = files.len() + 1,
            "Site bundles written"
        );
        Ok(manifest)
    }
}
