//! Target configuration and API credentials
//!
//! `config/fec-targets.json` names what the pipeline tracks:
//!
//! ```json
//! {
//!   "cycles": [2026],
//!   "candidate_ids": ["H6WA10123"],
//!   "committee_ids": ["C00000001"],
//!   "timezone": "America/Los_Angeles",
//!   "candidate_committees": { "H6WA10123": { "2026": ["C00000001"] } }
//! }
//! ```
//!
//! Writes are set unions and go through temp file + rename, so repeated
//! resolution is safe and a crash never leaves a half-written file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DEFAULT_TARGETS_PATH: &str = "config/fec-targets.json";
pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

pub const API_KEY_ENV: &str = "FEC_API_KEY";
/// When set, candidate → committee mapping comes from config instead of the API
pub const OFFLINE_ENV: &str = "SKIP_FEC_PREFLIGHT";

const MIN_API_KEY_LEN: usize = 20;

/// FEC API key; `Debug`/`Display` never show the full value
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Validates minimum length before any request can be made
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.len() < MIN_API_KEY_LEN {
            return Err(Error::Config(format!(
                "Missing/invalid {}. Saw: {}",
                API_KEY_ENV,
                redact(&key)
            )));
        }
        Ok(Self(key))
    }

    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(API_KEY_ENV).unwrap_or_default())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", redact(&self.0))
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(&self.0))
    }
}

/// `abcd…wxyz`, or `(none)`
pub fn redact(key: &str) -> String {
    if key.is_empty() {
        return "(none)".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "…".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// True when `SKIP_FEC_PREFLIGHT` is set to anything but empty/0/false
pub fn offline_mode() -> bool {
    match std::env::var(OFFLINE_ENV) {
        Ok(v) => !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"),
        Err(_) => false,
    }
}

/// Contents of `config/fec-targets.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub cycles: BTreeSet<u16>,
    #[serde(default)]
    pub candidate_ids: BTreeSet<String>,
    #[serde(default)]
    pub committee_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// candidate id → cycle (as string key) → committee ids
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub candidate_committees: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    /// Unknown fields survive a load/save round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TargetConfig {
    /// Load the target config; absence is a configuration error
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read target config {}: {}", path.display(), e))
        })?;
        let mut cfg: TargetConfig = serde_json::from_str(&text).map_err(|e| {
            Error::Config(format!("Invalid target config {}: {}", path.display(), e))
        })?;
        cfg.normalize();
        Ok(cfg)
    }

    /// Load, or start empty when the file does not exist yet
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Pretty JSON, atomic replace
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::ndjson::write_json_atomic(path, self)
    }

    /// Upper-case ids, drop blanks
    fn normalize(&mut self) {
        let clean = |set: &BTreeSet<String>| -> BTreeSet<String> {
            set.iter()
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        self.candidate_ids = clean(&self.candidate_ids);
        self.committee_ids = clean(&self.committee_ids);
        for by_cycle in self.candidate_committees.values_mut() {
            for ids in by_cycle.values_mut() {
                *ids = clean(ids);
            }
        }
    }

    /// Fails when there is nothing to track
    pub fn require_targets(&self) -> Result<()> {
        if self.candidate_ids.is_empty() && self.committee_ids.is_empty() {
            return Err(Error::Config(
                "No candidate_ids or committee_ids configured in target config".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured cycles, or `fallback` when none are listed
    pub fn cycles_or(&self, fallback: u16) -> BTreeSet<u16> {
        if self.cycles.is_empty() {
            BTreeSet::from([fallback])
        } else {
            self.cycles.clone()
        }
    }

    /// Offline committee mapping for one candidate and cycle
    pub fn committees_for(&self, candidate_id: &str, cycle: u16) -> BTreeSet<String> {
        self.candidate_committees
            .get(candidate_id)
            .and_then(|by_cycle| by_cycle.get(&cycle.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Set-union merge of one resolved candidate
    pub fn merge_candidate(
        &mut self,
        cycle: u16,
        candidate_id: &str,
        committee_ids: &BTreeSet<String>,
    ) {
        self.cycles.insert(cycle);
        self.candidate_ids.insert(candidate_id.to_string());
        self.committee_ids.extend(committee_ids.iter().cloned());
        if !committee_ids.is_empty() {
            self.candidate_committees
                .entry(candidate_id.to_string())
                .or_default()
                .entry(cycle.to_string())
                .or_default()
                .extend(committee_ids.iter().cloned());
        }
        if self.timezone.is_none() {
            self.timezone = Some(DEFAULT_TIMEZONE.to_string());
        }
    }

    /// Set-union merge of a resolved entity across its cycles
    pub fn merge_entity(&mut self, entity: &TrackedEntity) {
        match &entity.candidate_id {
            Some(candidate_id) => {
                for cycle in &entity.cycles {
                    self.merge_candidate(*cycle, candidate_id, &entity.committee_ids);
                }
            }
            None => {
                self.cycles.extend(entity.cycles.iter().copied());
                self.committee_ids.extend(entity.committee_ids.iter().cloned());
            }
        }
    }
}

/// A candidate or committee under observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub candidate_id: Option<String>,
    pub committee_ids: BTreeSet<String>,
    pub cycles: BTreeSet<u16>,
    pub state: Option<String>,
    /// House only
    pub district: Option<String>,
}

/// `H6WA10123` → office H, cycle digit, state WA, sequence
pub fn is_candidate_id(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 9
        && matches!(b[0], b'H' | b'S' | b'P')
        && b[1].is_ascii_digit()
        && b[2].is_ascii_uppercase()
        && b[3].is_ascii_uppercase()
        && b[4..].iter().all(u8::is_ascii_digit)
}

/// `C` followed by eight digits
pub fn is_committee_id(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 9 && b[0] == b'C' && b[1..].iter().all(u8::is_ascii_digit)
}

/// Two-letter state embedded in a House/Senate candidate id
pub fn candidate_state(candidate_id: &str) -> Option<String> {
    if is_candidate_id(candidate_id) && !candidate_id.starts_with('P') {
        Some(candidate_id[2..4].to_string())
    } else {
        None
    }
}

/// `"7"` → `"07"`; rejects non-numeric input
pub fn normalize_district(raw: &str) -> Result<String> {
    let n: u8 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("District must be numeric, got {:?}", raw)))?;
    Ok(format!("{:02}", n))
}

/// Default location of the target config relative to the working directory
pub fn default_targets_path() -> PathBuf {
    PathBuf::from(DEFAULT_TARGETS_PATH)
}
