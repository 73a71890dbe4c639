//! Candidate and committee resolution

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use fec_common::api::{collect_offset, FecClient, PageLimits};
use fec_common::config::{normalize_district, TargetConfig, TrackedEntity};
use fec_common::designation::{classify_designation, CommitteeRole};
use fec_common::{Error, Result};

const SEARCH_PATH: &str = "/candidates/search/";

/// Office sought
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Office {
    #[default]
    H,
    S,
    P,
}

impl Office {
    pub fn code(self) -> &'static str {
        match self {
            Office::H => "H",
            Office::S => "S",
            Office::P => "P",
        }
    }
}

impl FromStr for Office {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" | "HOUSE" => Ok(Office::H),
            "S" | "SENATE" => Ok(Office::S),
            "P" | "PRESIDENT" => Ok(Office::P),
            other => Err(format!("office must be H, S or P, got {:?}", other)),
        }
    }
}

impl fmt::Display for Office {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Search filters for one resolver run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveQuery {
    pub office: Office,
    pub state: Option<String>,
    pub district: Option<String>,
    pub name: Option<String>,
    pub cycle: u16,
}

impl ResolveQuery {
    /// Normalize filters: state upper-cased, district zero-padded (House only)
    pub fn validated(self) -> Result<Self> {
        let state = self
            .state
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty());
        let name = self
            .name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if state.is_none() && name.is_none() {
            return Err(Error::InvalidInput(
                "At least one of --state or --name is required".to_string(),
            ));
        }
        if let Some(st) = &state {
            if st.len() != 2 || !st.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(Error::InvalidInput(format!(
                    "State must be a two-letter code, got {:?}",
                    st
                )));
            }
        }
        if self.cycle == 0 || self.cycle % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "Cycle must be an even year, got {}",
                self.cycle
            )));
        }

        let district = match (self.office, self.district) {
            (_, None) => None,
            (Office::H, Some(d)) => Some(normalize_district(&d)?),
            (office, Some(d)) => {
                warn!(office = %office, district = %d, "District ignored for non-House search");
                None
            }
        };

        Ok(Self {
            office: self.office,
            state,
            district,
            name,
            cycle: self.cycle,
        })
    }

    /// Query parameters for `/candidates/search/`
    pub fn search_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("office".to_string(), self.office.code().to_string()),
            ("cycle".to_string(), self.cycle.to_string()),
        ];
        if let Some(state) = &self.state {
            params.push(("state".to_string(), state.clone()));
        }
        if let Some(district) = &self.district {
            params.push(("district".to_string(), district.clone()));
        }
        match &self.name {
            Some(name) => params.push(("q".to_string(), name.clone())),
            None => params.push(("is_active_candidate".to_string(), "true".to_string())),
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeSummary {
    pub committee_id: String,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub designation_full: Option<String>,
    pub committee_type_full: Option<String>,
    pub role: CommitteeRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCandidate {
    pub candidate_id: String,
    pub name: Option<String>,
    pub party: Option<String>,
    pub incumbent: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub committees: Vec<CommitteeSummary>,
    pub principal_ids: Vec<String>,
    pub authorized_ids: Vec<String>,
}

impl ResolvedCandidate {
    /// Principal and authorized committees; these are the ones worth tracking
    pub fn tracked_committee_ids(&self) -> BTreeSet<String> {
        self.principal_ids
            .iter()
            .chain(self.authorized_ids.iter())
            .cloned()
            .collect()
    }

    pub fn tracked_entity(&self, cycle: u16) -> TrackedEntity {
        TrackedEntity {
            candidate_id: Some(self.candidate_id.clone()),
            committee_ids: self.tracked_committee_ids(),
            cycles: BTreeSet::from([cycle]),
            state: self.state.clone(),
            district: self.district.clone(),
        }
    }
}

fn text(row: &Value, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// House districts as two digits; senate and presidential rows have none
fn district_of(row: &Value, office: Office) -> Option<String> {
    let office = text(row, "office")
        .and_then(|o| o.parse::<Office>().ok())
        .unwrap_or(office);
    if office != Office::H {
        return None;
    }
    let raw = text(row, "district")?;
    match normalize_district(&raw) {
        Ok(district) if district == "00" => None,
        Ok(district) => Some(district),
        Err(e) => {
            warn!(district = %raw, error = %e, "Unusable district dropped");
            None
        }
    }
}

fn summarize_committee(row: &Value) -> Option<CommitteeSummary> {
    let committee_id = text(row, "committee_id")?;
    let designation = text(row, "designation");
    let designation_full = text(row, "designation_full");
    let role = classify_designation(designation.as_deref(), designation_full.as_deref());
    Some(CommitteeSummary {
        committee_id,
        name: text(row, "name"),
        designation,
        designation_full,
        committee_type_full: text(row, "committee_type_full"),
        role,
    })
}

/// Search candidates, then fetch committees for each
///
/// A failed search fails the run. A failed committee lookup drops only that
/// candidate.
pub async fn resolve(
    client: &FecClient,
    query: &ResolveQuery,
    limits: PageLimits,
) -> Result<Vec<ResolvedCandidate>> {
    let mut found: Vec<Value> = Vec::new();
    let stats = collect_offset(client, SEARCH_PATH, &query.search_params(), limits, &mut found).await?;
    info!(
        candidates = found.len(),
        pages = stats.pages,
        truncated = stats.truncated,
        "Candidate search complete"
    );

    let cycle_param = vec![("cycle".to_string(), query.cycle.to_string())];
    let mut rows = Vec::new();

    for candidate in &found {
        let Some(candidate_id) = text(candidate, "candidate_id") else {
            debug!("Search result without candidate_id skipped");
            continue;
        };

        let path = format!("/candidate/{}/committees/", candidate_id);
        let mut committee_rows: Vec<Value> = Vec::new();
        if let Err(e) = collect_offset(client, &path, &cycle_param, limits, &mut committee_rows).await {
            warn!(candidate_id = %candidate_id, error = %e, "Committee lookup failed, skipping candidate");
            continue;
        }

        let committees: Vec<CommitteeSummary> =
            committee_rows.iter().filter_map(summarize_committee).collect();
        let ids_with = |role: CommitteeRole| -> Vec<String> {
            committees
                .iter()
                .filter(|c| c.role == role)
                .map(|c| c.committee_id.clone())
                .collect()
        };
        let principal_ids = ids_with(CommitteeRole::Principal);
        let authorized_ids = ids_with(CommitteeRole::Authorized);

        rows.push(ResolvedCandidate {
            name: text(candidate, "name"),
            party: text(candidate, "party_full").or_else(|| text(candidate, "party")),
            incumbent: text(candidate, "incumbent_challenge_full")
                .or_else(|| text(candidate, "incumbent_challenge")),
            state: text(candidate, "state"),
            district: district_of(candidate, query.office),
            candidate_id,
            committees,
            principal_ids,
            authorized_ids,
        });
    }

    Ok(rows)
}

/// Set-union merge of resolved candidates into the target config
pub fn merge_into(config: &mut TargetConfig, cycle: u16, rows: &[ResolvedCandidate]) {
    for row in rows {
        config.merge_entity(&row.tracked_entity(cycle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ResolveQuery {
        ResolveQuery {
            office: Office::H,
            state: Some("wa".to_string()),
            district: Some("7".to_string()),
            name: None,
            cycle: 2026,
        }
    }

    #[test]
    fn test_house_query_pads_district() {
        let q = query().validated().unwrap();
        assert_eq!(q.state.as_deref(), Some("WA"));
        assert_eq!(q.district.as_deref(), Some("07"));

        let params = q.search_params();
        assert!(params.contains(&("district".to_string(), "07".to_string())));
        assert!(params.contains(&("is_active_candidate".to_string(), "true".to_string())));
    }

    #[test]
    fn test_senate_query_drops_district() {
        let q = ResolveQuery { office: Office::S, ..query() }.validated().unwrap();
        assert_eq!(q.district, None);
        assert!(!q.search_params().iter().any(|(k, _)| k == "district"));
    }

    #[test]
    fn test_name_query_is_not_active_filtered() {
        let q = ResolveQuery {
            state: None,
            district: None,
            name: Some(" Jane Doe ".to_string()),
            ..query()
        }
        .validated()
        .unwrap();

        let params = q.search_params();
        assert!(params.contains(&("q".to_string(), "Jane Doe".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "is_active_candidate"));
    }

    #[test]
    fn test_query_requires_state_or_name() {
        let q = ResolveQuery { state: None, ..query() };
        assert!(matches!(q.validated(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_query_rejects_bad_district_and_cycle() {
        let bad_district = ResolveQuery { district: Some("x".to_string()), ..query() };
        assert!(bad_district.validated().is_err());

        let odd_cycle = ResolveQuery { cycle: 2025, ..query() };
        assert!(odd_cycle.validated().is_err());
    }

    #[test]
    fn test_office_parse() {
        assert_eq!("h".parse::<Office>().unwrap(), Office::H);
        assert_eq!("Senate".parse::<Office>().unwrap(), Office::S);
        assert!("X".parse::<Office>().is_err());
    }

    #[test]
    fn test_row_district_is_padded_for_house_only() {
        use serde_json::json;

        assert_eq!(district_of(&json!({"district": "1"}), Office::H).as_deref(), Some("01"));
        assert_eq!(district_of(&json!({"district": 7}), Office::H).as_deref(), Some("07"));
        assert_eq!(district_of(&json!({"district": "00"}), Office::H), None);
        assert_eq!(district_of(&json!({"district": "03"}), Office::S), None);
        assert_eq!(district_of(&json!({"office": "S", "district": "03"}), Office::H), None);
        assert_eq!(district_of(&json!({"district": "at large"}), Office::H), None);
    }
}
