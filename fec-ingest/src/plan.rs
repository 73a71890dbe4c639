//! What one ingest run fetches

use std::collections::{BTreeMap, BTreeSet};

use fec_common::config::TargetConfig;
use fec_common::raw::{RawSource, Subject};
use fec_common::settings::IngestSettings;
use fec_common::{Error, Result};

/// Where candidate → committee links come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMode {
    /// Ask `/candidate/{id}/committees/` for each cycle
    Live,
    /// Use `candidate_committees` from the target config
    Offline(BTreeMap<String, BTreeMap<String, BTreeSet<String>>>),
}

#[derive(Debug, Clone)]
pub struct IngestPlan {
    pub cycles: BTreeSet<u16>,
    pub candidate_ids: BTreeSet<String>,
    pub committee_ids: BTreeSet<String>,
    pub sources: BTreeSet<RawSource>,
    pub links: LinkMode,
}

impl IngestPlan {
    /// Fails when nothing is tracked or no source is enabled
    pub fn from_config(config: &TargetConfig, settings: &IngestSettings, offline: bool) -> Result<Self> {
        config.require_targets()?;

        let sources: BTreeSet<RawSource> = settings.sources.iter().copied().collect();
        if sources.is_empty() {
            return Err(Error::Config("[ingest] sources is empty".to_string()));
        }

        let links = if offline {
            LinkMode::Offline(config.candidate_committees.clone())
        } else {
            LinkMode::Live
        };

        Ok(Self {
            cycles: config.cycles_or(settings.default_cycle),
            candidate_ids: config.candidate_ids.clone(),
            committee_ids: config.committee_ids.clone(),
            sources,
            links,
        })
    }

    pub fn is_enabled(&self, source: RawSource) -> bool {
        self.sources.contains(&source)
    }

    /// Enabled per-cycle sources for one kind of subject, in catalogue order
    pub fn cycle_sources(&self, subject: Subject) -> Vec<RawSource> {
        self.sources
            .iter()
            .copied()
            .filter(|s| !s.is_dimension() && s.subject() == subject)
            .collect()
    }

    /// Linked committees from config; `None` when links are fetched live
    pub fn offline_committees(&self, candidate_id: &str, cycle: u16) -> Option<BTreeSet<String>> {
        match &self.links {
            LinkMode::Live => None,
            LinkMode::Offline(map) => Some(
                map.get(candidate_id)
                    .and_then(|by_cycle| by_cycle.get(&cycle.to_string()))
                    .cloned()
                    .unwrap_or_default(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> TargetConfig {
        serde_json::from_value(json!({
            "cycles": [2026, 2024],
            "candidate_ids": ["H6WA10123"],
            "committee_ids": ["C00000009"],
            "candidate_committees": {"H6WA10123": {"2026": ["C00000001"]}}
        }))
        .unwrap()
    }

    #[test]
    fn test_plan_from_config() {
        let plan = IngestPlan::from_config(&config(), &IngestSettings::default(), false).unwrap();
        assert_eq!(plan.cycles.iter().copied().collect::<Vec<_>>(), vec![2024, 2026]);
        assert_eq!(plan.links, LinkMode::Live);
        assert_eq!(plan.offline_committees("H6WA10123", 2026), None);
        assert_eq!(plan.sources.len(), RawSource::ALL.len());
    }

    #[test]
    fn test_offline_links_come_from_config() {
        let plan = IngestPlan::from_config(&config(), &IngestSettings::default(), true).unwrap();
        assert_eq!(
            plan.offline_committees("H6WA10123", 2026),
            Some(BTreeSet::from(["C00000001".to_string()]))
        );
        assert_eq!(plan.offline_committees("H6WA10123", 2024), Some(BTreeSet::new()));
    }

    #[test]
    fn test_cycle_sources_split_by_subject() {
        let plan = IngestPlan::from_config(&config(), &IngestSettings::default(), false).unwrap();
        assert_eq!(
            plan.cycle_sources(Subject::Candidate),
            vec![
                RawSource::CandidateHistory,
                RawSource::CandidateCommittees,
                RawSource::ScheduleE
            ]
        );
        let committee = plan.cycle_sources(Subject::Committee);
        assert_eq!(committee.first(), Some(&RawSource::CommitteeReports));
        assert!(!committee.contains(&RawSource::Committees));
    }

    #[test]
    fn test_empty_targets_or_sources_rejected() {
        let empty = TargetConfig::default();
        assert!(IngestPlan::from_config(&empty, &IngestSettings::default(), false).is_err());

        let settings = IngestSettings {
            sources: Vec::new(),
            ..IngestSettings::default()
        };
        assert!(matches!(
            IngestPlan::from_config(&config(), &settings, false),
            Err(Error::Config(_))
        ));
    }
}
