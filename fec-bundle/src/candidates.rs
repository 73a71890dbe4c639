//! `candidates.json`: committee metrics rolled up per candidate
//!
//! A candidate's committees for a cycle are its principal and authorized
//! committees from the warehouse link table plus any committees the target
//! config maps to it. The newest cycle with any committee metrics wins; a
//! candidate known only through independent expenditures gets the newest cycle
//! with outside spending and zero committee totals.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use fec_common::config::TargetConfig;
use fec_warehouse::tables::{DimCandidate, IndependentExpenditure};
use fec_warehouse::{CommitteeMetric, WarehouseTables};

use crate::summary::FinanceSummary;

/// Independent expenditures about one candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutsideSpendTotals {
    pub support: f64,
    pub oppose: f64,
    pub total: f64,
    pub count: usize,
}

impl OutsideSpendTotals {
    pub fn of<'a>(items: impl IntoIterator<Item = &'a IndependentExpenditure>) -> Self {
        let mut totals = Self::default();
        for ie in items {
            match ie.support_oppose.as_deref() {
                Some("S") => totals.support += ie.amount,
                Some("O") => totals.oppose += ie.amount,
                _ => {}
            }
            totals.total += ie.amount;
            totals.count += 1;
        }
        totals
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateBundle {
    pub candidate_id: String,
    pub cycle: u16,
    pub name: Option<String>,
    pub party: Option<String>,
    pub office: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub committees: Vec<String>,
    #[serde(flatten)]
    pub summary: FinanceSummary,
    pub outside_spend: OutsideSpendTotals,
}

/// The committees and cycle chosen for one candidate
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub candidate_id: String,
    pub cycle: u16,
    pub committees: BTreeSet<String>,
    pub metrics: Vec<&'a CommitteeMetric>,
}

impl Selection<'_> {
    pub fn outside_spend<'t>(&self, tables: &'t WarehouseTables) -> impl Iterator<Item = &'t IndependentExpenditure> + 't {
        let candidate_id = self.candidate_id.clone();
        let cycle = self.cycle;
        tables
            .independent_expenditures
            .iter()
            .filter(move |ie| ie.candidate_id == candidate_id && ie.cycle == cycle)
    }
}

/// Lookups over the warehouse shared by every candidate
pub struct CandidateIndex<'a> {
    tables: &'a WarehouseTables,
    config: &'a TargetConfig,
    metrics: BTreeMap<(String, u16), &'a CommitteeMetric>,
    dims: BTreeMap<&'a str, &'a DimCandidate>,
}

impl<'a> CandidateIndex<'a> {
    pub fn new(tables: &'a WarehouseTables, config: &'a TargetConfig) -> Self {
        Self {
            tables,
            config,
            metrics: tables
                .metrics
                .iter()
                .map(|m| ((m.committee_id.clone(), m.cycle), m))
                .collect(),
            dims: tables
                .candidates
                .iter()
                .map(|c| (c.candidate_id.as_str(), c))
                .collect(),
        }
    }

    /// Configured candidates plus every candidate the warehouse knows about
    pub fn candidate_ids(&self) -> BTreeSet<String> {
        let mut ids: BTreeSet<String> = self.config.candidate_ids.clone();
        ids.extend(self.tables.candidates.iter().map(|c| c.candidate_id.clone()));
        ids.extend(self.tables.links.iter().map(|l| l.candidate_id.clone()));
        ids.extend(
            self.tables
                .independent_expenditures
                .iter()
                .map(|ie| ie.candidate_id.clone()),
        );
        ids
    }

    pub fn committees_for(&self, candidate_id: &str, cycle: u16) -> BTreeSet<String> {
        let mut ids = self.config.committees_for(candidate_id, cycle);
        ids.extend(
            self.tables
                .links
                .iter()
                .filter(|l| l.candidate_id == candidate_id && l.cycle == cycle && l.role.is_campaign())
                .map(|l| l.committee_id.clone()),
        );
        ids
    }

    fn cycles(&self) -> BTreeSet<u16> {
        let mut cycles = self.config.cycles.clone();
        cycles.extend(self.metrics.keys().map(|(_, cycle)| *cycle));
        cycles
    }

    /// Newest cycle in which any of the candidate's committees has metrics,
    /// else the newest cycle with outside spending about the candidate
    pub fn select(&self, candidate_id: &str) -> Option<Selection<'a>> {
        self.cycles()
            .into_iter()
            .rev()
            .find_map(|cycle| {
                let committees = self.committees_for(candidate_id, cycle);
                let metrics: Vec<&'a CommitteeMetric> = committees
                    .iter()
                    .filter_map(|id| self.metrics.get(&(id.clone(), cycle)).copied())
                    .collect();
                if metrics.is_empty() {
                    return None;
                }
                Some(Selection {
                    candidate_id: candidate_id.to_string(),
                    cycle,
                    committees,
                    metrics,
                })
            })
            .or_else(|| self.outside_spend_only(candidate_id))
    }

    fn outside_spend_only(&self, candidate_id: &str) -> Option<Selection<'a>> {
        let cycle = self
            .tables
            .independent_expenditures
            .iter()
            .filter(|ie| ie.candidate_id == candidate_id)
            .map(|ie| ie.cycle)
            .max()?;
        Some(Selection {
            candidate_id: candidate_id.to_string(),
            cycle,
            committees: self.committees_for(candidate_id, cycle),
            metrics: Vec::new(),
        })
    }

    pub fn bundle(&self, selection: &Selection<'_>, top_donors: usize) -> CandidateBundle {
        let dim = self.dims.get(selection.candidate_id.as_str()).copied();

        CandidateBundle {
            candidate_id: selection.candidate_id.clone(),
            cycle: selection.cycle,
            name: dim.and_then(|d| d.name.clone()),
            party: dim.and_then(|d| d.party.clone()),
            office: dim.and_then(|d| d.office.clone()),
            state: dim
                .and_then(|d| d.state.clone())
                .or_else(|| fec_common::config::candidate_state(&selection.candidate_id)),
            district: dim.and_then(|d| d.district.clone()),
            committees: selection.committees.iter().cloned().collect(),
            summary: FinanceSummary::from_metrics(&selection.metrics, top_donors),
            outside_spend: OutsideSpendTotals::of(selection.outside_spend(self.tables)),
        }
    }
}

/// Candidate id → rolled-up bundle; candidates with neither metrics nor outside spending are left out
pub fn build_candidates(
    tables: &WarehouseTables,
    config: &TargetConfig,
    top_donors: usize,
) -> BTreeMap<String, CandidateBundle> {
    let index = CandidateIndex::new(tables, config);
    index
        .candidate_ids()
        .into_iter()
        .filter_map(|id| index.select(&id).map(|s| (id, index.bundle(&s, top_donors))))
        .collect()
}
