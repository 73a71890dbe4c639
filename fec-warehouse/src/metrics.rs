//! Per-committee, per-cycle metrics
//!
//! Contributor classes partition itemized receipts: every dollar lands in
//! exactly one of individual, committee or other. Small-dollar individual
//! money only exists in the by-size aggregates (the $200-and-under bucket),
//! so it is added on top; `total` is always the sum of the four classes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use fec_common::config;

use crate::classify::IndustryTag;
use crate::tables::{
    CommitteeReport, ContributorClass, DimCandidate, DimCommittee, WarehouseTables,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub total: f64,
    pub individual: f64,
    pub small_individual: f64,
    pub committee: f64,
    pub other: f64,
}

impl MetricTotals {
    fn add(&mut self, class: ContributorClass, amount: f64) {
        match class {
            ContributorClass::Individual => self.individual += amount,
            ContributorClass::Committee => self.committee += amount,
            ContributorClass::Other => self.other += amount,
        }
        self.settle();
    }

    fn settle(&mut self) {
        self.total = self.individual + self.small_individual + self.committee + self.other;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorTotal {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeMetric {
    pub committee_id: String,
    pub cycle: u16,
    pub name: Option<String>,
    /// Home state of the entity: linked candidate's state, else the committee's
    pub state: Option<String>,
    pub totals: MetricTotals,
    /// Itemized receipts from contributors in / outside the home state
    pub in_state: f64,
    pub out_state: f64,
    #[serde(default)]
    pub tags: BTreeMap<IndustryTag, f64>,
    #[serde(default)]
    pub top_donors: Vec<DonorTotal>,
    pub receipts_ytd: f64,
    pub disbursements_ytd: f64,
    pub cash_on_hand_end: Option<f64>,
    pub debts_owed: Option<f64>,
    pub latest_coverage_end_date: Option<String>,
    pub last_report_type: Option<String>,
    pub filings: usize,
    pub itemized_receipts: usize,
}

impl CommitteeMetric {
    fn empty(committee_id: &str, cycle: u16) -> Self {
        Self {
            committee_id: committee_id.to_string(),
            cycle,
            name: None,
            state: None,
            totals: MetricTotals::default(),
            in_state: 0.0,
            out_state: 0.0,
            tags: BTreeMap::new(),
            top_donors: Vec::new(),
            receipts_ytd: 0.0,
            disbursements_ytd: 0.0,
            cash_on_hand_end: None,
            debts_owed: None,
            latest_coverage_end_date: None,
            last_report_type: None,
            filings: 0,
            itemized_receipts: 0,
        }
    }
}

/// Home state per committee
///
/// A committee linked to a candidate takes the candidate's state (from the
/// dimension, else the candidate id itself); otherwise its own registration.
fn home_states(tables: &WarehouseTables) -> BTreeMap<String, String> {
    let candidates: BTreeMap<&str, &DimCandidate> = tables
        .candidates
        .iter()
        .map(|c| (c.candidate_id.as_str(), c))
        .collect();
    let candidate_state = |id: &str| {
        candidates
            .get(id)
            .and_then(|c| c.state.clone())
            .or_else(|| config::candidate_state(id))
    };

    let mut linked: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for link in tables.links.iter().filter(|l| l.role.is_campaign()) {
        linked
            .entry(link.committee_id.as_str())
            .or_default()
            .insert(link.candidate_id.as_str());
    }
    for committee in &tables.committees {
        for candidate in &committee.candidate_ids {
            linked
                .entry(committee.committee_id.as_str())
                .or_default()
                .insert(candidate.as_str());
        }
    }

    let mut states = BTreeMap::new();
    for committee in &tables.committees {
        if let Some(state) = &committee.state {
            states.insert(committee.committee_id.clone(), state.clone());
        }
    }
    for (committee, candidates) in linked {
        if let Some(state) = candidates.iter().find_map(|c| candidate_state(c)) {
            states.insert(committee.to_string(), state);
        }
    }
    states
}

fn latest_report<'a>(reports: &[&'a CommitteeReport]) -> Option<&'a CommitteeReport> {
    reports.iter().copied().max_by(|a, b| {
        a.coverage_end_date
            .cmp(&b.coverage_end_date)
            .then(a.file_number.cmp(&b.file_number))
    })
}

fn rank_donors(donors: BTreeMap<String, f64>, limit: usize) -> Vec<DonorTotal> {
    let mut ranked: Vec<DonorTotal> = donors
        .into_iter()
        .map(|(name, amount)| DonorTotal { name, amount })
        .collect();
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

/// One metric per committee and cycle seen in receipts, aggregates or reports
pub fn compute_metrics(tables: &WarehouseTables, top_donors: usize) -> Vec<CommitteeMetric> {
    let dims: BTreeMap<&str, &DimCommittee> = tables
        .committees
        .iter()
        .map(|c| (c.committee_id.as_str(), c))
        .collect();
    let states = home_states(tables);

    let mut metrics: BTreeMap<(String, u16), CommitteeMetric> = BTreeMap::new();
    let mut donors: BTreeMap<(String, u16), BTreeMap<String, f64>> = BTreeMap::new();
    let mut reports: BTreeMap<(String, u16), Vec<&CommitteeReport>> = BTreeMap::new();

    for receipt in &tables.receipts {
        let key = (receipt.committee_id.clone(), receipt.cycle);
        let metric = metrics
            .entry(key.clone())
            .or_insert_with(|| CommitteeMetric::empty(&receipt.committee_id, receipt.cycle));

        metric.totals.add(receipt.class, receipt.amount);
        metric.itemized_receipts += 1;

        if let Some(tag) = receipt.industry {
            *metric.tags.entry(tag).or_insert(0.0) += receipt.amount;
        }

        if let (Some(home), Some(from)) = (states.get(&receipt.committee_id), &receipt.contributor_state) {
            if home == from {
                metric.in_state += receipt.amount;
            } else {
                metric.out_state += receipt.amount;
            }
        }

        if let Some(name) = &receipt.contributor_name {
            *donors
                .entry(key)
                .or_default()
                .entry(name.to_uppercase())
                .or_insert(0.0) += receipt.amount;
        }
    }

    for agg in tables.aggregates.iter().filter(|a| a.is_small_dollar()) {
        let metric = metrics
            .entry((agg.committee_id.clone(), agg.cycle))
            .or_insert_with(|| CommitteeMetric::empty(&agg.committee_id, agg.cycle));
        metric.totals.small_individual += agg.total;
        metric.totals.settle();
    }

    for report in &tables.reports {
        let key = (report.committee_id.clone(), report.cycle);
        metrics
            .entry(key.clone())
            .or_insert_with(|| CommitteeMetric::empty(&report.committee_id, report.cycle));
        reports.entry(key).or_default().push(report);
    }

    for (key, metric) in metrics.iter_mut() {
        if let Some(dim) = dims.get(metric.committee_id.as_str()) {
            metric.name = dim.name.clone();
        }
        metric.state = states.get(&metric.committee_id).cloned();

        if let Some(filed) = reports.get(key) {
            metric.filings = filed.len();
            metric.receipts_ytd = filed.iter().map(|r| r.receipts).sum();
            metric.disbursements_ytd = filed.iter().map(|r| r.disbursements).sum();
            if let Some(latest) = latest_report(filed) {
                metric.cash_on_hand_end = latest.cash_on_hand_end;
                metric.debts_owed = latest.debts_owed;
                metric.latest_coverage_end_date = latest.coverage_end_date.clone();
                metric.last_report_type = latest.report_type.clone();
            }
        }

        if let Some(by_name) = donors.remove(key) {
            metric.top_donors = rank_donors(by_name, top_donors);
        }
    }

    metrics.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{AggregateDimension, CandidateCommitteeLink, Receipt, ReceiptAggregate};
    use fec_common::designation::CommitteeRole;

    fn receipt(committee: &str, amount: f64, class: ContributorClass) -> Receipt {
        Receipt {
            sub_id: None,
            transaction_id: None,
            committee_id: committee.to_string(),
            cycle: 2026,
            date: None,
            amount,
            contributor_name: None,
            contributor_state: None,
            contributor_employer: None,
            contributor_occupation: None,
            entity_type: None,
            class,
            industry: None,
        }
    }

    fn small(committee: &str, total: f64) -> ReceiptAggregate {
        ReceiptAggregate {
            committee_id: committee.to_string(),
            cycle: 2026,
            dimension: AggregateDimension::Size,
            key: "0".to_string(),
            total,
            count: None,
        }
    }

    #[test]
    fn test_classes_partition_the_total() {
        let tables = WarehouseTables {
            receipts: vec![
                receipt("C00000001", 100.0, ContributorClass::Individual),
                receipt("C00000001", 900.0, ContributorClass::Committee),
                receipt("C00000001", 25.0, ContributorClass::Other),
            ],
            aggregates: vec![small("C00000001", 75.0)],
            ..Default::default()
        };
        let metrics = compute_metrics(&tables, 25);
        let t = &metrics[0].totals;

        assert_eq!(metrics.len(), 1);
        assert_eq!(t.individual, 100.0);
        assert_eq!(t.committee, 900.0);
        assert_eq!(t.other, 25.0);
        assert_eq!(t.small_individual, 75.0);
        assert_eq!(t.total, 1100.0);
        assert_eq!(metrics[0].itemized_receipts, 3);
    }

    #[test]
    fn test_in_state_uses_linked_candidate_state() {
        let mut home = receipt("C00000001", 60.0, ContributorClass::Individual);
        home.contributor_state = Some("WA".into());
        let mut away = receipt("C00000001", 40.0, ContributorClass::Individual);
        away.contributor_state = Some("OR".into());

        let tables = WarehouseTables {
            receipts: vec![home, away],
            links: vec![CandidateCommitteeLink {
                candidate_id: "H6WA10123".into(),
                committee_id: "C00000001".into(),
                cycle: 2026,
                designation: Some("P".into()),
                role: CommitteeRole::Principal,
            }],
            committees: vec![DimCommittee {
                committee_id: "C00000001".into(),
                name: Some("FRIENDS OF JANE".into()),
                committee_type: None,
                designation: None,
                party: None,
                state: Some("DC".into()),
                treasurer_name: None,
                candidate_ids: Vec::new(),
            }],
            ..Default::default()
        };
        let m = &compute_metrics(&tables, 25)[0];

        assert_eq!(m.state.as_deref(), Some("WA"));
        assert_eq!(m.name.as_deref(), Some("FRIENDS OF JANE"));
        assert_eq!(m.in_state, 60.0);
        assert_eq!(m.out_state, 40.0);
    }

    #[test]
    fn test_latest_report_supplies_cash_and_debt() {
        let report = |end: &str, cash: f64, receipts: f64| CommitteeReport {
            committee_id: "C00000001".into(),
            cycle: 2026,
            file_number: None,
            report_type: Some(format!("R{}", end)),
            report_year: Some(2026),
            coverage_start_date: None,
            coverage_end_date: Some(end.to_string()),
            receipts,
            disbursements: 10.0,
            cash_on_hand_end: Some(cash),
            debts_owed: Some(0.0),
        };
        let tables = WarehouseTables {
            reports: vec![report("2026-06-30", 900.0, 500.0), report("2026-03-31", 100.0, 250.0)],
            ..Default::default()
        };
        let m = &compute_metrics(&tables, 25)[0];

        assert_eq!(m.filings, 2);
        assert_eq!(m.receipts_ytd, 750.0);
        assert_eq!(m.disbursements_ytd, 20.0);
        assert_eq!(m.cash_on_hand_end, Some(900.0));
        assert_eq!(m.latest_coverage_end_date.as_deref(), Some("2026-06-30"));
        assert_eq!(m.totals.total, 0.0);
    }

    #[test]
    fn test_top_donors_ranked_and_capped() {
        let donor = |name: &str, amount: f64| {
            let mut r = receipt("C00000001", amount, ContributorClass::Individual);
            r.contributor_name = Some(name.to_string());
            r
        };
        let tables = WarehouseTables {
            receipts: vec![
                donor("Smith, Ann", 50.0),
                donor("SMITH, ANN", 50.0),
                donor("Brown, Bo", 100.0),
                donor("Adams, Cy", 100.0),
                donor("Zed, Di", 5.0),
            ],
            ..Default::default()
        };
        let m = &compute_metrics(&tables, 3)[0];
        let names: Vec<&str> = m.top_donors.iter().map(|d| d.name.as_str()).collect();

        assert_eq!(names, vec!["ADAMS, CY", "BROWN, BO", "SMITH, ANN"]);
        assert_eq!(m.top_donors[2].amount, 100.0);
    }

    #[test]
    fn test_industry_tags_summed() {
        let mut a = receipt("C00000001", 30.0, ContributorClass::Individual);
        a.industry = Some(IndustryTag::Tech);
        let mut b = receipt("C00000001", 20.0, ContributorClass::Committee);
        b.industry = Some(IndustryTag::Tech);
        let tables = WarehouseTables {
            receipts: vec![a, b],
            ..Default::default()
        };
        let m = &compute_metrics(&tables, 25)[0];
        assert_eq!(m.tags.get(&IndustryTag::Tech), Some(&50.0));
        assert_eq!(m.tags.len(), 1);
    }
}
