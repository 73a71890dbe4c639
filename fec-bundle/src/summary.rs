//! Money summary shared by committee and candidate bundles
//!
//! A summary over several committees sums their totals first and derives
//! shares from the sums, so a candidate's shares are share-of-sum rather
//! than an average of per-committee shares.

use serde::Serialize;
use std::collections::BTreeMap;

use fec_warehouse::{CommitteeMetric, DonorTotal, IndustryTag, MetricTotals};

use crate::badges::{evaluate, Badge, BadgeInput};
use crate::shares::{pac_pct, BurnRate, Shares};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearToDate {
    pub receipts: f64,
    pub disbursements: f64,
    pub burn_rate: BurnRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub totals: MetricTotals,
    pub shares: Shares,
    pub pac_pct: f64,
    pub in_state: f64,
    pub out_state: f64,
    pub tags: BTreeMap<IndustryTag, f64>,
    pub top_donors: Vec<DonorTotal>,
    pub cash_on_hand_end: Option<f64>,
    pub debts_owed: Option<f64>,
    pub totals_ytd: YearToDate,
    pub badges: Vec<Badge>,
}

fn add_opt(acc: Option<f64>, v: Option<f64>) -> Option<f64> {
    match (acc, v) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    }
}

impl FinanceSummary {
    /// Sum `metrics` (normally one cycle) and derive ratios and badges
    pub fn from_metrics(metrics: &[&CommitteeMetric], top_donors: usize) -> Self {
        let mut totals = MetricTotals::default();
        let mut tags: BTreeMap<IndustryTag, f64> = BTreeMap::new();
        let mut donors: BTreeMap<&str, f64> = BTreeMap::new();
        let (mut in_state, mut out_state) = (0.0, 0.0);
        let (mut receipts, mut disbursements) = (0.0, 0.0);
        let (mut cash, mut debts) = (None, None);

        for m in metrics {
            totals.individual += m.totals.individual;
            totals.small_individual += m.totals.small_individual;
            totals.committee += m.totals.committee;
            totals.other += m.totals.other;
            totals.total += m.totals.total;
            in_state += m.in_state;
            out_state += m.out_state;
            receipts += m.receipts_ytd;
            disbursements += m.disbursements_ytd;
            cash = add_opt(cash, m.cash_on_hand_end);
            debts = add_opt(debts, m.debts_owed);
            for (tag, amount) in &m.tags {
                *tags.entry(*tag).or_insert(0.0) += amount;
            }
            for donor in &m.top_donors {
                *donors.entry(donor.name.as_str()).or_insert(0.0) += donor.amount;
            }
        }

        let mut top: Vec<DonorTotal> = donors
            .into_iter()
            .map(|(name, amount)| DonorTotal {
                name: name.to_string(),
                amount,
            })
            .collect();
        top.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
        top.truncate(top_donors);

        let shares = Shares::of(&totals);
        let burn_rate = BurnRate::of(disbursements, receipts);
        let badges = evaluate(BadgeInput {
            shares: &shares,
            tags: &tags,
            burn_rate,
            cash_on_hand_end: cash,
        });

        Self {
            pac_pct: pac_pct(&totals),
            totals,
            shares,
            in_state,
            out_state,
            tags,
            top_donors: top,
            cash_on_hand_end: cash,
            debts_owed: debts,
            totals_ytd: YearToDate {
                receipts,
                disbursements,
                burn_rate,
            },
            badges,
        }
    }
}
