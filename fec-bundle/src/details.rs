//! Per-candidate detail files under `site/candidates/<id>/`

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use fec_common::settings::BundleSettings;
use fec_common::Result;
use fec_warehouse::builder::vendor_index;
use fec_warehouse::tables::{AggregateDimension, Disbursement, VendorTotal};
use fec_warehouse::WarehouseTables;

use crate::candidates::{OutsideSpendTotals, Selection};

pub const DONORS_BY_STATE: &str = "donors-by-state.json";
pub const TOP_EMPLOYERS: &str = "top-employers.json";
pub const TOP_VENDORS: &str = "top-vendors.json";
pub const OUTSIDE_SPEND: &str = "outside-spend.json";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyTotal {
    pub key: String,
    pub total: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailFile<T> {
    pub candidate_id: String,
    pub cycle: u16,
    pub committees: Vec<String>,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spender {
    pub committee_id: Option<String>,
    pub support_oppose: Option<String>,
    pub amount: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutsideSpend {
    pub candidate_id: String,
    pub cycle: u16,
    pub totals: OutsideSpendTotals,
    pub spenders: Vec<Spender>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDetails {
    pub donors_by_state: DetailFile<KeyTotal>,
    pub top_employers: DetailFile<KeyTotal>,
    pub top_vendors: DetailFile<VendorTotal>,
    pub outside_spend: OutsideSpend,
}

fn ranked_aggregates(
    tables: &WarehouseTables,
    selection: &Selection<'_>,
    dimension: AggregateDimension,
    limit: usize,
) -> Vec<KeyTotal> {
    let mut sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for agg in tables.aggregates.iter().filter(|a| {
        a.dimension == dimension && a.cycle == selection.cycle && selection.committees.contains(&a.committee_id)
    }) {
        let entry = sums.entry(agg.key.as_str()).or_insert((0.0, 0));
        entry.0 += agg.total;
        entry.1 += agg.count.unwrap_or(0);
    }

    let mut ranked: Vec<KeyTotal> = sums
        .into_iter()
        .map(|(key, (total, count))| KeyTotal {
            key: key.to_string(),
            total,
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(limit);
    ranked
}

fn spenders(tables: &WarehouseTables, selection: &Selection<'_>) -> Vec<Spender> {
    let mut by_spender: BTreeMap<(Option<&str>, Option<&str>), (f64, usize)> = BTreeMap::new();
    for ie in selection.outside_spend(tables) {
        let entry = by_spender
            .entry((ie.committee_id.as_deref(), ie.support_oppose.as_deref()))
            .or_insert((0.0, 0));
        entry.0 += ie.amount;
        entry.1 += 1;
    }

    let mut ranked: Vec<Spender> = by_spender
        .into_iter()
        .map(|((committee_id, support_oppose), (amount, count))| Spender {
            committee_id: committee_id.map(str::to_string),
            support_oppose: support_oppose.map(str::to_string),
            amount,
            count,
        })
        .collect();
    // Stable sort keeps key order among equal amounts
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    ranked
}

impl CandidateDetails {
    pub fn build(tables: &WarehouseTables, selection: &Selection<'_>, settings: &BundleSettings) -> Self {
        let file = |items| DetailFile {
            candidate_id: selection.candidate_id.clone(),
            cycle: selection.cycle,
            committees: selection.committees.iter().cloned().collect(),
            items,
        };

        let paid: Vec<Disbursement> = tables
            .disbursements
            .iter()
            .filter(|d| d.cycle == selection.cycle && selection.committees.contains(&d.committee_id))
            .cloned()
            .collect();

        Self {
            donors_by_state: file(ranked_aggregates(
                tables,
                selection,
                AggregateDimension::State,
                settings.top_states,
            )),
            top_employers: file(ranked_aggregates(
                tables,
                selection,
                AggregateDimension::Employer,
                settings.top_employers,
            )),
            top_vendors: DetailFile {
                candidate_id: selection.candidate_id.clone(),
                cycle: selection.cycle,
                committees: selection.committees.iter().cloned().collect(),
                items: vendor_index(&paid, settings.top_vendors),
            },
            outside_spend: OutsideSpend {
                candidate_id: selection.candidate_id.clone(),
                cycle: selection.cycle,
                totals: OutsideSpendTotals::of(selection.outside_spend(tables)),
                spenders: spenders(tables, selection),
            },
        }
    }

    /// File name and JSON body of each detail file
    pub fn files(&self) -> Result<Vec<(&'static str, Value)>> {
        Ok(vec![
            (DONORS_BY_STATE, serde_json::to_value(&self.donors_by_state)?),
            (TOP_EMPLOYERS, serde_json::to_value(&self.top_employers)?),
            (TOP_VENDORS, serde_json::to_value(&self.top_vendors)?),
            (OUTSIDE_SPEND, serde_json::to_value(&self.outside_spend)?),
        ])
    }
}
