//! `committees.json`: one bundle per committee, latest cycle

use serde::Serialize;
use std::collections::BTreeMap;

use fec_warehouse::CommitteeMetric;

use crate::summary::FinanceSummary;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitteeBundle {
    pub committee_id: String,
    pub cycle: u16,
    pub name: Option<String>,
    pub state: Option<String>,
    pub filings: usize,
    pub itemized_receipts: usize,
    pub last_report_type: Option<String>,
    pub latest_coverage_end_date: Option<String>,
    #[serde(flatten)]
    pub summary: FinanceSummary,
}

impl CommitteeBundle {
    pub fn from_metric(metric: &CommitteeMetric, top_donors: usize) -> Self {
        Self {
            committee_id: metric.committee_id.clone(),
            cycle: metric.cycle,
            name: metric.name.clone(),
            state: metric.state.clone(),
            filings: metric.filings,
            itemized_receipts: metric.itemized_receipts,
            last_report_type: metric.last_report_type.clone(),
            latest_coverage_end_date: metric.latest_coverage_end_date.clone(),
            summary: FinanceSummary::from_metrics(&[metric], top_donors),
        }
    }
}

/// Committee id → bundle for the newest cycle that committee has metrics for
pub fn build_committees(metrics: &[CommitteeMetric], top_donors: usize) -> BTreeMap<String, CommitteeBundle> {
    let mut latest: BTreeMap<&str, &CommitteeMetric> = BTreeMap::new();
    for metric in metrics {
        let slot = latest.entry(metric.committee_id.as_str()).or_insert(metric);
        if metric.cycle > slot.cycle {
            *slot = metric;
        }
    }

    latest
        .into_iter()
        .map(|(id, metric)| (id.to_string(), CommitteeBundle::from_metric(metric, top_donors)))
        .collect()
}
