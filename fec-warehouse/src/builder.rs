//! Warehouse build: raw partition → tables
//!
//! Raw partitions are append-only, so the same record may appear more than
//! once. Every table is keyed by its natural key and the last record read
//! wins. Output rows are ordered by key so two builds over the same
//! partition write identical files.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

use fec_common::layout::DataLayout;
use fec_common::raw::RawSource;
use fec_common::settings::WarehouseSettings;
use fec_common::Result;

use crate::metrics::compute_metrics;
use crate::partition::select_partition;
use crate::records::{RawBatch, RawRecord};
use crate::tables::{
    AggregateDimension, CandidateCommitteeLink, CommitteeReport, DimCandidate, DimCommittee,
    Disbursement, IndependentExpenditure, Receipt, ReceiptAggregate, VendorTotal, WarehouseTables,
};

/// Keyed rows, last insert wins, emitted in key order
struct Dedup<T> {
    rows: BTreeMap<String, T>,
    dropped: usize,
}

impl<T> Dedup<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            dropped: 0,
        }
    }

    fn insert(&mut self, key: String, row: T) {
        if self.rows.insert(key, row).is_some() {
            self.dropped += 1;
        }
    }

    fn finish(self, table: &str) -> Vec<T> {
        if self.dropped > 0 {
            debug!(table, duplicates = self.dropped, "Duplicate records collapsed");
        }
        self.rows.into_values().collect()
    }
}

/// Itemized transaction key: `sub_id`, else `transaction_id`, else content
fn itemized_key(
    r: &RawRecord,
    committee_id: &str,
    cycle: u16,
    sub_id: &Option<String>,
    transaction_id: &Option<String>,
) -> String {
    match (sub_id, transaction_id) {
        (Some(sub), _) => format!("{}|{}|sub:{}", committee_id, cycle, sub),
        (None, Some(tx)) => format!("{}|{}|tx:{}", committee_id, cycle, tx),
        (None, None) => format!("{}|{}|body:{}", committee_id, cycle, r.content_key()),
    }
}

fn report_key(report: &CommitteeReport) -> String {
    match report.file_number {
        Some(n) => format!("{}|{}|file:{}", report.committee_id, report.cycle, n),
        None => format!(
            "{}|{}|{}|{}|{}",
            report.committee_id,
            report.cycle,
            report.coverage_start_date.as_deref().unwrap_or(""),
            report.coverage_end_date.as_deref().unwrap_or(""),
            report.report_type.as_deref().unwrap_or("")
        ),
    }
}

fn normalize_all<T>(
    rows: &[RawRecord],
    table: &str,
    build: impl Fn(&RawRecord) -> Option<T>,
    key: impl Fn(&RawRecord, &T) -> String,
) -> Vec<T> {
    let mut dedup = Dedup::new();
    let mut invalid = 0usize;
    for r in rows {
        match build(r) {
            Some(row) => {
                let k = key(r, &row);
                dedup.insert(k, row);
            }
            None => invalid += 1,
        }
    }
    if invalid > 0 {
        debug!(table, invalid, "Records without required fields skipped");
    }
    dedup.finish(table)
}

/// Payees rolled up by upper-cased name, largest first
pub fn vendor_index(disbursements: &[Disbursement], limit: usize) -> Vec<VendorTotal> {
    let mut by_vendor: BTreeMap<String, VendorTotal> = BTreeMap::new();
    for d in disbursements {
        let Some(vendor) = d.vendor() else { continue };
        let entry = by_vendor.entry(vendor.clone()).or_insert(VendorTotal {
            vendor,
            amount: 0.0,
            payments: 0,
        });
        entry.amount += d.amount;
        entry.payments += 1;
    }

    let mut ranked: Vec<VendorTotal> = by_vendor.into_values().collect();
    ranked.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.vendor.cmp(&b.vendor)));
    ranked.truncate(limit);
    ranked
}

/// Normalize one raw batch into every warehouse table
pub fn build_tables(batch: &RawBatch, settings: &WarehouseSettings) -> WarehouseTables {
    // Detail rows win over history rows for the same candidate
    let mut candidates = Dedup::new();
    for source in [RawSource::CandidateHistory, RawSource::Candidates] {
        for r in batch.get(source) {
            if let Some(c) = DimCandidate::from_raw(r) {
                candidates.insert(c.candidate_id.clone(), c);
            }
        }
    }

    let committees = normalize_all(
        batch.get(RawSource::Committees),
        "committees",
        DimCommittee::from_raw,
        |_, c| c.committee_id.clone(),
    );

    let links = normalize_all(
        batch.get(RawSource::CandidateCommittees),
        "links",
        CandidateCommitteeLink::from_raw,
        |_, l| format!("{}|{}|{}", l.candidate_id, l.committee_id, l.cycle),
    );

    let current: Vec<RawRecord> = batch
        .get(RawSource::CommitteeReports)
        .iter()
        .filter(|r| !CommitteeReport::is_superseded(r))
        .cloned()
        .collect();
    let reports = normalize_all(&current, "reports", CommitteeReport::from_raw, |_, r| report_key(r));

    let receipts = normalize_all(batch.get(RawSource::ScheduleA), "receipts", Receipt::from_raw, |r, row| {
        itemized_key(r, &row.committee_id, row.cycle, &row.sub_id, &row.transaction_id)
    });

    let mut aggregates = Dedup::new();
    for (source, dimension) in [
        (RawSource::ReceiptsBySize, AggregateDimension::Size),
        (RawSource::ReceiptsByState, AggregateDimension::State),
        (RawSource::ReceiptsByEmployer, AggregateDimension::Employer),
    ] {
        for r in batch.get(source) {
            if let Some(a) = ReceiptAggregate::from_raw(r, dimension) {
                let key = format!("{}|{}|{:?}|{}", a.committee_id, a.cycle, a.dimension, a.key);
                aggregates.insert(key, a);
            }
        }
    }

    let disbursements = normalize_all(
        batch.get(RawSource::ScheduleB),
        "disbursements",
        Disbursement::from_raw,
        |r, row| itemized_key(r, &row.committee_id, row.cycle, &row.sub_id, &row.transaction_id),
    );

    let independent_expenditures = normalize_all(
        batch.get(RawSource::ScheduleE),
        "independent_expenditures",
        IndependentExpenditure::from_raw,
        |r, row| itemized_key(r, &row.candidate_id, row.cycle, &row.sub_id, &row.transaction_id),
    );

    let vendors = vendor_index(&disbursements, settings.top_vendors);

    let mut tables = WarehouseTables {
        candidates: candidates.finish("candidates"),
        committees,
        links,
        reports,
        receipts,
        aggregates: aggregates.finish("aggregates"),
        disbursements,
        vendors,
        independent_expenditures,
        metrics: Vec::new(),
    };
    tables.metrics = compute_metrics(&tables, settings.top_donors);
    tables
}

/// Outcome of one build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub partition: PathBuf,
    pub records_read: usize,
    pub tables: BTreeMap<&'static str, usize>,
}

impl BuildSummary {
    pub fn log_summary(&self) {
        for (table, rows) in &self.tables {
            info!(table, rows, "Table written");
        }
        info!(
            partition = %self.partition.display(),
            records_read = self.records_read,
            "Warehouse build complete"
        );
    }
}

pub struct WarehouseBuilder {
    layout: DataLayout,
    settings: WarehouseSettings,
}

impl WarehouseBuilder {
    pub fn new(layout: DataLayout, settings: WarehouseSettings) -> Self {
        Self { layout, settings }
    }

    /// Select a partition, normalize it and rewrite every table
    pub fn build(&self, today: NaiveDate) -> Result<BuildSummary> {
        let partition = select_partition(&self.layout, today)?;
        let batch = RawBatch::load(&partition)?;
        info!(
            partition = %partition.path.display(),
            records = batch.len(),
            "Building warehouse"
        );

        let tables = build_tables(&batch, &self.settings);
        tables.write(&self.layout.warehouse_dir())?;

        Ok(BuildSummary {
            partition: partition.path,
            records_read: batch.len(),
            tables: tables.counts().into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(source: RawSource, entity: &str, value: Value) -> RawRecord {
        RawRecord {
            source,
            entity_id: Some(entity.to_string()),
            cycle: Some(2026),
            value,
        }
    }

    #[test]
    fn test_itemized_dedup_prefers_sub_id() {
        let mut batch = RawBatch::default();
        for amount in [10, 20] {
            batch.push(record(
                RawSource::ScheduleA,
                "C00000001",
                json!({"sub_id": "S1", "transaction_id": "T1", "amount": amount}),
            ));
        }
        batch.push(record(RawSource::ScheduleA, "C00000001", json!({"transaction_id": "T2", "amount": 5})));
        batch.push(record(RawSource::ScheduleA, "C00000001", json!({"transaction_id": "T2", "amount": 5})));

        let tables = build_tables(&batch, &WarehouseSettings::default());
        assert_eq!(tables.receipts.len(), 2);
        let s1 = tables.receipts.iter().find(|r| r.sub_id.as_deref() == Some("S1")).unwrap();
        assert_eq!(s1.amount, 20.0);
    }

    #[test]
    fn test_identical_bodies_without_ids_collapse() {
        let mut batch = RawBatch::default();
        let body = json!({"amount": 7, "contributor_name": "DOE, JO"});
        batch.push(record(RawSource::ScheduleA, "C00000001", body.clone()));
        batch.push(record(RawSource::ScheduleA, "C00000001", body));
        batch.push(record(RawSource::ScheduleA, "C00000001", json!({"amount": 8, "contributor_name": "DOE, JO"})));

        let tables = build_tables(&batch, &WarehouseSettings::default());
        assert_eq!(tables.receipts.len(), 2);
    }

    #[test]
    fn test_superseded_reports_are_dropped() {
        let mut batch = RawBatch::default();
        batch.push(record(
            RawSource::CommitteeReports,
            "C00000001",
            json!({"file_number": 1, "most_recent": false, "total_receipts_period": 10}),
        ));
        batch.push(record(
            RawSource::CommitteeReports,
            "C00000001",
            json!({"file_number": 2, "most_recent": true, "total_receipts_period": 12}),
        ));

        let tables = build_tables(&batch, &WarehouseSettings::default());
        assert_eq!(tables.reports.len(), 1);
        assert_eq!(tables.reports[0].file_number, Some(2));
    }

    #[test]
    fn test_vendor_index_ranks_and_caps() {
        let d = |payee: &str, amount: f64| Disbursement {
            sub_id: None,
            transaction_id: None,
            committee_id: "C00000001".into(),
            cycle: 2026,
            date: None,
            amount,
            payee: Some(payee.into()),
            purpose: None,
            recipient_state: None,
        };
        let vendors = vendor_index(
            &[d("Acme Print", 100.0), d("ACME PRINT ", 50.0), d("Beta Ads", 150.0), d("Gamma", 1.0)],
            2,
        );

        assert_eq!(vendors.len(), 2);
        assert_eq!(vendors[0].vendor, "ACME PRINT");
        assert_eq!(vendors[0].payments, 2);
        assert_eq!(vendors[1].vendor, "BETA ADS");
    }

    #[test]
    fn test_links_keep_designation_role() {
        let mut batch = RawBatch::default();
        batch.push(record(
            RawSource::CandidateCommittees,
            "H6WA10123",
            json!({"committee_id": "C00000001", "designation": "P"}),
        ));
        batch.push(record(
            RawSource::CandidateCommittees,
            "H6WA10123",
            json!({"committee_id": "C00000077", "designation": "J"}),
        ));

        let tables = build_tables(&batch, &WarehouseSettings::default());
        assert_eq!(tables.links.len(), 2);
        assert!(tables.links[0].role.is_campaign());
        assert!(!tables.links[1].role.is_campaign());
    }
}
