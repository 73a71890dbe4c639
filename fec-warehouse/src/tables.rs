//! Warehouse table rows and their files
//!
//! Each table is one JSON array document in `data/warehouse/`. Rows are built
//! from raw records by the `from_raw` constructors; records missing the
//! fields a row cannot exist without are dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use fec_common::designation::{role_of, CommitteeRole};
use fec_common::ndjson::{read_table, write_json_atomic};
use fec_common::{config, Error, Result};

use crate::classify::{classify_first, IndustryTag};
use crate::metrics::CommitteeMetric;
use crate::records::RawRecord;

pub const DIM_CANDIDATES: &str = "dim_candidates.jsonl";
pub const DIM_COMMITTEES: &str = "dim_committees.jsonl";
pub const LINK_CANDIDATE_COMMITTEES: &str = "link_candidate_committees.jsonl";
pub const COMMITTEE_REPORTS: &str = "committee_reports.jsonl";
pub const FACT_RECEIPTS: &str = "fact_receipts.jsonl";
pub const FACT_RECEIPTS_AGGREGATES: &str = "fact_receipts_aggregates.jsonl";
pub const FACT_DISBURSEMENTS: &str = "fact_disbursements.jsonl";
pub const VENDOR_INDEX: &str = "vendor_index.jsonl";
pub const FACT_IE: &str = "fact_ie.jsonl";
pub const COMMITTEE_METRICS: &str = "committee_metrics.jsonl";

pub const ALL_TABLES: [&str; 10] = [
    DIM_CANDIDATES,
    DIM_COMMITTEES,
    LINK_CANDIDATE_COMMITTEES,
    COMMITTEE_REPORTS,
    FACT_RECEIPTS,
    FACT_RECEIPTS_AGGREGATES,
    FACT_DISBURSEMENTS,
    VENDOR_INDEX,
    FACT_IE,
    COMMITTEE_METRICS,
];

fn upper(s: String) -> String {
    s.to_ascii_uppercase()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimCandidate {
    pub candidate_id: String,
    pub name: Option<String>,
    pub party: Option<String>,
    pub office: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub incumbent_challenge: Option<String>,
    #[serde(default)]
    pub cycles: Vec<u16>,
}

impl DimCandidate {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        let candidate_id = r.text("candidate_id").or_else(|| r.entity_id.clone()).map(upper)?;
        let state = r
            .text("state")
            .map(upper)
            .or_else(|| config::candidate_state(&candidate_id));
        Some(Self {
            name: r.text("name"),
            party: r.text_any(&["party_full", "party"]),
            office: r.text("office"),
            state,
            district: r.text("district"),
            incumbent_challenge: r.text_any(&["incumbent_challenge_full", "incumbent_challenge"]),
            cycles: string_list(&r.value, "cycles")
                .iter()
                .filter_map(|c| c.parse().ok())
                .collect(),
            candidate_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimCommittee {
    pub committee_id: String,
    pub name: Option<String>,
    pub committee_type: Option<String>,
    pub designation: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub treasurer_name: Option<String>,
    #[serde(default)]
    pub candidate_ids: Vec<String>,
}

impl DimCommittee {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        let committee_id = r.text("committee_id").or_else(|| r.entity_id.clone()).map(upper)?;
        Some(Self {
            committee_id,
            name: r.text("name"),
            committee_type: r.text_any(&["committee_type_full", "committee_type"]),
            designation: r.text_any(&["designation_full", "designation"]),
            party: r.text_any(&["party_full", "party"]),
            state: r.text("state").map(upper),
            treasurer_name: r.text("treasurer_name"),
            candidate_ids: string_list(&r.value, "candidate_ids").into_iter().map(upper).collect(),
        })
    }
}

/// Candidate → committee link for one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCommitteeLink {
    pub candidate_id: String,
    pub committee_id: String,
    pub cycle: u16,
    pub designation: Option<String>,
    pub role: CommitteeRole,
}

impl CandidateCommitteeLink {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        Some(Self {
            candidate_id: r.entity_id.clone().map(upper)?,
            committee_id: r.text("committee_id").map(upper)?,
            cycle: r.cycle?,
            designation: r.text("designation"),
            role: role_of(&r.value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeReport {
    pub committee_id: String,
    pub cycle: u16,
    pub file_number: Option<i64>,
    pub report_type: Option<String>,
    pub report_year: Option<u16>,
    pub coverage_start_date: Option<String>,
    pub coverage_end_date: Option<String>,
    pub receipts: f64,
    pub disbursements: f64,
    pub cash_on_hand_end: Option<f64>,
    pub debts_owed: Option<f64>,
}

impl CommitteeReport {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        Some(Self {
            committee_id: r.text("committee_id").or_else(|| r.entity_id.clone()).map(upper)?,
            cycle: r.cycle_or_meta(&["cycle"])?,
            file_number: r.number("file_number").map(|n| n as i64),
            report_type: r.text_any(&["report_type", "form_type"]),
            report_year: r.number("report_year").map(|n| n as u16),
            coverage_start_date: r.text("coverage_start_date"),
            coverage_end_date: r.text_any(&["coverage_end_date", "coverage_through_date"]),
            receipts: r
                .number_any(&["total_receipts_period", "total_receipts", "receipts"])
                .unwrap_or(0.0),
            disbursements: r
                .number_any(&["total_disbursements_period", "total_disbursements", "disbursements"])
                .unwrap_or(0.0),
            cash_on_hand_end: r.number_any(&["cash_on_hand_end_period", "ending_cash_on_hand", "cash_on_hand"]),
            debts_owed: r.number_any(&["debts_owed_by_committee", "debts_owed"]),
        })
    }

    /// Superseded amendments carry `most_recent: false`
    pub fn is_superseded(r: &RawRecord) -> bool {
        r.flag("most_recent") == Some(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorClass {
    Individual,
    Committee,
    Other,
}

const COMMITTEE_ENTITY_TYPES: [&str; 4] = ["PAC", "CCM", "COM", "PTY"];

/// Committee money wins over individual flags; anything unlabelled is other
pub fn contributor_class(r: &RawRecord) -> ContributorClass {
    let entity_type = r.text("entity_type").map(upper);
    let from_committee = entity_type
        .as_deref()
        .map_or(false, |t| COMMITTEE_ENTITY_TYPES.contains(&t))
        || r.text("contributor_committee_id").is_some()
        || r
            .text("contributor_id")
            .map_or(false, |id| config::is_committee_id(&id.to_ascii_uppercase()));

    if from_committee {
        ContributorClass::Committee
    } else if entity_type.as_deref() == Some("IND") || r.flag("is_individual") == Some(true) {
        ContributorClass::Individual
    } else {
        ContributorClass::Other
    }
}

/// Itemized Schedule A receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub sub_id: Option<String>,
    pub transaction_id: Option<String>,
    pub committee_id: String,
    pub cycle: u16,
    pub date: Option<String>,
    pub amount: f64,
    pub contributor_name: Option<String>,
    pub contributor_state: Option<String>,
    pub contributor_employer: Option<String>,
    pub contributor_occupation: Option<String>,
    pub entity_type: Option<String>,
    pub class: ContributorClass,
    pub industry: Option<IndustryTag>,
}

impl Receipt {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        let memo = r.text("memo_text");
        let contributor_employer = r.text("contributor_employer");
        let employer = r.text("employer");
        let industry = classify_first([memo.as_deref(), contributor_employer.as_deref(), employer.as_deref()]);

        Some(Self {
            sub_id: r.text("sub_id"),
            transaction_id: r.text("transaction_id"),
            committee_id: r.text("committee_id").or_else(|| r.entity_id.clone()).map(upper)?,
            cycle: r.cycle_or_meta(&["two_year_transaction_period", "cycle"])?,
            date: r.text_any(&["contribution_receipt_date", "receipt_date"]),
            amount: r.number_any(&["contribution_receipt_amount", "amount"]).unwrap_or(0.0),
            contributor_name: r.text_any(&["contributor_name", "name"]),
            contributor_state: r.text_any(&["contributor_state", "state"]).map(upper),
            contributor_employer: contributor_employer.or(employer),
            contributor_occupation: r.text("contributor_occupation"),
            entity_type: r.text("entity_type").map(upper),
            class: contributor_class(r),
            industry,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateDimension {
    Size,
    State,
    Employer,
}

/// Receipts rolled up by FEC over one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptAggregate {
    pub committee_id: String,
    pub cycle: u16,
    pub dimension: AggregateDimension,
    /// Size bucket floor (`0` is $200 and under), state code or employer
    pub key: String,
    pub total: f64,
    pub count: Option<u64>,
}

impl ReceiptAggregate {
    pub fn from_raw(r: &RawRecord, dimension: AggregateDimension) -> Option<Self> {
        let key = match dimension {
            AggregateDimension::Size => r.text("size")?,
            AggregateDimension::State => r.text("state").map(upper)?,
            AggregateDimension::Employer => r.text("employer").map(upper)?,
        };
        Some(Self {
            committee_id: r.text("committee_id").or_else(|| r.entity_id.clone()).map(upper)?,
            cycle: r.cycle_or_meta(&["cycle"])?,
            dimension,
            key,
            total: r.number_any(&["total", "total_amount"]).unwrap_or(0.0),
            count: r.number("count").map(|n| n as u64),
        })
    }

    /// The $200-and-under bucket
    pub fn is_small_dollar(&self) -> bool {
        self.dimension == AggregateDimension::Size && self.key.parse::<f64>().ok() == Some(0.0)
    }
}

/// Itemized Schedule B disbursement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disbursement {
    pub sub_id: Option<String>,
    pub transaction_id: Option<String>,
    pub committee_id: String,
    pub cycle: u16,
    pub date: Option<String>,
    pub amount: f64,
    pub payee: Option<String>,
    pub purpose: Option<String>,
    pub recipient_state: Option<String>,
}

impl Disbursement {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        Some(Self {
            sub_id: r.text("sub_id"),
            transaction_id: r.text("transaction_id"),
            committee_id: r.text("committee_id").or_else(|| r.entity_id.clone()).map(upper)?,
            cycle: r.cycle_or_meta(&["two_year_transaction_period", "cycle"])?,
            date: r.text("disbursement_date"),
            amount: r.number_any(&["disbursement_amount", "amount"]).unwrap_or(0.0),
            payee: r.text_any(&["recipient_name", "payee_name"]),
            purpose: r.text_any(&["disbursement_description", "disbursement_purpose_category"]),
            recipient_state: r.text("recipient_state").map(upper),
        })
    }

    /// Vendor key: payee upper-cased and trimmed
    pub fn vendor(&self) -> Option<String> {
        self.payee
            .as_deref()
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTotal {
    pub vendor: String,
    pub amount: f64,
    pub payments: usize,
}

/// Schedule E independent expenditure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndependentExpenditure {
    pub sub_id: Option<String>,
    pub transaction_id: Option<String>,
    /// Spending committee
    pub committee_id: Option<String>,
    pub candidate_id: String,
    pub cycle: u16,
    pub date: Option<String>,
    pub amount: f64,
    /// `S` support, `O` oppose
    pub support_oppose: Option<String>,
    pub payee: Option<String>,
    pub purpose: Option<String>,
}

impl IndependentExpenditure {
    pub fn from_raw(r: &RawRecord) -> Option<Self> {
        Some(Self {
            sub_id: r.text("sub_id"),
            transaction_id: r.text("transaction_id"),
            committee_id: r.text("committee_id").map(upper),
            candidate_id: r.text("candidate_id").or_else(|| r.entity_id.clone()).map(upper)?,
            cycle: r.cycle_or_meta(&["cycle", "election_cycle"])?,
            date: r.text_any(&["expenditure_date", "dissemination_date"]),
            amount: r.number_any(&["expenditure_amount", "amount"]).unwrap_or(0.0),
            support_oppose: r.text("support_oppose_indicator").map(upper),
            payee: r.text("payee_name"),
            purpose: r.text("expenditure_description"),
        })
    }
}

/// Every warehouse table, in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarehouseTables {
    pub candidates: Vec<DimCandidate>,
    pub committees: Vec<DimCommittee>,
    pub links: Vec<CandidateCommitteeLink>,
    pub reports: Vec<CommitteeReport>,
    pub receipts: Vec<Receipt>,
    pub aggregates: Vec<ReceiptAggregate>,
    pub disbursements: Vec<Disbursement>,
    pub vendors: Vec<VendorTotal>,
    pub independent_expenditures: Vec<IndependentExpenditure>,
    pub metrics: Vec<CommitteeMetric>,
}

impl WarehouseTables {
    /// Write every table; empty tables become `[]`
    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        write_json_atomic(&dir.join(DIM_CANDIDATES), &self.candidates)?;
        write_json_atomic(&dir.join(DIM_COMMITTEES), &self.committees)?;
        write_json_atomic(&dir.join(LINK_CANDIDATE_COMMITTEES), &self.links)?;
        write_json_atomic(&dir.join(COMMITTEE_REPORTS), &self.reports)?;
        write_json_atomic(&dir.join(FACT_RECEIPTS), &self.receipts)?;
        write_json_atomic(&dir.join(FACT_RECEIPTS_AGGREGATES), &self.aggregates)?;
        write_json_atomic(&dir.join(FACT_DISBURSEMENTS), &self.disbursements)?;
        write_json_atomic(&dir.join(VENDOR_INDEX), &self.vendors)?;
        write_json_atomic(&dir.join(FACT_IE), &self.independent_expenditures)?;
        write_json_atomic(&dir.join(COMMITTEE_METRICS), &self.metrics)?;
        Ok(())
    }

    /// Read every table; a missing file is a `MissingInput` error naming it
    pub fn load(dir: &Path) -> Result<Self> {
        for name in ALL_TABLES {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(Error::MissingInput(format!(
                    "{} not found; run fec-warehouse first",
                    path.display()
                )));
            }
        }

        Ok(Self {
            candidates: read_table(&dir.join(DIM_CANDIDATES))?,
            committees: read_table(&dir.join(DIM_COMMITTEES))?,
            links: read_table(&dir.join(LINK_CANDIDATE_COMMITTEES))?,
            reports: read_table(&dir.join(COMMITTEE_REPORTS))?,
            receipts: read_table(&dir.join(FACT_RECEIPTS))?,
            aggregates: read_table(&dir.join(FACT_RECEIPTS_AGGREGATES))?,
            disbursements: read_table(&dir.join(FACT_DISBURSEMENTS))?,
            vendors: read_table(&dir.join(VENDOR_INDEX))?,
            independent_expenditures: read_table(&dir.join(FACT_IE))?,
            metrics: read_table(&dir.join(COMMITTEE_METRICS))?,
        })
    }

    /// Row count per table file
    pub fn counts(&self) -> [(&'static str, usize); 10] {
        [
            (DIM_CANDIDATES, self.candidates.len()),
            (DIM_COMMITTEES, self.committees.len()),
            (LINK_CANDIDATE_COMMITTEES, self.links.len()),
            (COMMITTEE_REPORTS, self.reports.len()),
            (FACT_RECEIPTS, self.receipts.len()),
            (FACT_RECEIPTS_AGGREGATES, self.aggregates.len()),
            (FACT_DISBURSEMENTS, self.disbursements.len()),
            (VENDOR_INDEX, self.vendors.len()),
            (FACT_IE, self.independent_expenditures.len()),
            (COMMITTEE_METRICS, self.metrics.len()),
        ]
    }
}
