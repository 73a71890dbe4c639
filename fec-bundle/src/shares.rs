//! Ratios derived from summed totals

use serde::{Serialize, Serializer};

use fec_warehouse::MetricTotals;

/// `part / total`, 0 when there is nothing to divide by
pub fn share(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Shares {
    pub individual: f64,
    pub small_individual: f64,
    pub committee: f64,
}

impl Shares {
    pub fn of(totals: &MetricTotals) -> Self {
        Self {
            individual: share(totals.individual, totals.total),
            small_individual: share(totals.small_individual, totals.total),
            committee: share(totals.committee, totals.total),
        }
    }
}

/// Committee money over committee plus individual money; `other` is excluded
pub fn pac_pct(totals: &MetricTotals) -> f64 {
    share(
        totals.committee,
        totals.committee + totals.individual + totals.small_individual,
    )
}

/// Disbursements per dollar received
///
/// Spending with no receipts is infinite; serialized as the string
/// `"Infinity"` since JSON has no such number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnRate {
    Finite(f64),
    Infinite,
}

impl BurnRate {
    pub fn of(disbursements: f64, receipts: f64) -> Self {
        if receipts > 0.0 {
            BurnRate::Finite(disbursements / receipts)
        } else if disbursements > 0.0 {
            BurnRate::Infinite
        } else {
            BurnRate::Finite(0.0)
        }
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            BurnRate::Finite(v) => Some(v),
            BurnRate::Infinite => None,
        }
    }
}

impl Serialize for BurnRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BurnRate::Finite(v) => serializer.serialize_f64(*v),
            BurnRate::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}
