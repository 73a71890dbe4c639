//! Threshold badges
//!
//! Badges are recomputed from the numbers on every build and never stored on
//! their own. Each carries a reason embedding the value that triggered it.

use serde::Serialize;
use std::collections::BTreeMap;

use fec_warehouse::IndustryTag;

use crate::format::{dollars, percent};
use crate::shares::{BurnRate, Shares};

pub const SMALL_DOLLAR_SHARE: f64 = 0.50;
pub const COMMITTEE_SHARE: f64 = 0.30;
pub const HIGH_BURN_RATE: f64 = 1.0;
pub const LOW_CASH_ON_HAND: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub key: &'static str,
    pub label: &'static str,
    pub reason: String,
}

impl Badge {
    fn new(key: &'static str, label: &'static str, reason: String) -> Self {
        Self { key, label, reason }
    }
}

/// Industry money badges in display order; finance has none
const TAG_BADGES: [(IndustryTag, &str, &str); 5] = [
    (IndustryTag::Aipac, "aipac_money", "AIPAC-linked Money"),
    (IndustryTag::Defense, "defense_money", "Defense Contractor Money"),
    (IndustryTag::Fossil, "fossil_money", "Fossil Fuel Money"),
    (IndustryTag::Pharma, "pharma_money", "Pharma Money"),
    (IndustryTag::Tech, "tech_money", "Big Tech Money"),
];

/// The numbers badges are judged on
#[derive(Debug, Clone, Copy)]
pub struct BadgeInput<'a> {
    pub shares: &'a Shares,
    pub tags: &'a BTreeMap<IndustryTag, f64>,
    pub burn_rate: BurnRate,
    pub cash_on_hand_end: Option<f64>,
}

pub fn evaluate(input: BadgeInput<'_>) -> Vec<Badge> {
    let mut badges = Vec::new();

    if input.shares.small_individual >= SMALL_DOLLAR_SHARE {
        badges.push(Badge::new(
            "small_dollar_powered",
            "Small-Dollar Powered",
            format!("Small individual share {}", percent(input.shares.small_individual)),
        ));
    }
    if input.shares.committee >= COMMITTEE_SHARE {
        badges.push(Badge::new(
            "corporate_pac_reliant",
            "Corporate PAC Reliant",
            format!("Committee/PAC share {}", percent(input.shares.committee)),
        ));
    }

    for (tag, key, label) in TAG_BADGES {
        let amount = input.tags.get(&tag).copied().unwrap_or(0.0);
        if amount > 0.0 {
            badges.push(Badge::new(key, label, dollars(amount)));
        }
    }

    if let Some(rate) = input.burn_rate.finite().filter(|r| *r > HIGH_BURN_RATE) {
        badges.push(Badge::new(
            "burn_rate_high",
            "High Burn Rate",
            format!("{:.0}% of receipts", rate * 100.0),
        ));
    }

    if let Some(cash) = input.cash_on_hand_end.filter(|c| *c > 0.0 && *c < LOW_CASH_ON_HAND) {
        badges.push(Badge::new("low_cash_on_hand", "Low Cash on Hand", dollars(cash)));
    }

    badges
}
