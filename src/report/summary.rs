//! Aggregation of an evaluated record set into billing totals

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::*;

/// Count and value of one status in a distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLine {
    pub status: String,
    pub count: usize,
    pub value: BigDecimal,
}

/// Cards per status with their billing value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    /// Lines ordered by status label
    pub lines: Vec<StatusLine>,
    pub total_count: usize,
    pub total_value: BigDecimal,
}

impl Distribution {
    /// Count records per status and price each count at `unit_price`
    pub fn from_records<'a, I>(records: I, unit_price: &BigDecimal) -> Self
    where
        I: IntoIterator<Item = &'a SimRecord>,
    {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.status.label()).or_insert(0) += 1;
        }

        let lines: Vec<StatusLine> = counts
            .into_iter()
            .map(|(status, count)| StatusLine {
                status: status.to_string(),
                count,
                value: money(unit_price, count),
            })
            .collect();

        let total_count = lines.iter().map(|l| l.count).sum();
        Self {
            lines,
            total_count,
            total_value: money(unit_price, total_count),
        }
    }

    /// Count for a status label, zero when absent
    pub fn count_for(&self, status: &str) -> usize {
        self.lines
            .iter()
            .find(|l| l.status == status)
            .map(|l| l.count)
            .unwrap_or(0)
    }
}

/// Non-billable cards sharing a status and reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionLine {
    pub status: String,
    pub reason: NonBillingReason,
    pub count: usize,
}

impl ExclusionLine {
    pub fn reason_label(&self) -> &'static str {
        self.reason.label()
    }
}

/// Original vs revised distributions plus the exclusion breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub unit_price: BigDecimal,
    /// Every roster card, billed or not
    pub original: Distribution,
    /// Only the billable cards
    pub revised: Distribution,
    /// Non-billable cards by (status, reason), ordered by both
    pub exclusions: Vec<ExclusionLine>,
    pub excluded_count: usize,
    /// Value removed from the supplier's original total
    pub excluded_value: BigDecimal,
}

impl BillingSummary {
    /// Aggregate evaluated records. Records are not modified.
    pub fn build(records: &[SimRecord], unit_price: &BigDecimal) -> Self {
        let original = Distribution::from_records(records, unit_price);
        let revised = Distribution::from_records(records.iter().filter(|r| r.billable), unit_price);

        let mut grouped: BTreeMap<(&str, NonBillingReason), usize> = BTreeMap::new();
        for record in records.iter().filter(|r| !r.billable) {
            // records are only excluded with a reason; fall back defensively
            let reason = record
                .non_billing_reason
                .unwrap_or(NonBillingReason::ReasonUnidentified);
            *grouped.entry((record.status.label(), reason)).or_insert(0) += 1;
        }

        let exclusions: Vec<ExclusionLine> = grouped
            .into_iter()
            .map(|((status, reason), count)| ExclusionLine {
                status: status.to_string(),
                reason,
                count,
            })
            .collect();
        let excluded_count = original.total_count - revised.total_count;

        Self {
            unit_price: unit_price.clone(),
            excluded_value: money(unit_price, excluded_count),
            original,
            revised,
            exclusions,
            excluded_count,
        }
    }
}

/// `unit_price * count`, rounded to cents
pub fn money(unit_price: &BigDecimal, count: usize) -> BigDecimal {
    (unit_price * BigDecimal::from(count as u64)).round(2)
}
