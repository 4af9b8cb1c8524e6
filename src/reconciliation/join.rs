//! Reference join of the supplier roster against the internal database

use serde::{Deserialize, Serialize};

use crate::reconciliation::inputs::{IdentifierSet, InternalDatabase, SupplierRoster};
use crate::types::*;

/// Counters collected while joining
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    pub supplier_rows: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Supplier rows with a blank identifier (never matched)
    pub blank_identifiers: usize,
    /// Matched rows whose status cell was blank
    pub blank_statuses: usize,
    pub acquisition_hits: usize,
    pub test_chip_hits: usize,
}

/// Left-join the roster against the internal database and flag list
/// membership. Produces exactly one record per roster row, in roster order.
pub fn join_records(
    roster: &SupplierRoster,
    internal: &InternalDatabase,
    acquisition: &IdentifierSet,
    test_chips: &IdentifierSet,
) -> (Vec<SimRecord>, JoinStats) {
    let mut stats = JoinStats {
        supplier_rows: roster.len(),
        ..JoinStats::default()
    };
    let mut records = Vec::with_capacity(roster.len());

    for (index, identifier) in roster.identifiers.iter().enumerate() {
        let Some(iccid) = identifier else {
            stats.blank_identifiers += 1;
            stats.unmatched += 1;
            let mut record = SimRecord::new(String::new(), SimStatus::NotInInternalDb);
            record.source_row = index + 1;
            records.push(record);
            continue;
        };

        let entry = internal.get(iccid);
        // a row without a status counts as absent from the internal database
        let status = match entry {
            Some(entry) => match &entry.status {
                Some(status) => {
                    stats.matched += 1;
                    status.clone()
                }
                None => {
                    stats.blank_statuses += 1;
                    stats.unmatched += 1;
                    SimStatus::NotInInternalDb
                }
            },
            None => {
                stats.unmatched += 1;
                SimStatus::NotInInternalDb
            }
        };

        let in_acquisition_list = acquisition.contains(iccid);
        let is_test_chip = test_chips.contains(iccid);
        stats.acquisition_hits += usize::from(in_acquisition_list);
        stats.test_chip_hits += usize::from(is_test_chip);

        let mut record = SimRecord::new(iccid.clone(), status)
            .with_membership(in_acquisition_list, is_test_chip);
        record.source_row = index + 1;
        if let Some(entry) = entry {
            record = record.with_dates(
                entry.activation_date,
                entry.cancellation_date,
                entry.suspension_date,
            );
            record.internal_values = entry.values.clone();
        }
        records.push(record);
    }

    if let Some(status) = records
        .iter()
        .find(|r| !r.status.is_recognized())
        .map(|r| r.status.label().to_string())
    {
        log::warn!("join: unrecognized status values present (first: '{}')", status);
    }

    log::debug!(
        "join: {} roster rows, {} matched, {} unmatched",
        stats.supplier_rows,
        stats.matched,
        stats.unmatched
    );
    (records, stats)
}
