//! Typed views over the four input tables

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::config::{DatasetLayout, InternalDatabaseLayout};
use crate::tabular::Table;
use crate::types::*;
use crate::utils::{normalize_iccid_cell, parse_date_cell, validate_unique_identifiers};

/// Supplier roster: one normalized identifier per row, in file order.
/// `None` marks a row whose identifier cell was blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierRoster {
    pub identifiers: Vec<Option<String>>,
}

impl SupplierRoster {
    pub fn from_table(table: &Table, layout: &DatasetLayout) -> BillingResult<Self> {
        let column = table.require_column(DatasetKind::SupplierRoster, &layout.identifier_column)?;
        let identifiers = (0..table.len())
            .map(|row| normalize_iccid_cell(table.cell(row, column)))
            .collect();
        Ok(Self { identifiers })
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Column positions of the internal database, kept for the detail export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalColumns {
    pub headers: Vec<String>,
    pub identifier: usize,
    pub status: usize,
    pub activation: Option<usize>,
    pub cancellation: Option<usize>,
    pub suspension: Option<usize>,
}

/// One internal database row
#[derive(Debug, Clone, PartialEq)]
pub struct InternalEntry {
    /// `None` when the status cell was blank
    pub status: Option<SimStatus>,
    pub activation_date: Option<NaiveDate>,
    pub cancellation_date: Option<NaiveDate>,
    pub suspension_date: Option<NaiveDate>,
    /// Raw cell text of every column, in header order
    pub values: Vec<String>,
}

/// Internal database indexed by normalized identifier
#[derive(Debug, Clone, Default)]
pub struct InternalDatabase {
    pub columns: InternalColumns,
    entries: HashMap<String, InternalEntry>,
}

impl InternalDatabase {
    /// Index the table. Duplicate identifiers are rejected; rows with a blank
    /// identifier are skipped.
    pub fn from_table(table: &Table, layout: &InternalDatabaseLayout) -> BillingResult<Self> {
        let dataset = DatasetKind::InternalDatabase;
        let optional_column = |name: &str| {
            let index = table.column_index(name);
            if index.is_none() {
                log::warn!("{}: column '{}' not found, treating its dates as absent", dataset, name);
            }
            index
        };

        let columns = InternalColumns {
            headers: table.headers().to_vec(),
            identifier: table.require_column(dataset, &layout.identifier_column)?,
            status: table.require_column(dataset, &layout.status_column)?,
            activation: optional_column(&layout.activation_column),
            cancellation: optional_column(&layout.cancellation_column),
            suspension: optional_column(&layout.suspension_column),
        };

        let mut keyed: Vec<(String, InternalEntry)> = Vec::with_capacity(table.len());
        let mut blank = 0usize;

        for row in 0..table.len() {
            let Some(iccid) = normalize_iccid_cell(table.cell(row, columns.identifier)) else {
                blank += 1;
                continue;
            };

            let date_at = |column: Option<usize>| -> BillingResult<Option<NaiveDate>> {
                match column {
                    Some(col) => parse_date_cell(
                        table.cell(row, col),
                        dataset,
                        row + 1,
                        &columns.headers[col],
                    ),
                    None => Ok(None),
                }
            };

            let entry = InternalEntry {
                status: SimStatus::parse(&table.cell(row, columns.status).to_text()),
                activation_date: date_at(columns.activation)?,
                cancellation_date: date_at(columns.cancellation)?,
                suspension_date: date_at(columns.suspension)?,
                values: (0..columns.headers.len())
                    .map(|col| table.cell(row, col).to_text())
                    .collect(),
            };
            keyed.push((iccid, entry));
        }

        if blank > 0 {
            log::warn!("{}: skipped {} rows with a blank identifier", dataset, blank);
        }

        validate_unique_identifiers(keyed.iter().map(|(iccid, _)| iccid.as_str()))?;

        Ok(Self {
            columns,
            entries: keyed.into_iter().collect(),
        })
    }

    pub fn get(&self, iccid: &str) -> Option<&InternalEntry> {
        self.entries.get(iccid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Set of normalized identifiers from a reference list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierSet {
    identifiers: HashSet<String>,
}

impl IdentifierSet {
    pub fn from_table(kind: DatasetKind, table: &Table, layout: &DatasetLayout) -> BillingResult<Self> {
        let column = table.require_column(kind, &layout.identifier_column)?;
        let identifiers = (0..table.len())
            .filter_map(|row| normalize_iccid_cell(table.cell(row, column)))
            .collect();
        Ok(Self { identifiers })
    }

    pub fn contains(&self, iccid: &str) -> bool {
        self.identifiers.contains(iccid)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IdentifierSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            identifiers: iter.into_iter().map(Into::<String>::into).collect(),
        }
    }
}
