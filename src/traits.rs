//! Traits for the collaborators around the reconciliation core
//!
//! The core never reads files or renders documents itself. Input tables come
//! from a [`TableSource`]; the finished run is handed to a [`DetailExporter`]
//! and a [`SummaryExporter`].

use crate::config::DatasetLayout;
use crate::reconciliation::ReconciliationRun;
use crate::tabular::Table;
use crate::types::*;

/// Supplies the four input datasets of a run
pub trait TableSource {
    /// Whether the dataset was provided at all
    fn is_supplied(&self, kind: DatasetKind) -> bool;

    /// Load a dataset; `Ok(None)` when it was not provided
    fn load_table(&self, kind: DatasetKind, layout: &DatasetLayout) -> BillingResult<Option<Table>>;
}

/// Renders the per-card table
pub trait DetailExporter {
    fn export_detail(&mut self, run: &ReconciliationRun) -> BillingResult<()>;
}

/// Renders the aggregated summary document
pub trait SummaryExporter {
    fn export_summary(&mut self, run: &ReconciliationRun) -> BillingResult<()>;
}
