//! Run orchestrator that loads the inputs and drives join, evaluation and
//! aggregation

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::{BillingConfig, SupplierConfig};
use crate::eligibility::{EligibilityEngine, RuleSet};
use crate::reconciliation::inputs::{IdentifierSet, InternalColumns, InternalDatabase, SupplierRoster};
use crate::reconciliation::join::{join_records, JoinStats};
use crate::report::BillingSummary;
use crate::tabular::Table;
use crate::traits::*;
use crate::types::*;

/// The outcome of one reconciliation: evaluated records plus aggregates.
/// Exporters read it; nothing mutates it after it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationRun {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub supplier: SupplierConfig,
    pub period: BillingPeriod,
    pub rules: RuleSet,
    /// Internal database layout, needed to rebuild the detail table
    pub internal_columns: InternalColumns,
    /// One record per supplier roster row, in roster order
    pub records: Vec<SimRecord>,
    pub stats: JoinStats,
    pub summary: BillingSummary,
}

impl ReconciliationRun {
    pub fn billable_count(&self) -> usize {
        self.summary.revised.total_count
    }

    pub fn excluded_count(&self) -> usize {
        self.summary.excluded_count
    }

    /// Export through both collaborators
    pub fn export(
        &self,
        detail: &mut dyn DetailExporter,
        summary: &mut dyn SummaryExporter,
    ) -> BillingResult<()> {
        detail.export_detail(self)?;
        summary.export_summary(self)
    }
}

/// Billing reconciliation bound to a table source and a configuration
pub struct BillingReconciliation<S: TableSource> {
    source: S,
    config: BillingConfig,
}

impl<S: TableSource> BillingReconciliation<S> {
    pub fn new(source: S, config: BillingConfig) -> Self {
        Self { source, config }
    }

    /// Reconciliation with the default configuration
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, BillingConfig::default())
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Check the run preconditions without loading anything
    pub fn check_preconditions(
        &self,
        reference_month: Option<&str>,
        supplier: &str,
    ) -> BillingResult<(BillingPeriod, SupplierConfig)> {
        let period = BillingPeriod::parse(reference_month.unwrap_or_default())?;

        if let Some(kind) = DatasetKind::ALL
            .into_iter()
            .find(|kind| !self.source.is_supplied(*kind))
        {
            return Err(BillingError::MissingDataset(kind));
        }

        let supplier = self.config.supplier(supplier)?.clone();
        Ok((period, supplier))
    }

    fn load(&self, kind: DatasetKind) -> BillingResult<Table> {
        let layout = self.config.datasets.layout(kind);
        let table = self
            .source
            .load_table(kind, &layout)?
            .ok_or(BillingError::MissingDataset(kind))?;
        log::info!("{}: {} rows", kind, table.len());
        Ok(table)
    }

    /// Reconcile the supplier roster for the reference month (`YYYY-MM`)
    pub fn run(&self, reference_month: Option<&str>, supplier: &str) -> BillingResult<ReconciliationRun> {
        let (period, supplier) = self.check_preconditions(reference_month, supplier)?;
        let run_id = Uuid::new_v4();
        log::info!(
            "run {}: supplier {}, reference month {}, rules {}",
            run_id,
            supplier.name,
            period,
            self.config.rules.version
        );

        let layouts = &self.config.datasets;
        let roster = SupplierRoster::from_table(
            &self.load(DatasetKind::SupplierRoster)?,
            &layouts.supplier_roster,
        )?;
        let internal = InternalDatabase::from_table(
            &self.load(DatasetKind::InternalDatabase)?,
            &layouts.internal_database,
        )?;
        let acquisition = IdentifierSet::from_table(
            DatasetKind::AcquisitionList,
            &self.load(DatasetKind::AcquisitionList)?,
            &layouts.acquisition_list,
        )?;
        let test_chips = IdentifierSet::from_table(
            DatasetKind::TestChipList,
            &self.load(DatasetKind::TestChipList)?,
            &layouts.test_chip_list,
        )?;

        let (mut records, stats) = join_records(&roster, &internal, &acquisition, &test_chips);
        log::info!(
            "join: {} matched, {} unmatched, {} blank identifiers, {} on acquisition list, {} test chips",
            stats.matched,
            stats.unmatched,
            stats.blank_identifiers,
            stats.acquisition_hits,
            stats.test_chip_hits
        );

        let engine = EligibilityEngine::new(self.config.rules);
        let billable = engine.evaluate_all(&mut records, &period);
        let summary = BillingSummary::build(&records, &supplier.unit_price);
        log::info!(
            "run {}: {} of {} cards billable, revised total {}",
            run_id,
            billable,
            records.len(),
            summary.revised.total_value
        );

        Ok(ReconciliationRun {
            run_id,
            created_at: Utc::now(),
            supplier,
            period,
            rules: self.config.rules,
            internal_columns: internal.columns.clone(),
            records,
            stats,
            summary,
        })
    }
}
