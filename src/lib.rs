//! # Chip Billing Core
//!
//! Monthly billing reconciliation of SIM cards: checks a supplier's roster of
//! billed cards against the internal subscriber database and two reference
//! lists, then decides card by card whether the charge is justified.
//!
//! ## Features
//!
//! - **Identifier normalization**: ICCIDs from any source compare equal after trimming and zero-padding
//! - **Reference join**: every roster card is enriched with status, lifecycle dates and list membership
//! - **Eligibility rules**: a deterministic rule engine with selectable rule revisions
//! - **Aggregation**: original vs revised distributions and the exclusion breakdown
//! - **Exporters**: XLSX/CSV detail tables and a plain-text summary document
//! - **Source abstraction**: inputs come through the [`TableSource`] trait (files or memory)
//!
//! ## Quick Start
//!
//! ```rust
//! use chip_billing_core::{BillingReconciliation, DatasetKind, MemoryStorage, Table};
//!
//! let storage = MemoryStorage::new()
//!     .with_table(
//!         DatasetKind::SupplierRoster,
//!         Table::from_strings(&["Iccid"], &[&["8955010000000000001"]]),
//!     )
//!     .with_table(
//!         DatasetKind::InternalDatabase,
//!         Table::from_strings(
//!             &["ICCID", "STATUS", "DATA DE ATIVAÇÃO"],
//!             &[&["8955010000000000001", "ATIVO", "2025-03-10"]],
//!         ),
//!     )
//!     .with_table(DatasetKind::AcquisitionList, Table::from_strings(&["iccid"], &[]))
//!     .with_table(DatasetKind::TestChipList, Table::from_strings(&["ICCID"], &[]));
//!
//! let run = BillingReconciliation::with_defaults(storage)
//!     .run(Some("2025-04"), "VIVO")
//!     .unwrap();
//! assert_eq!(run.billable_count(), 1);
//! ```

pub mod config;
pub mod eligibility;
pub mod reconciliation;
pub mod report;
pub mod tabular;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use eligibility::*;
pub use reconciliation::*;
pub use report::*;
pub use tabular::*;
pub use traits::*;
pub use types::*;
pub use utils::*;
