//! Run configuration
//!
//! Everything here has a default, so an empty TOML document is a valid
//! configuration. Example:
//!
//! ```toml
//! timezone_offset_hours = -3
//! summary_header = "ACME Telemetria - Gestão de Frota"
//!
//! [rules]
//! version = "v3"
//! suspension_after_period_billable = false
//!
//! [[suppliers]]
//! name = "VIVO"
//! unit_price = "3.50"
//!
//! [datasets.internal_database]
//! identifier_column = "ICCID"
//! header_row = 1
//! ```

use bigdecimal::BigDecimal;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::eligibility::RuleSet;
use crate::types::*;

/// Where to find the identifier in one input dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayout {
    pub identifier_column: String,
    /// 0-based row holding the headers
    pub header_row: usize,
    /// Sheet to read from workbooks; the first sheet when unset
    pub sheet: Option<String>,
}

impl Default for DatasetLayout {
    fn default() -> Self {
        Self {
            identifier_column: "ICCID".to_string(),
            header_row: 0,
            sheet: None,
        }
    }
}

impl DatasetLayout {
    fn with_identifier(identifier_column: &str) -> Self {
        Self {
            identifier_column: identifier_column.to_string(),
            ..Self::default()
        }
    }
}

/// Internal database layout: identifier plus status and lifecycle dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalDatabaseLayout {
    pub identifier_column: String,
    /// The exported internal database carries a title line above the headers
    pub header_row: usize,
    pub sheet: Option<String>,
    pub status_column: String,
    pub activation_column: String,
    pub cancellation_column: String,
    pub suspension_column: String,
}

impl Default for InternalDatabaseLayout {
    fn default() -> Self {
        Self {
            identifier_column: "ICCID".to_string(),
            header_row: 1,
            sheet: None,
            status_column: "STATUS".to_string(),
            activation_column: "DATA DE ATIVAÇÃO".to_string(),
            cancellation_column: "DATA DE CANCELAMENTO".to_string(),
            suspension_column: "DATA DE SUSPENSÃO".to_string(),
        }
    }
}

impl InternalDatabaseLayout {
    /// The part of the layout a loader needs
    pub fn table(&self) -> DatasetLayout {
        DatasetLayout {
            identifier_column: self.identifier_column.clone(),
            header_row: self.header_row,
            sheet: self.sheet.clone(),
        }
    }
}

/// Layouts of the four input datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetLayouts {
    pub supplier_roster: DatasetLayout,
    pub internal_database: InternalDatabaseLayout,
    pub acquisition_list: DatasetLayout,
    pub test_chip_list: DatasetLayout,
}

impl Default for DatasetLayouts {
    fn default() -> Self {
        Self {
            supplier_roster: DatasetLayout::with_identifier("Iccid"),
            internal_database: InternalDatabaseLayout::default(),
            acquisition_list: DatasetLayout::with_identifier("iccid"),
            test_chip_list: DatasetLayout {
                sheet: Some("CHIP TESTES".to_string()),
                ..DatasetLayout::default()
            },
        }
    }
}

impl DatasetLayouts {
    /// Table layout for a dataset
    pub fn layout(&self, kind: DatasetKind) -> DatasetLayout {
        match kind {
            DatasetKind::SupplierRoster => self.supplier_roster.clone(),
            DatasetKind::InternalDatabase => self.internal_database.table(),
            DatasetKind::AcquisitionList => self.acquisition_list.clone(),
            DatasetKind::TestChipList => self.test_chip_list.clone(),
        }
    }
}

/// A supplier the run can be reconciled for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub name: String,
    /// Monthly charge per billed card
    pub unit_price: BigDecimal,
}

impl SupplierConfig {
    pub fn new(name: &str, unit_price: BigDecimal) -> Self {
        Self {
            name: name.to_string(),
            unit_price,
        }
    }
}

/// Configuration of a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub suppliers: Vec<SupplierConfig>,
    pub rules: RuleSet,
    /// Fixed UTC offset used to stamp the summary document
    pub timezone_offset_hours: i32,
    /// Organization line printed above the summary title
    pub summary_header: Option<String>,
    pub datasets: DatasetLayouts,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let price = BigDecimal::from_str("3.50").unwrap_or_else(|_| BigDecimal::from(0));
        Self {
            suppliers: ["VIVO", "CLARO", "TIM"]
                .iter()
                .map(|name| SupplierConfig::new(name, price.clone()))
                .collect(),
            rules: RuleSet::default(),
            timezone_offset_hours: -3,
            summary_header: None,
            datasets: DatasetLayouts::default(),
        }
    }
}

impl BillingConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> BillingResult<Self> {
        let config: BillingConfig =
            toml::from_str(content).map_err(|e| BillingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: &Path) -> BillingResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> BillingResult<()> {
        if self.suppliers.is_empty() {
            return Err(BillingError::Config(
                "At least one supplier must be configured".to_string(),
            ));
        }

        for (i, supplier) in self.suppliers.iter().enumerate() {
            if supplier.name.trim().is_empty() {
                return Err(BillingError::Config(
                    "Supplier name cannot be empty".to_string(),
                ));
            }
            if supplier.unit_price < BigDecimal::from(0) {
                return Err(BillingError::Config(format!(
                    "Supplier '{}' has a negative unit price",
                    supplier.name
                )));
            }
            if self.suppliers[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&supplier.name))
            {
                return Err(BillingError::Config(format!(
                    "Supplier '{}' is configured twice",
                    supplier.name
                )));
            }
        }

        self.timezone()?;
        Ok(())
    }

    /// Look up a configured supplier, ignoring case
    pub fn supplier(&self, name: &str) -> BillingResult<&SupplierConfig> {
        self.suppliers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| BillingError::UnknownSupplier(name.to_string()))
    }

    /// Names of the configured suppliers
    pub fn supplier_names(&self) -> Vec<&str> {
        self.suppliers.iter().map(|s| s.name.as_str()).collect()
    }

    /// Fixed offset for report timestamps
    pub fn timezone(&self) -> BillingResult<FixedOffset> {
        self.timezone_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                BillingError::Config(format!(
                    "Invalid timezone offset: {} hours",
                    self.timezone_offset_hours
                ))
            })
    }
}
