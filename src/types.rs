//! Core types and data structures for the billing reconciliation

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a SIM card as recorded in the internal database
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimStatus {
    /// Card is active
    Ativo,
    /// Card was cancelled
    Cancelado,
    /// Card was reported lost or stolen
    Extraviado,
    /// Card is inactive
    Inativo,
    /// Card is suspended
    Suspenso,
    /// Synthesized by the join when the identifier has no internal database row
    NotInInternalDb,
    /// Any status value outside the known set, kept verbatim
    Other(String),
}

impl SimStatus {
    /// Parse a raw status cell. Blank cells yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }

        let status = match value.to_uppercase().as_str() {
            "ATIVO" => SimStatus::Ativo,
            "CANCELADO" => SimStatus::Cancelado,
            "EXTRAVIADO" => SimStatus::Extraviado,
            "INATIVO" => SimStatus::Inativo,
            "SUSPENSO" => SimStatus::Suspenso,
            _ => SimStatus::Other(value.to_string()),
        };
        Some(status)
    }

    /// Label used in reports and exports
    pub fn label(&self) -> &str {
        match self {
            SimStatus::Ativo => "ATIVO",
            SimStatus::Cancelado => "CANCELADO",
            SimStatus::Extraviado => "EXTRAVIADO",
            SimStatus::Inativo => "INATIVO",
            SimStatus::Suspenso => "SUSPENSO",
            SimStatus::NotInInternalDb => "NOT_IN_INTERNAL_DB",
            SimStatus::Other(raw) => raw,
        }
    }

    /// Whether this is a status the rule engine knows how to dispose of
    pub fn is_recognized(&self) -> bool {
        !matches!(self, SimStatus::Other(_))
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Fixed reason codes attached to a card that is not billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonBillingReason {
    /// Card is in neither the internal database nor the acquisition list
    OutsideInternalDbAndAcquisitionList,
    /// Status EXTRAVIADO
    InvalidStatusLost,
    /// Status INATIVO
    InvalidStatusInactive,
    /// ATIVO card without an activation date on or before the period end
    ActivationOutsideBillingMonth,
    /// CANCELADO card not cancelled within the billing month
    CancellationOutsideBillingMonth,
    /// SUSPENSO card matching none of the suspension rules
    SuspensionOutsideRules,
    /// Fallback for statuses the engine does not recognise
    ReasonUnidentified,
}

impl NonBillingReason {
    /// Human-readable reason code
    pub fn label(&self) -> &'static str {
        match self {
            NonBillingReason::OutsideInternalDbAndAcquisitionList => {
                "outside internal DB and outside acquisition list"
            }
            NonBillingReason::InvalidStatusLost => "invalid status - lost",
            NonBillingReason::InvalidStatusInactive => "invalid status - inactive",
            NonBillingReason::ActivationOutsideBillingMonth => "activation outside billing month",
            NonBillingReason::CancellationOutsideBillingMonth => {
                "cancellation outside billing month"
            }
            NonBillingReason::SuspensionOutsideRules => "suspension outside rules",
            NonBillingReason::ReasonUnidentified => "valid status - reason unidentified",
        }
    }
}

impl fmt::Display for NonBillingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Outcome of evaluating one card: the billing flag and, when not billed, why
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub billable: bool,
    pub reason: Option<NonBillingReason>,
}

impl Decision {
    /// The card is billed
    pub fn bill() -> Self {
        Self {
            billable: true,
            reason: None,
        }
    }

    /// The card is not billed for the given reason
    pub fn reject(reason: NonBillingReason) -> Self {
        Self {
            billable: false,
            reason: Some(reason),
        }
    }

    /// Reason label, empty when billable
    pub fn reason_label(&self) -> &'static str {
        self.reason.map(|r| r.label()).unwrap_or("")
    }
}

/// The billing reference ("competência"), represented by the last day of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillingPeriod {
    end: NaiveDate,
}

impl BillingPeriod {
    /// Parse a `YYYY-MM` reference month
    pub fn parse(reference_month: &str) -> BillingResult<Self> {
        let value = reference_month.trim();
        if value.is_empty() {
            return Err(BillingError::MissingReferenceMonth);
        }

        let invalid = || BillingError::InvalidReferenceMonth(value.to_string());
        // chrono would also accept signed or unpadded fields
        let shaped = value.len() == 7
            && value
                .char_indices()
                .all(|(i, c)| if i == 4 { c == '-' } else { c.is_ascii_digit() });
        if !shaped {
            return Err(invalid());
        }

        let first = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
            .map_err(|_| invalid())?;
        Self::from_year_month(first.year(), first.month()).ok_or_else(invalid)
    }

    /// Build the period for a calendar month; `None` if the month is invalid
    pub fn from_year_month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let end = next_first.pred_opt()?;
        debug_assert_eq!(end.month(), first.month());
        Some(Self { end })
    }

    /// Last calendar day of the period
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// First calendar day of the period
    pub fn start(&self) -> NaiveDate {
        self.end.with_day(1).unwrap_or(self.end)
    }

    pub fn year(&self) -> i32 {
        self.end.year()
    }

    pub fn month(&self) -> u32 {
        self.end.month()
    }

    /// Whether `date` falls in the same calendar month and year
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Whether `date` falls in this month or any later month
    pub fn reaches(&self, date: NaiveDate) -> bool {
        (date.year(), date.month()) >= (self.year(), self.month())
    }

    /// `YYYY-MM` label
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// One supplier-roster card after the reference join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimRecord {
    /// Normalized identifier; empty when the supplier cell was blank
    pub iccid: String,
    /// 1-based data row in the supplier roster
    pub source_row: usize,
    pub status: SimStatus,
    pub activation_date: Option<NaiveDate>,
    pub cancellation_date: Option<NaiveDate>,
    pub suspension_date: Option<NaiveDate>,
    pub in_internal_db: bool,
    pub in_acquisition_list: bool,
    pub is_test_chip: bool,
    /// Activation + 90 days, filled for suspended cards with an activation date
    pub loyalty_deadline: Option<NaiveDate>,
    pub billable: bool,
    pub non_billing_reason: Option<NonBillingReason>,
    /// Raw internal database cells in header order, empty when unmatched
    pub internal_values: Vec<String>,
}

impl SimRecord {
    /// Create a record with no dates and no flags set
    pub fn new(iccid: String, status: SimStatus) -> Self {
        let in_internal_db = status != SimStatus::NotInInternalDb;
        Self {
            iccid,
            source_row: 0,
            status,
            activation_date: None,
            cancellation_date: None,
            suspension_date: None,
            in_internal_db,
            in_acquisition_list: false,
            is_test_chip: false,
            loyalty_deadline: None,
            billable: false,
            non_billing_reason: None,
            internal_values: Vec::new(),
        }
    }

    /// Set the three lifecycle dates
    pub fn with_dates(
        mut self,
        activation: Option<NaiveDate>,
        cancellation: Option<NaiveDate>,
        suspension: Option<NaiveDate>,
    ) -> Self {
        self.activation_date = activation;
        self.cancellation_date = cancellation;
        self.suspension_date = suspension;
        self
    }

    /// Set the two reference-list membership flags
    pub fn with_membership(mut self, in_acquisition_list: bool, is_test_chip: bool) -> Self {
        self.in_acquisition_list = in_acquisition_list;
        self.is_test_chip = is_test_chip;
        self
    }

    /// Store an evaluation outcome on the record
    pub fn apply(&mut self, decision: Decision) {
        self.billable = decision.billable;
        self.non_billing_reason = decision.reason;
    }

    /// The stored outcome
    pub fn decision(&self) -> Decision {
        Decision {
            billable: self.billable,
            reason: self.non_billing_reason,
        }
    }

    /// Reason label, empty when billable
    pub fn reason_label(&self) -> &'static str {
        self.decision().reason_label()
    }
}

/// The four input datasets of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    SupplierRoster,
    InternalDatabase,
    AcquisitionList,
    TestChipList,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::SupplierRoster,
        DatasetKind::InternalDatabase,
        DatasetKind::AcquisitionList,
        DatasetKind::TestChipList,
    ];
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::SupplierRoster => "supplier roster",
            DatasetKind::InternalDatabase => "internal database",
            DatasetKind::AcquisitionList => "acquisition list",
            DatasetKind::TestChipList => "test-chip list",
        };
        f.pad(name)
    }
}

/// Errors that can occur during a billing reconciliation run
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Reference month not provided")]
    MissingReferenceMonth,
    #[error("Invalid reference month '{0}': expected YYYY-MM")]
    InvalidReferenceMonth(String),
    #[error("Dataset not supplied: {0}")]
    MissingDataset(DatasetKind),
    #[error("Unknown supplier: {0}")]
    UnknownSupplier(String),
    #[error("{dataset}: missing column '{column}'")]
    MissingColumn { dataset: DatasetKind, column: String },
    #[error("{dataset}, row {row}, column '{column}': cannot parse date '{value}'")]
    DateParse {
        dataset: DatasetKind,
        row: usize,
        column: String,
        value: String,
    },
    #[error("Identifier {iccid} appears {count} times in the internal database")]
    DuplicateIdentifier { iccid: String, count: usize },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Read error: {0}")]
    Read(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for billing operations
pub type BillingResult<T> = Result<T, BillingError>;
