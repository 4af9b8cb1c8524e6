//! Versioned rule sets for the eligibility engine
//!
//! The billing rules went through three revisions. Rather than merging them,
//! each revision is a [`RuleVersion`] and the differences between them are
//! exposed as small policy enums the engine consults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Revision of the billing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVersion {
    /// First revision: loyalty deadline must land in the billing month, late
    /// suspensions are billed and test chips missing from the internal
    /// database are always billed
    V1,
    /// Second revision: drops the late-suspension branch and requires the
    /// acquisition list for test chips missing from the internal database
    V2,
    /// Current revision: the loyalty deadline may land in the billing month
    /// or any later month
    #[default]
    V3,
}

/// How the 90-day loyalty deadline is compared against the billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoyaltyCheck {
    /// Deadline falls in the billing month
    SameMonth,
    /// Deadline falls in the billing month or later
    SameMonthOrLater,
}

/// Disposition of a test chip that has no internal database row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestChipOutsideDb {
    Billable,
    RequireAcquisitionList,
}

impl RuleVersion {
    pub const ALL: [RuleVersion; 3] = [RuleVersion::V1, RuleVersion::V2, RuleVersion::V3];

    pub fn loyalty_check(&self) -> LoyaltyCheck {
        match self {
            RuleVersion::V1 | RuleVersion::V2 => LoyaltyCheck::SameMonth,
            RuleVersion::V3 => LoyaltyCheck::SameMonthOrLater,
        }
    }

    /// Default for the "suspended after the period end" branch
    pub fn suspension_after_period_billable(&self) -> bool {
        matches!(self, RuleVersion::V1)
    }

    pub fn test_chip_outside_db(&self) -> TestChipOutsideDb {
        match self {
            RuleVersion::V1 => TestChipOutsideDb::Billable,
            RuleVersion::V2 | RuleVersion::V3 => TestChipOutsideDb::RequireAcquisitionList,
        }
    }
}

impl fmt::Display for RuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleVersion::V1 => write!(f, "v1"),
            RuleVersion::V2 => write!(f, "v2"),
            RuleVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Rule version plus optional overrides of its defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub version: RuleVersion,
    /// Overrides the version's late-suspension default when set
    #[serde(default)]
    pub suspension_after_period_billable: Option<bool>,
}

impl RuleSet {
    pub fn new(version: RuleVersion) -> Self {
        Self {
            version,
            suspension_after_period_billable: None,
        }
    }

    /// Force the late-suspension branch on or off
    pub fn with_suspension_after_period(mut self, enabled: bool) -> Self {
        self.suspension_after_period_billable = Some(enabled);
        self
    }

    /// Effective late-suspension flag
    pub fn suspension_after_period(&self) -> bool {
        self.suspension_after_period_billable
            .unwrap_or_else(|| self.version.suspension_after_period_billable())
    }

    pub fn loyalty_check(&self) -> LoyaltyCheck {
        self.version.loyalty_check()
    }

    pub fn test_chip_outside_db(&self) -> TestChipOutsideDb {
        self.version.test_chip_outside_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defaults() {
        assert_eq!(RuleVersion::default(), RuleVersion::V3);
        assert!(RuleVersion::V1.suspension_after_period_billable());
        assert!(!RuleVersion::V2.suspension_after_period_billable());
        assert!(!RuleVersion::V3.suspension_after_period_billable());
        assert_eq!(RuleVersion::V2.loyalty_check(), LoyaltyCheck::SameMonth);
        assert_eq!(RuleVersion::V3.loyalty_check(), LoyaltyCheck::SameMonthOrLater);
        assert_eq!(
            RuleVersion::V1.test_chip_outside_db(),
            TestChipOutsideDb::Billable
        );
    }

    #[test]
    fn test_override_wins_over_version() {
        let rules = RuleSet::new(RuleVersion::V3).with_suspension_after_period(true);
        assert!(rules.suspension_after_period());

        let rules = RuleSet::new(RuleVersion::V1).with_suspension_after_period(false);
        assert!(!rules.suspension_after_period());

        assert!(RuleSet::new(RuleVersion::V1).suspension_after_period());
    }
}
