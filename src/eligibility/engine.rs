//! Billing eligibility rule engine
//!
//! [`EligibilityEngine::evaluate`] is a pure function of one record and the
//! billing period. Branch order matters and is part of the contract:
//!
//! 1. test chips are routed to their own sub-ruleset,
//! 2. cards outside both the internal database and the acquisition list are excluded,
//! 3. everything else is disposed of by status and dates.
//!
//! The decision and its reason come out of the same call, so a card is never
//! billed with a reason attached or excluded without one.

use chrono::{Days, NaiveDate};

use crate::eligibility::ruleset::{LoyaltyCheck, RuleSet, TestChipOutsideDb};
use crate::types::*;

/// Length of the contractual loyalty window after activation
pub const LOYALTY_WINDOW_DAYS: u64 = 90;

/// Activation date plus the loyalty window
pub fn loyalty_deadline(activation: NaiveDate) -> Option<NaiveDate> {
    activation.checked_add_days(Days::new(LOYALTY_WINDOW_DAYS))
}

/// Evaluate a record with the current rule revision
pub fn evaluate(record: &SimRecord, period: &BillingPeriod) -> Decision {
    EligibilityEngine::default().evaluate(record, period)
}

/// Rule engine bound to one rule set
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityEngine {
    rules: RuleSet,
}

impl EligibilityEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Decide whether a card is billed for the period
    pub fn evaluate(&self, record: &SimRecord, period: &BillingPeriod) -> Decision {
        if record.is_test_chip {
            return self.evaluate_test_chip(record, period);
        }

        if !record.in_internal_db && !record.in_acquisition_list {
            return Decision::reject(NonBillingReason::OutsideInternalDbAndAcquisitionList);
        }

        match &record.status {
            SimStatus::Extraviado => Decision::reject(NonBillingReason::InvalidStatusLost),
            SimStatus::Inativo => Decision::reject(NonBillingReason::InvalidStatusInactive),
            SimStatus::Ativo | SimStatus::Cancelado | SimStatus::Suspenso => {
                self.evaluate_dates(record, period)
            }
            SimStatus::NotInInternalDb => {
                if record.in_acquisition_list {
                    Decision::bill()
                } else {
                    Decision::reject(NonBillingReason::OutsideInternalDbAndAcquisitionList)
                }
            }
            SimStatus::Other(_) => Decision::reject(NonBillingReason::ReasonUnidentified),
        }
    }

    fn evaluate_test_chip(&self, record: &SimRecord, period: &BillingPeriod) -> Decision {
        match &record.status {
            SimStatus::Extraviado => Decision::reject(NonBillingReason::InvalidStatusLost),
            SimStatus::Inativo => Decision::bill(),
            SimStatus::Ativo | SimStatus::Cancelado | SimStatus::Suspenso => {
                self.evaluate_dates(record, period)
            }
            SimStatus::NotInInternalDb => match self.rules.test_chip_outside_db() {
                TestChipOutsideDb::Billable => Decision::bill(),
                TestChipOutsideDb::RequireAcquisitionList if record.in_acquisition_list => {
                    Decision::bill()
                }
                TestChipOutsideDb::RequireAcquisitionList => {
                    Decision::reject(NonBillingReason::OutsideInternalDbAndAcquisitionList)
                }
            },
            SimStatus::Other(_) => Decision::reject(NonBillingReason::ReasonUnidentified),
        }
    }

    /// Date rules shared by both paths for ATIVO, CANCELADO and SUSPENSO
    fn evaluate_dates(&self, record: &SimRecord, period: &BillingPeriod) -> Decision {
        match record.status {
            SimStatus::Ativo => match record.activation_date {
                Some(activation) if activation <= period.end() => Decision::bill(),
                _ => Decision::reject(NonBillingReason::ActivationOutsideBillingMonth),
            },
            SimStatus::Cancelado => match record.cancellation_date {
                Some(cancellation) if period.contains(cancellation) => Decision::bill(),
                _ => Decision::reject(NonBillingReason::CancellationOutsideBillingMonth),
            },
            SimStatus::Suspenso => {
                if self.suspension_qualifies(record, period) {
                    Decision::bill()
                } else {
                    Decision::reject(NonBillingReason::SuspensionOutsideRules)
                }
            }
            _ => Decision::reject(NonBillingReason::ReasonUnidentified),
        }
    }

    /// Whether a suspended card is still billed for the period
    pub fn suspension_qualifies(&self, record: &SimRecord, period: &BillingPeriod) -> bool {
        let Some(suspension) = record.suspension_date else {
            return false;
        };

        if period.contains(suspension) {
            return true;
        }

        if let Some(deadline) = record.activation_date.and_then(loyalty_deadline) {
            let deadline_in_window = match self.rules.loyalty_check() {
                LoyaltyCheck::SameMonth => period.contains(deadline),
                LoyaltyCheck::SameMonthOrLater => period.reaches(deadline),
            };
            if suspension <= deadline && deadline_in_window {
                return true;
            }
        }

        self.rules.suspension_after_period() && suspension > period.end()
    }

    /// Evaluate every record in place, filling the loyalty deadline of
    /// suspended cards. Returns the number of billable records.
    pub fn evaluate_all(&self, records: &mut [SimRecord], period: &BillingPeriod) -> usize {
        let mut billable = 0;
        for record in records.iter_mut() {
            record.loyalty_deadline = match record.status {
                SimStatus::Suspenso => record.activation_date.and_then(loyalty_deadline),
                _ => None,
            };

            let decision = self.evaluate(record, period);
            if decision.billable {
                billable += 1;
            }
            record.apply(decision);
        }
        billable
    }
}
