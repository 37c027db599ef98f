use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};
use crate::money::Money;
use crate::types::LoanTerms;

/// one week of a generated schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub week: u32,
    pub amount: Money,
}

/// flat-interest weekly schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub terms: LoanTerms,
    pub total_payable: Money,
    pub weekly_amount: Money,
    /// truncation remainder that no installment collects
    pub residual: Money,
    pub installments: Vec<ScheduledInstallment>,
}

impl Schedule {
    /// get installment for a 1-based week
    pub fn get_installment(&self, week: u32) -> Option<&ScheduledInstallment> {
        week.checked_sub(1)
            .and_then(|index| self.installments.get(index as usize))
    }

    /// sum of every scheduled amount
    pub fn total_scheduled(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }
}

/// generate the weekly schedule for a set of terms.
///
/// total payable is principal plus a flat `rate` percent of it and each week
/// collects total / weeks; both divisions truncate.
pub fn create_schedule(terms: LoanTerms) -> Result<Schedule> {
    if terms.weeks == 0 {
        return Err(BillingError::validation("weeks", "loan term must be at least one week"));
    }
    if terms.principal.is_negative() {
        return Err(BillingError::validation(
            "principal",
            format!("must not be negative, got {}", terms.principal),
        ));
    }
    if terms.rate.is_negative() {
        return Err(BillingError::validation(
            "rate",
            format!("must not be negative, got {}", terms.rate),
        ));
    }

    let interest = terms
        .principal
        .checked_percentage(terms.rate)
        .ok_or_else(|| BillingError::validation("principal", "interest calculation overflows"))?;
    let total_payable = terms
        .principal
        .checked_add(interest)
        .ok_or_else(|| BillingError::validation("principal", "total payable overflows"))?;
    let weekly_amount = total_payable
        .checked_div(terms.weeks)
        .ok_or_else(|| BillingError::validation("weeks", "loan term must be at least one week"))?;

    let installments: Vec<ScheduledInstallment> = (1..=terms.weeks)
        .map(|week| ScheduledInstallment {
            week,
            amount: weekly_amount,
        })
        .collect();

    // weekly * weeks <= total_payable, so this cannot overflow
    let residual = total_payable - installments.iter().map(|i| i.amount).sum::<Money>();

    Ok(Schedule {
        terms,
        total_payable,
        weekly_amount,
        residual,
        installments,
    })
}
