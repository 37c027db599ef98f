use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::{weekly_windows, WeekWindow};
use crate::errors::{BillingError, Result};
use crate::money::Money;
use crate::schedule::Schedule;
use crate::types::{InstallmentId, LoanId, LoanKey, LoanTerms};

/// one weekly obligation of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub week: u32,
    pub amount: Money,
    pub paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub due: WeekWindow,
}

impl Installment {
    /// flip to paid; the only mutation an installment supports
    pub(crate) fn settle(&mut self, paid_at: DateTime<Utc>) {
        self.paid = true;
        self.paid_at = Some(paid_at);
    }
}

/// a loan together with its weekly installments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,
    pub key: LoanKey,
    pub terms: LoanTerms,
    pub total_payable: Money,
    pub weekly_amount: Money,
    pub outstanding: Money,
    pub created_at: DateTime<Utc>,
    /// empty when loaded without installments
    #[serde(default)]
    pub installments: Vec<Installment>,
}

impl Loan {
    /// build a new loan and its full installment sequence from a schedule.
    ///
    /// Fails with `Validation` on `weeks` when the due windows would run past
    /// the last representable date.
    pub fn originate(
        key: LoanKey,
        schedule: &Schedule,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        let id = Uuid::new_v4();
        let created_at = time_provider.now();
        let windows = weekly_windows(created_at, schedule.terms.weeks)?;

        let installments = schedule
            .installments
            .iter()
            .zip(windows)
            .map(|(scheduled, due)| Installment {
                id: Uuid::new_v4(),
                loan_id: id,
                week: scheduled.week,
                amount: scheduled.amount,
                paid: false,
                paid_at: None,
                due,
            })
            .collect();

        Ok(Self {
            id,
            key,
            terms: schedule.terms,
            total_payable: schedule.total_payable,
            weekly_amount: schedule.weekly_amount,
            outstanding: schedule.total_payable,
            created_at,
            installments,
        })
    }

    /// installments must be exactly weeks 1..=terms.weeks in order, all owned by this loan
    pub fn check_installments(&self) -> Result<()> {
        if self.installments.len() != self.terms.weeks as usize {
            return Err(BillingError::validation(
                "installments",
                format!(
                    "expected {} installments, got {}",
                    self.terms.weeks,
                    self.installments.len()
                ),
            ));
        }

        for (expected, installment) in (1..=self.terms.weeks).zip(&self.installments) {
            if installment.week != expected {
                return Err(BillingError::validation(
                    "installments",
                    format!("expected week {}, got week {}", expected, installment.week),
                ));
            }
            if installment.loan_id != self.id {
                return Err(BillingError::validation(
                    "installments",
                    format!("week {} belongs to loan {}", expected, installment.loan_id),
                ));
            }
        }
        Ok(())
    }

    pub fn installment(&self, week: u32) -> Option<&Installment> {
        self.installments.iter().find(|i| i.week == week)
    }

    pub(crate) fn installment_mut(&mut self, week: u32) -> Option<&mut Installment> {
        self.installments.iter_mut().find(|i| i.week == week)
    }

    /// sum of installments already paid
    pub fn paid_total(&self) -> Money {
        self.installments
            .iter()
            .filter(|i| i.paid)
            .map(|i| i.amount)
            .sum()
    }

    /// amount the truncated weekly schedule never collects
    pub fn residual(&self) -> Money {
        self.total_payable - self.weekly_amount * self.terms.weeks
    }

    /// every installment paid (outstanding may still hold the residual)
    pub fn is_settled(&self) -> bool {
        !self.installments.is_empty() && self.installments.iter().all(|i| i.paid)
    }

    pub fn paid_weeks(&self) -> impl Iterator<Item = u32> + '_ {
        self.installments.iter().filter(|i| i.paid).map(|i| i.week)
    }

    /// copy of the loan header without installments
    pub fn without_installments(&self) -> Self {
        Self {
            installments: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Rate;
    use crate::schedule::create_schedule;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;

    fn test_loan(principal: i64, rate: i64, weeks: u32) -> Loan {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 8, 7, 9, 0, 0).unwrap(),
        ));
        let schedule = create_schedule(LoanTerms::new(
            Money::from_minor(principal),
            Rate::from_percentage(rate),
            weeks,
        ))
        .unwrap();
        Loan::originate(LoanKey::new(1, 100), &schedule, &time).unwrap()
    }

    #[test]
    fn test_originate_builds_contiguous_unpaid_weeks() {
        let loan = test_loan(5_000_000, 10, 50);

        assert_eq!(loan.outstanding, Money::from_minor(5_500_000));
        assert_eq!(loan.installments.len(), 50);
        assert!(loan.installments.iter().all(|i| !i.paid && i.paid_at.is_none()));
        assert!(loan.installments.iter().all(|i| i.loan_id == loan.id));

        let weeks: Vec<u32> = loan.installments.iter().map(|i| i.week).collect();
        assert_eq!(weeks, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_term_running_past_the_calendar_is_rejected() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            DateTime::<Utc>::MAX_UTC - chrono::Duration::weeks(3),
        ));
        let schedule = create_schedule(LoanTerms::new(
            Money::from_minor(1_000),
            Rate::from_percentage(10),
            10,
        ))
        .unwrap();

        let err = Loan::originate(LoanKey::new(1, 100), &schedule, &time).unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "weeks", .. }));
    }

    #[test]
    fn test_check_installments() {
        let loan = test_loan(1_000, 10, 3);
        loan.check_installments().unwrap();

        let mut short = loan.clone();
        short.installments.pop();
        assert!(short.check_installments().is_err());

        let mut reordered = loan.clone();
        reordered.installments.swap(0, 1);
        assert!(matches!(
            reordered.check_installments(),
            Err(BillingError::Validation { field: "installments", .. })
        ));

        let mut foreign = loan.clone();
        foreign.installments[2].loan_id = Uuid::new_v4();
        assert!(foreign.check_installments().is_err());
    }

    #[test]
    fn test_due_windows_follow_creation_week() {
        let loan = test_loan(1_000, 0, 3);

        let first = loan.installment(1).unwrap().due;
        assert_eq!(first.start, Utc.with_ymd_and_hms(2025, 8, 4, 0, 0, 0).unwrap());
        assert!(first.contains(loan.created_at));

        let third = loan.installment(3).unwrap().due;
        assert_eq!(third.start, Utc.with_ymd_and_hms(2025, 8, 18, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_residual_and_settlement() {
        let mut loan = test_loan(1_000, 10, 3);
        assert_eq!(loan.residual(), Money::from_minor(2));
        assert!(!loan.is_settled());

        let now = loan.created_at;
        for installment in loan.installments.iter_mut() {
            installment.settle(now);
        }
        assert!(loan.is_settled());
        assert_eq!(loan.paid_total(), Money::from_minor(1_098));
        assert_eq!(loan.paid_weeks().count(), 3);
    }

    #[test]
    fn test_without_installments() {
        let loan = test_loan(1_000, 10, 3);
        let header = loan.without_installments();

        assert!(header.installments.is_empty());
        assert_eq!(header.outstanding, loan.outstanding);
        assert!(!header.is_settled());
    }

    #[test]
    fn test_json_shape() {
        let loan = test_loan(1_000, 10, 2);
        let json = serde_json::to_value(&loan).unwrap();

        assert_eq!(json["key"]["customerId"], 1);
        assert_eq!(json["totalPayable"], 1_100);
        assert_eq!(json["installments"][0]["week"], 1);
        assert_eq!(json["installments"][0]["paid"], false);
    }
}
