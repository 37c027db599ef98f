use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Entity, Result};
use crate::loan::{Installment, Loan};
use crate::money::Money;
use crate::types::{LoanId, LoanKey};

/// payment request for one week of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub week: u32,
    /// amount handed over; `None` means exactly the installment amount
    #[serde(default)]
    pub amount: Option<Money>,
}

impl PaymentRequest {
    pub fn week(week: u32) -> Self {
        Self { week, amount: None }
    }

    pub fn with_amount(week: u32, amount: Money) -> Self {
        Self {
            week,
            amount: Some(amount),
        }
    }
}

/// result of a successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub loan_id: LoanId,
    pub key: LoanKey,
    pub outstanding: Money,
    pub installment: Installment,
}

/// applies weekly payments to an in-memory loan
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentLedger;

impl PaymentLedger {
    pub fn new() -> Self {
        Self
    }

    /// check a request against the loan, first failure wins:
    /// week range, installment exists and is unpaid, tendered amount covers it
    pub fn validate<'a>(&self, loan: &'a Loan, request: &PaymentRequest) -> Result<&'a Installment> {
        let week = request.week;
        if week < 1 || week > loan.terms.weeks {
            return Err(BillingError::OutOfRange {
                week,
                max_week: loan.terms.weeks,
            });
        }

        let installment = loan.installment(week).ok_or(BillingError::NotFound {
            entity: Entity::Installment {
                loan_id: loan.id,
                week,
            },
        })?;

        if installment.paid {
            return Err(BillingError::AlreadyPaid { week });
        }

        if let Some(tendered) = request.amount {
            if tendered < installment.amount {
                return Err(BillingError::InsufficientPayment {
                    week,
                    due: installment.amount,
                    tendered,
                });
            }
        }

        Ok(installment)
    }

    /// mark the requested week paid and take its amount off the outstanding balance.
    ///
    /// The loan is left untouched when validation fails.
    pub fn apply_payment(
        &self,
        loan: &mut Loan,
        request: &PaymentRequest,
        paid_at: DateTime<Utc>,
    ) -> Result<PaymentReceipt> {
        let amount = self.validate(loan, request)?.amount;
        let loan_id = loan.id;

        let installment = loan
            .installment_mut(request.week)
            .ok_or(BillingError::NotFound {
                entity: Entity::Installment {
                    loan_id,
                    week: request.week,
                },
            })?;
        installment.settle(paid_at);
        let installment = installment.clone();

        loan.outstanding -= amount;

        Ok(PaymentReceipt {
            loan_id: loan.id,
            key: loan.key,
            outstanding: loan.outstanding,
            installment,
        })
    }

    /// outstanding must equal total payable less every paid installment;
    /// a mismatch is inconsistent stored data and reports as `Storage`
    pub fn verify_balance(&self, loan: &Loan) -> Result<()> {
        let expected = loan.total_payable - loan.paid_total();
        if loan.outstanding != expected {
            return Err(BillingError::storage(format!(
                "loan {} balance {} does not match total payable {} less paid {}",
                loan.id,
                loan.outstanding,
                loan.total_payable,
                loan.paid_total()
            )));
        }
        Ok(())
    }

    /// amount still due on unpaid installments
    pub fn scheduled_remaining(&self, loan: &Loan) -> Money {
        loan.installments
            .iter()
            .filter(|i| !i.paid)
            .map(|i| i.amount)
            .sum()
    }
}
