//! serializable request and response shapes for a transport layer
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{BillingError, Result};
use crate::ledger::PaymentReceipt;
use crate::loan::{Installment, Loan};
use crate::money::{Money, Rate};
use crate::types::{LoanId, LoanKey, LoanTerms};

/// json body for creating a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub customer_id: u64,
    pub loan_id: u64,
    pub loan_amount: i64,
    pub loan_interest: i64,
    pub loan_weeks: i64,
}

impl CreateLoanRequest {
    /// split into business key and terms, rejecting a term that is not a positive week count
    pub fn into_parts(self) -> Result<(LoanKey, LoanTerms)> {
        let weeks = u32::try_from(self.loan_weeks)
            .ok()
            .filter(|weeks| *weeks > 0)
            .ok_or_else(|| {
                BillingError::validation(
                    "weeks",
                    format!("loan term must be a positive week count, got {}", self.loan_weeks),
                )
            })?;

        Ok((
            LoanKey::new(self.customer_id, self.loan_id),
            LoanTerms::new(
                Money::from_minor(self.loan_amount),
                Rate::from_percentage(self.loan_interest),
                weeks,
            ),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub id: LoanId,
    pub customer_id: u64,
    pub loan_id: u64,
    pub loan_amount: Money,
    pub loan_interest: Rate,
    pub loan_weeks: u32,
    pub loan_weekly_amount: Money,
    pub total_payable: Money,
    pub outstanding: Money,
    pub residual: Money,
    pub created_at: DateTime<Utc>,
    pub payments: Vec<Installment>,
}

impl From<&Loan> for LoanView {
    fn from(loan: &Loan) -> Self {
        LoanView {
            id: loan.id,
            customer_id: loan.key.customer_id,
            loan_id: loan.key.loan_id,
            loan_amount: loan.terms.principal,
            loan_interest: loan.terms.rate,
            loan_weeks: loan.terms.weeks,
            loan_weekly_amount: loan.weekly_amount,
            total_payable: loan.total_payable,
            outstanding: loan.outstanding,
            residual: loan.residual(),
            created_at: loan.created_at,
            payments: loan.installments.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingView {
    pub id: LoanId,
    pub customer_id: u64,
    pub loan_id: u64,
    pub outstanding: Money,
}

impl From<&Loan> for OutstandingView {
    fn from(loan: &Loan) -> Self {
        OutstandingView {
            id: loan.id,
            customer_id: loan.key.customer_id,
            loan_id: loan.key.loan_id,
            outstanding: loan.outstanding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelinquencyView {
    pub id: LoanId,
    pub customer_id: u64,
    pub loan_id: u64,
    pub is_delinquent: bool,
}

impl DelinquencyView {
    pub fn new(loan: &Loan, is_delinquent: bool) -> Self {
        DelinquencyView {
            id: loan.id,
            customer_id: loan.key.customer_id,
            loan_id: loan.key.loan_id,
            is_delinquent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub customer_id: u64,
    pub loan_id: u64,
    pub outstanding: Money,
    pub payment: Installment,
}

impl From<&PaymentReceipt> for PaymentView {
    fn from(receipt: &PaymentReceipt) -> Self {
        PaymentView {
            customer_id: receipt.key.customer_id,
            loan_id: receipt.key.loan_id,
            outstanding: receipt.outstanding,
            payment: receipt.installment.clone(),
        }
    }
}

/// pretty json rendering for any view
pub trait JsonView: Serialize {
    fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("JSON error: {}", e))
    }
}

impl JsonView for LoanView {}
impl JsonView for OutstandingView {}
impl JsonView for DelinquencyView {}
impl JsonView for PaymentView {}
