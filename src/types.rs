use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::{Money, Rate};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// business key of a loan, unique across the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanKey {
    pub customer_id: u64,
    pub loan_id: u64,
}

impl LoanKey {
    pub fn new(customer_id: u64, loan_id: u64) -> Self {
        Self { customer_id, loan_id }
    }
}

impl fmt::Display for LoanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "customer {} loan {}", self.customer_id, self.loan_id)
    }
}

/// how a caller identifies the loan it wants to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanRef {
    Id(LoanId),
    Key(LoanKey),
}

impl From<LoanId> for LoanRef {
    fn from(id: LoanId) -> Self {
        LoanRef::Id(id)
    }
}

impl From<LoanKey> for LoanRef {
    fn from(key: LoanKey) -> Self {
        LoanRef::Key(key)
    }
}

/// loan terms as agreed at origination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    /// amount lent, in minor units
    pub principal: Money,
    /// flat interest, charged once on principal
    pub rate: Rate,
    /// term length in weeks
    pub weeks: u32,
}

impl LoanTerms {
    pub fn new(principal: Money, rate: Rate, weeks: u32) -> Self {
        Self { principal, rate, weeks }
    }
}
