pub mod memory;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::loan::{Installment, Loan};
use crate::money::Money;
use crate::types::{InstallmentId, LoanId, LoanKey};

pub use memory::MemoryStore;

/// handle onto persisted loans, either default-scoped or transaction-scoped
pub trait LoanRepository {
    /// persist a loan with its full installment sequence as one unit
    fn create_loan(&mut self, loan: &Loan) -> Result<LoanId>;

    fn find_loan_by_id(&self, id: LoanId, include_installments: bool) -> Result<Loan>;

    fn find_loan_by_key(&self, key: LoanKey, include_installments: bool) -> Result<Loan>;

    fn find_installment(&self, loan_id: LoanId, week: u32) -> Result<Installment>;

    fn update_outstanding(&mut self, loan_id: LoanId, balance: Money) -> Result<()>;

    /// flip an unpaid installment to paid; a paid one yields `AlreadyPaid`
    fn mark_installment_paid(
        &mut self,
        installment_id: InstallmentId,
        paid_at: DateTime<Utc>,
    ) -> Result<Installment>;
}

/// storage capability handed to the billing service
pub trait BillingStore {
    /// run `work` against the default scope; each write stands on its own
    fn with_default<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>;

    /// run `work` atomically; every write commits together or not at all
    fn run_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>;
}

impl<S: BillingStore> BillingStore for Arc<S> {
    fn with_default<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>,
    {
        self.as_ref().with_default(work)
    }

    fn run_transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn LoanRepository) -> Result<T>,
    {
        self.as_ref().run_transaction(work)
    }
}
