use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info, instrument};

use crate::config::BillingConfig;
use crate::delinquency::{DelinquencyEvaluator, DelinquencyReport};
use crate::errors::Result;
use crate::ledger::{PaymentLedger, PaymentReceipt, PaymentRequest};
use crate::loan::{Installment, Loan};
use crate::schedule::create_schedule;
use crate::store::{BillingStore, LoanRepository};
use crate::types::{LoanId, LoanKey, LoanRef, LoanTerms};
use crate::views::{CreateLoanRequest, DelinquencyView, OutstandingView};

/// request-scoped billing operations over a store
pub struct BillingService<S> {
    store: S,
    ledger: PaymentLedger,
    evaluator: DelinquencyEvaluator,
    time: SafeTimeProvider,
}

impl<S: BillingStore> BillingService<S> {
    pub fn new(store: S, config: BillingConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            ledger: PaymentLedger::new(),
            evaluator: DelinquencyEvaluator::from_config(&config),
            time,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// create a loan and its whole schedule in one unit of work
    #[instrument(level = "debug", skip(self))]
    pub fn create_loan(&self, key: LoanKey, terms: LoanTerms) -> Result<Loan> {
        let schedule = create_schedule(terms)?;
        let loan = Loan::originate(key, &schedule, &self.time)?;

        self.store.run_transaction(|repo| repo.create_loan(&loan))?;

        info!(
            loan_id = %loan.id,
            customer_id = key.customer_id,
            weeks = terms.weeks,
            total_payable = %loan.total_payable,
            weekly_amount = %loan.weekly_amount,
            "loan created"
        );
        Ok(loan)
    }

    pub fn create_loan_from_request(&self, request: CreateLoanRequest) -> Result<Loan> {
        let (key, terms) = request.into_parts()?;
        self.create_loan(key, terms)
    }

    /// loan with installments
    #[instrument(level = "debug", skip(self))]
    pub fn get_loan(&self, id: LoanId) -> Result<Loan> {
        self.store.with_default(|repo| repo.find_loan_by_id(id, true))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn find_loan(&self, key: LoanKey, include_installments: bool) -> Result<Loan> {
        self.store
            .with_default(|repo| repo.find_loan_by_key(key, include_installments))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_installment(&self, id: LoanId, week: u32) -> Result<Installment> {
        self.store.with_default(|repo| repo.find_installment(id, week))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn get_outstanding(&self, id: LoanId) -> Result<OutstandingView> {
        let loan = self.store.with_default(|repo| repo.find_loan_by_id(id, false))?;
        Ok(OutstandingView::from(&loan))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn is_delinquent(&self, id: LoanId) -> Result<DelinquencyView> {
        let loan = self.get_loan(id)?;
        let delinquent = self.evaluator.is_delinquent(&loan.installments);

        debug!(
            loan_id = %loan.id,
            threshold = self.evaluator.threshold(),
            delinquent,
            "delinquency evaluated"
        );
        Ok(DelinquencyView::new(&loan, delinquent))
    }

    pub fn delinquency_report(&self, id: LoanId) -> Result<DelinquencyReport> {
        let loan = self.get_loan(id)?;
        Ok(self.evaluator.assess(&loan.installments))
    }

    /// pay one week of a loan.
    ///
    /// Lookup, validation and both writes share one transaction; any failure
    /// leaves the stored loan exactly as it was.
    #[instrument(level = "debug", skip(self, loan))]
    pub fn make_payment(
        &self,
        loan: impl Into<LoanRef>,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt> {
        let loan_ref = loan.into();
        let paid_at = self.time.now();

        let receipt = self.store.run_transaction(|repo| {
            let mut loan = load_loan(repo, loan_ref)?;
            self.ledger.verify_balance(&loan)?;

            let receipt = self.ledger.apply_payment(&mut loan, &request, paid_at)?;
            let installment = repo.mark_installment_paid(receipt.installment.id, paid_at)?;
            repo.update_outstanding(loan.id, receipt.outstanding)?;

            Ok(PaymentReceipt {
                installment,
                ..receipt
            })
        })?;

        info!(
            loan_id = %receipt.loan_id,
            customer_id = receipt.key.customer_id,
            week = receipt.installment.week,
            outstanding = %receipt.outstanding,
            "payment applied"
        );
        Ok(receipt)
    }
}

fn load_loan(repo: &dyn LoanRepository, loan: LoanRef) -> Result<Loan> {
    match loan {
        LoanRef::Id(id) => repo.find_loan_by_id(id, true),
        LoanRef::Key(key) => repo.find_loan_by_key(key, true),
    }
}
