/// quick start - create a weekly loan and pay the first week
use loan_billing_rs::{
    BillingConfig, BillingService, JsonView, LoanKey, LoanTerms, LoanView, MemoryStore, Money,
    PaymentRequest, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = BillingService::new(
        MemoryStore::new(),
        BillingConfig::from_env()?,
        SafeTimeProvider::new(TimeSource::System),
    )?;

    // 5,000,000 at 10% flat over 50 weeks
    let loan = service.create_loan(
        LoanKey::new(1, 100),
        LoanTerms::new(Money::from_minor(5_000_000), Rate::from_percentage(10), 50),
    )?;

    // pay week one
    service.make_payment(loan.id, PaymentRequest::week(1))?;

    // print current state
    let loan = service.get_loan(loan.id)?;
    println!("{}", LoanView::from(&loan).to_json_pretty());

    Ok(())
}
