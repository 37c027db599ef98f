/// delinquency - consecutive missed weeks against the configured threshold
use loan_billing_rs::{
    BillingConfig, BillingService, JsonView, LoanKey, LoanTerms, MemoryStore, Money,
    PaymentRequest, Rate, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    println!("=== delinquency ===\n");

    // MISSED_PAYMENT_MAX overrides the default of 2
    let config = BillingConfig::from_env()?;
    println!("threshold: {} missed weeks\n", config.missed_payment_threshold);

    let service = BillingService::new(
        MemoryStore::new(),
        config,
        SafeTimeProvider::new(TimeSource::System),
    )?;

    let terms = LoanTerms::new(Money::from_minor(600_000), Rate::from_percentage(5), 6);

    // pays every other week
    let alternating = service.create_loan(LoanKey::new(1, 1), terms)?;
    for week in [1, 3, 5] {
        service.make_payment(alternating.id, PaymentRequest::week(week))?;
    }

    // stops paying after week two
    let lapsed = service.create_loan(LoanKey::new(2, 1), terms)?;
    for week in [1, 2] {
        service.make_payment(lapsed.id, PaymentRequest::week(week))?;
    }

    for loan in [&alternating, &lapsed] {
        println!("{}", service.is_delinquent(loan.id)?.to_json_pretty());
        let report = service.delinquency_report(loan.id)?;
        println!(
            "  missed {} weeks, longest run {}\n",
            report.missed_weeks, report.longest_missed_run
        );
    }

    Ok(())
}
