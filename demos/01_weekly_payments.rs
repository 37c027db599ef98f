/// weekly payments - pay through a loan week by week with controlled time
use chrono::{Duration, TimeZone, Utc};
use loan_billing_rs::{
    BillingConfig, BillingError, BillingService, JsonView, LoanKey, LoanTerms, MemoryStore,
    Money, PaymentRequest, PaymentView, Rate, SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== weekly payments ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2025, 8, 4, 9, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let service = BillingService::new(MemoryStore::new(), BillingConfig::default(), time.clone())?;

    // 1,000 at 10% over 3 weeks: 366 a week, 2 left over
    let loan = service.create_loan(
        LoanKey::new(42, 1),
        LoanTerms::new(Money::from_minor(1_000), Rate::from_percentage(10), 3),
    )?;
    println!(
        "total payable {} weekly {} residual {}\n",
        loan.total_payable,
        loan.weekly_amount,
        loan.residual()
    );

    for week in 1..=loan.terms.weeks {
        let receipt = service.make_payment(LoanKey::new(42, 1), PaymentRequest::week(week))?;
        println!(
            "{} paid week {} outstanding {}",
            time.now().format("%Y-%m-%d"),
            week,
            receipt.outstanding
        );
        if week == loan.terms.weeks {
            println!("\nlast receipt:");
            println!("{}", PaymentView::from(&receipt).to_json_pretty());
        }
        controller.advance(Duration::weeks(1));
    }

    // paying a settled week is refused
    match service.make_payment(loan.id, PaymentRequest::week(1)) {
        Err(BillingError::AlreadyPaid { week }) => println!("\nweek {} already paid", week),
        other => println!("\nunexpected: {:?}", other),
    }

    // so is a week past the term
    if let Err(e) = service.make_payment(loan.id, PaymentRequest::week(4)) {
        println!("{}", e);
    }

    println!("\n{}", service.get_outstanding(loan.id)?.to_json_pretty());

    Ok(())
}
