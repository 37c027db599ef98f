pub mod calendar;
pub mod config;
pub mod delinquency;
pub mod errors;
pub mod ledger;
pub mod loan;
pub mod money;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use calendar::{week_window, weekly_windows, WeekWindow};
pub use config::BillingConfig;
pub use delinquency::{DelinquencyEvaluator, DelinquencyReport};
pub use errors::{BillingError, Entity, ErrorKind, Result};
pub use ledger::{PaymentLedger, PaymentReceipt, PaymentRequest};
pub use loan::{Installment, Loan};
pub use money::{Money, Rate};
pub use schedule::{create_schedule, Schedule, ScheduledInstallment};
pub use service::BillingService;
pub use store::{BillingStore, LoanRepository, MemoryStore};
pub use types::{InstallmentId, LoanId, LoanKey, LoanRef, LoanTerms};
pub use views::{
    CreateLoanRequest, DelinquencyView, JsonView, LoanView, OutstandingView, PaymentView,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use uuid::Uuid;
