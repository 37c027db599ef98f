use std::fmt;

use thiserror::Error;

use crate::money::Money;
use crate::types::{InstallmentId, LoanId, LoanKey};

/// what a failed lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Loan(LoanId),
    LoanByKey(LoanKey),
    Installment { loan_id: LoanId, week: u32 },
    InstallmentById(InstallmentId),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Loan(id) => write!(f, "loan {}", id),
            Entity::LoanByKey(key) => write!(f, "loan for {}", key),
            Entity::Installment { loan_id, week } => {
                write!(f, "installment week {} of loan {}", week, loan_id)
            }
            Entity::InstallmentById(id) => write!(f, "installment {}", id),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("not found: {entity}")]
    NotFound {
        entity: Entity,
    },

    #[error("week {week} is outside the loan term of {max_week} weeks")]
    OutOfRange {
        week: u32,
        max_week: u32,
    },

    #[error("week {week} has already been paid")]
    AlreadyPaid {
        week: u32,
    },

    #[error("insufficient payment for week {week}: due {due}, tendered {tendered}")]
    InsufficientPayment {
        week: u32,
        due: Money,
        tendered: Money,
    },

    #[error("loan already exists for {key}")]
    Conflict {
        key: LoanKey,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

/// closed set of failure kinds a boundary layer maps to caller-visible errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    OutOfRange,
    AlreadyPaid,
    Conflict,
    Storage,
}

impl BillingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        BillingError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        BillingError::Storage {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Validation { .. } | BillingError::InsufficientPayment { .. } => {
                ErrorKind::Validation
            }
            BillingError::NotFound { .. } => ErrorKind::NotFound,
            BillingError::OutOfRange { .. } => ErrorKind::OutOfRange,
            BillingError::AlreadyPaid { .. } => ErrorKind::AlreadyPaid,
            BillingError::Conflict { .. } => ErrorKind::Conflict,
            BillingError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// only storage failures are worth retrying from scratch
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
