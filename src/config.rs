use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{BillingError, Result};

/// environment variable holding the missed payment threshold
pub const MISSED_PAYMENT_MAX_VAR: &str = "MISSED_PAYMENT_MAX";

/// consecutive unpaid weeks before a loan counts as delinquent
pub const DEFAULT_MISSED_PAYMENT_THRESHOLD: u32 = 2;

/// billing configuration, built once and handed to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingConfig {
    pub missed_payment_threshold: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            missed_payment_threshold: DEFAULT_MISSED_PAYMENT_THRESHOLD,
        }
    }
}

impl BillingConfig {
    pub fn new(missed_payment_threshold: u32) -> Result<Self> {
        let config = Self { missed_payment_threshold };
        config.validate()?;
        Ok(config)
    }

    /// load from the process environment, reading `.env` if one exists.
    ///
    /// A missing or unparsable `MISSED_PAYMENT_MAX` falls back to the default;
    /// an explicit zero is rejected.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_value(env::var(MISSED_PAYMENT_MAX_VAR).ok().as_deref())
    }

    fn from_value(raw: Option<&str>) -> Result<Self> {
        let threshold = match raw.map(str::trim).map(str::parse::<u32>) {
            Some(Ok(value)) => value,
            Some(Err(_)) | None => {
                tracing::debug!(
                    var = MISSED_PAYMENT_MAX_VAR,
                    default = DEFAULT_MISSED_PAYMENT_THRESHOLD,
                    "missed payment threshold not set, using default"
                );
                DEFAULT_MISSED_PAYMENT_THRESHOLD
            }
        };
        Self::new(threshold)
    }

    pub fn validate(&self) -> Result<()> {
        if self.missed_payment_threshold == 0 {
            return Err(BillingError::validation(
                "missed_payment_threshold",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
