use serde::{Deserialize, Serialize};

use crate::config::BillingConfig;
use crate::loan::Installment;

/// delinquency assessment of an installment sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelinquencyReport {
    pub delinquent: bool,
    pub threshold: u32,
    /// longest run of consecutive unpaid weeks
    pub longest_missed_run: u32,
    /// total unpaid weeks, run or not
    pub missed_weeks: u32,
}

/// flags loans with a run of consecutive unpaid weeks at or beyond a threshold.
///
/// A paid week resets the run, so scattered misses never add up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelinquencyEvaluator {
    threshold: u32,
}

impl DelinquencyEvaluator {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &BillingConfig) -> Self {
        Self::new(config.missed_payment_threshold)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// scan weeks in order, stopping as soon as the run reaches the threshold
    pub fn is_delinquent(&self, installments: &[Installment]) -> bool {
        let mut missed = 0;
        for installment in Self::in_week_order(installments) {
            if installment.paid {
                missed = 0;
            } else {
                missed += 1;
            }
            if missed >= self.threshold {
                return true;
            }
        }
        false
    }

    /// full scan with run statistics
    pub fn assess(&self, installments: &[Installment]) -> DelinquencyReport {
        let mut run = 0;
        let mut longest = 0;
        let mut missed_weeks = 0;

        for installment in Self::in_week_order(installments) {
            if installment.paid {
                run = 0;
            } else {
                run += 1;
                missed_weeks += 1;
                longest = longest.max(run);
            }
        }

        DelinquencyReport {
            delinquent: longest >= self.threshold,
            threshold: self.threshold,
            longest_missed_run: longest,
            missed_weeks,
        }
    }

    fn in_week_order(installments: &[Installment]) -> Vec<&Installment> {
        let mut ordered: Vec<&Installment> = installments.iter().collect();
        ordered.sort_by_key(|i| i.week);
        ordered
    }
}

impl Default for DelinquencyEvaluator {
    fn default() -> Self {
        Self::from_config(&BillingConfig::default())
    }
}
