//! Lending policy configuration.

use serde::{Deserialize, Serialize};

/// Lending policy settings governing reservations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingConfig {
    /// Loan period in days; a reservation's due date is its creation
    /// time plus this many days.
    #[serde(default = "default_loan_period")]
    pub loan_period_days: i64,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            loan_period_days: default_loan_period(),
        }
    }
}

fn default_loan_period() -> i64 {
    14
}
