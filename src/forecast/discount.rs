//! Present-value discounting of cumulative recovery curves
//!
//! Each month's incremental recovery is discounted back to charge-off at
//! the monthly rate (annual rate / 12) and the curve is re-accumulated.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cohort::{AccountCurves, CohortCurves};

/// Single-rate monthly discounting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyDiscount {
    /// Annual discount rate as a decimal
    pub annual_rate: f64,
}

impl MonthlyDiscount {
    pub fn from_annual(annual_rate: f64) -> Self {
        Self { annual_rate }
    }

    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / 12.0
    }

    /// One-month discount factor
    pub fn discount_factor(&self) -> f64 {
        1.0 / (1.0 + self.monthly_rate())
    }

    /// Present value of a cumulative series indexed by month
    pub fn present_value_cumulative(&self, cumulative: &[f64]) -> Vec<f64> {
        if self.monthly_rate() == 0.0 {
            return cumulative.to_vec();
        }

        let v = self.discount_factor();
        let mut factor = 1.0;
        let mut previous = 0.0;
        let mut total = 0.0;
        cumulative
            .iter()
            .map(|&value| {
                total += (value - previous) * factor;
                previous = value;
                factor *= v;
                total
            })
            .collect()
    }

    /// Discount the actual and predicted curves of one account
    pub fn discount_account(&self, account: AccountCurves) -> AccountCurves {
        AccountCurves {
            actual: self.present_value_cumulative(&account.actual),
            predicted: self.present_value_cumulative(&account.predicted),
            ..account
        }
    }
}

/// Discount every account of a cohort; accounts are independent and processed in parallel
pub fn discount_cohort(cohort: CohortCurves, discount: &MonthlyDiscount) -> CohortCurves {
    let accounts = cohort
        .accounts
        .into_par_iter()
        .map(|account| discount.discount_account(account))
        .collect();

    CohortCurves { accounts, ..cohort }
}
