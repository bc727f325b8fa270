//! Vintage filtering and dense per-cohort recovery curves
//!
//! The dataset stores curves with blank cells; forecasting works on dense
//! curves truncated to the horizon. Building a `CohortCurves` is where a
//! cohort is validated: every account must carry actual values for the
//! elapsed months and predicted values for months `0..=horizon`.

use log::warn;
use serde::Serialize;

use crate::account::{actual_column, predicted_column, Account, AccountInfo, Dataset, Vintage};
use crate::error::{RecoveryError, RecoveryResult};

/// Select the accounts of the requested vintages, grouped per vintage in ascending order
///
/// Vintages absent from the dataset are logged and skipped.
pub fn select_vintages<'a>(dataset: &'a Dataset, vintages: &[Vintage]) -> Vec<(Vintage, Vec<&'a Account>)> {
    let mut wanted = vintages.to_vec();
    wanted.sort();
    wanted.dedup();

    wanted
        .into_iter()
        .filter_map(|vintage| {
            let accounts: Vec<&Account> = dataset
                .accounts
                .iter()
                .filter(|a| a.info.vintage == vintage)
                .collect();
            if accounts.is_empty() {
                warn!("Vintage {} has no accounts in the dataset", vintage);
                None
            } else {
                Some((vintage, accounts))
            }
        })
        .collect()
}

/// Dense cumulative recovery curves of one account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountCurves {
    pub info: AccountInfo,

    /// Actual cumulative recovery for elapsed months `0..observed_months`
    pub actual: Vec<f64>,

    /// Predicted cumulative recovery for months `0..=horizon`
    pub predicted: Vec<f64>,
}

/// One vintage prepared for a forecast run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortCurves {
    pub vintage: Vintage,

    /// Months in collection shared by every account of the vintage
    pub months_in_collection: u32,

    /// `min(months_in_collection, horizon)`
    pub observed_months: usize,

    pub horizon: usize,

    pub accounts: Vec<AccountCurves>,
}

impl CohortCurves {
    /// Validate a vintage's accounts and truncate their curves to `horizon`
    pub fn build(vintage: Vintage, accounts: &[&Account], horizon: u32) -> RecoveryResult<Self> {
        let months_in_collection = accounts.first().map(|a| a.info.months_in_collection).unwrap_or(0);
        let horizon = horizon as usize;
        let observed_months = (months_in_collection as usize).min(horizon);

        let accounts = accounts
            .iter()
            .map(|account| {
                if account.info.months_in_collection != months_in_collection {
                    return Err(RecoveryError::InconsistentCohort {
                        vintage,
                        account: account.info.acct_no.clone(),
                        expected: months_in_collection,
                        found: account.info.months_in_collection,
                    });
                }
                Ok(AccountCurves {
                    info: account.info.clone(),
                    actual: dense_prefix(account, &account.actual_recovery, observed_months, actual_column)?,
                    predicted: dense_prefix(account, &account.predicted_recovery, horizon + 1, predicted_column)?,
                })
            })
            .collect::<RecoveryResult<Vec<_>>>()?;

        Ok(Self {
            vintage,
            months_in_collection,
            observed_months,
            horizon,
            accounts,
        })
    }

    /// Whether observed actuals stop short of the horizon
    pub fn needs_correction(&self) -> bool {
        self.horizon > self.observed_months
    }

    /// Sum of write-off amounts over the cohort
    pub fn total_write_off(&self) -> f64 {
        self.accounts.iter().map(|a| a.info.wrtoff_amt).sum()
    }
}

fn dense_prefix(
    account: &Account,
    values: &[Option<f64>],
    len: usize,
    column: fn(usize) -> String,
) -> RecoveryResult<Vec<f64>> {
    (0..len)
        .map(|k| {
            values.get(k).copied().flatten().ok_or_else(|| RecoveryError::MissingCohortValue {
                vintage: account.info.vintage,
                account: account.info.acct_no.clone(),
                column: column(k),
            })
        })
        .collect()
}

/// Filter the dataset to the requested vintages and build their curves
pub fn build_cohorts(dataset: &Dataset, vintages: &[Vintage], horizon: u32) -> RecoveryResult<Vec<CohortCurves>> {
    select_vintages(dataset, vintages)
        .into_iter()
        .map(|(vintage, accounts)| CohortCurves::build(vintage, &accounts, horizon))
        .collect()
}
