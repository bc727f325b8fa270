//! Rank accounts by predicted recovery still to come within the horizon

use log::warn;
use serde::Serialize;
use std::cmp::Ordering;

use super::cohort::CohortCurves;
use crate::account::AccountInfo;
use crate::format::round_to;

/// One account in the ranking table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedAccount {
    pub info: AccountInfo,

    /// Predicted cumulative recovery at the horizon minus at the observation point
    pub marginal_recovery: f64,

    /// `marginal_recovery / wrtoff_amt` in percent, 2 decimals
    pub recovery_rate_pct: f64,
}

/// Accounts ordered ascending by predicted recovery rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    pub horizon: usize,

    pub accounts: Vec<RankedAccount>,

    /// Accounts left out because their write-off amount is not positive
    pub excluded: Vec<AccountInfo>,
}

impl RankingTable {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Ascending rate, then descending write-off amount
fn ranking_order(a: &RankedAccount, b: &RankedAccount) -> Ordering {
    a.recovery_rate_pct
        .total_cmp(&b.recovery_rate_pct)
        .then_with(|| b.info.wrtoff_amt.total_cmp(&a.info.wrtoff_amt))
}

/// Build the global ranking over corrected, discounted cohorts
///
/// Cohorts are expected in ascending vintage order; the sort is stable so
/// exact ties keep cohort order and then dataset order.
pub fn rank_accounts(cohorts: &[CohortCurves]) -> RankingTable {
    let horizon = cohorts.first().map(|c| c.horizon).unwrap_or(0);
    let mut accounts = Vec::new();
    let mut excluded = Vec::new();

    for cohort in cohorts {
        let observed = cohort.observed_months;
        for account in &cohort.accounts {
            if !(account.info.wrtoff_amt > 0.0) {
                warn!(
                    "Vintage {}: account {} has write-off amount {}, excluded from ranking",
                    cohort.vintage, account.info.acct_no, account.info.wrtoff_amt
                );
                excluded.push(account.info.clone());
                continue;
            }

            let marginal_recovery = account.predicted[cohort.horizon] - account.predicted[observed];
            let recovery_rate_pct = round_to(marginal_recovery / account.info.wrtoff_amt * 100.0, 2);
            accounts.push(RankedAccount {
                info: account.info.clone(),
                marginal_recovery,
                recovery_rate_pct,
            });
        }
    }

    accounts.sort_by(ranking_order);

    RankingTable {
        horizon,
        accounts,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Dataset, ProductType, Vintage};
    use crate::forecast::cohort::build_cohorts;
    use crate::forecast::cohort::tests::{account, scenario_dataset};
    use crate::forecast::correction::correct_cohort;
    use approx::assert_abs_diff_eq;

    fn corrected_scenario() -> Vec<CohortCurves> {
        let dataset = scenario_dataset();
        build_cohorts(&dataset, &dataset.vintages(), 3)
            .unwrap()
            .into_iter()
            .map(correct_cohort)
            .collect()
    }

    #[test]
    fn test_marginal_recovery_and_rate() {
        let ranking = rank_accounts(&corrected_scenario());
        assert_eq!(ranking.len(), 3);

        // Corrected curves: [10,20,30,40], [30,40,60,80], [0,0,10,20]; marginal = P[3] - P[2]
        let by_id = |id: &str| ranking.accounts.iter().find(|a| a.info.acct_no == id).unwrap();
        assert_abs_diff_eq!(by_id("1").marginal_recovery, 10.0);
        assert_abs_diff_eq!(by_id("1").recovery_rate_pct, 10.0);
        assert_abs_diff_eq!(by_id("2").marginal_recovery, 20.0);
        assert_abs_diff_eq!(by_id("2").recovery_rate_pct, 10.0);
        assert_abs_diff_eq!(by_id("3").recovery_rate_pct, 3.33);
    }

    #[test]
    fn test_order_ascending_rate_then_descending_write_off() {
        let ranking = rank_accounts(&corrected_scenario());
        let order: Vec<&str> = ranking.accounts.iter().map(|a| a.info.acct_no.as_str()).collect();
        // 3 has the lowest rate; 1 and 2 tie at 10% and the larger write-off (2) comes first
        assert_eq!(order, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let cohorts = corrected_scenario();
        assert_eq!(rank_accounts(&cohorts), rank_accounts(&cohorts));
    }

    #[test]
    fn test_zero_write_off_excluded() {
        let v = Vintage::new(2022, 1).unwrap();
        let dataset = Dataset {
            accounts: vec![
                account("z", v, 0.0, ProductType::Visa, 0, &[], &[0.0, 5.0]),
                account("ok", v, 50.0, ProductType::Visa, 0, &[], &[0.0, 5.0]),
            ],
            version: "zero".to_string(),
            actual_months: 0,
            predicted_months: 2,
        };
        let cohorts = build_cohorts(&dataset, &[v], 1).unwrap();
        let ranking = rank_accounts(&cohorts);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.excluded.len(), 1);
        assert_eq!(ranking.excluded[0].acct_no, "z");
        assert_abs_diff_eq!(ranking.accounts[0].recovery_rate_pct, 10.0);
    }
}
