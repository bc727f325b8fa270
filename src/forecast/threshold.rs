//! Target recovery-rate thresholds over the ranked accounts
//!
//! For each integer target rate from 1% to 100% the selector finds the
//! shortest prefix of the ranking whose aggregate predicted recovery rate
//! reaches the target. Larger targets never need a shorter prefix, so the
//! scan continues from the previous prefix length. Once the prefix covers
//! every ranked account the row is emitted and the scan stops.

use serde::Serialize;

use super::ranking::{RankedAccount, RankingTable};
use crate::account::ProductType;

/// Highest target recovery rate in percent
pub const MAX_TARGET_RATE_PCT: u32 = 100;

/// Account count and amounts for a group of accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SegmentTotals {
    pub accounts: usize,
    pub write_off: f64,
    pub predicted_recovery: f64,
}

impl SegmentTotals {
    pub fn add(&mut self, account: &RankedAccount) {
        self.accounts += 1;
        self.write_off += account.info.wrtoff_amt;
        self.predicted_recovery += account.marginal_recovery;
    }

    /// Aggregate recovery rate as a fraction; undefined without write-off
    pub fn rate(&self) -> Option<f64> {
        if self.write_off > 0.0 {
            Some(self.predicted_recovery / self.write_off)
        } else {
            None
        }
    }
}

/// Totals split by product portfolio
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductSplit {
    pub personal_loan: SegmentTotals,
    pub visa: SegmentTotals,
}

impl ProductSplit {
    pub fn get(&self, product: ProductType) -> &SegmentTotals {
        match product {
            ProductType::PersonalLoan => &self.personal_loan,
            ProductType::Visa => &self.visa,
        }
    }

    fn get_mut(&mut self, product: ProductType) -> &mut SegmentTotals {
        match product {
            ProductType::PersonalLoan => &mut self.personal_loan,
            ProductType::Visa => &mut self.visa,
        }
    }

    pub fn add(&mut self, account: &RankedAccount) {
        self.get_mut(account.info.product_type).add(account);
    }

    /// Both portfolios combined
    pub fn total(&self) -> SegmentTotals {
        SegmentTotals {
            accounts: self.personal_loan.accounts + self.visa.accounts,
            write_off: self.personal_loan.write_off + self.visa.write_off,
            predicted_recovery: self.personal_loan.predicted_recovery + self.visa.predicted_recovery,
        }
    }
}

/// Running product totals for every prefix length of the ranking
///
/// `sums[n - 1]` holds the totals of the first `n` accounts.
#[derive(Debug, Clone)]
pub struct PrefixSums {
    sums: Vec<ProductSplit>,
}

impl PrefixSums {
    pub fn new(accounts: &[RankedAccount]) -> Self {
        let mut running = ProductSplit::default();
        let sums = accounts
            .iter()
            .map(|account| {
                running.add(account);
                running
            })
            .collect();
        Self { sums }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Totals of the first `n` accounts (`1 <= n <= len`)
    pub fn prefix(&self, n: usize) -> &ProductSplit {
        &self.sums[n - 1]
    }

    /// Aggregate rate of the first `n` accounts
    pub fn rate(&self, n: usize) -> f64 {
        self.prefix(n).total().rate().unwrap_or(0.0)
    }
}

/// Selection reached for one target recovery rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRow {
    /// Target aggregate recovery rate in percent
    pub target_rate_pct: u32,

    /// Number of top-ranked accounts selected
    pub prefix_len: usize,

    /// Selected accounts as a share of all ranked accounts, in percent
    pub coverage_pct: f64,

    /// Aggregate predicted recovery rate of the selection, in percent
    pub predicted_rate_pct: f64,

    pub split: ProductSplit,
}

impl ThresholdRow {
    pub fn totals(&self) -> SegmentTotals {
        self.split.total()
    }

    /// Share of the selection in a product portfolio, in percent
    pub fn product_share_pct(&self, product: ProductType) -> f64 {
        if self.prefix_len == 0 {
            return 0.0;
        }
        self.split.get(product).accounts as f64 / self.prefix_len as f64 * 100.0
    }

    /// Whether target was actually reached (false when the dataset ran out first)
    pub fn reached(&self) -> bool {
        self.predicted_rate_pct >= self.target_rate_pct as f64
    }
}

/// One row per target rate, ending at full coverage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    pub total_accounts: usize,
    pub rows: Vec<ThresholdRow>,
}

impl ThresholdTable {
    /// Accounts selected for a row
    pub fn selected<'a>(&self, ranking: &'a RankingTable, row: &ThresholdRow) -> &'a [RankedAccount] {
        &ranking.accounts[..row.prefix_len.min(ranking.accounts.len())]
    }

    pub fn row(&self, target_rate_pct: u32) -> Option<&ThresholdRow> {
        self.rows.iter().find(|r| r.target_rate_pct == target_rate_pct)
    }
}

/// Run the prefix scan over a ranking table
pub fn select_thresholds(ranking: &RankingTable) -> ThresholdTable {
    let total_accounts = ranking.len();
    let mut rows = Vec::new();
    if total_accounts == 0 {
        return ThresholdTable { total_accounts, rows };
    }

    let sums = PrefixSums::new(&ranking.accounts);
    let mut prefix_len = 1;

    for target_rate_pct in 1..=MAX_TARGET_RATE_PCT {
        let goal = target_rate_pct as f64 / 100.0;
        while prefix_len < total_accounts && sums.rate(prefix_len) < goal {
            prefix_len += 1;
        }

        rows.push(ThresholdRow {
            target_rate_pct,
            prefix_len,
            coverage_pct: (prefix_len as f64 / total_accounts as f64 * 100.0).min(100.0),
            predicted_rate_pct: sums.rate(prefix_len) * 100.0,
            split: *sums.prefix(prefix_len),
        });

        if prefix_len == total_accounts {
            break;
        }
    }

    ThresholdTable { total_accounts, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountInfo, Vintage};
    use approx::assert_abs_diff_eq;

    fn ranked(id: &str, wrtoff_amt: f64, marginal: f64, product_type: ProductType) -> RankedAccount {
        RankedAccount {
            info: AccountInfo {
                acct_no: id.to_string(),
                acct_id: id.to_string(),
                cust_id: id.to_string(),
                vintage: Vintage::new(2021, 1).unwrap(),
                wrtoff_amt,
                product_type,
                months_in_collection: 3,
                recovery_probability: 0.5,
            },
            marginal_recovery: marginal,
            recovery_rate_pct: marginal / wrtoff_amt * 100.0,
        }
    }

    fn table(accounts: Vec<RankedAccount>) -> RankingTable {
        RankingTable {
            horizon: 12,
            accounts,
            excluded: Vec::new(),
        }
    }

    #[test]
    fn test_prefix_extends_until_target_met() {
        // Rates 1%, 3%, 8%, 20% on equal write-offs
        let ranking = table(vec![
            ranked("a", 100.0, 1.0, ProductType::PersonalLoan),
            ranked("b", 100.0, 3.0, ProductType::Visa),
            ranked("c", 100.0, 8.0, ProductType::PersonalLoan),
            ranked("d", 100.0, 20.0, ProductType::Visa),
        ]);
        let thresholds = select_thresholds(&ranking);

        // 1% met by "a" alone; 2% by a+b (4/200); 3%..4% by a+b+c (12/300); 5%+ needs all four
        let lens: Vec<usize> = thresholds.rows.iter().map(|r| r.prefix_len).collect();
        assert_eq!(lens, vec![1, 2, 3, 3, 4]);
        assert_eq!(thresholds.rows.last().unwrap().target_rate_pct, 5);

        let row3 = thresholds.row(3).unwrap();
        assert_abs_diff_eq!(row3.predicted_rate_pct, 4.0, epsilon = 1e-12);
        assert_eq!(row3.split.personal_loan.accounts, 2);
        assert_eq!(row3.split.visa.accounts, 1);
        assert_abs_diff_eq!(row3.coverage_pct, 75.0);
        assert!(row3.reached());

        let last = thresholds.rows.last().unwrap();
        assert_abs_diff_eq!(last.predicted_rate_pct, 8.0, epsilon = 1e-12);
        assert!(last.reached());
        assert_eq!(thresholds.selected(&ranking, last).len(), 4);
    }

    #[test]
    fn test_stops_at_full_coverage_even_if_target_unreached() {
        let ranking = table(vec![
            ranked("a", 1000.0, 0.0, ProductType::Visa),
            ranked("b", 1000.0, 5.0, ProductType::Visa),
        ]);
        let thresholds = select_thresholds(&ranking);
        assert_eq!(thresholds.rows.len(), 1);
        let row = &thresholds.rows[0];
        assert_eq!(row.prefix_len, 2);
        assert!(!row.reached());
        assert_abs_diff_eq!(row.predicted_rate_pct, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_prefix_len_is_monotone_and_ends_full() {
        let accounts: Vec<RankedAccount> = (0..40)
            .map(|i| {
                let product = if i % 3 == 0 { ProductType::Visa } else { ProductType::PersonalLoan };
                ranked(&i.to_string(), 50.0 + i as f64 * 10.0, i as f64 * 4.0, product)
            })
            .collect();
        let ranking = table(accounts);
        let thresholds = select_thresholds(&ranking);

        assert!(thresholds.rows.windows(2).all(|w| w[0].prefix_len <= w[1].prefix_len));
        assert!(thresholds.rows.len() <= MAX_TARGET_RATE_PCT as usize);
        assert_eq!(thresholds.rows.last().unwrap().prefix_len, 40);

        // Every row is the minimal prefix for its target (given the previous one)
        let sums = PrefixSums::new(&ranking.accounts);
        for row in &thresholds.rows {
            if row.reached() && row.prefix_len > 1 {
                let goal = row.target_rate_pct as f64 / 100.0;
                let previous = thresholds
                    .rows
                    .iter()
                    .filter(|r| r.target_rate_pct < row.target_rate_pct)
                    .map(|r| r.prefix_len)
                    .max()
                    .unwrap_or(1);
                if row.prefix_len > previous {
                    assert!(sums.rate(row.prefix_len - 1) < goal);
                }
            }
        }
    }

    #[test]
    fn test_split_totals_add_up() {
        let ranking = table(vec![
            ranked("a", 200.0, 2.0, ProductType::PersonalLoan),
            ranked("b", 300.0, 9.0, ProductType::Visa),
            ranked("c", 500.0, 50.0, ProductType::PersonalLoan),
        ]);
        let thresholds = select_thresholds(&ranking);
        for row in &thresholds.rows {
            let totals = row.totals();
            assert_eq!(totals.accounts, row.prefix_len);
            let selected = thresholds.selected(&ranking, row);
            let write_off: f64 = selected.iter().map(|a| a.info.wrtoff_amt).sum();
            assert_abs_diff_eq!(totals.write_off, write_off, epsilon = 1e-9);
            let share = row.product_share_pct(ProductType::PersonalLoan) + row.product_share_pct(ProductType::Visa);
            assert_abs_diff_eq!(share, 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_empty_ranking_has_no_rows() {
        let thresholds = select_thresholds(&table(Vec::new()));
        assert_eq!(thresholds.total_accounts, 0);
        assert!(thresholds.rows.is_empty());
    }
}
