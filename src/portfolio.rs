//! Portfolio view of the selected vintages
//!
//! Summarises what has been recovered so far, independent of any forecast:
//! per-account already-recovered amounts and rates, totals per
//! (product, vintage) segment, and a count grid of write-off amount against
//! recovery-probability score per vintage.

use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::account::{actual_column, AccountInfo, Dataset, ProductType, Vintage};
use crate::error::{RecoveryError, RecoveryResult};
use crate::forecast::select_vintages;

/// Default number of bins per axis of the density grid
pub const DEFAULT_DENSITY_BINS: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveredAccount {
    pub info: AccountInfo,

    /// Cumulative actual recovery at the last elapsed month
    pub already_recovered_amount: f64,

    /// Already recovered amount over write-off, in percent; undefined without write-off
    pub already_recovered_rate_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSegment {
    pub product_type: ProductType,
    pub vintage: Vintage,
    pub accounts: usize,
    pub write_off: f64,
    pub already_recovered: f64,
}

/// Counts of accounts by write-off amount (x) and recovery probability (y)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityGrid {
    pub vintage: Vintage,

    /// `bins + 1` bin edges shared by every vintage's grid
    pub write_off_edges: Vec<f64>,
    pub probability_edges: Vec<f64>,

    /// `counts[y][x]`
    pub counts: Vec<Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub accounts: Vec<RecoveredAccount>,
    pub segments: Vec<PortfolioSegment>,
    pub density: Vec<DensityGrid>,
}

impl PortfolioView {
    /// Totals per product across all selected vintages
    pub fn product_totals(&self, product: ProductType) -> (usize, f64, f64) {
        self.segments
            .iter()
            .filter(|s| s.product_type == product)
            .fold((0, 0.0, 0.0), |(n, w, r), s| (n + s.accounts, w + s.write_off, r + s.already_recovered))
    }
}

/// Build the portfolio view; `Ok(None)` when the selection matches no accounts
pub fn portfolio_view(dataset: &Dataset, vintages: &[Vintage], bins: usize) -> RecoveryResult<Option<PortfolioView>> {
    if bins == 0 {
        return Err(RecoveryError::InvalidConfig("density grid needs at least one bin".to_string()));
    }

    let selected = select_vintages(dataset, vintages);
    if selected.is_empty() {
        return Ok(None);
    }

    let mut accounts = Vec::new();
    for (vintage, cohort) in &selected {
        for account in cohort {
            let already_recovered_amount = account.already_recovered().ok_or_else(|| {
                RecoveryError::MissingCohortValue {
                    vintage: *vintage,
                    account: account.info.acct_no.clone(),
                    column: actual_column(account.info.months_in_collection.saturating_sub(1) as usize),
                }
            })?;
            let already_recovered_rate_pct = if account.info.wrtoff_amt > 0.0 {
                Some(already_recovered_amount / account.info.wrtoff_amt * 100.0)
            } else {
                warn!("Account {} has write-off amount {}, rate undefined", account.info.acct_no, account.info.wrtoff_amt);
                None
            };
            accounts.push(RecoveredAccount {
                info: account.info.clone(),
                already_recovered_amount,
                already_recovered_rate_pct,
            });
        }
    }

    let segments = segment_totals(&accounts);
    let density = density_grids(&accounts, bins);

    Ok(Some(PortfolioView {
        accounts,
        segments,
        density,
    }))
}

fn segment_totals(accounts: &[RecoveredAccount]) -> Vec<PortfolioSegment> {
    let mut segments: BTreeMap<(u8, Vintage), PortfolioSegment> = BTreeMap::new();
    for account in accounts {
        let product_type = account.info.product_type;
        let order = ProductType::ALL.iter().position(|p| *p == product_type).unwrap_or(0) as u8;
        let segment = segments
            .entry((order, account.info.vintage))
            .or_insert_with(|| PortfolioSegment {
                product_type,
                vintage: account.info.vintage,
                accounts: 0,
                write_off: 0.0,
                already_recovered: 0.0,
            });
        segment.accounts += 1;
        segment.write_off += account.info.wrtoff_amt;
        segment.already_recovered += account.already_recovered_amount;
    }
    segments.into_values().collect()
}

/// Equal-width edges over `[min, max]`; a degenerate range gets unit width
fn bin_edges(values: impl Iterator<Item = f64>, bins: usize) -> Vec<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (min, max) = if min.is_finite() { (min, max) } else { (0.0, 0.0) };
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 / bins as f64 };
    (0..=bins).map(|i| min + width * i as f64).collect()
}

fn bin_index(edges: &[f64], value: f64) -> usize {
    let bins = edges.len() - 1;
    let width = edges[1] - edges[0];
    let idx = ((value - edges[0]) / width).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(bins - 1)
    }
}

fn density_grids(accounts: &[RecoveredAccount], bins: usize) -> Vec<DensityGrid> {
    let write_off_edges = bin_edges(accounts.iter().map(|a| a.info.wrtoff_amt), bins);
    let probability_edges = bin_edges(accounts.iter().map(|a| a.info.recovery_probability), bins);

    let mut grids: BTreeMap<Vintage, Vec<Vec<usize>>> = BTreeMap::new();
    for account in accounts {
        let counts = grids
            .entry(account.info.vintage)
            .or_insert_with(|| vec![vec![0; bins]; bins]);
        let x = bin_index(&write_off_edges, account.info.wrtoff_amt);
        let y = bin_index(&probability_edges, account.info.recovery_probability);
        counts[y][x] += 1;
    }

    grids
        .into_iter()
        .map(|(vintage, counts)| DensityGrid {
            vintage,
            write_off_edges: write_off_edges.clone(),
            probability_edges: probability_edges.clone(),
            counts,
        })
        .collect()
}
