//! Forecast engine: filter → correct → discount → rank → select

use log::{debug, info};
use serde::Serialize;

use super::cohort::build_cohorts;
use super::correction::correct_cohort;
use super::curve::{recovery_curve, RecoveryCurve};
use super::discount::{discount_cohort, MonthlyDiscount};
use super::ranking::{rank_accounts, RankedAccount, RankingTable};
use super::request::ForecastRequest;
use super::threshold::{select_thresholds, ThresholdRow, ThresholdTable};
use crate::account::Dataset;
use crate::error::{RecoveryError, RecoveryResult};

/// Everything produced by one forecast run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub request: ForecastRequest,

    /// Version of the dataset the outcome was computed from
    pub dataset_version: String,

    /// One curve per selected vintage, ascending
    pub curves: Vec<RecoveryCurve>,

    pub ranking: RankingTable,

    pub thresholds: ThresholdTable,
}

impl ForecastOutcome {
    /// Accounts selected for a threshold row
    pub fn selected(&self, row: &ThresholdRow) -> &[RankedAccount] {
        self.thresholds.selected(&self.ranking, row)
    }
}

/// Forecast engine for one request
pub struct ForecastEngine {
    request: ForecastRequest,
    discount: MonthlyDiscount,
}

impl ForecastEngine {
    /// Create an engine, rejecting invalid requests up front
    pub fn new(request: ForecastRequest) -> RecoveryResult<Self> {
        request.validate()?;
        let discount = MonthlyDiscount::from_annual(request.annual_discount_rate());
        Ok(Self { request, discount })
    }

    pub fn request(&self) -> &ForecastRequest {
        &self.request
    }

    /// Run the forecast; `Ok(None)` when the selection matches no accounts
    pub fn run(&self, dataset: &Dataset) -> RecoveryResult<Option<ForecastOutcome>> {
        let horizon = self.request.horizon_months;
        let needed = horizon as usize + 1;
        if needed > dataset.predicted_months {
            return Err(RecoveryError::HorizonOutOfRange {
                horizon,
                needed,
                available: dataset.predicted_months,
            });
        }

        if self.request.vintages.is_empty() {
            debug!("Empty vintage selection, nothing to forecast");
            return Ok(None);
        }

        let cohorts = build_cohorts(dataset, &self.request.vintages, horizon)?;
        if cohorts.is_empty() {
            info!("Selected vintages match no accounts");
            return Ok(None);
        }

        let cohorts: Vec<_> = cohorts
            .into_iter()
            .map(correct_cohort)
            .map(|cohort| discount_cohort(cohort, &self.discount))
            .collect();

        let curves = cohorts
            .iter()
            .map(|cohort| recovery_curve(cohort, self.request.cumulative))
            .collect();

        let ranking = rank_accounts(&cohorts);
        let thresholds = select_thresholds(&ranking);

        info!(
            "Forecast over {} vintages: {} accounts ranked, {} excluded, {} threshold rows",
            cohorts.len(),
            ranking.len(),
            ranking.excluded.len(),
            thresholds.rows.len()
        );

        Ok(Some(ForecastOutcome {
            request: self.request.clone(),
            dataset_version: dataset.version.clone(),
            curves,
            ranking,
            thresholds,
        }))
    }
}
