//! Aggregate monthly recovery-rate curves per vintage
//!
//! Months before the observation point report what was already recovered;
//! later months report the (corrected, discounted) prediction. Rates are in
//! percent of the vintage's total write-off.

use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use super::cohort::CohortCurves;
use crate::account::Vintage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Months after charge-off
    pub month: u32,

    /// Calendar month of the point
    pub date: Option<NaiveDate>,

    pub already_recovered_pct: Option<f64>,

    pub predicted_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryCurve {
    pub vintage: Vintage,
    pub observed_months: usize,
    pub cumulative: bool,
    pub points: Vec<CurvePoint>,
}

/// Build the curve for months `0..horizon` of one cohort
pub fn recovery_curve(cohort: &CohortCurves, cumulative: bool) -> RecoveryCurve {
    let horizon = cohort.horizon;
    let observed = cohort.observed_months;
    let total_write_off = cohort.total_write_off();
    if !(total_write_off > 0.0) {
        warn!("Vintage {}: total write-off is {}, curve left empty", cohort.vintage, total_write_off);
    }

    // Cohort-wide cumulative amount per month: actuals while observed, predictions after
    let totals: Vec<f64> = (0..horizon)
        .map(|k| {
            cohort
                .accounts
                .iter()
                .map(|a| if k < observed { a.actual[k] } else { a.predicted[k] })
                .sum()
        })
        .collect();

    let points = (0..horizon)
        .map(|k| {
            let amount = if cumulative || k == 0 { totals[k] } else { totals[k] - totals[k - 1] };
            let pct = if total_write_off > 0.0 {
                Some(amount / total_write_off * 100.0)
            } else {
                None
            };
            let (already_recovered_pct, predicted_pct) = if k < observed { (pct, None) } else { (None, pct) };
            CurvePoint {
                month: k as u32,
                date: cohort.vintage.month_offset(k as u32),
                already_recovered_pct,
                predicted_pct,
            }
        })
        .collect();

    RecoveryCurve {
        vintage: cohort.vintage,
        observed_months: observed,
        cumulative,
        points,
    }
}
