//! Anchor predicted recovery curves to observed actuals
//!
//! For elapsed months the prediction is replaced with what was actually
//! recovered; later months keep the predicted month-to-month increments on
//! top of the last observed value, so the predicted shape is preserved.

use log::debug;

use super::cohort::{AccountCurves, CohortCurves};

/// Correct one predicted cumulative curve with the observed prefix `actual`
///
/// `actual.len()` must not exceed `predicted.len()`. An empty `actual`
/// leaves the prediction untouched.
pub fn correct_curve(predicted: &[f64], actual: &[f64]) -> Vec<f64> {
    let observed = actual.len();
    if observed == 0 {
        return predicted.to_vec();
    }
    debug_assert!(observed <= predicted.len());

    let mut corrected = Vec::with_capacity(predicted.len());
    corrected.extend_from_slice(actual);

    let mut running = actual[observed - 1];
    for k in observed..predicted.len() {
        running += predicted[k] - predicted[k - 1];
        corrected.push(running);
    }
    corrected
}

/// Correct every account of a cohort; a no-op once the horizon is fully observed
pub fn correct_cohort(cohort: CohortCurves) -> CohortCurves {
    if !cohort.needs_correction() {
        debug!(
            "Vintage {}: horizon {} already observed, no correction",
            cohort.vintage, cohort.horizon
        );
        return cohort;
    }

    let accounts = cohort
        .accounts
        .into_iter()
        .map(|account| AccountCurves {
            predicted: correct_curve(&account.predicted, &account.actual),
            ..account
        })
        .collect();

    CohortCurves { accounts, ..cohort }
}
