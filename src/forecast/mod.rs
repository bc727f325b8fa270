//! Recovery forecasting pipeline
//!
//! Each stage is a function from one table to a new one:
//! 1. **Filter**: select vintages and build dense per-cohort curves
//! 2. **Correct**: anchor predicted curves to observed recovery
//! 3. **Discount**: convert cumulative recovery to present value
//! 4. **Rank**: order accounts by predicted recovery rate within the horizon
//! 5. **Select**: shortest ranked prefix reaching each target rate 1%..100%
//!
//! `ForecastEngine` runs the stages for one `ForecastRequest`;
//! `ForecastCache` memoizes outcomes by dataset version and request.

mod cohort;
mod correction;
mod discount;
mod ranking;
mod threshold;
mod curve;
mod request;
mod engine;
mod cache;

pub use cohort::{build_cohorts, select_vintages, AccountCurves, CohortCurves};
pub use correction::{correct_cohort, correct_curve};
pub use discount::{discount_cohort, MonthlyDiscount};
pub use ranking::{rank_accounts, RankedAccount, RankingTable};
pub use threshold::{
    select_thresholds, PrefixSums, ProductSplit, SegmentTotals, ThresholdRow, ThresholdTable,
    MAX_TARGET_RATE_PCT,
};
pub use curve::{recovery_curve, CurvePoint, RecoveryCurve};
pub use request::{ForecastRequest, DEFAULT_DISCOUNT_RATE_PCT, DEFAULT_HORIZON_MONTHS};
pub use engine::{ForecastEngine, ForecastOutcome};
pub use cache::{CacheKey, ForecastCache};
