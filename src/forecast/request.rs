//! Per-run forecast configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::account::Vintage;
use crate::error::{RecoveryError, RecoveryResult};

/// Default forecast window: 6 years after charge-off
pub const DEFAULT_HORIZON_MONTHS: u32 = 72;

/// Default annual discount rate in percent
pub const DEFAULT_DISCOUNT_RATE_PCT: f64 = 3.6;

fn default_horizon_months() -> u32 { DEFAULT_HORIZON_MONTHS }
fn default_discount_rate_pct() -> f64 { DEFAULT_DISCOUNT_RATE_PCT }
fn default_cumulative() -> bool { true }

/// Everything one forecast run depends on besides the dataset itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// Vintages to include; empty selects nothing
    #[serde(default)]
    pub vintages: Vec<Vintage>,

    /// Months after charge-off covered by the forecast
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,

    /// Annual discount rate in percent (0-100)
    #[serde(default = "default_discount_rate_pct")]
    pub discount_rate_pct: f64,

    /// Report recovery curves as cumulative (true) or monthly (false) rates
    #[serde(default = "default_cumulative")]
    pub cumulative: bool,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            vintages: Vec::new(),
            horizon_months: DEFAULT_HORIZON_MONTHS,
            discount_rate_pct: DEFAULT_DISCOUNT_RATE_PCT,
            cumulative: true,
        }
    }
}

impl ForecastRequest {
    /// Request with default horizon and discount rate for the given vintages
    pub fn new(vintages: Vec<Vintage>) -> Self {
        Self {
            vintages,
            ..Default::default()
        }
    }

    pub fn with_horizon(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }

    pub fn with_discount_rate(mut self, annual_pct: f64) -> Self {
        self.discount_rate_pct = annual_pct;
        self
    }

    pub fn with_cumulative(mut self, cumulative: bool) -> Self {
        self.cumulative = cumulative;
        self
    }

    /// Parse a request from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> RecoveryResult<Self> {
        let request: Self = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Load a request from a JSON file
    pub fn from_json_path(path: &Path) -> RecoveryResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> RecoveryResult<()> {
        if self.horizon_months == 0 {
            return Err(RecoveryError::InvalidConfig(
                "forecast horizon must be at least one month".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.discount_rate_pct) {
            return Err(RecoveryError::InvalidConfig(format!(
                "discount rate {}% is outside 0-100%",
                self.discount_rate_pct
            )));
        }
        Ok(())
    }

    /// Annual discount rate as a decimal
    pub fn annual_discount_rate(&self) -> f64 {
        self.discount_rate_pct / 100.0
    }

    /// Selected vintages, ascending and de-duplicated
    pub fn normalized_vintages(&self) -> Vec<Vintage> {
        let mut vintages = self.vintages.clone();
        vintages.sort();
        vintages.dedup();
        vintages
    }
}
