//! Account and cohort data structures matching the write-off dataset format

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RecoveryError, RecoveryResult};

/// Product portfolio of a written-off account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Personal loan ("PL")
    #[serde(rename = "PL")]
    PersonalLoan,
    /// Revolving credit card ("VS")
    #[serde(rename = "VS")]
    Visa,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [ProductType::PersonalLoan, ProductType::Visa];

    /// Parse the dataset product code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "PL" => Some(ProductType::PersonalLoan),
            "VS" => Some(ProductType::Visa),
            _ => None,
        }
    }

    /// Dataset product code
    pub fn code(&self) -> &'static str {
        match self {
            ProductType::PersonalLoan => "PL",
            ProductType::Visa => "VS",
        }
    }

    /// Label used in report headers
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::PersonalLoan => "PL",
            ProductType::Visa => "Visa",
        }
    }
}

/// Write-off cohort, identified by the month of charge-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vintage(NaiveDate);

impl Vintage {
    pub fn new(year: i32, month: u32) -> RecoveryResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Vintage)
            .ok_or_else(|| RecoveryError::InvalidVintage(format!("{:04}-{:02}", year, month)))
    }

    /// First day of the charge-off month
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Calendar month `months` after charge-off
    pub fn month_offset(&self, months: u32) -> Option<NaiveDate> {
        self.0.checked_add_months(Months::new(months))
    }

    /// Compact `YYYYMM` form used in export names
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.0.year(), self.0.month())
    }
}

impl FromStr for Vintage {
    type Err = RecoveryError;

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` date (day is dropped)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let date = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .map_err(|_| RecoveryError::InvalidVintage(s.to_string()))?;
        Vintage::new(date.year(), date.month())
    }
}

impl TryFrom<String> for Vintage {
    type Error = RecoveryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vintage> for String {
    fn from(v: Vintage) -> Self {
        v.to_string()
    }
}

impl fmt::Display for Vintage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), self.0.month())
    }
}

/// Identifying and static attributes of a written-off account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account number
    pub acct_no: String,

    /// Account-level identifier
    pub acct_id: String,

    /// Customer identifier
    pub cust_id: String,

    /// Charge-off cohort
    pub vintage: Vintage,

    /// Balance declared as loss at charge-off
    pub wrtoff_amt: f64,

    pub product_type: ProductType,

    /// Elapsed months with observed recovery
    pub months_in_collection: u32,

    /// Model score for any recovery at all
    pub recovery_probability: f64,
}

/// A single account row from the write-off dataset
///
/// Curve entries are cumulative amounts indexed by month after charge-off.
/// `None` marks a blank cell (actual recovery is blank for future months).
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub info: AccountInfo,

    /// `actual_recovery_amount_M{k}`
    pub actual_recovery: Vec<Option<f64>>,

    /// `predicted_recovery_amount_M{k}`
    pub predicted_recovery: Vec<Option<f64>>,
}

impl Account {
    /// Cumulative actual recovery at the last elapsed month (0 when nothing has elapsed)
    pub fn already_recovered(&self) -> Option<f64> {
        match self.info.months_in_collection {
            0 => Some(0.0),
            m => self.actual_recovery.get(m as usize - 1).copied().flatten(),
        }
    }
}

/// Column name for the actual cumulative recovery at month `k`
pub fn actual_column(k: usize) -> String {
    format!("actual_recovery_amount_M{}", k)
}

/// Column name for the predicted cumulative recovery at month `k`
pub fn predicted_column(k: usize) -> String {
    format!("predicted_recovery_amount_M{}", k)
}

/// In-memory write-off dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Account rows in file order
    pub accounts: Vec<Account>,

    /// SHA-256 of the raw dataset bytes
    pub version: String,

    /// Number of `actual_recovery_amount_M{k}` columns
    pub actual_months: usize,

    /// Number of `predicted_recovery_amount_M{k}` columns
    pub predicted_months: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Distinct vintages, ascending
    pub fn vintages(&self) -> Vec<Vintage> {
        let mut vintages: Vec<Vintage> = self.accounts.iter().map(|a| a.info.vintage).collect();
        vintages.sort();
        vintages.dedup();
        vintages
    }

    /// Distinct vintages with their account counts, ascending
    pub fn vintage_counts(&self) -> Vec<(Vintage, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for account in &self.accounts {
            *counts.entry(account.info.vintage).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }

    /// Default selection: the two most recent vintages
    pub fn default_selection(&self) -> Vec<Vintage> {
        let vintages = self.vintages();
        let skip = vintages.len().saturating_sub(2);
        vintages.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vintage_parsing() {
        let v: Vintage = "2021-03".parse().unwrap();
        assert_eq!(v.to_string(), "2021-03");
        assert_eq!(v.compact(), "202103");

        let full: Vintage = "2021-03-31".parse().unwrap();
        assert_eq!(full, v);

        assert!("2021-13".parse::<Vintage>().is_err());
        assert!("March 2021".parse::<Vintage>().is_err());
    }

    #[test]
    fn test_vintage_month_offset() {
        let v = Vintage::new(2021, 11).unwrap();
        assert_eq!(v.month_offset(0), NaiveDate::from_ymd_opt(2021, 11, 1));
        assert_eq!(v.month_offset(3), NaiveDate::from_ymd_opt(2022, 2, 1));
    }

    #[test]
    fn test_vintage_serde_roundtrip_as_string() {
        let v = Vintage::new(2020, 7).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"2020-07\"");
        let back: Vintage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_product_codes() {
        assert_eq!(ProductType::from_code("PL"), Some(ProductType::PersonalLoan));
        assert_eq!(ProductType::from_code(" VS "), Some(ProductType::Visa));
        assert_eq!(ProductType::from_code("MC"), None);
        assert_eq!(ProductType::Visa.label(), "Visa");
    }

    #[test]
    fn test_already_recovered_uses_last_elapsed_month() {
        let account = Account {
            info: AccountInfo {
                acct_no: "1".into(),
                acct_id: "1".into(),
                cust_id: "1".into(),
                vintage: Vintage::new(2021, 1).unwrap(),
                wrtoff_amt: 100.0,
                product_type: ProductType::PersonalLoan,
                months_in_collection: 2,
                recovery_probability: 0.5,
            },
            actual_recovery: vec![Some(10.0), Some(25.0), None],
            predicted_recovery: vec![Some(5.0), Some(15.0), Some(25.0)],
        };
        assert_eq!(account.already_recovered(), Some(25.0));
    }
}
