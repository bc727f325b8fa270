//! Recovery Forecast - recovery forecasting for written-off loan portfolios
//!
//! This library provides:
//! - Loading and validating write-off datasets (personal loans and Visa)
//! - Correcting predicted recovery curves with observed collections
//! - Present-value discounting of monthly recovery
//! - Account ranking and shortest-prefix selection per target recovery rate
//! - Recovery curves, portfolio summaries and report exports
//! - Cached batch runs over many forecast requests

pub mod account;
pub mod error;
pub mod format;
pub mod forecast;
pub mod portfolio;
pub mod report;
pub mod scenario;

// Re-export commonly used types
pub use account::{load_dataset, Account, AccountInfo, Dataset, ProductType, Vintage};
pub use error::{RecoveryError, RecoveryResult};
pub use forecast::{ForecastEngine, ForecastOutcome, ForecastRequest};
pub use portfolio::{portfolio_view, PortfolioView};
pub use scenario::ForecastRunner;
