//! Forecast runner for repeated requests against one dataset
//!
//! Loads the dataset once, then answers many forecast requests, reusing
//! cached outcomes for requests it has already seen.

use std::path::Path;
use std::sync::Arc;

use crate::account::{load_dataset, Dataset};
use crate::error::RecoveryResult;
use crate::forecast::{ForecastCache, ForecastEngine, ForecastOutcome, ForecastRequest};

/// Pre-loaded forecast runner
///
/// # Example
/// ```ignore
/// let mut runner = ForecastRunner::from_csv_path(Path::new("data/example.csv"))?;
///
/// for rate in [0.0, 3.6, 8.0] {
///     let request = ForecastRequest::new(runner.dataset().default_selection())
///         .with_discount_rate(rate);
///     let outcome = runner.run(&request)?;
/// }
/// ```
#[derive(Debug)]
pub struct ForecastRunner {
    dataset: Dataset,
    cache: ForecastCache,
}

impl ForecastRunner {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            cache: ForecastCache::new(),
        }
    }

    /// Create runner by loading a dataset CSV
    pub fn from_csv_path(path: &Path) -> RecoveryResult<Self> {
        Ok(Self::new(load_dataset(path)?))
    }

    /// Run one forecast, served from the cache when possible
    pub fn run(&mut self, request: &ForecastRequest) -> RecoveryResult<Option<Arc<ForecastOutcome>>> {
        let dataset = &self.dataset;
        self.cache
            .get_or_compute(&dataset.version, request, || ForecastEngine::new(request.clone())?.run(dataset))
    }

    /// Run several requests in order
    pub fn run_scenarios(&mut self, requests: &[ForecastRequest]) -> RecoveryResult<Vec<Option<Arc<ForecastOutcome>>>> {
        requests.iter().map(|request| self.run(request)).collect()
    }

    /// Swap in a new dataset, dropping outcomes of the old one
    pub fn replace_dataset(&mut self, dataset: Dataset) -> Dataset {
        let old = std::mem::replace(&mut self.dataset, dataset);
        if old.version != self.dataset.version {
            let dropped = self.cache.invalidate_dataset(&old.version);
            log::debug!("Dataset replaced, {} cached outcomes dropped", dropped);
        }
        old
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ForecastCache {
        &mut self.cache
    }
}
