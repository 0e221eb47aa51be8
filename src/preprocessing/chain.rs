use super::backend::{Filter, FilterBackend};
use crate::error::StageError;
use crate::raster::Image;

/// Ordered list of filters applied left to right.
///
/// Each filter is independently optional: on failure the previous image is
/// kept and the next filter still runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

/// What a chain run produced.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub image: Image,
    /// Names of the filters whose output was adopted, in order
    pub applied: Vec<&'static str>,
    /// Filters that failed, with the reason
    pub failed: Vec<(&'static str, StageError)>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply(&self, backend: &dyn FilterBackend, image: &Image) -> ChainOutcome {
        let mut current = image.clone();
        let mut applied = Vec::new();
        let mut failed = Vec::new();

        for filter in &self.filters {
            match backend.apply_filter(&current, filter) {
                Ok(output) => {
                    tracing::debug!("Filter '{}' applied", filter.name());
                    current = output;
                    applied.push(filter.name());
                }
                Err(e) => {
                    tracing::warn!("Filter '{}' failed, keeping previous image: {}", filter.name(), e);
                    failed.push((filter.name(), e));
                }
            }
        }

        ChainOutcome {
            image: current,
            applied,
            failed,
        }
    }
}
