//! [`FilterFactory`]: filter-type identifiers to fresh filter instances.

use std::sync::Arc;

use anyhow::Result;
use filter_core::{FilterType, ResourceLoader};
use tracing::{debug, warn};

use crate::catalog;
use crate::filter::Filter;

/// Builds filters by type and remembers the last type selected.
#[derive(Clone)]
pub struct FilterFactory {
    loader: Arc<dyn ResourceLoader>,
    last_selected: FilterType,
}

impl std::fmt::Debug for FilterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFactory")
            .field("last_selected", &self.last_selected)
            .finish_non_exhaustive()
    }
}

impl FilterFactory {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            last_selected: FilterType::None,
        }
    }

    /// Build a filter for `ty`. `FilterType::None` builds nothing.
    ///
    /// The last selected type only changes when construction succeeds.
    pub fn select(&mut self, ty: FilterType) -> Result<Option<Box<dyn Filter>>> {
        let filter = catalog::build(ty, &*self.loader)?;
        self.last_selected = ty;
        debug!(filter = %ty, "filter selected");
        Ok(filter)
    }

    /// Like [`select`](Self::select) for a raw identifier. Unknown
    /// identifiers build nothing and leave the last selection unchanged.
    pub fn select_id(&mut self, id: u32) -> Result<Option<Box<dyn Filter>>> {
        match FilterType::from_id(id) {
            Some(ty) => self.select(ty),
            None => {
                warn!(id, current = %self.last_selected, "unknown filter id");
                Ok(None)
            }
        }
    }

    pub fn last_selected(&self) -> FilterType {
        self.last_selected
    }

    /// Whether the last selection applies any filter.
    pub fn is_filtered(&self) -> bool {
        self.last_selected != FilterType::None
    }

    pub fn loader(&self) -> &Arc<dyn ResourceLoader> {
        &self.loader
    }
}
