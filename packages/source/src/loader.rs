//! Last-wins data loading.
//!
//! Loads cannot be cancelled, so every load takes a generation number from
//! a monotonic counter and its result is discarded if a newer load started
//! while it was in flight.

use std::sync::atomic::{AtomicU64, Ordering};

use sheet_map_convert::{ConvertOptions, convert};
use sheet_map_sheet_models::FeatureCollection;

use crate::{LoadError, SheetSource};

/// Result of a load that did not fail.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The load is the most recent one and produced a collection.
    Loaded {
        /// Generation of this load.
        generation: u64,
        /// The converted data.
        collection: FeatureCollection,
    },
    /// A newer load began before this one finished; its result was
    /// dropped.
    Superseded {
        /// Generation of the discarded load.
        generation: u64,
    },
}

/// Fetches and converts sheet data, ignoring results of stale loads.
#[derive(Debug, Default)]
pub struct DataLoader {
    generation: AtomicU64,
    options: ConvertOptions,
}

impl DataLoader {
    /// Creates a loader converting with `options`.
    #[must_use]
    pub const fn new(options: ConvertOptions) -> Self {
        Self {
            generation: AtomicU64::new(0),
            options,
        }
    }

    /// Generation of the most recently started load (0 before any load).
    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Fetches `source` and converts its rows.
    ///
    /// A load that was overtaken by a newer one resolves to
    /// [`LoadOutcome::Superseded`], whether it succeeded or failed.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the fetch or the conversion of the current
    /// load fails.
    pub async fn load(&self, source: &dyn SheetSource) -> Result<LoadOutcome, LoadError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::info!("Load {generation}: fetching '{}'", source.id());

        let fetched = source.fetch_rows().await;

        if self.current_generation() != generation {
            log::info!("Load {generation} superseded; discarding its result");
            return Ok(LoadOutcome::Superseded { generation });
        }

        let rows = fetched?;
        let collection = convert(&rows, &self.options)?;

        Ok(LoadOutcome::Loaded {
            generation,
            collection,
        })
    }
}
