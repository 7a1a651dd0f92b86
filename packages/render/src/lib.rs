#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Glue between the core and a map rendering library.
//!
//! The map library is abstracted behind [`RenderLayer`]. Its adapter
//! resolves a [`ReadySignal`] once the map's sources and layers exist, and
//! [`MapView`] waits on it before pushing anything. After that,
//! [`MapView::handle`] turns host events into coordinator deltas, filter
//! expressions, and a fresh list view.

pub mod ready;
pub mod view;

use sheet_map_filter::FilterExpression;
use sheet_map_interaction::{FeatureFlags, FeatureId};
use sheet_map_sheet_models::FeatureCollection;

pub use ready::{ReadyHandle, ReadySignal};
pub use view::{MapView, ViewEvent};

/// Render adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The readiness signal was dropped before it fired.
    #[error("Render layer was dropped before becoming ready")]
    NeverReady,
}

/// Operations the core needs from a map rendering library.
pub trait RenderLayer {
    /// Replaces the data of the source `source_id`.
    fn set_data(&mut self, source_id: &str, collection: &FeatureCollection);

    /// Sets the paint-state flags of one feature of `source_id`.
    fn set_feature_state(&mut self, source_id: &str, id: FeatureId, flags: FeatureFlags);

    /// Sets (or with `None`, removes) the filter of layer `layer_id`.
    fn set_filter(&mut self, layer_id: &str, filter: Option<&FilterExpression>);
}
