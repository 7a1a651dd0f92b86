//! Event adapter keeping the render layer, feature state, and list view in
//! step.

use sheet_map_filter::{Bounds, FilterEngine, FilteredView};
use sheet_map_interaction::{FeatureId, FeatureStateCoordinator, InteractionEvent, StateDelta};
use sheet_map_sheet_models::{FeatureCollection, Position};

use crate::{ReadyHandle, RenderError, RenderLayer};

/// Source id used when none is configured.
pub const DEFAULT_SOURCE_ID: &str = "sheet";

/// Layer id used when none is configured.
pub const DEFAULT_LAYER_ID: &str = "sheet-points";

/// Host events the view reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Pointer moved over the map or list; `Some` when over a feature.
    PointerMove(Option<FeatureId>),
    /// Pointer left the map or list.
    PointerLeave,
    /// Click on a feature, or on empty space for `None`.
    Click(Option<FeatureId>),
    /// The map settled after a pan or zoom.
    MoveEnd {
        /// New map center.
        center: Position,
        /// New visible area.
        bounds: Bounds,
    },
    /// A filter control changed; empty text clears the column's filter.
    FilterChanged {
        /// Column being filtered.
        column: String,
        /// Entered or selected value.
        value: String,
    },
    /// The "within map bounds" toggle changed.
    BoundsToggled(bool),
}

/// One map instance: its render layer, coordinator, and filter engine.
#[derive(Debug)]
pub struct MapView<L> {
    layer: L,
    source_id: String,
    layer_id: String,
    center: Position,
    bounds: Option<Bounds>,
    coordinator: FeatureStateCoordinator,
    engine: Option<FilterEngine>,
}

impl<L: RenderLayer> MapView<L> {
    /// Waits for the render layer to become ready and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NeverReady`] if the layer never signals
    /// readiness.
    pub async fn attach(
        layer: L,
        ready: &ReadyHandle,
        center: Position,
    ) -> Result<Self, RenderError> {
        ready.wait().await?;
        Ok(Self {
            layer,
            source_id: DEFAULT_SOURCE_ID.to_owned(),
            layer_id: DEFAULT_LAYER_ID.to_owned(),
            center,
            bounds: None,
            coordinator: FeatureStateCoordinator::new(),
            engine: None,
        })
    }

    /// Uses `source_id` and `layer_id` instead of the defaults.
    #[must_use]
    pub fn with_ids(mut self, source_id: &str, layer_id: &str) -> Self {
        source_id.clone_into(&mut self.source_id);
        layer_id.clone_into(&mut self.layer_id);
        self
    }

    /// The wrapped render layer.
    #[must_use]
    pub const fn layer(&self) -> &L {
        &self.layer
    }

    /// The feature state coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &FeatureStateCoordinator {
        &self.coordinator
    }

    /// The filter engine, once data is loaded.
    #[must_use]
    pub const fn engine(&self) -> Option<&FilterEngine> {
        self.engine.as_ref()
    }

    /// The current list view, once data is loaded.
    #[must_use]
    pub fn view(&self) -> Option<&FilteredView> {
        self.engine.as_ref().map(FilterEngine::view)
    }

    fn push_delta(&mut self, delta: StateDelta) {
        for update in delta {
            self.layer
                .set_feature_state(&self.source_id, update.id, update.flags);
        }
    }

    fn push_filter(&mut self) {
        let expression = self.engine.as_ref().and_then(FilterEngine::render_filter);
        self.layer.set_filter(&self.layer_id, expression.as_ref());
    }

    /// Shows freshly loaded data, resetting feature state and filters.
    pub fn load(&mut self, collection: FeatureCollection) -> &FilteredView {
        let delta = self.coordinator.handle(InteractionEvent::Reload);
        self.push_delta(delta);

        self.layer.set_data(&self.source_id, &collection);
        log::info!(
            "Showing {} features on source '{}'",
            collection.len(),
            self.source_id
        );

        let engine = match self.engine.take() {
            Some(mut engine) => {
                let _ = engine.reload(collection);
                engine
            }
            None => {
                let mut engine = FilterEngine::new(collection, self.center);
                if let Some(bounds) = self.bounds {
                    let _ = engine.move_to(self.center, bounds);
                }
                engine
            }
        };
        self.layer.set_filter(&self.layer_id, None);

        self.engine.insert(engine).view()
    }

    /// Applies a host event. Returns the recomputed list view, or `None`
    /// while no data is loaded.
    pub fn handle(&mut self, event: ViewEvent) -> Option<&FilteredView> {
        if self.engine.is_none() {
            if let ViewEvent::MoveEnd { center, bounds } = event {
                self.center = center;
                self.bounds = Some(bounds);
            }
            log::debug!("Ignoring {event:?} before data is loaded");
            return None;
        }

        match event {
            ViewEvent::PointerMove(id) => {
                let delta = self.coordinator.handle(InteractionEvent::PointerMove(id));
                self.push_delta(delta);
            }
            ViewEvent::PointerLeave => {
                let delta = self.coordinator.handle(InteractionEvent::PointerLeave);
                self.push_delta(delta);
            }
            ViewEvent::Click(id) => {
                let delta = self.coordinator.handle(InteractionEvent::Click(id));
                self.push_delta(delta);
            }
            ViewEvent::MoveEnd { center, bounds } => {
                self.center = center;
                self.bounds = Some(bounds);
                if let Some(engine) = &mut self.engine {
                    let _ = engine.move_to(center, bounds);
                }
            }
            ViewEvent::FilterChanged { column, value } => {
                if let Some(engine) = &mut self.engine {
                    let _ = engine.set_filter_text(&column, &value);
                }
                self.push_filter();
            }
            ViewEvent::BoundsToggled(enabled) => {
                if let Some(engine) = &mut self.engine {
                    let _ = engine.set_within_bounds(enabled);
                }
            }
        }

        self.view()
    }
}
