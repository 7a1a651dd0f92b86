#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hover/selection feature state tracking.
//!
//! [`FeatureStateCoordinator`] is the single writer of per-feature paint
//! state. It remembers the flags last pushed for every feature and emits a
//! [`StateDelta`] holding only the writes that change something, so the
//! render layer never receives a redundant update.
//!
//! Pointer and click handling is split in two: [`InteractionState::apply`]
//! is a pure `(state, event) -> state` transition, and
//! [`FeatureStateCoordinator::handle`] diffs the result against what was
//! applied.

use std::collections::HashMap;

/// Identifier of a feature: its `row_number`.
pub type FeatureId = u64;

/// Paint-state flags of one feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureFlags {
    /// The pointer is over the feature (or its list entry).
    pub hover: bool,
    /// The feature was clicked.
    pub selected: bool,
}

impl FeatureFlags {
    /// No flags set.
    pub const EMPTY: Self = Self {
        hover: false,
        selected: false,
    };

    /// Whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.hover && !self.selected
    }
}

/// One paint-state write for the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureStateUpdate {
    /// Feature to repaint.
    pub id: FeatureId,
    /// Its complete new flag set.
    pub flags: FeatureFlags,
}

/// The writes produced by one coordinator call, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    updates: Vec<FeatureStateUpdate>,
}

impl StateDelta {
    /// Whether the call changed nothing.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.updates.is_empty()
    }

    /// The writes to push.
    #[must_use]
    pub fn updates(&self) -> &[FeatureStateUpdate] {
        &self.updates
    }

    fn extend(&mut self, other: Self) {
        self.updates.extend(other.updates);
    }
}

impl IntoIterator for StateDelta {
    type Item = FeatureStateUpdate;
    type IntoIter = std::vec::IntoIter<FeatureStateUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

/// Pointer and click input relevant to feature state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    /// The pointer moved; `Some` when it is over a feature or list entry.
    PointerMove(Option<FeatureId>),
    /// The pointer left the map or list.
    PointerLeave,
    /// A click; `None` for empty map space, which clears the selection.
    Click(Option<FeatureId>),
    /// New data was loaded; every identifier is stale.
    Reload,
}

/// Which feature is hovered and which is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    /// Hovered feature, if any.
    pub hovered: Option<FeatureId>,
    /// Selected feature, if any.
    pub selected: Option<FeatureId>,
}

impl InteractionState {
    /// The state after `event`.
    #[must_use]
    pub const fn apply(self, event: InteractionEvent) -> Self {
        match event {
            InteractionEvent::PointerMove(hovered) => Self { hovered, ..self },
            InteractionEvent::PointerLeave => Self {
                hovered: None,
                ..self
            },
            InteractionEvent::Click(selected) => Self { selected, ..self },
            InteractionEvent::Reload => Self {
                hovered: None,
                selected: None,
            },
        }
    }
}

/// Single authority for hover and selection paint state.
///
/// Create one per map instance and pass it to event handlers.
#[derive(Debug, Default)]
pub struct FeatureStateCoordinator {
    state: InteractionState,
    applied: HashMap<FeatureId, FeatureFlags>,
}

impl FeatureStateCoordinator {
    /// Creates a coordinator with nothing hovered or selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hover/selection identifiers.
    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Flags last applied to `id`; empty if none were.
    #[must_use]
    pub fn flags(&self, id: FeatureId) -> FeatureFlags {
        self.applied.get(&id).copied().unwrap_or_default()
    }

    /// Records a write and adds it to `delta` unless it matches what was
    /// last applied.
    fn write(
        &mut self,
        id: FeatureId,
        edit: impl FnOnce(&mut FeatureFlags),
        delta: &mut StateDelta,
    ) {
        let current = self.flags(id);
        let mut next = current;
        edit(&mut next);
        if next == current {
            return;
        }

        if next.is_empty() {
            self.applied.remove(&id);
        } else {
            self.applied.insert(id, next);
        }
        log::trace!("Feature {id} state -> {next:?}");
        delta.updates.push(FeatureStateUpdate { id, flags: next });
    }

    /// Moves the hover flag to `id` (or clears it for `None`).
    ///
    /// Returns an unchanged delta if `id` is already hovered.
    pub fn set_hovered(&mut self, id: Option<FeatureId>) -> StateDelta {
        let mut delta = StateDelta::default();
        if self.state.hovered == id {
            return delta;
        }
        if let Some(previous) = self.state.hovered {
            self.write(previous, |f| f.hover = false, &mut delta);
        }
        if let Some(next) = id {
            self.write(next, |f| f.hover = true, &mut delta);
        }
        self.state.hovered = id;
        delta
    }

    /// Moves the selected flag to `id` (or clears it for `None`).
    ///
    /// Independent of hover: a feature may be hovered and selected at once.
    pub fn set_selected(&mut self, id: Option<FeatureId>) -> StateDelta {
        let mut delta = StateDelta::default();
        if self.state.selected == id {
            return delta;
        }
        if let Some(previous) = self.state.selected {
            self.write(previous, |f| f.selected = false, &mut delta);
        }
        if let Some(next) = id {
            self.write(next, |f| f.selected = true, &mut delta);
        }
        self.state.selected = id;
        delta
    }

    /// Clears every tracked feature's flags and both identifiers.
    pub fn clear_all(&mut self) -> StateDelta {
        let mut ids: Vec<FeatureId> = self.applied.keys().copied().collect();
        ids.sort_unstable();

        let mut delta = StateDelta::default();
        for id in ids {
            self.write(id, |f| *f = FeatureFlags::EMPTY, &mut delta);
        }
        self.state = InteractionState::default();
        delta
    }

    /// Applies an input event and returns the resulting writes.
    pub fn handle(&mut self, event: InteractionEvent) -> StateDelta {
        if event == InteractionEvent::Reload {
            return self.clear_all();
        }
        let next = self.state.apply(event);
        let mut delta = self.set_hovered(next.hovered);
        delta.extend(self.set_selected(next.selected));
        delta
    }
}
