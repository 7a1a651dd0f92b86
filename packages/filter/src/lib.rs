#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Column and viewport filtering with proximity-sorted list views.
//!
//! [`FilterEngine`] owns the [`FilterState`] and derives a read-only
//! [`FilteredView`] of the loaded [`FeatureCollection`]: features that pass
//! every active column filter (and, when enabled, lie inside the current
//! viewport), sorted by great-circle distance from the map center. The view
//! is recomputed synchronously on every input change.

pub mod bounds;
pub mod expression;
pub mod proximity;

use std::cmp::Ordering;
use std::collections::BTreeMap;

use sheet_map_convert::inference::coerce;
use sheet_map_sheet_models::{
    FeatureCollection, FieldType, GeoFeature, Position, ROW_NUMBER_COLUMN, RawValue, TypedValue,
};

pub use bounds::Bounds;
pub use expression::FilterExpression;
pub use proximity::{Direction, Octant, Proximity};

/// Active column filters plus the "within map bounds" toggle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    columns: BTreeMap<String, TypedValue>,
    within_bounds: bool,
}

impl FilterState {
    /// Constrains `column` to `value`, or removes its constraint for
    /// `None`.
    pub fn set(&mut self, column: &str, value: Option<TypedValue>) {
        match value {
            Some(value) => {
                self.columns.insert(column.to_owned(), value);
            }
            None => {
                self.columns.remove(column);
            }
        }
    }

    /// The constraint on `column`, if any.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.columns.get(column)
    }

    /// Active column constraints, ordered by column name.
    pub fn active(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether results are restricted to the viewport.
    #[must_use]
    pub const fn within_bounds(&self) -> bool {
        self.within_bounds
    }

    /// Turns the viewport restriction on or off.
    pub const fn set_within_bounds(&mut self, enabled: bool) {
        self.within_bounds = enabled;
    }

    /// Whether `feature` satisfies every column constraint. A constraint on
    /// [`ROW_NUMBER_COLUMN`] matches the feature's row number.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    pub fn matches(&self, feature: &GeoFeature) -> bool {
        self.columns.iter().all(|(column, wanted)| {
            if column == ROW_NUMBER_COLUMN {
                wanted.as_f64() == Some(feature.row_number() as f64)
            } else {
                feature.properties.get(column) == Some(wanted)
            }
        })
    }
}

/// Display annotation for one entry of the list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListAnnotation {
    /// Feature the annotation belongs to.
    pub row_number: u64,
    /// Distance and bearing from the map center.
    pub proximity: Proximity,
    /// Formatted distance, e.g. `"350 m"` or `"12.4 km"`.
    pub distance: String,
    /// Arrow bucket or "at location".
    pub direction: Direction,
}

impl ListAnnotation {
    fn new(row_number: u64, proximity: Proximity) -> Self {
        Self {
            row_number,
            distance: proximity.distance_label(),
            direction: proximity.direction(),
            proximity,
        }
    }
}

/// Filtered, proximity-sorted features with their list annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    /// Matching features, nearest first. Shares the source metadata.
    pub collection: FeatureCollection,
    /// One annotation per feature, in the same order.
    pub annotations: Vec<ListAnnotation>,
}

impl FilteredView {
    /// Features paired with their annotations, nearest first.
    pub fn entries(&self) -> impl Iterator<Item = (&GeoFeature, &ListAnnotation)> {
        self.collection.features.iter().zip(&self.annotations)
    }

    /// Number of matching features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Whether nothing matched; the list should show its empty state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Derives the filtered, sorted view of `collection`.
///
/// The viewport restriction only applies when both the toggle is on and
/// `bounds` are known. Ties in distance keep row number order.
#[must_use]
pub fn filter_and_sort(
    collection: &FeatureCollection,
    filters: &FilterState,
    bounds: Option<&Bounds>,
    center: Position,
) -> FilteredView {
    let bounds = bounds.filter(|_| filters.within_bounds());

    let mut matched: Vec<(Proximity, &GeoFeature)> = collection
        .features
        .iter()
        .filter(|feature| filters.matches(feature))
        .filter(|feature| bounds.is_none_or(|b| b.contains(feature.position)))
        .map(|feature| (Proximity::between(center, feature.position), feature))
        .collect();

    matched.sort_by(|(a, fa), (b, fb)| {
        a.distance_meters
            .total_cmp(&b.distance_meters)
            .then_with(|| fa.row_number().cmp(&fb.row_number()))
    });

    let annotations = matched
        .iter()
        .map(|(proximity, feature)| ListAnnotation::new(feature.row_number(), *proximity))
        .collect();
    let features = matched.into_iter().map(|(_, f)| f.clone()).collect();

    FilteredView {
        collection: collection.derive(features),
        annotations,
    }
}

fn type_rank(value: &TypedValue) -> u8 {
    match value {
        TypedValue::Boolean(_) => 0,
        TypedValue::Number(_) => 1,
        TypedValue::Date(_) => 2,
        TypedValue::String(_) => 3,
        TypedValue::Empty => 4,
    }
}

/// Orders values for option lists: by type, then naturally within a type.
fn compare_values(a: &TypedValue, b: &TypedValue) -> Ordering {
    match (a, b) {
        (TypedValue::Boolean(x), TypedValue::Boolean(y)) => x.cmp(y),
        (TypedValue::Number(x), TypedValue::Number(y)) => x.total_cmp(y),
        (TypedValue::Date(x), TypedValue::Date(y)) => x.cmp(y),
        (TypedValue::String(x), TypedValue::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Owner of [`FilterState`] and the current [`FilteredView`].
#[derive(Debug, Clone)]
pub struct FilterEngine {
    collection: FeatureCollection,
    filters: FilterState,
    bounds: Option<Bounds>,
    center: Position,
    view: FilteredView,
}

impl FilterEngine {
    /// Creates an engine over `collection`, sorting around `center`.
    #[must_use]
    pub fn new(collection: FeatureCollection, center: Position) -> Self {
        let filters = FilterState::default();
        let view = filter_and_sort(&collection, &filters, None, center);
        Self {
            collection,
            filters,
            bounds: None,
            center,
            view,
        }
    }

    fn recompute(&mut self) -> &FilteredView {
        self.view = filter_and_sort(
            &self.collection,
            &self.filters,
            self.bounds.as_ref(),
            self.center,
        );
        log::debug!(
            "Filtered view: {} of {} features",
            self.view.len(),
            self.collection.len()
        );
        &self.view
    }

    /// The current view.
    #[must_use]
    pub const fn view(&self) -> &FilteredView {
        &self.view
    }

    /// The full, unfiltered collection.
    #[must_use]
    pub const fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// The current filter state.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// The reference point used for sorting.
    #[must_use]
    pub const fn center(&self) -> Position {
        self.center
    }

    /// Replaces the data and resets every filter.
    pub fn reload(&mut self, collection: FeatureCollection) -> &FilteredView {
        self.collection = collection;
        self.filters = FilterState::default();
        self.recompute()
    }

    /// Constrains `column` to `value` (`None` removes the constraint).
    pub fn set_filter(&mut self, column: &str, value: Option<TypedValue>) -> &FilteredView {
        self.filters.set(column, value);
        self.recompute()
    }

    /// Constrains `column` to user-entered text, coerced with the column's
    /// inferred type. Blank text removes the constraint.
    pub fn set_filter_text(&mut self, column: &str, text: &str) -> &FilteredView {
        let field_type = if column == ROW_NUMBER_COLUMN {
            FieldType::Number
        } else {
            self.collection
                .metadata
                .field_types
                .field_type(column)
                .unwrap_or(FieldType::String)
        };
        let value = coerce(field_type, &RawValue::from(text.trim()));
        let value = (!value.is_empty()).then_some(value);
        self.set_filter(column, value)
    }

    /// Removes every column constraint. The bounds toggle is kept.
    pub fn clear_filters(&mut self) -> &FilteredView {
        let within_bounds = self.filters.within_bounds();
        self.filters = FilterState::default();
        self.filters.set_within_bounds(within_bounds);
        self.recompute()
    }

    /// Turns the viewport restriction on or off.
    pub fn set_within_bounds(&mut self, enabled: bool) -> &FilteredView {
        self.filters.set_within_bounds(enabled);
        self.recompute()
    }

    /// Records a settled map move: the new center and visible bounds.
    pub fn move_to(&mut self, center: Position, bounds: Bounds) -> &FilteredView {
        self.center = center;
        self.bounds = Some(bounds);
        self.recompute()
    }

    /// Distinct non-empty values of `column` across the full collection,
    /// sorted, for populating a filter control.
    #[must_use]
    pub fn options(&self, column: &str) -> Vec<TypedValue> {
        let mut values: Vec<TypedValue> = self
            .collection
            .features
            .iter()
            .filter_map(|f| f.properties.get(column))
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        values.sort_by(compare_values);
        values.dedup();
        values
    }

    /// Active column filters as a render-layer expression, or `None` when
    /// no column is constrained.
    #[must_use]
    pub fn render_filter(&self) -> Option<FilterExpression> {
        let parts: Vec<FilterExpression> = self
            .filters
            .active()
            .map(|(property, value)| FilterExpression::Equals {
                property: property.to_owned(),
                value: value.clone(),
            })
            .collect();
        (!parts.is_empty()).then_some(FilterExpression::All(parts))
    }
}

#[cfg(test)]
mod tests {
    use sheet_map_convert::{ConvertOptions, convert};
    use sheet_map_sheet_models::RawRow;

    use super::*;

    fn place(lng: f64, lat: f64, name: &str, category: &str) -> RawRow {
        RawRow::new()
            .with("Name", name)
            .with("Category", category)
            .with("Latitude", lat.to_string())
            .with("Longitude", lng.to_string())
    }

    fn collection(rows: &[RawRow]) -> FeatureCollection {
        convert(rows, &ConvertOptions::default()).unwrap()
    }

    fn names(view: &FilteredView) -> Vec<String> {
        view.collection
            .features
            .iter()
            .map(|f| f.properties.get("Name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn sorts_by_distance_and_formats() {
        let rows = vec![
            place(0.0, 1.0, "far", "x"),
            place(0.0, 0.001, "near", "x"),
        ];
        let engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let view = engine.view();

        assert_eq!(names(view), vec!["near", "far"]);
        assert_eq!(view.annotations[0].distance, "111 m");
        assert_eq!(view.annotations[1].distance, "111.2 km");
        assert_eq!(
            view.annotations[0].direction,
            Direction::Toward(Octant::North)
        );
    }

    #[test]
    fn category_and_bounds_compose() {
        let mut rows = Vec::new();
        // 3 parks: two inside the viewport, one outside.
        rows.push(place(1.0, 1.0, "park-in-1", "Park"));
        rows.push(place(2.0, 2.0, "park-in-2", "Park"));
        rows.push(place(50.0, 50.0, "park-out", "Park"));
        for i in 0..7 {
            rows.push(place(f64::from(i), 0.5, &format!("shop-{i}"), "Shop"));
        }
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        assert_eq!(engine.view().len(), 10);

        assert_eq!(engine.set_filter_text("Category", "Park").len(), 3);
        let _ = engine.move_to(Position::new(0.0, 0.0), Bounds::new(-5.0, -5.0, 5.0, 5.0));
        assert_eq!(engine.view().len(), 3);

        let view = engine.set_within_bounds(true);
        assert_eq!(view.len(), 2);
        assert_eq!(names(view), vec!["park-in-1", "park-in-2"]);
    }

    #[test]
    fn adding_filters_never_grows_results() {
        let rows = vec![
            place(0.0, 0.0, "a", "Park").with("Open", "true"),
            place(0.0, 1.0, "b", "Park").with("Open", "false"),
            place(0.0, 2.0, "c", "Shop").with("Open", "true"),
        ];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let one = engine.set_filter_text("Category", "Park").len();
        let two = engine.set_filter_text("Open", "TRUE").len();
        assert_eq!(one, 2);
        assert_eq!(two, 1);
        assert!(two <= one);
        assert_eq!(
            engine.filters().get("Open"),
            Some(&TypedValue::Boolean(true))
        );
    }

    #[test]
    fn empty_results_are_valid() {
        let rows = vec![place(0.0, 0.0, "a", "Park")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let view = engine.set_filter_text("Category", "Museum");
        assert!(view.is_empty());
        assert_eq!(view.collection.metadata.total_row_count, 1);
    }

    #[test]
    fn blank_filter_text_removes_constraint() {
        let rows = vec![place(0.0, 0.0, "a", "Park"), place(0.0, 0.0, "b", "Shop")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let _ = engine.set_filter_text("Category", "Park");
        assert_eq!(engine.set_filter_text("Category", "  ").len(), 2);
        assert!(engine.render_filter().is_none());
    }

    #[test]
    fn ties_keep_row_order_and_distances_are_monotonic() {
        let rows = vec![
            place(0.0, 0.5, "b", "x"),
            place(0.0, 0.2, "a1", "x"),
            place(0.0, -0.2, "a2", "x"),
            place(0.2, 0.0, "a3", "x"),
            place(0.0, 0.0, "here", "x"),
        ];
        let engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let view = engine.view();
        assert_eq!(names(view), vec!["here", "a1", "a2", "a3", "b"]);
        assert_eq!(view.annotations[0].direction, Direction::AtLocation);
        assert!(
            view.annotations
                .windows(2)
                .all(|w| w[0].proximity.distance_meters <= w[1].proximity.distance_meters)
        );
    }

    #[test]
    fn moving_resorts_around_new_center() {
        let rows = vec![place(0.0, 0.0, "origin", "x"), place(10.0, 10.0, "ten", "x")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        assert_eq!(names(engine.view()), vec!["origin", "ten"]);
        let view = engine.move_to(
            Position::new(10.0, 10.0),
            Bounds::new(-180.0, -90.0, 180.0, 90.0),
        );
        assert_eq!(names(view), vec!["ten", "origin"]);
    }

    #[test]
    fn reload_resets_filters() {
        let rows = vec![place(0.0, 0.0, "a", "Park"), place(0.0, 0.0, "b", "Shop")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let _ = engine.set_filter_text("Category", "Park");
        let _ = engine.set_within_bounds(true);
        let view = engine.reload(collection(&rows));
        assert_eq!(view.len(), 2);
        assert_eq!(engine.filters(), &FilterState::default());
    }

    #[test]
    fn clear_filters_keeps_bounds_toggle() {
        let rows = vec![place(0.0, 0.0, "a", "Park"), place(0.0, 0.0, "b", "Shop")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let _ = engine.set_within_bounds(true);
        let _ = engine.set_filter_text("Category", "Park");
        assert_eq!(engine.clear_filters().len(), 2);
        assert!(engine.filters().within_bounds());
    }

    #[test]
    fn row_number_is_filterable() {
        let rows = vec![place(0.0, 0.0, "a", "Park"), place(0.0, 1.0, "b", "Shop")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let view = engine.set_filter_text(ROW_NUMBER_COLUMN, "3");
        assert_eq!(names(view), vec!["b"]);
        assert!(engine.set_filter_text(ROW_NUMBER_COLUMN, "x").is_empty());
    }

    #[test]
    fn options_are_distinct_and_sorted() {
        let rows = vec![
            place(0.0, 0.0, "a", "Shop"),
            place(0.0, 0.0, "b", "Park"),
            place(0.0, 0.0, "c", "Shop"),
            place(0.0, 0.0, "d", ""),
        ];
        let engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        assert_eq!(
            engine.options("Category"),
            vec![
                TypedValue::String("Park".to_owned()),
                TypedValue::String("Shop".to_owned()),
            ]
        );
        assert!(engine.options("Missing").is_empty());
    }

    #[test]
    fn render_filter_reflects_active_columns() {
        let rows = vec![place(0.0, 0.0, "a", "Park")];
        let mut engine = FilterEngine::new(collection(&rows), Position::new(0.0, 0.0));
        let _ = engine.set_filter_text("Category", "Park");
        assert_eq!(
            engine.render_filter(),
            Some(FilterExpression::All(vec![FilterExpression::Equals {
                property: "Category".to_owned(),
                value: TypedValue::String("Park".to_owned()),
            }]))
        );
    }
}
