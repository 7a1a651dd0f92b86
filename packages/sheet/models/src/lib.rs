#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tabular row, inferred schema, and geospatial feature types.
//!
//! A published sheet arrives as a list of [`RawRow`]s. The converter infers
//! one [`FieldType`] per column, coerces every cell into a [`TypedValue`],
//! and emits a [`FeatureCollection`] of point [`GeoFeature`]s together with
//! [`CollectionMetadata`] describing the schema and the rows it rejected.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Timelike as _, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Name of the synthetic per-row identifier injected into every feature.
pub const ROW_NUMBER_COLUMN: &str = "row_number";

/// An untyped spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A boolean cell (only produced by already-parsed input).
    Boolean(bool),
    /// A numeric cell (only produced by already-parsed input).
    Number(f64),
    /// A text cell, as delivered by CSV exports.
    Text(String),
    /// A blank cell.
    Empty,
}

impl RawValue {
    /// Whether the cell carries no value. Whitespace-only text counts as
    /// empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Boolean(_) | Self::Number(_) => false,
        }
    }

    /// Renders the cell as text, the form every type test starts from.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Boolean(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Empty => String::new(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// One spreadsheet row: column name to untyped cell, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Appends a cell, replacing any existing cell of the same column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets a cell, replacing any existing cell of the same column in place
    /// so that column order is preserved.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        let column = column.into();
        let value = value.into();
        if let Some(cell) = self.cells.iter_mut().find(|(name, _)| *name == column) {
            cell.1 = value;
        } else {
            self.cells.push((column, value));
        }
    }

    /// Looks up a cell by exact column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in spreadsheet order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Cells in spreadsheet order.
    #[must_use]
    pub fn cells(&self) -> &[(String, RawValue)] {
        &self.cells
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawRowVisitor;

        impl<'de> Visitor<'de> for RawRowVisitor {
            type Value = RawRow;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to cell values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RawRow, A::Error> {
                let mut row = RawRow::new();
                while let Some((column, value)) = access.next_entry::<String, RawValue>()? {
                    row.insert(column, value);
                }
                Ok(row)
            }
        }

        deserializer.deserialize_map(RawRowVisitor)
    }
}

/// Column type inferred once per column from all of its non-empty values.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    /// Every value is a finite number.
    Number,
    /// Every value is `true` or `false`, in any case.
    Boolean,
    /// Every value is a calendar date and they are not all the epoch.
    Date,
    /// Anything else, and columns with no values at all.
    String,
}

/// A cell coerced to its column's [`FieldType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// A `number` column value.
    Number(f64),
    /// A `boolean` column value.
    Boolean(bool),
    /// A `date` column value.
    Date(DateTime<Utc>),
    /// A `string` column value.
    String(String),
    /// A blank cell in any column.
    Empty,
}

impl TypedValue {
    /// Whether this is a blank cell.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Date(value) if value.num_seconds_from_midnight() == 0 => {
                write!(f, "{}", value.format("%Y-%m-%d"))
            }
            Self::Date(value) => write!(f, "{}", value.to_rfc3339()),
            Self::String(value) => f.write_str(value),
            Self::Empty => Ok(()),
        }
    }
}

/// A row whose cells have been coerced to their inferred column types.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRow {
    /// Stable identifier assigned at conversion time.
    pub row_number: u64,
    values: Vec<(String, TypedValue)>,
}

impl TypedRow {
    /// Creates a typed row from cells already in column order.
    #[must_use]
    pub const fn new(row_number: u64, values: Vec<(String, TypedValue)>) -> Self {
        Self { row_number, values }
    }

    /// Looks up a typed cell by exact column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&TypedValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Cells in column order, excluding the synthetic row number.
    #[must_use]
    pub fn values(&self) -> &[(String, TypedValue)] {
        &self.values
    }
}

/// A WGS84 longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Degrees east, within `[-180, 180]`.
    pub longitude: f64,
    /// Degrees north, within `[-90, 90]`.
    pub latitude: f64,
}

impl Position {
    /// Creates a position from longitude and latitude, in that order.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Whether both coordinates are finite and within geographic range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// One geolocated record: a point and its typed property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    /// Point geometry.
    pub position: Position,
    /// Typed properties, including the synthetic row number.
    pub properties: TypedRow,
}

impl GeoFeature {
    /// The feature's identifier for paint state and list keys.
    #[must_use]
    pub const fn row_number(&self) -> u64 {
        self.properties.row_number
    }
}

/// A column name and its inferred type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Column header text.
    pub name: String,
    /// Inferred type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Inferred field types for every column, in spreadsheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
}

impl Schema {
    /// Creates a schema from columns in spreadsheet order.
    #[must_use]
    pub const fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Looks up the inferred type of a column.
    #[must_use]
    pub fn field_type(&self, column: &str) -> Option<FieldType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.field_type)
    }

    /// Columns in spreadsheet order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Column names in spreadsheet order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Why a row was excluded from the feature set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InvalidReason {
    /// The latitude cell is blank.
    MissingLatitude,
    /// The longitude cell is blank.
    MissingLongitude,
    /// The latitude cell is not a finite number.
    UnparseableLatitude,
    /// The longitude cell is not a finite number.
    UnparseableLongitude,
    /// The latitude is outside `[-90, 90]`.
    LatitudeOutOfRange,
    /// The longitude is outside `[-180, 180]`.
    LongitudeOutOfRange,
}

/// A row that failed coordinate validation, kept verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
    /// Identifier the row would have had as a feature.
    pub row_number: u64,
    /// First validation failure found.
    pub reason: InvalidReason,
    /// The untouched source row.
    pub row: RawRow,
}

/// How the synthetic `row_number` is assigned.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RowNumbering {
    /// 1-based sheet row with the header on row 1: the first data row is 2.
    #[default]
    Spreadsheet,
    /// 0-based position among data rows.
    Sequence,
}

impl RowNumbering {
    /// Row number for the data row at `index` (0-based, header excluded).
    #[must_use]
    pub const fn assign(self, index: usize) -> u64 {
        match self {
            Self::Spreadsheet => index as u64 + 2,
            Self::Sequence => index as u64,
        }
    }
}

/// Descriptive metadata produced alongside the features of one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMetadata {
    /// Inferred type of every column.
    pub field_types: Schema,
    /// Rows excluded from the feature set.
    pub invalid_rows: Vec<InvalidRow>,
    /// Number of input rows.
    pub total_row_count: usize,
    /// Number of rows that became features.
    pub valid_row_count: usize,
    /// Column the latitudes were read from.
    pub latitude_column: String,
    /// Column the longitudes were read from.
    pub longitude_column: String,
}

/// The converted features of one data load plus their metadata.
///
/// Replaced wholesale on reload. Filtered views are new collections that
/// share the same metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    /// Features in original row order (or the order a view sorted them).
    pub features: Vec<GeoFeature>,
    /// Metadata shared by every view derived from this load.
    pub metadata: Arc<CollectionMetadata>,
}

impl FeatureCollection {
    /// Creates a collection.
    #[must_use]
    pub fn new(features: Vec<GeoFeature>, metadata: CollectionMetadata) -> Self {
        Self {
            features,
            metadata: Arc::new(metadata),
        }
    }

    /// Creates a sub-collection carrying this collection's metadata.
    #[must_use]
    pub fn derive(&self, features: Vec<GeoFeature>) -> Self {
        Self {
            features,
            metadata: Arc::clone(&self.metadata),
        }
    }

    /// Finds a feature by row number.
    #[must_use]
    pub fn feature(&self, row_number: u64) -> Option<&GeoFeature> {
        self.features.iter().find(|f| f.row_number() == row_number)
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
