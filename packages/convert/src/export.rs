//! `GeoJSON` export and re-import.
//!
//! Exported collections carry the [`CollectionMetadata`] as a `metadata`
//! foreign member, so [`parse`] can restore typed properties from the
//! embedded schema.

use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use geojson::feature::Id;
use geojson::{Feature, GeoJson, Geometry, JsonObject, JsonValue};
use sheet_map_sheet_models::{
    CollectionMetadata, FeatureCollection, GeoFeature, Position, ROW_NUMBER_COLUMN, RawValue,
    TypedRow, TypedValue,
};

use crate::inference;

/// File extension used for exported documents.
pub const GEOJSON_EXTENSION: &str = "geojson";

/// Name of the foreign member holding the collection metadata.
const METADATA_MEMBER: &str = "metadata";

/// Errors from exporting or re-importing a collection.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document has no embedded metadata to re-type properties with.
    #[error("GeoJSON document has no '{METADATA_MEMBER}' member")]
    MissingMetadata,

    /// The document is not a feature collection of points.
    #[error("Unsupported GeoJSON content: {message}")]
    Unsupported {
        /// What was found instead.
        message: String,
    },
}

/// Encodes a typed value as JSON: dates as RFC 3339 strings, blanks as
/// `null`.
#[must_use]
pub fn typed_to_json(value: &TypedValue) -> JsonValue {
    match value {
        TypedValue::Number(n) => {
            serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number)
        }
        TypedValue::Boolean(b) => JsonValue::Bool(*b),
        TypedValue::Date(date) => {
            JsonValue::String(date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        TypedValue::String(text) => JsonValue::String(text.clone()),
        TypedValue::Empty => JsonValue::Null,
    }
}

fn json_to_raw(value: &JsonValue) -> RawValue {
    match value {
        JsonValue::Bool(b) => RawValue::Boolean(*b),
        JsonValue::Number(n) => n.as_f64().map_or(RawValue::Empty, RawValue::Number),
        JsonValue::String(text) => RawValue::Text(text.clone()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => RawValue::Empty,
    }
}

fn to_feature(feature: &GeoFeature) -> Feature {
    let mut properties = JsonObject::new();
    for (column, value) in feature.properties.values() {
        properties.insert(column.clone(), typed_to_json(value));
    }
    properties.insert(
        ROW_NUMBER_COLUMN.to_owned(),
        JsonValue::from(feature.row_number()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            feature.position.longitude,
            feature.position.latitude,
        ]))),
        id: Some(Id::Number(feature.row_number().into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Builds a `GeoJSON` feature collection with one point feature per
/// feature, `id` set to the row number.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if the metadata cannot be serialized.
pub fn to_geojson(
    collection: &FeatureCollection,
) -> Result<geojson::FeatureCollection, ExportError> {
    let mut foreign_members = JsonObject::new();
    foreign_members.insert(
        METADATA_MEMBER.to_owned(),
        serde_json::to_value(collection.metadata.as_ref())?,
    );

    Ok(geojson::FeatureCollection {
        bbox: None,
        features: collection.features.iter().map(to_feature).collect(),
        foreign_members: Some(foreign_members),
    })
}

/// Serializes a collection as pretty-printed `GeoJSON`.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_pretty_json(collection: &FeatureCollection) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&to_geojson(collection)?)?)
}

/// Returns `base` with the `.geojson` extension, added only if missing.
#[must_use]
pub fn export_file_name(base: &str) -> String {
    let suffix = format!(".{GEOJSON_EXTENSION}");
    if base.to_ascii_lowercase().ends_with(&suffix) {
        base.to_owned()
    } else {
        format!("{base}{suffix}")
    }
}

/// Writes a collection to `dir` as `<name>.geojson`, returning the path.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the write fails.
pub fn write_file(
    collection: &FeatureCollection,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(name));
    std::fs::write(&path, to_pretty_json(collection)?)?;
    log::info!(
        "Exported {} features to {}",
        collection.len(),
        path.display()
    );
    Ok(path)
}

fn unsupported(message: impl Into<String>) -> ExportError {
    ExportError::Unsupported {
        message: message.into(),
    }
}

fn from_feature(
    feature: &Feature,
    metadata: &CollectionMetadata,
) -> Result<GeoFeature, ExportError> {
    let position = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Point(coords)) if coords.len() >= 2 => {
            Position::new(coords[0], coords[1])
        }
        _ => return Err(unsupported("feature without a point geometry")),
    };

    let empty = JsonObject::new();
    let properties = feature.properties.as_ref().unwrap_or(&empty);

    let row_number = properties
        .get(ROW_NUMBER_COLUMN)
        .and_then(JsonValue::as_u64)
        .or_else(|| match &feature.id {
            Some(Id::Number(n)) => n.as_u64(),
            _ => None,
        })
        .ok_or_else(|| unsupported("feature without a row number"))?;

    let values = metadata
        .field_types
        .columns()
        .iter()
        .map(|column| {
            let raw = properties.get(&column.name).map_or(RawValue::Empty, json_to_raw);
            (
                column.name.clone(),
                inference::coerce(column.field_type, &raw),
            )
        })
        .collect();

    Ok(GeoFeature {
        position,
        properties: TypedRow::new(row_number, values),
    })
}

/// Parses a document produced by [`to_pretty_json`] back into a
/// [`FeatureCollection`].
///
/// # Errors
///
/// Returns [`ExportError`] if the document is not a point feature
/// collection with embedded metadata.
pub fn parse(document: &str) -> Result<FeatureCollection, ExportError> {
    let GeoJson::FeatureCollection(collection) = document.parse::<GeoJson>()? else {
        return Err(unsupported("document is not a FeatureCollection"));
    };

    let metadata_value = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get(METADATA_MEMBER))
        .ok_or(ExportError::MissingMetadata)?;
    let metadata: CollectionMetadata = serde_json::from_value(metadata_value.clone())?;

    let features = collection
        .features
        .iter()
        .map(|feature| from_feature(feature, &metadata))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection::new(features, metadata))
}
