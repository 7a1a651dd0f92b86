#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row validation, column type inference, and tabular-to-GeoJSON
//! conversion.
//!
//! [`convert`] is the sole producer of [`FeatureCollection`]s. It is a pure
//! function of its input: the same rows and options always yield the same
//! collection, with row numbers assigned in original row order.

pub mod coordinates;
pub mod export;
pub mod inference;

use sheet_map_sheet_models::{
    CollectionMetadata, FeatureCollection, GeoFeature, InvalidRow, ROW_NUMBER_COLUMN, RawRow,
    RawValue, RowNumbering, TypedRow,
};

pub use coordinates::CoordinateColumns;

/// Load-level conversion failures. Per-row problems are never errors; they
/// are recorded as [`InvalidRow`]s.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// No latitude/longitude column could be found.
    #[error("No latitude/longitude columns found (columns: {})", columns.join(", "))]
    MissingCoordinateFields {
        /// Every header present in the input.
        columns: Vec<String>,
    },

    /// Every row failed coordinate validation.
    #[error("No valid rows: all {total} rows have missing or invalid coordinates")]
    NoValidRows {
        /// Number of input rows.
        total: usize,
    },
}

/// Options controlling a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// How the coordinate columns are located.
    pub coordinates: CoordinateColumns,
    /// How `row_number` is assigned.
    pub row_numbering: RowNumbering,
}

/// Headers of the first row, minus the reserved row number column.
fn columns_of(first: &RawRow) -> Vec<String> {
    first
        .columns()
        .filter(|column| {
            let reserved = column.eq_ignore_ascii_case(ROW_NUMBER_COLUMN);
            if reserved {
                log::warn!(
                    "Source column '{column}' collides with the generated \
                     {ROW_NUMBER_COLUMN} and will be ignored"
                );
            }
            !reserved
        })
        .map(str::to_owned)
        .collect()
}

/// Converts raw rows into a [`FeatureCollection`].
///
/// The column set is taken from the first row. Each row whose coordinates
/// validate becomes one [`GeoFeature`]; every other row is kept verbatim in
/// [`CollectionMetadata::invalid_rows`]. The input is not modified.
///
/// # Errors
///
/// * [`ConvertError::MissingCoordinateFields`] if the coordinate columns
///   cannot be resolved.
/// * [`ConvertError::NoValidRows`] if no row passes validation (including
///   empty input).
pub fn convert(
    rows: &[RawRow],
    options: &ConvertOptions,
) -> Result<FeatureCollection, ConvertError> {
    let Some(first) = rows.first() else {
        return Err(ConvertError::NoValidRows { total: 0 });
    };

    let columns = columns_of(first);
    let resolved = coordinates::resolve(&columns, &options.coordinates)?;
    log::debug!(
        "Reading coordinates from '{}' / '{}'",
        resolved.latitude,
        resolved.longitude
    );

    let schema = inference::infer_schema(rows, &columns);

    let mut features = Vec::with_capacity(rows.len());
    let mut invalid_rows = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = options.row_numbering.assign(index);

        match coordinates::validate(row, &resolved) {
            Ok(position) => {
                let values = schema
                    .columns()
                    .iter()
                    .map(|column| {
                        let raw = row.get(&column.name).unwrap_or(&RawValue::Empty);
                        (
                            column.name.clone(),
                            inference::coerce(column.field_type, raw),
                        )
                    })
                    .collect();
                features.push(GeoFeature {
                    position,
                    properties: TypedRow::new(row_number, values),
                });
            }
            Err(reason) => {
                log::debug!("Row {row_number} is invalid: {reason}");
                invalid_rows.push(InvalidRow {
                    row_number,
                    reason,
                    row: row.clone(),
                });
            }
        }
    }

    if features.is_empty() {
        return Err(ConvertError::NoValidRows { total: rows.len() });
    }

    log::info!(
        "Converted {} of {} rows ({} invalid)",
        features.len(),
        rows.len(),
        invalid_rows.len()
    );

    let metadata = CollectionMetadata {
        field_types: schema,
        valid_row_count: features.len(),
        total_row_count: rows.len(),
        invalid_rows,
        latitude_column: resolved.latitude,
        longitude_column: resolved.longitude,
    };

    Ok(FeatureCollection::new(features, metadata))
}
