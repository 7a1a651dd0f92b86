//! Latitude/longitude column resolution and per-row coordinate validation.

use sheet_map_sheet_models::{InvalidReason, Position, RawRow, RawValue};

use crate::ConvertError;
use crate::inference::parse_number;

/// Header names accepted as latitude when detecting columns, by priority.
pub const LATITUDE_ALIASES: &[&str] = &["latitude", "lat", "y"];

/// Header names accepted as longitude when detecting columns, by priority.
pub const LONGITUDE_ALIASES: &[&str] = &["longitude", "lon", "lng", "x"];

/// How the coordinate columns are located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateColumns {
    /// Use these column names (matched case-insensitively).
    Named {
        /// Latitude column name.
        latitude: String,
        /// Longitude column name.
        longitude: String,
    },
    /// Pick the first header matching [`LATITUDE_ALIASES`] and
    /// [`LONGITUDE_ALIASES`].
    Detect,
}

impl Default for CoordinateColumns {
    fn default() -> Self {
        Self::Named {
            latitude: "Latitude".to_owned(),
            longitude: "Longitude".to_owned(),
        }
    }
}

/// The actual header names coordinates are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Latitude header as it appears in the sheet.
    pub latitude: String,
    /// Longitude header as it appears in the sheet.
    pub longitude: String,
}

fn find_column<'a>(columns: &'a [String], wanted: &str) -> Option<&'a String> {
    columns
        .iter()
        .find(|c| c.as_str() == wanted)
        .or_else(|| {
            columns
                .iter()
                .find(|c| c.trim().eq_ignore_ascii_case(wanted))
        })
}

fn find_alias<'a>(columns: &'a [String], aliases: &[&str]) -> Option<&'a String> {
    aliases.iter().find_map(|alias| find_column(columns, alias))
}

/// Resolves the coordinate columns among `columns`.
///
/// # Errors
///
/// Returns [`ConvertError::MissingCoordinateFields`] if either column
/// cannot be found. The error carries every detected header.
pub fn resolve(
    columns: &[String],
    mode: &CoordinateColumns,
) -> Result<ResolvedColumns, ConvertError> {
    let (latitude, longitude) = match mode {
        CoordinateColumns::Named {
            latitude,
            longitude,
        } => (find_column(columns, latitude), find_column(columns, longitude)),
        CoordinateColumns::Detect => (
            find_alias(columns, LATITUDE_ALIASES),
            find_alias(columns, LONGITUDE_ALIASES),
        ),
    };

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) if latitude != longitude => Ok(ResolvedColumns {
            latitude: latitude.clone(),
            longitude: longitude.clone(),
        }),
        _ => Err(ConvertError::MissingCoordinateFields {
            columns: columns.to_vec(),
        }),
    }
}

fn read(
    value: Option<&RawValue>,
    missing: InvalidReason,
    unparseable: InvalidReason,
) -> Result<f64, InvalidReason> {
    let value = value.filter(|v| !v.is_empty()).ok_or(missing)?;
    let parsed = match value {
        RawValue::Number(n) if n.is_finite() => Some(*n),
        RawValue::Text(text) => parse_number(text),
        RawValue::Number(_) | RawValue::Boolean(_) | RawValue::Empty => None,
    };
    parsed.ok_or(unparseable)
}

/// Reads and range-checks a row's coordinates.
///
/// # Errors
///
/// Returns the first [`InvalidReason`] that applies to the row.
pub fn validate(row: &RawRow, columns: &ResolvedColumns) -> Result<Position, InvalidReason> {
    let latitude = read(
        row.get(&columns.latitude),
        InvalidReason::MissingLatitude,
        InvalidReason::UnparseableLatitude,
    )?;
    let longitude = read(
        row.get(&columns.longitude),
        InvalidReason::MissingLongitude,
        InvalidReason::UnparseableLongitude,
    )?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(InvalidReason::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(InvalidReason::LongitudeOutOfRange);
    }

    Ok(Position::new(longitude, latitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn named_columns_match_case_insensitively() {
        let resolved = resolve(
            &headers(&["Name", "LATITUDE", "longitude"]),
            &CoordinateColumns::default(),
        )
        .unwrap();
        assert_eq!(resolved.latitude, "LATITUDE");
        assert_eq!(resolved.longitude, "longitude");
    }

    #[test]
    fn named_columns_prefer_exact_case() {
        let resolved = resolve(
            &headers(&["latitude", "Latitude", "Longitude"]),
            &CoordinateColumns::default(),
        )
        .unwrap();
        assert_eq!(resolved.latitude, "Latitude");
    }

    #[test]
    fn detection_uses_alias_priority() {
        let resolved = resolve(
            &headers(&["x", "y", "Lat", "Lng"]),
            &CoordinateColumns::Detect,
        )
        .unwrap();
        assert_eq!(resolved.latitude, "Lat");
        assert_eq!(resolved.longitude, "Lng");

        let resolved = resolve(&headers(&["X", "Y"]), &CoordinateColumns::Detect).unwrap();
        assert_eq!(resolved.latitude, "Y");
        assert_eq!(resolved.longitude, "X");
    }

    #[test]
    fn missing_columns_report_detected_headers() {
        let err = resolve(&headers(&["Name", "Lat"]), &CoordinateColumns::Detect).unwrap_err();
        let ConvertError::MissingCoordinateFields { columns } = err else {
            panic!("expected MissingCoordinateFields");
        };
        assert_eq!(columns, headers(&["Name", "Lat"]));
    }

    #[test]
    fn validation_reasons() {
        let columns = ResolvedColumns {
            latitude: "Latitude".to_owned(),
            longitude: "Longitude".to_owned(),
        };
        let check = |lat: &str, lng: &str| {
            validate(
                &RawRow::new().with("Latitude", lat).with("Longitude", lng),
                &columns,
            )
        };

        assert_eq!(check("18.5", "73.8"), Ok(Position::new(73.8, 18.5)));
        assert_eq!(check("", "73.8"), Err(InvalidReason::MissingLatitude));
        assert_eq!(check("abc", "73.8"), Err(InvalidReason::UnparseableLatitude));
        assert_eq!(check("18.5", " "), Err(InvalidReason::MissingLongitude));
        assert_eq!(check("18.5", "east"), Err(InvalidReason::UnparseableLongitude));
        assert_eq!(check("91", "73.8"), Err(InvalidReason::LatitudeOutOfRange));
        assert_eq!(check("18.5", "-180.1"), Err(InvalidReason::LongitudeOutOfRange));
        assert_eq!(check("-90", "180"), Ok(Position::new(180.0, -90.0)));
    }

    #[test]
    fn native_numbers_validate() {
        let columns = ResolvedColumns {
            latitude: "lat".to_owned(),
            longitude: "lon".to_owned(),
        };
        let row = RawRow::new().with("lat", 10.0).with("lon", 20.0);
        assert_eq!(validate(&row, &columns), Ok(Position::new(20.0, 10.0)));
        let row = RawRow::new().with("lat", true).with("lon", 20.0);
        assert_eq!(
            validate(&row, &columns),
            Err(InvalidReason::UnparseableLatitude)
        );
    }
}
