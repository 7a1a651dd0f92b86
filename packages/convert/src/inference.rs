//! Column type inference and cell coercion.
//!
//! A column's [`FieldType`] is decided once from every non-empty value in
//! it. The tests run strictest first (number, boolean, date) and a column
//! only takes a type when *every* value passes; otherwise it is a string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sheet_map_sheet_models::{ColumnSchema, FieldType, RawRow, RawValue, Schema, TypedValue};

/// Date-time layouts tried after RFC 3339 and RFC 2822.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, interpreted as midnight UTC.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parses a finite number. Surrounding whitespace is ignored.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses `true`/`false` in any case.
#[must_use]
pub fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses a calendar date or date-time into a UTC timestamp.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

fn cell_number(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        RawValue::Text(text) => parse_number(text),
        RawValue::Boolean(_) | RawValue::Empty => None,
    }
}

fn cell_boolean(value: &RawValue) -> Option<bool> {
    match value {
        RawValue::Boolean(b) => Some(*b),
        RawValue::Text(text) => parse_boolean(text),
        RawValue::Number(_) | RawValue::Empty => None,
    }
}

fn cell_date(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::Text(text) => parse_date(text),
        RawValue::Boolean(_) | RawValue::Number(_) | RawValue::Empty => None,
    }
}

/// Infers one column's type from its values. Empty cells are skipped; a
/// column with no non-empty value is a string.
pub fn infer_field_type<'a>(values: impl IntoIterator<Item = &'a RawValue>) -> FieldType {
    let values: Vec<&RawValue> = values.into_iter().filter(|v| !v.is_empty()).collect();
    if values.is_empty() {
        return FieldType::String;
    }
    if values.iter().all(|v| cell_number(v).is_some()) {
        return FieldType::Number;
    }
    if values.iter().all(|v| cell_boolean(v).is_some()) {
        return FieldType::Boolean;
    }

    let dates: Option<Vec<DateTime<Utc>>> = values.iter().map(|v| cell_date(v)).collect();
    if let Some(dates) = dates
        && !dates.iter().all(|d| *d == DateTime::<Utc>::UNIX_EPOCH)
    {
        return FieldType::Date;
    }

    FieldType::String
}

/// Infers the type of each of `columns` across all `rows`. A row missing a
/// column contributes an empty cell.
#[must_use]
pub fn infer_schema(rows: &[RawRow], columns: &[String]) -> Schema {
    let schema = columns
        .iter()
        .map(|column| {
            let field_type = infer_field_type(rows.iter().filter_map(|row| row.get(column)));
            log::debug!("Column '{column}' inferred as {field_type}");
            ColumnSchema {
                name: column.clone(),
                field_type,
            }
        })
        .collect();
    Schema::new(schema)
}

/// Coerces a cell to `field_type`.
///
/// Blank cells become [`TypedValue::Empty`]. A value that does not fit a
/// non-string type is kept as its text rather than dropped.
#[must_use]
pub fn coerce(field_type: FieldType, value: &RawValue) -> TypedValue {
    if value.is_empty() {
        return TypedValue::Empty;
    }
    match field_type {
        FieldType::Number => cell_number(value).map_or_else(
            || TypedValue::String(value.to_text()),
            TypedValue::Number,
        ),
        FieldType::Boolean => match value {
            RawValue::Boolean(b) => TypedValue::Boolean(*b),
            other => TypedValue::Boolean(other.to_text().trim().eq_ignore_ascii_case("true")),
        },
        FieldType::Date => cell_date(value).map_or_else(
            || TypedValue::String(value.to_text()),
            TypedValue::Date,
        ),
        FieldType::String => TypedValue::String(value.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<RawValue> {
        values.iter().map(|v| RawValue::from(*v)).collect()
    }

    #[test]
    fn numbers_are_inferred_when_unanimous() {
        assert_eq!(
            infer_field_type(&texts(&["1", "2.5", " -3e2 "])),
            FieldType::Number
        );
        assert_eq!(infer_field_type(&texts(&["1", "two"])), FieldType::String);
    }

    #[test]
    fn non_finite_numbers_are_not_numbers() {
        assert_eq!(infer_field_type(&texts(&["1", "inf"])), FieldType::String);
        assert_eq!(infer_field_type(&texts(&["NaN"])), FieldType::String);
    }

    #[test]
    fn booleans_are_case_insensitive() {
        assert_eq!(
            infer_field_type(&texts(&["true", "false", "TRUE"])),
            FieldType::Boolean
        );
        assert_eq!(
            infer_field_type(&texts(&["true", "maybe"])),
            FieldType::String
        );
    }

    #[test]
    fn dates_are_inferred() {
        assert_eq!(
            infer_field_type(&texts(&["2024-01-15", "03/02/2023", "2024-06-01T12:30:00Z"])),
            FieldType::Date
        );
    }

    #[test]
    fn all_epoch_dates_are_degenerate() {
        assert_eq!(
            infer_field_type(&texts(&["1970-01-01", "1970-01-01T00:00:00Z"])),
            FieldType::String
        );
        assert_eq!(
            infer_field_type(&texts(&["1970-01-01", "2020-01-01"])),
            FieldType::Date
        );
    }

    #[test]
    fn empty_cells_are_ignored() {
        let values = vec![RawValue::Empty, RawValue::from(" "), RawValue::from("4")];
        assert_eq!(infer_field_type(&values), FieldType::Number);
        assert_eq!(infer_field_type(&[RawValue::Empty]), FieldType::String);
        assert_eq!(infer_field_type(&[]), FieldType::String);
    }

    #[test]
    fn native_values_are_typed_directly() {
        assert_eq!(
            infer_field_type(&[RawValue::from(1.0), RawValue::from("2")]),
            FieldType::Number
        );
        assert_eq!(
            infer_field_type(&[RawValue::from(true), RawValue::from("False")]),
            FieldType::Boolean
        );
    }

    #[test]
    fn schema_covers_missing_cells() {
        let rows = vec![
            RawRow::new().with("a", "1").with("b", "x"),
            RawRow::new().with("a", "2"),
        ];
        let schema = infer_schema(&rows, &["a".to_owned(), "b".to_owned()]);
        assert_eq!(schema.field_type("a"), Some(FieldType::Number));
        assert_eq!(schema.field_type("b"), Some(FieldType::String));
    }

    #[test]
    fn coercion_follows_field_type() {
        assert_eq!(
            coerce(FieldType::Number, &RawValue::from("18.5")),
            TypedValue::Number(18.5)
        );
        assert_eq!(
            coerce(FieldType::Boolean, &RawValue::from("TRUE")),
            TypedValue::Boolean(true)
        );
        assert_eq!(
            coerce(FieldType::Boolean, &RawValue::from("false")),
            TypedValue::Boolean(false)
        );
        assert_eq!(
            coerce(FieldType::String, &RawValue::from(" spaced ")),
            TypedValue::String(" spaced ".to_owned())
        );
        assert_eq!(coerce(FieldType::Number, &RawValue::Empty), TypedValue::Empty);
        let TypedValue::Date(date) = coerce(FieldType::Date, &RawValue::from("2024-01-15")) else {
            panic!("expected a date");
        };
        assert_eq!(date.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn coercion_keeps_misfits_as_text() {
        assert_eq!(
            coerce(FieldType::Number, &RawValue::from("n/a")),
            TypedValue::String("n/a".to_owned())
        );
    }
}
