//! Plain-text rendering of collections and list views.

use sheet_map_filter::{Direction, FilteredView};
use sheet_map_sheet_models::{FeatureCollection, GeoFeature, Position};

/// Summary of a load: counts, inferred schema, and invalid rows.
#[must_use]
pub fn inspect_report(source_id: &str, collection: &FeatureCollection) -> Vec<String> {
    let metadata = &collection.metadata;
    let mut lines = vec![
        format!("Source:      {source_id}"),
        format!(
            "Rows:        {} total, {} valid, {} invalid",
            metadata.total_row_count,
            metadata.valid_row_count,
            metadata.invalid_rows.len()
        ),
        format!(
            "Coordinates: {} / {}",
            metadata.latitude_column, metadata.longitude_column
        ),
        String::new(),
        format!("{:<24} TYPE", "COLUMN"),
        "-".repeat(32),
    ];

    lines.extend(
        metadata
            .field_types
            .columns()
            .iter()
            .map(|column| format!("{:<24} {}", column.name, column.field_type)),
    );

    if !metadata.invalid_rows.is_empty() {
        lines.push(String::new());
        lines.push("Invalid rows:".to_owned());
        lines.extend(
            metadata
                .invalid_rows
                .iter()
                .map(|invalid| format!("  row {:<6} {}", invalid.row_number, invalid.reason)),
        );
    }

    lines
}

fn describe(feature: &GeoFeature, columns: &[String]) -> String {
    columns
        .iter()
        .filter_map(|column| {
            let value = feature.properties.get(column)?;
            (!value.is_empty()).then(|| format!("{column}: {value}"))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// The proximity-sorted list, one line per feature.
#[must_use]
pub fn list_report(
    view: &FilteredView,
    columns: &[String],
    show_header: bool,
) -> Vec<String> {
    let mut lines = Vec::new();
    if show_header {
        lines.push(format!(
            "{} of {} places",
            view.len(),
            view.collection.metadata.valid_row_count
        ));
        lines.push("-".repeat(40));
    }

    if view.is_empty() {
        lines.push("No places match the current filters.".to_owned());
        return lines;
    }

    lines.extend(view.entries().map(|(feature, annotation)| {
        let location = match annotation.direction {
            Direction::AtLocation => annotation.direction.to_string(),
            Direction::Toward(_) => format!("{:>9} {}", annotation.distance, annotation.direction),
        };
        format!(
            "#{:<5} {:<16} {}",
            annotation.row_number,
            location,
            describe(feature, columns)
        )
    }));

    lines
}

/// Arithmetic mean of the feature positions, used as the default list
/// center.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_position(collection: &FeatureCollection) -> Option<Position> {
    if collection.is_empty() {
        return None;
    }
    let count = collection.len() as f64;
    let (lon, lat) = collection.features.iter().fold((0.0, 0.0), |(lon, lat), f| {
        (lon + f.position.longitude, lat + f.position.latitude)
    });
    Some(Position::new(lon / count, lat / count))
}

#[cfg(test)]
mod tests {
    use sheet_map_convert::{ConvertOptions, convert};
    use sheet_map_filter::FilterEngine;
    use sheet_map_sheet_models::RawRow;

    use super::*;

    fn sample() -> FeatureCollection {
        let rows = vec![
            RawRow::new()
                .with("Name", "Fountain")
                .with("Url", "")
                .with("Latitude", "0.001")
                .with("Longitude", "0"),
            RawRow::new()
                .with("Name", "Lookout")
                .with("Url", "https://example.com")
                .with("Latitude", "1")
                .with("Longitude", "0"),
            RawRow::new()
                .with("Name", "Nowhere")
                .with("Url", "")
                .with("Latitude", "95")
                .with("Longitude", "0"),
        ];
        convert(&rows, &ConvertOptions::default()).unwrap()
    }

    #[test]
    fn inspect_lists_schema_and_invalid_rows() {
        let lines = inspect_report("places.csv", &sample());
        assert_eq!(lines[0], "Source:      places.csv");
        assert_eq!(lines[1], "Rows:        3 total, 2 valid, 1 invalid");
        assert!(lines.iter().any(|l| l.starts_with("Name") && l.ends_with("string")));
        assert!(lines.iter().any(|l| l.starts_with("Latitude") && l.ends_with("number")));
        assert_eq!(
            lines.last().map(String::as_str),
            Some("  row 4      latitude_out_of_range")
        );
    }

    #[test]
    fn list_shows_distance_and_allowlisted_fields() {
        let engine = FilterEngine::new(sample(), Position::new(0.0, 0.0));
        let columns = vec!["Url".to_owned(), "Name".to_owned()];
        let lines = list_report(engine.view(), &columns, true);

        assert_eq!(lines[0], "2 of 2 places");
        assert!(lines[2].starts_with("#2 "));
        assert!(lines[2].contains("111 m ↑ N"));
        assert!(lines[2].ends_with("Name: Fountain"));
        assert!(lines[3].contains("111.2 km"));
        assert!(lines[3].ends_with("Url: https://example.com | Name: Lookout"));
    }

    #[test]
    fn empty_list_has_a_message() {
        let mut engine = FilterEngine::new(sample(), Position::new(0.0, 0.0));
        let view = engine.set_filter_text("Name", "Museum");
        assert_eq!(
            list_report(view, &[], false),
            vec!["No places match the current filters."]
        );
    }

    #[test]
    fn mean_of_positions() {
        let center = mean_position(&sample()).unwrap();
        assert!((center.latitude - 0.5005).abs() < 1e-9);
        assert!(center.longitude.abs() < 1e-9);
    }
}
