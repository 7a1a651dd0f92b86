//! Delimited text to [`RawRow`]s.
//!
//! Column names come from the header row. Headers and cells are trimmed,
//! blank cells become [`RawValue::Empty`], and fully blank lines are
//! skipped.

use std::collections::HashSet;

use sheet_map_sheet_models::{RawRow, RawValue};

use crate::FetchError;

/// Trims headers and renames repeats to `Name_2`, `Name_3`, ... so no cell
/// is overwritten. Unnamed columns stay empty.
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let raw: Vec<&str> = raw.collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for header in &raw {
        if header.is_empty() || seen.insert((*header).to_owned()) {
            headers.push((*header).to_owned());
            continue;
        }
        let mut suffix = 2;
        let renamed = loop {
            let candidate = format!("{header}_{suffix}");
            if !raw.contains(&candidate.as_str()) && seen.insert(candidate.clone()) {
                break candidate;
            }
            suffix += 1;
        };
        log::warn!("Duplicate column '{header}' renamed to '{renamed}'");
        headers.push(renamed);
    }

    headers
}

/// Parses comma-separated text into rows.
///
/// # Errors
///
/// Returns [`FetchError::NoHeader`] if the text has no usable header row,
/// or [`FetchError::Csv`] if the text is not valid CSV.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRow>, FetchError> {
    parse_delimited(bytes, b',')
}

/// Parses delimited text into rows using `delimiter` between fields.
///
/// # Errors
///
/// Returns [`FetchError::NoHeader`] if the text has no usable header row,
/// or [`FetchError::Csv`] if the text is not valid delimited text.
pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Vec<RawRow>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers = unique_headers(reader.headers()?.iter().map(str::trim));

    if headers.iter().all(String::is_empty) {
        return Err(FetchError::NoHeader);
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            // Published sheets pad the export with unnamed columns.
            if header.is_empty() {
                continue;
            }
            let cell = record.get(i).unwrap_or("").trim();
            let value = if cell.is_empty() {
                RawValue::Empty
            } else {
                RawValue::from(cell)
            };
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    log::debug!("Parsed {} rows with {} columns", rows.len(), headers.len());

    Ok(rows)
}
