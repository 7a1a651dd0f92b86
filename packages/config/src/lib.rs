#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Viewer configuration.
//!
//! Settings are layered, each layer overriding the previous one:
//! built-in defaults, a TOML file, the page query string (`id`, `fields`,
//! `header`), and finally the `SHEET_MAP_*` environment variables. Command
//! line flags are applied on top by the binary.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sheet_map_convert::{ConvertOptions, CoordinateColumns};
use sheet_map_sheet_models::{RowNumbering, Schema};

/// Environment variable naming the data source.
pub const ENV_SOURCE: &str = "SHEET_MAP_SOURCE";
/// Environment variable holding the field allowlist.
pub const ENV_FIELDS: &str = "SHEET_MAP_FIELDS";
/// Environment variable toggling the header.
pub const ENV_HEADER: &str = "SHEET_MAP_HEADER";

/// Errors building a [`ViewerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML file is malformed.
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A setting has a value of the wrong shape.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue {
        /// Setting or variable name.
        name: String,
        /// Offending value.
        value: String,
    },
}

/// Everything the viewer needs to know before loading data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Published sheet id, CSV URL, or local CSV path.
    pub source: Option<String>,
    /// Columns to display, in display order. `None` shows every column.
    pub fields: Option<Vec<String>>,
    /// Whether the page header is shown.
    pub show_header: bool,
    /// Latitude column name.
    pub latitude_column: String,
    /// Longitude column name.
    pub longitude_column: String,
    /// Detect coordinate columns from common aliases instead of using the
    /// configured names.
    pub detect_coordinates: bool,
    /// How row numbers are assigned.
    pub row_numbering: RowNumbering,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: None,
            fields: None,
            show_header: true,
            latitude_column: "Latitude".to_owned(),
            longitude_column: "Longitude".to_owned(),
            detect_coordinates: false,
            row_numbering: RowNumbering::default(),
        }
    }
}

/// Parses a boolean setting: `true`/`false`, `1`/`0`, or `yes`/`no`, in any
/// case.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for anything else.
pub fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        }),
    }
}

/// Splits a comma-separated field list. Blank entries are dropped; an
/// entirely blank list means "no allowlist".
#[must_use]
pub fn parse_fields(value: &str) -> Option<Vec<String>> {
    let fields: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect();
    (!fields.is_empty()).then_some(fields)
}

impl ViewerConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the document is malformed.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Toml`] if it is malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path)?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&document)
    }

    fn apply_setting(&mut self, name: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "id" | "source" => {
                let value = value.trim();
                if !value.is_empty() {
                    self.source = Some(value.to_owned());
                }
            }
            "fields" => self.fields = parse_fields(value),
            "header" => self.show_header = parse_bool(name, value)?,
            _ => log::debug!("Ignoring unknown setting {name}"),
        }
        Ok(())
    }

    /// Applies a page query string. Accepts a full URL, `?a=b&c=d`, or
    /// `a=b&c=d`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `header` is not a boolean.
    pub fn apply_query(&mut self, query: &str) -> Result<(), ConfigError> {
        let query = url::Url::parse(query).map_or_else(
            |_| query.trim_start_matches('?').to_owned(),
            |url| url.query().unwrap_or_default().to_owned(),
        );

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            self.apply_setting(&key, &key, &value)?;
        }
        Ok(())
    }

    /// Applies `SHEET_MAP_*` variables resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if [`ENV_HEADER`] is not a
    /// boolean.
    pub fn apply_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let vars = [
            (ENV_SOURCE, "source"),
            (ENV_FIELDS, "fields"),
            (ENV_HEADER, "header"),
        ];
        for (name, key) in vars {
            if let Some(value) = lookup(name) {
                self.apply_setting(name, key, &value)?;
            }
        }
        Ok(())
    }

    /// Applies the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if [`ENV_HEADER`] is not a
    /// boolean.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Builds a config from the optional file and query string, then the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any layer fails to parse.
    pub fn load(path: Option<&Path>, query: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(query) = query {
            config.apply_query(query)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Converter options for these settings.
    #[must_use]
    pub fn convert_options(&self) -> ConvertOptions {
        let coordinates = if self.detect_coordinates {
            CoordinateColumns::Detect
        } else {
            CoordinateColumns::Named {
                latitude: self.latitude_column.clone(),
                longitude: self.longitude_column.clone(),
            }
        };
        ConvertOptions {
            coordinates,
            row_numbering: self.row_numbering,
        }
    }

    /// Columns to display for `schema`: the allowlist in its own order
    /// (names matched case-insensitively, unknown names skipped), or every
    /// schema column without one.
    #[must_use]
    pub fn display_columns(&self, schema: &Schema) -> Vec<String> {
        let Some(fields) = &self.fields else {
            return schema.names().map(str::to_owned).collect();
        };

        fields
            .iter()
            .filter_map(|field| {
                let found = schema
                    .names()
                    .find(|name| *name == field.as_str())
                    .or_else(|| schema.names().find(|name| name.eq_ignore_ascii_case(field)));
                if found.is_none() {
                    log::debug!("Display field '{field}' is not a column; skipping");
                }
                found.map(str::to_owned)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use sheet_map_sheet_models::{ColumnSchema, FieldType};

    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema::new(
            names
                .iter()
                .map(|name| ColumnSchema {
                    name: (*name).to_owned(),
                    field_type: FieldType::String,
                })
                .collect(),
        )
    }

    #[test]
    fn defaults() {
        let config = ViewerConfig::default();
        assert!(config.show_header);
        assert!(config.fields.is_none());
        assert_eq!(config.convert_options(), ConvertOptions::default());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            source = "2PACX-abc"
            fields = ["Name", "Category"]
            show_header = false
            row_numbering = "sequence"
            detect_coordinates = true
            "#,
        )
        .unwrap();
        assert_eq!(config.source.as_deref(), Some("2PACX-abc"));
        assert_eq!(
            config.fields,
            Some(vec!["Name".to_owned(), "Category".to_owned()])
        );
        assert!(!config.show_header);
        assert_eq!(config.latitude_column, "Latitude");
        assert_eq!(config.row_numbering, RowNumbering::Sequence);
        assert_eq!(config.convert_options().coordinates, CoordinateColumns::Detect);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_toml_str("show_header = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn query_strings_in_every_shape() {
        for query in [
            "https://example.com/map/?id=abc&fields=Name,%20Url&header=no",
            "?id=abc&fields=Name,%20Url&header=no",
            "id=abc&fields=Name,+Url&header=NO",
        ] {
            let mut config = ViewerConfig::default();
            config.apply_query(query).unwrap();
            assert_eq!(config.source.as_deref(), Some("abc"), "{query}");
            assert_eq!(
                config.fields,
                Some(vec!["Name".to_owned(), "Url".to_owned()]),
                "{query}"
            );
            assert!(!config.show_header, "{query}");
        }
    }

    #[test]
    fn invalid_header_flag_is_rejected() {
        let mut config = ViewerConfig::default();
        let err = config.apply_query("header=maybe").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref name, ref value }
                if name == "header" && value == "maybe"
        ));
    }

    #[test]
    fn environment_wins_over_query() {
        let vars: HashMap<&str, &str> = [(ENV_SOURCE, "from-env"), (ENV_HEADER, "1")]
            .into_iter()
            .collect();

        let mut config = ViewerConfig::default();
        config.apply_query("id=from-query&header=false&fields=A").unwrap();
        config
            .apply_vars(|name| vars.get(name).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.source.as_deref(), Some("from-env"));
        assert!(config.show_header);
        assert_eq!(config.fields, Some(vec!["A".to_owned()]));
    }

    #[test]
    fn bools_accept_common_spellings() {
        let cases = [
            ("TRUE", true),
            ("yes", true),
            ("1", true),
            ("False", false),
            ("no", false),
            ("0", false),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_bool("x", text).unwrap(), expected);
        }
        assert!(parse_bool("x", "").is_err());
    }

    #[test]
    fn blank_field_list_means_all_fields() {
        assert_eq!(parse_fields(" , "), None);
        let config = ViewerConfig {
            fields: parse_fields(""),
            ..ViewerConfig::default()
        };
        assert_eq!(
            config.display_columns(&schema(&["Name", "Url"])),
            vec!["Name", "Url"]
        );
    }

    #[test]
    fn display_columns_follow_allowlist_order() {
        let config = ViewerConfig {
            fields: Some(vec!["url".to_owned(), "Missing".to_owned(), "Name".to_owned()]),
            ..ViewerConfig::default()
        };
        assert_eq!(
            config.display_columns(&schema(&["Name", "Category", "Url"])),
            vec!["Url", "Name"]
        );
    }

    #[test]
    fn named_columns_feed_convert_options() {
        let config = ViewerConfig {
            latitude_column: "lat_deg".to_owned(),
            longitude_column: "lon_deg".to_owned(),
            ..ViewerConfig::default()
        };
        assert_eq!(
            config.convert_options().coordinates,
            CoordinateColumns::Named {
                latitude: "lat_deg".to_owned(),
                longitude: "lon_deg".to_owned(),
            }
        );
    }
}
