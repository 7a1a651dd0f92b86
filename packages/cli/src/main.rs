#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line viewer for published sheets and CSV files.
//!
//! Loads a data source through the same conversion and filtering core the
//! map viewer uses and prints it as text: a schema summary (`inspect`), a
//! proximity-sorted list (`list`), or a `.geojson` file (`export`).

mod composer;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sheet_map_config::{ViewerConfig, parse_fields};
use sheet_map_convert::export;
use sheet_map_filter::{Bounds, FilterEngine};
use sheet_map_sheet_models::{FeatureCollection, Position, RowNumbering};
use sheet_map_source::loader::{DataLoader, LoadOutcome};
use sheet_map_source::source_for;

#[derive(Parser)]
#[command(name = "sheet_map", about = "Browse spreadsheet rows as map points")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Viewer query string or URL (e.g. "?id=...&fields=Name,Url")
    #[arg(long, global = true)]
    query: Option<String>,
    /// Latitude column name
    #[arg(long, global = true)]
    latitude: Option<String>,
    /// Longitude column name
    #[arg(long, global = true)]
    longitude: Option<String>,
    /// Detect coordinate columns from common names (lat, lng, x, y, ...)
    #[arg(long, global = true)]
    detect: bool,
    /// Row numbering: `spreadsheet` or `sequence`
    #[arg(long, global = true, value_parser = parse_row_numbering)]
    row_numbering: Option<RowNumbering>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Column filter as `column=value`; repeat to combine
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    /// Only keep places inside `west,south,east,north`
    #[arg(long, allow_hyphen_values = true)]
    bounds: Option<Bounds>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the inferred schema, row counts, and invalid rows
    Inspect {
        /// Published sheet id, CSV URL, or CSV path
        source: Option<String>,
    },
    /// Print places sorted by distance
    List {
        /// Published sheet id, CSV URL, or CSV path
        source: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Reference point as `longitude,latitude` (default: center of the
        /// bounds, else the mean of all places)
        #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
        center: Option<Position>,
        /// Comma-separated columns to show
        #[arg(long)]
        fields: Option<String>,
        /// Omit the summary header
        #[arg(long)]
        no_header: bool,
    },
    /// Write the (filtered) places as pretty `GeoJSON`
    Export {
        /// Published sheet id, CSV URL, or CSV path
        source: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file name; `.geojson` is appended when missing
        #[arg(long, default_value = "export")]
        out: String,
        /// Output directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn parse_filter(arg: &str) -> Result<(String, String), String> {
    let (column, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected column=value, got '{arg}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{arg}'"));
    }
    Ok((column.to_owned(), value.trim().to_owned()))
}

fn parse_row_numbering(arg: &str) -> Result<RowNumbering, String> {
    match arg.trim().to_ascii_lowercase().as_str() {
        "spreadsheet" => Ok(RowNumbering::Spreadsheet),
        "sequence" => Ok(RowNumbering::Sequence),
        _ => Err(format!("expected spreadsheet or sequence, got '{arg}'")),
    }
}

fn parse_position(arg: &str) -> Result<Position, String> {
    let (lon, lat) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected longitude,latitude, got '{arg}'"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{s}': {e}"))
    };
    let position = Position::new(parse(lon)?, parse(lat)?);
    if !position.is_valid() {
        return Err(format!("coordinates out of range: '{arg}'"));
    }
    Ok(position)
}

fn bounds_center(bounds: &Bounds) -> Position {
    let mut longitude = f64::midpoint(bounds.west, bounds.east);
    if bounds.west > bounds.east {
        longitude += if longitude > 0.0 { -180.0 } else { 180.0 };
    }
    Position::new(longitude, f64::midpoint(bounds.south, bounds.north))
}

impl Cli {
    fn viewer_config(&self) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
        let mut config = ViewerConfig::load(self.config.as_deref(), self.query.as_deref())?;
        if let Some(latitude) = &self.latitude {
            config.latitude_column.clone_from(latitude);
        }
        if let Some(longitude) = &self.longitude {
            config.longitude_column.clone_from(longitude);
        }
        if self.detect {
            config.detect_coordinates = true;
        }
        if let Some(numbering) = self.row_numbering {
            config.row_numbering = numbering;
        }
        Ok(config)
    }
}

async fn load(
    config: &ViewerConfig,
    source: Option<String>,
) -> Result<(String, FeatureCollection), Box<dyn std::error::Error>> {
    let identifier = source
        .or_else(|| config.source.clone())
        .ok_or("No data source given: pass one or set SHEET_MAP_SOURCE")?;
    let source = source_for(&identifier);
    let loader = DataLoader::new(config.convert_options());

    match loader.load(source.as_ref()).await? {
        LoadOutcome::Loaded { collection, .. } => Ok((identifier, collection)),
        LoadOutcome::Superseded { generation } => {
            Err(format!("Load {generation} was superseded").into())
        }
    }
}

fn filtered(
    collection: FeatureCollection,
    center: Option<Position>,
    args: &FilterArgs,
) -> FilterEngine {
    let center = center
        .or_else(|| args.bounds.as_ref().map(bounds_center))
        .or_else(|| composer::mean_position(&collection))
        .unwrap_or(Position::new(0.0, 0.0));

    let mut engine = FilterEngine::new(collection, center);
    for (column, value) in &args.filters {
        let _ = engine.set_filter_text(column, value);
    }
    if let Some(bounds) = args.bounds {
        let _ = engine.move_to(center, bounds);
        let _ = engine.set_within_bounds(true);
    }
    engine
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();
    let mut config = cli.viewer_config()?;

    match cli.command {
        Commands::Inspect { source } => {
            let (id, collection) = load(&config, source).await?;
            for line in composer::inspect_report(&id, &collection) {
                println!("{line}");
            }
        }
        Commands::List {
            source,
            filter,
            center,
            fields,
            no_header,
        } => {
            if let Some(fields) = fields {
                config.fields = parse_fields(&fields);
            }
            if no_header {
                config.show_header = false;
            }

            let (_, collection) = load(&config, source).await?;
            let engine = filtered(collection, center, &filter);
            let columns = config.display_columns(&engine.collection().metadata.field_types);
            for line in composer::list_report(engine.view(), &columns, config.show_header) {
                println!("{line}");
            }
        }
        Commands::Export {
            source,
            filter,
            out,
            dir,
        } => {
            let (_, collection) = load(&config, source).await?;
            let engine = filtered(collection, None, &filter);
            let path = export::write_file(&engine.view().collection, &dir, &out)?;
            println!("Wrote {} places to {}", engine.view().len(), path.display());
        }
    }

    Ok(())
}
