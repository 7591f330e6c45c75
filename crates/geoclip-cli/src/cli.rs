use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Geoclip - configuration-driven spatial data extraction
#[derive(Parser, Debug)]
#[command(name = "geoclip")]
#[command(about = "Extract bbox-clipped spatial data and export it to GIS formats", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Catalog file merged over the built-in sources and locations
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an extraction job and export the results
    Extract(ExtractArgs),

    /// Calculate the bounding box of a dataset or catalog source
    Bbox(BboxArgs),

    /// List catalog sources and named locations
    Sources(SourcesArgs),
}

#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// Job file (TOML). Flags given alongside override its values
    #[arg(long, value_name = "FILE")]
    pub job: Option<PathBuf>,

    /// Catalog source id, or a dataset path/URL
    #[arg(long)]
    pub source: Option<String>,

    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_name = "COORDS", allow_hyphen_values = true)]
    pub bbox: Option<String>,

    /// Named location from the catalog
    #[arg(long)]
    pub location: Option<String>,

    /// Buffer in degrees applied around the bounding box
    #[arg(long, allow_hyphen_values = true)]
    pub buffer: Option<f64>,

    /// Output formats, comma separated (geojson, shapefile, geopackage,
    /// filegdb, csv, parquet)
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Prefix for artifact file names
    #[arg(long)]
    pub output_prefix: Option<String>,

    /// Directory the artifacts are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Geometry column of the source (when --source is a path)
    #[arg(long)]
    pub geometry_column: Option<String>,

    /// Record successful artifacts in an upload manifest next to them
    #[arg(long)]
    pub manifest: bool,
}

#[derive(Parser, Debug)]
pub struct BboxArgs {
    /// Dataset path/URL or catalog source id
    pub input: String,

    /// Attribute filters as FIELD=VALUE pairs; a feature must match all
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Buffer in degrees applied to the result
    #[arg(long, allow_hyphen_values = true)]
    pub buffer: Option<f64>,

    /// Fold extents during the scan instead of materializing the features
    #[arg(long)]
    pub push_down: bool,

    /// Geometry column of the source (when the input is a path)
    #[arg(long)]
    pub geometry_column: Option<String>,
}

#[derive(Parser, Debug)]
pub struct SourcesArgs {
    /// List only the named locations
    #[arg(long)]
    pub locations: bool,
}
