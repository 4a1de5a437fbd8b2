use std::path::PathBuf;

use geo::{coord, Coord, Rect};

/// Parcel tracing toolkit: validate, merge, slice and fetch reference data
#[derive(clap::Parser, Debug)]
#[command(name = "parcelkit", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Engine configuration (JSON); missing fields take defaults
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Validate a parcel set against its boundary, optionally saving it
    Validate(ValidateArgs),

    /// Merge adjacent polygons into one boundary (forbids stdout)
    Merge(MergeArgs),

    /// Split a polygon along a chord into two parcels (forbids stdout)
    Slice(SliceArgs),

    /// Fetch reference features for an extent (forbids stdout)
    #[cfg(feature = "download")]
    Fetch(FetchArgs),
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Boundary GeoJSON (first polygon is used)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub boundary: PathBuf,

    /// Parcels GeoJSON
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub parcels: PathBuf,

    /// Directory to save boundary.geojson and parcels.geojson into when valid
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub save: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct MergeArgs {
    /// GeoJSON files whose polygons are merged
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Output boundary file, defaults to "./boundary.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write geographic (service CRS) coordinates instead of working CRS
    #[arg(long)]
    pub geographic: bool,
}

#[derive(clap::Args, Debug)]
pub struct SliceArgs {
    /// GeoJSON containing the polygon to split (first polygon is used)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Chord start on the polygon boundary, as "x,y"
    #[arg(long, value_parser = parse_coord)]
    pub from: Coord<f64>,

    /// Chord end on the polygon boundary, as "x,y"
    #[arg(long, value_parser = parse_coord)]
    pub to: Coord<f64>,

    /// Output parcels file, defaults to "./parcels.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write geographic (service CRS) coordinates instead of working CRS
    #[arg(long)]
    pub geographic: bool,
}

#[cfg(feature = "download")]
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// Extent in the working CRS, as "minx,miny,maxx,maxy"
    #[arg(long, value_parser = parse_extent)]
    pub bbox: Rect<f64>,

    /// Map zoom level the extent is viewed at
    #[arg(short, long, default_value_t = 18.0)]
    pub zoom: f64,

    /// Feature service API key (overrides the config)
    #[arg(long, env = "PARCELKIT_API_KEY")]
    pub api_key: Option<String>,

    /// Output features file, defaults to "./reference.geojson"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

fn parse_numbers(s: &str, n: usize) -> Result<Vec<f64>, String> {
    let values = s.split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("`{part}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != n { return Err(format!("expected {n} comma-separated numbers, got {}", values.len())) }
    Ok(values)
}

fn parse_coord(s: &str) -> Result<Coord<f64>, String> {
    let v = parse_numbers(s, 2)?;
    Ok(coord! { x: v[0], y: v[1] })
}

#[cfg_attr(not(feature = "download"), allow(dead_code))]
fn parse_extent(s: &str) -> Result<Rect<f64>, String> {
    let v = parse_numbers(s, 4)?;
    Ok(Rect::new(coord! { x: v[0], y: v[1] }, coord! { x: v[2], y: v[3] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_parse_from_pairs() {
        assert_eq!(parse_coord("10, 20.5"), Ok(coord! { x: 10.0, y: 20.5 }));
        assert!(parse_coord("10").is_err());
        assert!(parse_coord("a,b").is_err());
        assert_eq!(parse_extent("0,0,5,5").unwrap().width(), 5.0);
    }

    #[test]
    fn command_line_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
