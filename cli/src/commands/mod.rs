#[cfg(feature = "download")]
pub mod fetch;
pub mod merge;
pub mod slice;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use parcelkit::{to_geographic, write_geojson_file, EngineConfig};
use serde_json::Value;

/// Engine configuration from `--config`, or defaults.
pub fn load_config(cli: &crate::cli::Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Write an exported document, reprojecting it first when `geographic` is set.
pub fn write_output(path: &Path, value: &Value, config: &EngineConfig, geographic: bool) -> Result<()> {
    if geographic {
        write_geojson_file(path, &to_geographic(value, &config.crs)?)
    } else {
        write_geojson_file(path, value)
    }
}
