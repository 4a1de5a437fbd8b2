use std::sync::Arc;

use anyhow::{bail, Result};
use parcelkit::{
    reference_features_to_geojson, write_geojson_file, HttpFeatureSource, LayerType, ReferenceIndex, RefreshScheduler,
    RefreshStatus,
};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::FetchArgs) -> Result<()> {
    let mut config = super::load_config(cli)?;
    if args.api_key.is_some() { config.index.api_key = args.api_key.clone() }
    let output = args.output.clone().unwrap_or("reference.geojson".into());

    let source = HttpFeatureSource::new(&config.index)?;
    let mut scheduler = RefreshScheduler::new(Arc::new(source), config.index.clone(), config.crs.clone());
    let mut index = ReferenceIndex::default();

    if scheduler.refresh_now(&mut index, args.bbox, args.zoom)? == RefreshStatus::BelowMinZoom {
        bail!("zoom {} is below the minimum of {} for reference features", args.zoom, config.index.min_zoom);
    }

    for layer in LayerType::ALL {
        let count = index.features().iter().filter(|f| f.layer == layer).count();
        println!("[fetch] {layer}: {count} features");
    }

    write_geojson_file(&output, &reference_features_to_geojson(index.features(), config.crs.working_epsg))?;
    println!("[fetch] wrote {}", output.display());
    Ok(())
}
