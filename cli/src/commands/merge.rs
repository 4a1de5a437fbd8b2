use anyhow::{anyhow, bail, Result};
use parcelkit::{
    boundary_to_geojson, merge_polygons, polygon_area, read_geojson_file, read_polygons, AreaReadout, Validator,
};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::MergeArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let output = args.output.clone().unwrap_or("boundary.geojson".into());

    let mut polygons = Vec::new();
    for path in &args.inputs {
        let read = read_polygons(&read_geojson_file(path)?)?;
        println!("[merge] {} polygons from {}", read.len(), path.display());
        polygons.extend(read);
    }

    let refs = polygons.iter().collect::<Vec<_>>();
    if !Validator::new(config.validate.clone()).contiguous(&refs) {
        bail!("the {} input polygons do not form one connected area", refs.len());
    }
    let merged = merge_polygons(&refs).ok_or_else(|| anyhow!("nothing to merge"))?;
    let area = AreaReadout::from_square_meters(polygon_area(&merged));
    println!("[merge] merged {} polygons into {} vertices, {:.4} ha", refs.len(), merged.exterior().0.len() - 1, area.hectares);

    let value = boundary_to_geojson(&merged, config.crs.working_epsg);
    super::write_output(&output, &value, &config, args.geographic)?;
    println!("[merge] wrote {}", output.display());
    Ok(())
}
