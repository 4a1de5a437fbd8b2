use anyhow::{bail, Result};
use parcelkit::{
    parcels_to_geojson, polygon_area, read_boundary, read_geojson_file, split_polygon, Parcel,
};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::SliceArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let output = args.output.clone().unwrap_or("parcels.geojson".into());

    let length = (args.to - args.from).x.hypot((args.to - args.from).y);
    if length < config.draw.min_slice_length {
        bail!("chord length {length:.3} is shorter than the minimum {}", config.draw.min_slice_length);
    }

    let polygon = read_boundary(&read_geojson_file(&args.input)?)?;
    let (a, b) = split_polygon(&polygon, args.from, args.to, config.validate.epsilon)?;
    println!("[slice] pieces of {:.2} and {:.2} m²", polygon_area(&a), polygon_area(&b));

    let parcels = [Parcel::new(a, 0), Parcel::new(b, 1)];
    let value = parcels_to_geojson(&parcels, config.crs.working_epsg);
    super::write_output(&output, &value, &config, args.geographic)?;
    println!("[slice] wrote {}", output.display());
    Ok(())
}
