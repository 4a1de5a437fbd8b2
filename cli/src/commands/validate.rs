use anyhow::{bail, Result};
use parcelkit::{
    polygon_area, read_boundary, read_geojson_file, read_parcels, AreaReadout, DrawMode, FileStore, SessionBuilder,
};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::ValidateArgs) -> Result<()> {
    let config = super::load_config(cli)?;
    let boundary = read_boundary(&read_geojson_file(&args.boundary)?)?;
    let parcels = read_parcels(&read_geojson_file(&args.parcels)?)?;

    let mut session = SessionBuilder::new(config.clone())
        .mode(DrawMode::Parcels)
        .with_all_tools()
        .build();
    session.load_boundary(boundary)?;
    session.load_parcels(parcels)?;

    for (i, parcel) in session.parcels().iter().enumerate() {
        let area = AreaReadout::from_square_meters(polygon_area(&parcel.polygon));
        let status = if parcel.valid { "ok" } else { "invalid" };
        println!("[validate] parcel {}: {status}, {:.4} ha", i + 1, area.hectares);
    }

    let report = session.validate_all();
    if !report.valid {
        for reason in &report.reasons { println!("[validate] {reason}") }
        bail!("{} problem(s) found in {}", report.reasons.len(), args.parcels.display());
    }
    println!("[validate] {} parcels are valid", session.parcels().len());

    if let Some(dir) = &args.save {
        session.save(&mut FileStore::new(dir), &config.crs)?;
        println!("[validate] saved to {}", dir.display());
    }
    Ok(())
}
