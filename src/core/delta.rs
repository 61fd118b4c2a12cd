use crate::types::{bands, HeatScanError, HeatScanResult, RasterImage};

/// Single-band image `later[band] - earlier[band]`, named `Δ_<band>`.
/// No-data on either side yields no-data.
pub fn delta(band: &str, later: &RasterImage, earlier: &RasterImage) -> HeatScanResult<RasterImage> {
    if later.grid != earlier.grid {
        return Err(HeatScanError::Processing(format!(
            "Cannot difference '{}' ({:?}) and '{}' ({:?}): grids differ",
            later.id, later.grid, earlier.id, earlier.grid
        )));
    }

    let difference = later.band(band)? - earlier.band(band)?;
    let name = bands::delta(band);
    log::info!("Computed {} = {}[{}] - {}[{}]", name, later.id, band, earlier.id, band);

    RasterImage::new(format!("{}_{}_minus_{}", name, later.id, earlier.id), later.grid)
        .with_band(&name, difference)
}
