use crate::core::reduce::ReductionEngine;
use crate::types::{AreaOfInterest, HeatScanResult, RasterImage, Reducer, ZonalStats};

/// Aggregate every band of `image` over `area` at `scale` metres per pixel.
/// `max_pixels` bounds the pixels the engine may touch.
pub fn summarize<E: ReductionEngine + ?Sized>(
    engine: &E,
    image: &RasterImage,
    area: &AreaOfInterest,
    scale: f64,
    reducer: Reducer,
    max_pixels: f64,
) -> HeatScanResult<ZonalStats> {
    log::info!(
        "Zonal {:?} of '{}' over area at {} m ({} bands)",
        reducer,
        image.id,
        scale,
        image.band_count()
    );
    let stats = engine.reduce_region(image, reducer, area, scale, max_pixels)?;

    let missing: Vec<&str> = stats
        .values
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        log::warn!("'{}' has no valid pixels in area for {:?}", image.id, missing);
    }
    Ok(stats)
}

/// Spatial mean of every band, the summary printed for each year
pub fn summarize_mean<E: ReductionEngine + ?Sized>(
    engine: &E,
    image: &RasterImage,
    area: &AreaOfInterest,
    scale: f64,
    max_pixels: f64,
) -> HeatScanResult<ZonalStats> {
    summarize(engine, image, area, scale, Reducer::Mean, max_pixels)
}
