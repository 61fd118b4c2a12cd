use crate::core::reduce::ReductionEngine;
use crate::types::{AreaOfInterest, HeatScanResult, RasterImage, SamplePointSet};

/// Seeded random sample of `fields` over `area`, for scatter charts.
/// The same seed on the same image always yields the same points.
pub fn sample<E: ReductionEngine + ?Sized>(
    engine: &E,
    image: &RasterImage,
    fields: &[&str],
    area: &AreaOfInterest,
    scale: f64,
    count: usize,
    seed: u64,
) -> HeatScanResult<SamplePointSet> {
    let selected = image.select(fields)?;
    let points = engine.sample_region(&selected, area, scale, count, seed)?;
    log::info!(
        "Sampled {} of {} requested pixels of {:?} from '{}' (seed {})",
        points.len(),
        count,
        fields,
        image.id,
        seed
    );
    Ok(points)
}
