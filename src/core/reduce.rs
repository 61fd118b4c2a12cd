//! Reduction service: per-pixel median over a collection, region reducers and
//! seeded region sampling.
//!
//! `ReductionEngine` is the seam the pipeline calls through; `LocalReductionEngine`
//! evaluates everything in-process on `ndarray` arrays. NaN pixels are masked and
//! ignored by every reducer.

use crate::types::{
    AreaOfInterest, BandData, BandValue, HeatScanError, HeatScanResult, ImageCollection,
    RasterImage, Reducer, SamplePoint, SamplePointSet, ZonalStats, NO_DATA,
};
use ndarray::Zip;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Reductions the pipeline needs from the processing backend
pub trait ReductionEngine {
    /// Per-pixel median across all images, band by band
    fn median_reduce(&self, collection: &ImageCollection) -> HeatScanResult<RasterImage>;

    /// Reduce every band over `area`, sampling at `scale` metres per pixel
    fn reduce_region(
        &self,
        image: &RasterImage,
        reducer: Reducer,
        area: &AreaOfInterest,
        scale: f64,
        max_pixels: f64,
    ) -> HeatScanResult<ZonalStats>;

    /// Up to `count` seeded random pixels inside `area`; pixels with any
    /// no-data band are dropped
    fn sample_region(
        &self,
        image: &RasterImage,
        area: &AreaOfInterest,
        scale: f64,
        count: usize,
        seed: u64,
    ) -> HeatScanResult<SamplePointSet>;
}

/// In-process reduction engine
#[derive(Debug, Clone, Default)]
pub struct LocalReductionEngine;

impl LocalReductionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Pixel step that approximates sampling `image` at `scale`
    fn stride(image: &RasterImage, scale: f64) -> HeatScanResult<usize> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(HeatScanError::Configuration(format!(
                "Reduction scale must be positive, got {}",
                scale
            )));
        }
        Ok((scale / image.grid.scale).round().max(1.0) as usize)
    }

    /// (row, col) of every pixel inside `area` on the stride lattice
    fn region_pixels(
        image: &RasterImage,
        area: &AreaOfInterest,
        scale: f64,
    ) -> HeatScanResult<Vec<(usize, usize)>> {
        let step = Self::stride(image, scale)?;
        let mask = image.grid.area_mask(area);
        let mut pixels = Vec::new();
        for row in (0..image.grid.rows).step_by(step) {
            for col in (0..image.grid.cols).step_by(step) {
                if mask[[row, col]] {
                    pixels.push((row, col));
                }
            }
        }
        Ok(pixels)
    }
}

/// Median of the finite entries of `values`; even counts average the middle pair
pub fn median_of(values: &mut Vec<BandValue>) -> BandValue {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return NO_DATA;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn median_band(layers: &[&BandData], shape: (usize, usize)) -> BandData {
    let mut out = BandData::from_elem(shape, NO_DATA);
    let kernel = |(row, col): (usize, usize), value: &mut BandValue| {
        let mut stack: Vec<BandValue> = layers.iter().map(|layer| layer[[row, col]]).collect();
        *value = median_of(&mut stack);
    };

    #[cfg(feature = "parallel")]
    Zip::indexed(&mut out).par_for_each(kernel);
    #[cfg(not(feature = "parallel"))]
    Zip::indexed(&mut out).for_each(kernel);

    out
}

/// Applies `reducer` to the valid values of one band
pub fn reduce_values(reducer: Reducer, values: &mut Vec<f64>) -> Option<f64> {
    values.retain(|v| v.is_finite());
    if reducer == Reducer::Count {
        return Some(values.len() as f64);
    }
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let value = match reducer {
        Reducer::Mean => values.iter().sum::<f64>() / n,
        Reducer::Median => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
        Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Reducer::StdDev => {
            let mean = values.iter().sum::<f64>() / n;
            (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt()
        }
        Reducer::Count => n,
    };
    Some(value)
}

impl ReductionEngine for LocalReductionEngine {
    fn median_reduce(&self, collection: &ImageCollection) -> HeatScanResult<RasterImage> {
        let images = collection.images();
        let first = images.first().ok_or_else(|| {
            HeatScanError::external("median_reduce", "cannot reduce an empty collection")
        })?;

        for img in images.iter().skip(1) {
            if img.grid != first.grid {
                return Err(HeatScanError::Processing(format!(
                    "Image '{}' grid {:?} differs from '{}' grid {:?}",
                    img.id, img.grid, first.id, first.grid
                )));
            }
        }

        log::debug!(
            "Median of {} images, {} bands, {}x{} pixels",
            images.len(),
            first.band_count(),
            first.grid.rows,
            first.grid.cols
        );

        let mut result = RasterImage::new(format!("{}_median", first.id), first.grid);
        for name in first.band_names() {
            let layers = images
                .iter()
                .map(|img| img.band(name))
                .collect::<HeatScanResult<Vec<_>>>()?;
            result = result.with_band(name, median_band(&layers, first.grid.shape()))?;
        }
        Ok(result)
    }

    fn reduce_region(
        &self,
        image: &RasterImage,
        reducer: Reducer,
        area: &AreaOfInterest,
        scale: f64,
        max_pixels: f64,
    ) -> HeatScanResult<ZonalStats> {
        let pixels = Self::region_pixels(image, area, scale)?;
        if pixels.len() as f64 > max_pixels {
            return Err(HeatScanError::external(
                "reduce_region",
                format!(
                    "too many pixels in the region: {} > maxPixels {}",
                    pixels.len(),
                    max_pixels
                ),
            ));
        }

        let values = image
            .named_bands()
            .par_iter()
            .map(|band| {
                let mut samples: Vec<f64> = pixels
                    .iter()
                    .map(|&(row, col)| band.data[[row, col]] as f64)
                    .collect();
                (band.name.clone(), reduce_values(reducer, &mut samples))
            })
            .collect();

        Ok(ZonalStats { reducer, values })
    }

    fn sample_region(
        &self,
        image: &RasterImage,
        area: &AreaOfInterest,
        scale: f64,
        count: usize,
        seed: u64,
    ) -> HeatScanResult<SamplePointSet> {
        let candidates = Self::region_pixels(image, area, scale)?;
        let fields: Vec<String> = image.band_names().iter().map(|s| s.to_string()).collect();

        let amount = count.min(candidates.len());
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picks = rand::seq::index::sample(&mut rng, candidates.len(), amount).into_vec();
        picks.sort_unstable();

        let bands = image.named_bands();
        let points = picks
            .into_iter()
            .filter_map(|i| {
                let (row, col) = candidates[i];
                let values: Vec<BandValue> =
                    bands.iter().map(|band| band.data[[row, col]]).collect();
                if values.iter().any(|v| !v.is_finite()) {
                    return None;
                }
                let (lon, lat) = image.grid.geo_transform.pixel_center(row, col);
                Some(SamplePoint { lon, lat, values })
            })
            .collect();

        Ok(SamplePointSet { fields, points })
    }
}
