//! Per-pixel band transforms
//!
//! Each transform reads only source bands of the Level-2 product and returns a
//! new image with exactly one derived band added. The input image is untouched,
//! so the transforms can be applied in any order with identical results.

use crate::types::{bands, BandData, BandValue, HeatScanResult, RasterImage, NO_DATA};
use ndarray::Zip;
use num_traits::Float;

/// ST_B10 scale factor (Kelvin per DN)
pub const THERMAL_SCALE: f64 = 0.00341802;
/// ST_B10 offset in Kelvin
pub const THERMAL_OFFSET: f64 = 149.0;
pub const KELVIN_TO_CELSIUS: f64 = 273.15;

/// `(a - b) / (a + b)`; a zero denominator yields NaN (no-data)
pub fn normalized_difference<T: Float>(a: T, b: T) -> T {
    let sum = a + b;
    if sum == T::zero() {
        return T::nan();
    }
    (a - b) / sum
}

/// Celsius surface temperature from a scaled-Kelvin ST_B10 value
pub fn thermal_dn_to_celsius(dn: f64) -> f64 {
    dn * THERMAL_SCALE + THERMAL_OFFSET - KELVIN_TO_CELSIUS
}

fn normalized_difference_band(a: &BandData, b: &BandData) -> BandData {
    let mut out = BandData::from_elem(a.dim(), NO_DATA);
    Zip::from(&mut out)
        .and(a)
        .and(b)
        .for_each(|o, &x, &y| *o = normalized_difference(x, y));
    out
}

fn add_normalized_difference(
    img: &RasterImage,
    first: &str,
    second: &str,
    name: &str,
) -> HeatScanResult<RasterImage> {
    let a = img.band(first)?;
    let b = img.band(second)?;
    img.with_band(name, normalized_difference_band(a, b))
}

/// Adds `LST_C`: land surface temperature in degrees Celsius
pub fn temperature_celsius(img: &RasterImage) -> HeatScanResult<RasterImage> {
    let thermal = img.band(bands::THERMAL)?;
    let lst = thermal.mapv(|dn| thermal_dn_to_celsius(dn as f64) as BandValue);
    img.with_band(bands::LST, lst)
}

/// Adds `NDVI = (NIR - Red) / (NIR + Red)`
pub fn vegetation_index(img: &RasterImage) -> HeatScanResult<RasterImage> {
    add_normalized_difference(img, bands::NIR, bands::RED, bands::NDVI)
}

/// Adds `NDBI = (SWIR1 - NIR) / (SWIR1 + NIR)`
pub fn built_up_index(img: &RasterImage) -> HeatScanResult<RasterImage> {
    add_normalized_difference(img, bands::SWIR1, bands::NIR, bands::NDBI)
}

/// Adds `MNDWI = (Green - SWIR1) / (Green + SWIR1)`
pub fn water_index(img: &RasterImage) -> HeatScanResult<RasterImage> {
    add_normalized_difference(img, bands::GREEN, bands::SWIR1, bands::MNDWI)
}

/// Signature shared by every band transform
pub type BandTransform = fn(&RasterImage) -> HeatScanResult<RasterImage>;

/// The four transforms in their conventional order: temperature, vegetation,
/// built-up, water
pub const STANDARD_TRANSFORMS: [BandTransform; 4] = [
    temperature_celsius,
    vegetation_index,
    built_up_index,
    water_index,
];

/// Applies `transforms` one after another
pub fn apply_transforms(
    img: &RasterImage,
    transforms: &[BandTransform],
) -> HeatScanResult<RasterImage> {
    transforms
        .iter()
        .try_fold(img.clone(), |acc, transform| transform(&acc))
}

/// Applies all four standard transforms
pub fn add_all_indices(img: &RasterImage) -> HeatScanResult<RasterImage> {
    apply_transforms(img, &STANDARD_TRANSFORMS)
}
