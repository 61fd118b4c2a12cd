#![allow(dead_code)]

use chrono::NaiveDate;
use heatscan::config::LANDSAT8_L2;
use heatscan::io::archive::CLOUD_COVER;
use heatscan::types::bands;
use heatscan::{AnalysisConfig, InMemoryArchive, RasterGrid, RasterImage};
use ndarray::Array2;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Default recipe shrunk to a 10x10 pixel area
pub fn small_config() -> AnalysisConfig {
    AnalysisConfig {
        buffer_meters: 150.0,
        sample_count: 40,
        ..AnalysisConfig::default()
    }
}

/// Per-band DN values of a synthetic Level-2 scene
#[derive(Debug, Clone, Copy)]
pub struct Reflectance {
    pub thermal: f32,
    pub green: f32,
    pub red: f32,
    pub nir: f32,
    pub swir: f32,
}

pub const URBAN_2022_A: Reflectance = Reflectance {
    thermal: 44000.0,
    green: 0.08,
    red: 0.10,
    nir: 0.30,
    swir: 0.25,
};

pub const URBAN_2022_B: Reflectance = Reflectance {
    thermal: 45000.0,
    green: 0.06,
    red: 0.12,
    nir: 0.20,
    swir: 0.30,
};

pub const RURAL_2015: Reflectance = Reflectance {
    thermal: 42000.0,
    green: 0.07,
    red: 0.08,
    nir: 0.40,
    swir: 0.20,
};

/// Red value at `col` for a scene built with `red_gradient`
pub fn red_at(r: &Reflectance, red_gradient: f32, col: usize) -> f32 {
    r.red + red_gradient * col as f32
}

pub fn scene(
    grid: &RasterGrid,
    id: &str,
    date: (i32, u32, u32),
    cloud: f64,
    r: &Reflectance,
    red_gradient: f32,
) -> RasterImage {
    let shape = grid.shape();
    let red = Array2::from_shape_fn(shape, |(_, col)| red_at(r, red_gradient, col));
    RasterImage::new(id, *grid)
        .with_acquired(NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap())
        .with_property(CLOUD_COVER, cloud)
        .with_band(bands::THERMAL, Array2::from_elem(shape, r.thermal))
        .unwrap()
        .with_band(bands::GREEN, Array2::from_elem(shape, r.green))
        .unwrap()
        .with_band(bands::RED, red)
        .unwrap()
        .with_band(bands::NIR, Array2::from_elem(shape, r.nir))
        .unwrap()
        .with_band(bands::SWIR1, Array2::from_elem(shape, r.swir))
        .unwrap()
}

/// `grid` moved by whole pixels; positive `cols` is east, positive `rows` south
pub fn shifted_grid(grid: &RasterGrid, rows: i32, cols: i32) -> RasterGrid {
    let mut shifted = *grid;
    shifted.geo_transform.top_left_x += cols as f64 * grid.geo_transform.pixel_width;
    shifted.geo_transform.top_left_y += rows as f64 * grid.geo_transform.pixel_height;
    shifted
}

/// `grid` grown by `margin` pixels on every side
pub fn padded_grid(grid: &RasterGrid, margin: usize) -> RasterGrid {
    let mut padded = shifted_grid(grid, -(margin as i32), -(margin as i32));
    padded.rows += 2 * margin;
    padded.cols += 2 * margin;
    padded
}

/// 2015: one clear scene and one cloudy one; 2022: two clear scenes, one
/// cloudy, one outside the window
pub fn two_year_archive(grid: &RasterGrid) -> InMemoryArchive {
    InMemoryArchive::new()
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2015_0510", (2015, 5, 10), 5.0, &RURAL_2015, 0.0))
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2015_0526", (2015, 5, 26), 60.0, &URBAN_2022_B, 0.0))
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2022_0505", (2022, 5, 5), 0.0, &URBAN_2022_A, 0.001))
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2022_0521", (2022, 5, 21), 0.0, &URBAN_2022_B, 0.0))
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2022_0513", (2022, 5, 13), 35.0, &RURAL_2015, 0.0))
        .with_scene(LANDSAT8_L2, scene(grid, "LC08_2022_0421", (2022, 4, 21), 0.0, &RURAL_2015, 0.0))
}

pub fn celsius(dn: f32) -> f64 {
    dn as f64 * 0.00341802 + 149.0 - 273.15
}

pub fn nd(a: f32, b: f32) -> f64 {
    (a as f64 - b as f64) / (a as f64 + b as f64)
}
