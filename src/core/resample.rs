//! Nearest-neighbour resampling of scenes onto the analysis grid.
//!
//! Each target pixel takes the value of the source pixel containing its
//! center. Target pixels that fall outside the source footprint are no-data.

use crate::types::{BandData, HeatScanResult, RasterGrid, RasterImage, NO_DATA};
use ndarray::{Array2, Zip};

/// Source pixel feeding every target pixel, `None` where the scene has no coverage
fn pixel_lookup(source: &RasterGrid, target: &RasterGrid) -> Array2<Option<(usize, usize)>> {
    Array2::from_shape_fn(target.shape(), |(row, col)| {
        let (lon, lat) = target.geo_transform.pixel_center(row, col);
        source.locate(lon, lat)
    })
}

fn resample_band(data: &BandData, lookup: &Array2<Option<(usize, usize)>>) -> BandData {
    let mut out = BandData::from_elem(lookup.dim(), NO_DATA);
    let kernel = |value: &mut f32, source: &Option<(usize, usize)>| {
        if let Some((row, col)) = *source {
            *value = data[[row, col]];
        }
    };

    #[cfg(feature = "parallel")]
    Zip::from(&mut out).and(lookup).par_for_each(kernel);
    #[cfg(not(feature = "parallel"))]
    Zip::from(&mut out).and(lookup).for_each(kernel);

    out
}

/// `image` on `grid`, keeping id, acquisition date and properties
pub fn resample_to_grid(image: &RasterImage, grid: &RasterGrid) -> HeatScanResult<RasterImage> {
    if image.grid == *grid {
        return Ok(image.clone());
    }

    log::debug!(
        "Resampling '{}' from {}x{} to {}x{}",
        image.id,
        image.grid.rows,
        image.grid.cols,
        grid.rows,
        grid.cols
    );
    let lookup = pixel_lookup(&image.grid, grid);

    let mut resampled = RasterImage::new(image.id.clone(), *grid);
    resampled.acquired = image.acquired;
    resampled.properties = image.properties.clone();
    for band in image.named_bands() {
        resampled = resampled.with_band(&band.name, resample_band(&band.data, &lookup))?;
    }
    Ok(resampled)
}
