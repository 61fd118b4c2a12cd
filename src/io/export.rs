use crate::core::resample::resample_to_grid;
use crate::io::geotiff::write_geotiff;
use crate::io::presentation::ExportRequest;
use crate::types::{HeatScanError, HeatScanResult, RasterGrid};
use std::path::{Path, PathBuf};

/// Writes single-band exports as `<root>/<folder>/<prefix>.tif`
#[derive(Debug, Clone)]
pub struct FileExporter {
    root: PathBuf,
}

impl FileExporter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Export the request's band clipped to its region at its scale. Returns
    /// the written GeoTIFF path.
    pub fn export(&self, request: &ExportRequest) -> HeatScanResult<PathBuf> {
        let names = request.image.band_names();
        if names.len() != 1 {
            return Err(HeatScanError::external(
                "export",
                format!(
                    "'{}' must be a single-band image, got {:?}",
                    request.description, names
                ),
            ));
        }
        let band = names[0];

        let native = request.image.grid;
        let image = if (request.scale - native.scale).abs() > 1e-9 * native.scale {
            let target = RasterGrid::covering(&request.region, request.scale).map_err(|e| {
                HeatScanError::external(
                    "export",
                    format!("'{}' cannot be gridded: {}", request.description, e),
                )
            })?;
            log::info!(
                "Export '{}': resampling {} m to {} m ({}x{} pixels)",
                request.description,
                native.scale,
                request.scale,
                target.rows,
                target.cols
            );
            resample_to_grid(&request.image, &target)?
        } else {
            request.image.clone()
        };

        let grid = image.grid;
        if grid.pixel_count() as f64 > request.max_pixels {
            return Err(HeatScanError::external(
                "export",
                format!(
                    "'{}' has {} pixels, exceeding maxPixels {}",
                    request.description,
                    grid.pixel_count(),
                    request.max_pixels
                ),
            ));
        }

        let clipped = image.clip(&request.region);
        let folder = self.root.join(&request.folder);
        std::fs::create_dir_all(&folder)?;

        let raster = folder.join(format!("{}.tif", request.file_name_prefix));
        write_geotiff(&raster, clipped.band(band)?, &grid.geo_transform)?;

        log::info!(
            "Exported '{}' ({}) to {}",
            request.description,
            band,
            raster.display()
        );
        Ok(raster)
    }
}
