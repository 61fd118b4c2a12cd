use crate::io::geotiff::{read_geotiff, write_geotiff};
use crate::types::{
    AreaOfInterest, DateRange, GeoTransform, HeatScanError, HeatScanResult, ImageCollection,
    MetadataFilter, RasterGrid, RasterImage,
};
use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Metadata key holding scene cloud cover in percent
pub const CLOUD_COVER: &str = "CLOUD_COVER";

/// Manifest file name inside each scene directory
pub const SCENE_MANIFEST: &str = "scene.xml";

/// Imagery archive and its query engine
pub trait ImageArchive {
    /// Scenes of `product_id` acquired in `range` whose footprint intersects `bounds`
    fn query_collection(
        &self,
        product_id: &str,
        range: &DateRange,
        bounds: &AreaOfInterest,
    ) -> HeatScanResult<ImageCollection>;

    /// Keep scenes whose scalar `field` passes `filter` against `threshold`
    fn filter_by_metadata(
        &self,
        collection: ImageCollection,
        field: &str,
        filter: MetadataFilter,
        threshold: f64,
    ) -> ImageCollection {
        collection.filter_metadata(field, filter, threshold)
    }
}

/// Archive holding scenes in memory, keyed by product
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchive {
    products: HashMap<String, Vec<RasterImage>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, product_id: &str, image: RasterImage) {
        self.products
            .entry(product_id.to_string())
            .or_default()
            .push(image);
    }

    pub fn with_scene(mut self, product_id: &str, image: RasterImage) -> Self {
        self.add(product_id, image);
        self
    }
}

impl ImageArchive for InMemoryArchive {
    fn query_collection(
        &self,
        product_id: &str,
        range: &DateRange,
        bounds: &AreaOfInterest,
    ) -> HeatScanResult<ImageCollection> {
        let scenes = self.products.get(product_id).ok_or_else(|| {
            HeatScanError::external(
                "query_collection",
                format!("unknown image collection '{}'", product_id),
            )
        })?;
        Ok(ImageCollection::new(scenes.clone())
            .filter_date(range)
            .filter_bounds(bounds))
    }
}

/// On-disk scene manifest (`scene.xml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneManifest {
    pub id: String,
    #[serde(rename = "productId")]
    pub product_id: String,
    #[serde(rename = "acquisitionDate")]
    pub acquisition_date: String,
    #[serde(rename = "cloudCover")]
    pub cloud_cover: f64,
    pub rows: usize,
    pub cols: usize,
    pub scale: f64,
    #[serde(rename = "geoTransform")]
    pub geo_transform: GeoTransformElement,
    #[serde(rename = "fillValue", default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f32>,
    #[serde(rename = "bandList")]
    pub band_list: BandList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoTransformElement {
    #[serde(rename = "topLeftX")]
    pub top_left_x: f64,
    #[serde(rename = "pixelWidth")]
    pub pixel_width: f64,
    #[serde(rename = "topLeftY")]
    pub top_left_y: f64,
    #[serde(rename = "pixelHeight")]
    pub pixel_height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandList {
    #[serde(rename = "band", default)]
    pub bands: Vec<BandEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandEntry {
    pub name: String,
    pub file: String,
}

impl SceneManifest {
    pub fn parse(xml: &str) -> HeatScanResult<Self> {
        from_str(xml).map_err(|e| HeatScanError::XmlParsing(format!("{}", e)))
    }

    pub fn acquired(&self) -> HeatScanResult<NaiveDate> {
        NaiveDate::parse_from_str(self.acquisition_date.trim(), "%Y-%m-%d").map_err(|e| {
            HeatScanError::XmlParsing(format!(
                "Scene '{}' has invalid acquisition date '{}': {}",
                self.id, self.acquisition_date, e
            ))
        })
    }

    pub fn grid(&self) -> RasterGrid {
        RasterGrid {
            rows: self.rows,
            cols: self.cols,
            geo_transform: GeoTransform {
                top_left_x: self.geo_transform.top_left_x,
                pixel_width: self.geo_transform.pixel_width,
                top_left_y: self.geo_transform.top_left_y,
                pixel_height: self.geo_transform.pixel_height,
            },
            scale: self.scale,
        }
    }
}

/// Band georeferencing agrees with the manifest to well under a pixel
fn same_placement(a: &GeoTransform, b: &GeoTransform) -> bool {
    let tolerance = 1e-3 * b.pixel_width.abs().min(b.pixel_height.abs());
    (a.top_left_x - b.top_left_x).abs() <= tolerance
        && (a.top_left_y - b.top_left_y).abs() <= tolerance
        && (a.pixel_width - b.pixel_width).abs() <= tolerance
        && (a.pixel_height - b.pixel_height).abs() <= tolerance
}

/// Archive of scene directories, each holding a `scene.xml` manifest and one
/// GeoTIFF per band
pub struct SceneDirectoryArchive {
    root: PathBuf,
}

impl SceneDirectoryArchive {
    pub fn new<P: AsRef<Path>>(root: P) -> HeatScanResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(HeatScanError::external(
                "open_archive",
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// Manifests of every scene directory under the root, sorted by path
    pub fn manifests(&self) -> HeatScanResult<Vec<(PathBuf, SceneManifest)>> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join(SCENE_MANIFEST).is_file())
            .collect();
        dirs.sort();

        dirs.into_iter()
            .map(|dir| -> HeatScanResult<(PathBuf, SceneManifest)> {
                let xml = std::fs::read_to_string(dir.join(SCENE_MANIFEST))?;
                let manifest = SceneManifest::parse(&xml)?;
                Ok((dir, manifest))
            })
            .collect()
    }

    /// Load a scene directory into an image
    pub fn read_scene<P: AsRef<Path>>(dir: P) -> HeatScanResult<RasterImage> {
        let dir = dir.as_ref();
        let xml = std::fs::read_to_string(dir.join(SCENE_MANIFEST))?;
        let manifest = SceneManifest::parse(&xml)?;
        Self::load(dir, &manifest)
    }

    fn load(dir: &Path, manifest: &SceneManifest) -> HeatScanResult<RasterImage> {
        log::debug!("Loading scene {} from {}", manifest.id, dir.display());
        let grid = manifest.grid();
        let mut image = RasterImage::new(manifest.id.clone(), grid)
            .with_acquired(manifest.acquired()?)
            .with_property(CLOUD_COVER, manifest.cloud_cover);

        for band in &manifest.band_list.bands {
            let path = dir.join(&band.file);
            let tiff = read_geotiff(&path, manifest.fill_value)?;
            if tiff.data.dim() != grid.shape() {
                return Err(HeatScanError::external(
                    "read_scene",
                    format!(
                        "{} is {:?}, manifest of '{}' says {:?}",
                        path.display(),
                        tiff.data.dim(),
                        manifest.id,
                        grid.shape()
                    ),
                ));
            }
            if let Some(gt) = tiff.geo_transform {
                if !same_placement(&gt, &grid.geo_transform) {
                    return Err(HeatScanError::external(
                        "read_scene",
                        format!(
                            "{} is georeferenced at {:?}, manifest of '{}' says {:?}",
                            path.display(),
                            gt,
                            manifest.id,
                            grid.geo_transform
                        ),
                    ));
                }
            }
            image = image.with_band(&band.name, tiff.data)?;
        }
        Ok(image)
    }

    /// Write `image` as a scene directory `<root>/<image.id>`
    pub fn write_scene<P: AsRef<Path>>(
        root: P,
        product_id: &str,
        image: &RasterImage,
    ) -> HeatScanResult<PathBuf> {
        let acquired = image.acquired.ok_or_else(|| {
            HeatScanError::Processing(format!("Scene '{}' has no acquisition date", image.id))
        })?;
        let dir = root.as_ref().join(&image.id);
        std::fs::create_dir_all(&dir)?;

        let mut entries = Vec::with_capacity(image.band_count());
        for name in image.band_names() {
            let file = format!("{}.tif", name);
            write_geotiff(dir.join(&file), image.band(name)?, &image.grid.geo_transform)?;
            entries.push(BandEntry {
                name: name.to_string(),
                file,
            });
        }

        let gt = image.grid.geo_transform;
        let manifest = SceneManifest {
            id: image.id.clone(),
            product_id: product_id.to_string(),
            acquisition_date: acquired.format("%Y-%m-%d").to_string(),
            cloud_cover: image.property(CLOUD_COVER).unwrap_or(0.0),
            rows: image.grid.rows,
            cols: image.grid.cols,
            scale: image.grid.scale,
            geo_transform: GeoTransformElement {
                top_left_x: gt.top_left_x,
                pixel_width: gt.pixel_width,
                top_left_y: gt.top_left_y,
                pixel_height: gt.pixel_height,
            },
            fill_value: None,
            band_list: BandList { bands: entries },
        };
        let xml = quick_xml::se::to_string_with_root("scene", &manifest)
            .map_err(|e| HeatScanError::XmlParsing(format!("{}", e)))?;
        std::fs::write(dir.join(SCENE_MANIFEST), xml)?;
        Ok(dir)
    }
}

impl ImageArchive for SceneDirectoryArchive {
    fn query_collection(
        &self,
        product_id: &str,
        range: &DateRange,
        bounds: &AreaOfInterest,
    ) -> HeatScanResult<ImageCollection> {
        let manifests = self.manifests().map_err(|e| {
            HeatScanError::external(
                "query_collection",
                format!("cannot list {}: {}", self.root.display(), e),
            )
        })?;

        let mut images = Vec::new();
        for (dir, manifest) in manifests {
            if manifest.product_id != product_id {
                continue;
            }
            let acquired = manifest.acquired()?;
            if !range.contains(acquired) || !manifest.grid().bounds().intersects(&bounds.bounds) {
                continue;
            }
            let image = Self::load(&dir, &manifest).map_err(|e| {
                HeatScanError::external(
                    "query_collection",
                    format!("cannot load scene {}: {}", dir.display(), e),
                )
            })?;
            images.push(image);
        }

        log::info!(
            "Archive {}: {} scenes of {} in {}..{}",
            self.root.display(),
            images.len(),
            product_id,
            range.start,
            range.end
        );
        Ok(ImageCollection::new(images))
    }
}
