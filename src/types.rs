use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Pixel value type for every band (reflectance DN, Kelvin DN, index, Celsius)
pub type BandValue = f32;

/// 2D band raster (rows x cols); NaN marks no-data
pub type BandData = Array2<BandValue>;

/// No-data marker, propagated through arithmetic
pub const NO_DATA: BandValue = f32::NAN;

/// Metres per degree of latitude, used to size buffers and pixels in degrees
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Band names of the Landsat 8 Collection 2 Level-2 product and derived indices
pub mod bands {
    /// Surface temperature, scaled Kelvin
    pub const THERMAL: &str = "ST_B10";
    pub const GREEN: &str = "SR_B3";
    pub const RED: &str = "SR_B4";
    pub const NIR: &str = "SR_B5";
    pub const SWIR1: &str = "SR_B6";

    pub const LST: &str = "LST_C";
    pub const NDVI: &str = "NDVI";
    pub const NDBI: &str = "NDBI";
    pub const MNDWI: &str = "MNDWI";

    pub const SOURCE: [&str; 5] = [THERMAL, GREEN, RED, NIR, SWIR1];
    pub const DERIVED: [&str; 4] = [LST, NDVI, NDBI, MNDWI];

    /// Name of the difference band for `band`
    pub fn delta(band: &str) -> String {
        format!("Δ_{}", band)
    }
}

/// Geospatial bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// The fixed region every query, clip and reduction is restricted to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOfInterest {
    pub center_lon: f64,
    pub center_lat: f64,
    pub bounds: BoundingBox,
}

impl AreaOfInterest {
    /// Bounding box of a circular buffer of `buffer_meters` around a point
    pub fn from_buffered_point(lon: f64, lat: f64, buffer_meters: f64) -> HeatScanResult<Self> {
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(HeatScanError::Configuration(format!(
                "Area center ({}, {}) is outside geographic range",
                lon, lat
            )));
        }
        if !(buffer_meters.is_finite() && buffer_meters > 0.0) {
            return Err(HeatScanError::Configuration(format!(
                "Buffer distance must be positive, got {}",
                buffer_meters
            )));
        }

        let cos_lat = lat.to_radians().cos();
        if cos_lat < 1e-6 {
            return Err(HeatScanError::Configuration(
                "Cannot buffer a point at the pole".to_string(),
            ));
        }

        let dlat = buffer_meters / METERS_PER_DEGREE;
        let dlon = buffer_meters / (METERS_PER_DEGREE * cos_lat);

        Ok(Self {
            center_lon: lon,
            center_lat: lat,
            bounds: BoundingBox {
                min_lon: lon - dlon,
                max_lon: lon + dlon,
                min_lat: lat - dlat,
                max_lat: lat + dlat,
            },
        })
    }

    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.bounds.contains(lon, lat)
    }
}

/// Affine pixel-to-geographic transform (north-up, no rotation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub top_left_y: f64,
    pub pixel_height: f64, // negative for north-up
}

impl GeoTransform {
    /// Geographic coordinates of the center of pixel (row, col)
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.top_left_x + (col as f64 + 0.5) * self.pixel_width;
        let lat = self.top_left_y + (row as f64 + 0.5) * self.pixel_height;
        (lon, lat)
    }

    /// Fractional (row, col) of a geographic point
    pub fn pixel_coordinates(&self, lon: f64, lat: f64) -> (f64, f64) {
        let col = (lon - self.top_left_x) / self.pixel_width;
        let row = (lat - self.top_left_y) / self.pixel_height;
        (row, col)
    }
}

/// Spatial extent and resolution shared by all images of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub rows: usize,
    pub cols: usize,
    pub geo_transform: GeoTransform,
    /// Nominal ground resolution in metres per pixel
    pub scale: f64,
}

impl RasterGrid {
    /// Grid at `scale` metres per pixel covering the area's bounding box
    pub fn covering(area: &AreaOfInterest, scale: f64) -> HeatScanResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(HeatScanError::Configuration(format!(
                "Scale must be positive, got {}",
                scale
            )));
        }

        let pixel_height = scale / METERS_PER_DEGREE;
        let pixel_width = scale / (METERS_PER_DEGREE * area.center_lat.to_radians().cos());
        // Tolerance keeps an exact multiple of the pixel size from growing a column
        let cols = (area.bounds.width() / pixel_width - 1e-9).ceil().max(1.0) as usize;
        let rows = (area.bounds.height() / pixel_height - 1e-9).ceil().max(1.0) as usize;

        Ok(Self {
            rows,
            cols,
            geo_transform: GeoTransform {
                top_left_x: area.bounds.min_lon,
                pixel_width,
                top_left_y: area.bounds.max_lat,
                pixel_height: -pixel_height,
            },
            scale,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn pixel_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn bounds(&self) -> BoundingBox {
        let gt = &self.geo_transform;
        let x_end = gt.top_left_x + self.cols as f64 * gt.pixel_width;
        let y_end = gt.top_left_y + self.rows as f64 * gt.pixel_height;
        BoundingBox {
            min_lon: gt.top_left_x.min(x_end),
            max_lon: gt.top_left_x.max(x_end),
            min_lat: gt.top_left_y.min(y_end),
            max_lat: gt.top_left_y.max(y_end),
        }
    }

    /// Pixel containing a geographic point, if it falls on the grid
    pub fn locate(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let (row, col) = self.geo_transform.pixel_coordinates(lon, lat);
        if !(row.is_finite() && col.is_finite()) || row < 0.0 || col < 0.0 {
            return None;
        }
        let (row, col) = (row.floor() as usize, col.floor() as usize);
        if row < self.rows && col < self.cols {
            Some((row, col))
        } else {
            None
        }
    }

    /// Row-major mask of pixels whose center lies inside `area`
    pub fn area_mask(&self, area: &AreaOfInterest) -> Array2<bool> {
        Array2::from_shape_fn(self.shape(), |(row, col)| {
            let (lon, lat) = self.geo_transform.pixel_center(row, col);
            area.contains(lon, lat)
        })
    }
}

/// Half-open calendar date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Month-day window applied to every configured year, e.g. ("05-01", "05-31")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: String,
    pub end: String,
}

impl DateWindow {
    pub fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Concrete date range of this window in `year`
    pub fn for_year(&self, year: &str) -> HeatScanResult<DateRange> {
        let parse = |month_day: &str| {
            NaiveDate::parse_from_str(&format!("{}-{}", year, month_day), "%Y-%m-%d").map_err(
                |e| {
                    HeatScanError::Configuration(format!(
                        "Invalid date '{}-{}': {}",
                        year, month_day, e
                    ))
                },
            )
        };

        let range = DateRange {
            start: parse(&self.start)?,
            end: parse(&self.end)?,
        };
        if range.end <= range.start {
            return Err(HeatScanError::Configuration(format!(
                "Date window {}..{} is empty in {}",
                self.start,
                self.end,
                range.start.year()
            )));
        }
        Ok(range)
    }
}

/// One named band of an image; the array is shared between image values
#[derive(Debug, Clone)]
pub struct NamedBand {
    pub name: String,
    pub data: Arc<BandData>,
}

/// Multi-band raster over a fixed grid. Adding a band yields a new image value;
/// the arrays of untouched bands are shared, never copied or mutated.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub id: String,
    pub grid: RasterGrid,
    pub acquired: Option<NaiveDate>,
    pub properties: HashMap<String, f64>,
    bands: Vec<NamedBand>,
}

impl RasterImage {
    pub fn new(id: impl Into<String>, grid: RasterGrid) -> Self {
        Self {
            id: id.into(),
            grid,
            acquired: None,
            properties: HashMap::new(),
            bands: Vec::new(),
        }
    }

    /// Image whose every pixel of every named band is no-data
    pub fn no_data(id: impl Into<String>, grid: RasterGrid, band_names: &[&str]) -> Self {
        let empty = Arc::new(Array2::from_elem(grid.shape(), NO_DATA));
        let mut image = Self::new(id, grid);
        image.bands = band_names
            .iter()
            .map(|name| NamedBand {
                name: name.to_string(),
                data: Arc::clone(&empty),
            })
            .collect();
        image
    }

    pub fn with_acquired(mut self, date: NaiveDate) -> Self {
        self.acquired = Some(date);
        self
    }

    pub fn with_property(mut self, key: &str, value: f64) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn property(&self, key: &str) -> Option<f64> {
        self.properties.get(key).copied()
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|b| b.name == name)
    }

    pub fn band(&self, name: &str) -> HeatScanResult<&BandData> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.data.as_ref())
            .ok_or_else(|| {
                HeatScanError::Configuration(format!(
                    "Band '{}' not found in image '{}' (bands: {:?})",
                    name,
                    self.id,
                    self.band_names()
                ))
            })
    }

    /// New image with `data` added as band `name`. A band already carrying the
    /// name is replaced in place; every other band keeps its array.
    pub fn with_band(&self, name: &str, data: BandData) -> HeatScanResult<Self> {
        if data.dim() != self.grid.shape() {
            return Err(HeatScanError::Processing(format!(
                "Band '{}' has shape {:?}, image '{}' grid is {:?}",
                name,
                data.dim(),
                self.id,
                self.grid.shape()
            )));
        }

        let mut image = self.clone();
        let band = NamedBand {
            name: name.to_string(),
            data: Arc::new(data),
        };
        match image.bands.iter_mut().find(|b| b.name == name) {
            Some(existing) => *existing = band,
            None => image.bands.push(band),
        }
        Ok(image)
    }

    /// New image holding only `names`, in the requested order
    pub fn select(&self, names: &[&str]) -> HeatScanResult<Self> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let band = self
                .bands
                .iter()
                .find(|b| b.name == *name)
                .ok_or_else(|| {
                    HeatScanError::Configuration(format!(
                        "Band '{}' not found in image '{}'",
                        name, self.id
                    ))
                })?;
            selected.push(band.clone());
        }

        let mut image = self.clone();
        image.bands = selected;
        Ok(image)
    }

    /// Single-band image with its only band renamed
    pub fn rename_single(&self, name: &str) -> HeatScanResult<Self> {
        if self.bands.len() != 1 {
            return Err(HeatScanError::Processing(format!(
                "Cannot rename image '{}' with {} bands to a single name",
                self.id,
                self.bands.len()
            )));
        }
        let mut image = self.clone();
        image.bands[0].name = name.to_string();
        Ok(image)
    }

    /// Masks every pixel whose center falls outside `area`
    pub fn clip(&self, area: &AreaOfInterest) -> Self {
        let mask = self.grid.area_mask(area);
        let mut image = self.clone();
        for band in image.bands.iter_mut() {
            let mut clipped = band.data.as_ref().clone();
            ndarray::Zip::from(&mut clipped)
                .and(&mask)
                .for_each(|value, &inside| {
                    if !inside {
                        *value = NO_DATA;
                    }
                });
            band.data = Arc::new(clipped);
        }
        image
    }

    pub(crate) fn named_bands(&self) -> &[NamedBand] {
        &self.bands
    }
}

/// Comparison applied to a scalar metadata property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFilter {
    LessThan,
    GreaterThan,
    Equals,
}

impl MetadataFilter {
    pub fn accepts(&self, value: f64, threshold: f64) -> bool {
        match self {
            MetadataFilter::LessThan => value < threshold,
            MetadataFilter::GreaterThan => value > threshold,
            MetadataFilter::Equals => value == threshold,
        }
    }
}

/// Ordered sequence of images sharing a band schema
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<RasterImage>,
}

impl ImageCollection {
    pub fn new(images: Vec<RasterImage>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    pub fn into_images(self) -> Vec<RasterImage> {
        self.images
    }

    /// Keeps images acquired within `range`; images without a date are dropped
    pub fn filter_date(self, range: &DateRange) -> Self {
        Self {
            images: self
                .images
                .into_iter()
                .filter(|img| img.acquired.map_or(false, |d| range.contains(d)))
                .collect(),
        }
    }

    /// Keeps images whose footprint intersects the area
    pub fn filter_bounds(self, area: &AreaOfInterest) -> Self {
        Self {
            images: self
                .images
                .into_iter()
                .filter(|img| img.grid.bounds().intersects(&area.bounds))
                .collect(),
        }
    }

    /// Keeps images whose `field` passes `filter` against `threshold`;
    /// images missing the property are dropped
    pub fn filter_metadata(self, field: &str, filter: MetadataFilter, threshold: f64) -> Self {
        Self {
            images: self
                .images
                .into_iter()
                .filter(|img| {
                    img.property(field)
                        .map_or(false, |value| filter.accepts(value, threshold))
                })
                .collect(),
        }
    }

    /// Applies `f` to every image, in order
    pub fn map<F>(self, f: F) -> HeatScanResult<Self>
    where
        F: Fn(&RasterImage) -> HeatScanResult<RasterImage>,
    {
        let images = self.images.iter().map(f).collect::<HeatScanResult<Vec<_>>>()?;
        Ok(Self { images })
    }
}

/// Region reducers supported by the reduction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reducer {
    Mean,
    Median,
    Min,
    Max,
    StdDev,
    Count,
}

/// Band name to reduced scalar; `None` when a band has no valid pixel
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalStats {
    pub reducer: Reducer,
    pub values: Vec<(String, Option<f64>)>,
}

impl ZonalStats {
    pub fn get(&self, band: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == band)
            .and_then(|(_, value)| *value)
    }
}

impl std::fmt::Display for ZonalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Some(v) => write!(f, "{}: {:.4}", name, v)?,
                None => write!(f, "{}: null", name)?,
            }
        }
        write!(f, "}}")
    }
}

/// One sampled pixel: its location and the values of the sampled bands
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub lon: f64,
    pub lat: f64,
    pub values: Vec<BandValue>,
}

/// Least-squares line through sampled points, for chart trendlines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Seeded random pixel sample; `fields` names the entries of each point's values
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePointSet {
    pub fields: Vec<String>,
    pub points: Vec<SamplePoint>,
}

impl SamplePointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn column(&self, field: &str) -> HeatScanResult<Vec<BandValue>> {
        let idx = self.fields.iter().position(|f| f == field).ok_or_else(|| {
            HeatScanError::Configuration(format!(
                "Field '{}' not in sample (fields: {:?})",
                field, self.fields
            ))
        })?;
        Ok(self.points.iter().map(|p| p.values[idx]).collect())
    }

    /// Ordinary least squares of `y` on `x`; `None` with fewer than two points
    /// or when `x` has no spread
    pub fn linear_fit(&self, x: &str, y: &str) -> HeatScanResult<Option<LinearFit>> {
        let xs = self.column(x)?;
        let ys = self.column(y)?;
        let n = xs.len();
        if n < 2 {
            return Ok(None);
        }

        let mean_x = xs.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
        let mean_y = ys.iter().map(|&v| v as f64).sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (&xv, &yv) in xs.iter().zip(ys.iter()) {
            let dx = xv as f64 - mean_x;
            let dy = yv as f64 - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        if sxx < 1e-12 {
            return Ok(None);
        }

        let slope = sxy / sxx;
        let r_squared = if syy < 1e-12 { 1.0 } else { (sxy * sxy) / (sxx * syy) };
        Ok(Some(LinearFit {
            slope,
            intercept: mean_y - slope * mean_x,
            r_squared,
        }))
    }
}

/// Error types for the heat scan pipeline
#[derive(Debug, thiserror::Error)]
pub enum HeatScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("External service error during {operation}: {message}")]
    ExternalService { operation: String, message: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Year {year}: {source}")]
    Year {
        year: String,
        #[source]
        source: Box<HeatScanError>,
    },
}

impl HeatScanError {
    pub fn external(operation: &str, message: impl Into<String>) -> Self {
        HeatScanError::ExternalService {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn in_year(self, year: &str) -> Self {
        HeatScanError::Year {
            year: year.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type for heat scan operations
pub type HeatScanResult<T> = Result<T, HeatScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize) -> RasterGrid {
        RasterGrid {
            rows,
            cols,
            geo_transform: GeoTransform {
                top_left_x: 0.0,
                pixel_width: 1.0,
                top_left_y: 0.0,
                pixel_height: -1.0,
            },
            scale: 30.0,
        }
    }

    #[test]
    fn test_buffered_point_is_square_in_meters() {
        let aoi = AreaOfInterest::from_buffered_point(72.6836, 23.1550, 15000.0).unwrap();
        let half_height_m = aoi.bounds.height() / 2.0 * METERS_PER_DEGREE;
        let half_width_m =
            aoi.bounds.width() / 2.0 * METERS_PER_DEGREE * 23.1550f64.to_radians().cos();

        assert!((half_height_m - 15000.0).abs() < 1e-6);
        assert!((half_width_m - 15000.0).abs() < 1e-6);
        assert!(aoi.contains(72.6836, 23.1550));
    }

    #[test]
    fn test_invalid_area_rejected() {
        assert!(AreaOfInterest::from_buffered_point(200.0, 0.0, 100.0).is_err());
        assert!(AreaOfInterest::from_buffered_point(0.0, 0.0, -5.0).is_err());
    }

    #[test]
    fn test_grid_covers_area() {
        let aoi = AreaOfInterest::from_buffered_point(72.6836, 23.1550, 15000.0).unwrap();
        let grid = RasterGrid::covering(&aoi, 30.0).unwrap();

        assert_eq!(grid.rows, 1000);
        assert_eq!(grid.cols, 1000);
        let bounds = grid.bounds();
        assert!(bounds.min_lon <= aoi.bounds.min_lon + 1e-9);
        assert!(bounds.max_lat >= aoi.bounds.max_lat - 1e-9);
    }

    #[test]
    fn test_locate_pixel_centers() {
        let aoi = AreaOfInterest::from_buffered_point(72.6836, 23.1550, 150.0).unwrap();
        let grid = RasterGrid::covering(&aoi, 30.0).unwrap();

        for (row, col) in [(0, 0), (3, 7), (9, 9)] {
            let (lon, lat) = grid.geo_transform.pixel_center(row, col);
            assert_eq!(grid.locate(lon, lat), Some((row, col)));
        }
        let gt = grid.geo_transform;
        assert_eq!(grid.locate(gt.top_left_x - gt.pixel_width, aoi.center_lat), None);
        assert_eq!(grid.locate(aoi.center_lon, gt.top_left_y - 0.5 * gt.pixel_height), None);
        assert_eq!(grid.locate(aoi.bounds.max_lon + gt.pixel_width, aoi.center_lat), None);
    }

    #[test]
    fn test_date_window_for_year() {
        let window = DateWindow::new("05-01", "05-31");
        let range = window.for_year("2022").unwrap();

        assert_eq!(range.start, NaiveDate::from_ymd_opt(2022, 5, 1).unwrap());
        assert!(range.contains(NaiveDate::from_ymd_opt(2022, 5, 30).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2022, 5, 31).unwrap()));
        assert!(window.for_year("20x2").is_err());
        assert!(DateWindow::new("05-31", "05-01").for_year("2022").is_err());
    }

    #[test]
    fn test_with_band_is_non_destructive() {
        let base = RasterImage::new("a", grid(2, 2))
            .with_band("X", Array2::from_elem((2, 2), 1.0))
            .unwrap();
        let extended = base.with_band("Y", Array2::from_elem((2, 2), 2.0)).unwrap();

        assert_eq!(base.band_names(), vec!["X"]);
        assert_eq!(extended.band_names(), vec!["X", "Y"]);
        assert!(base.with_band("Z", Array2::zeros((3, 2))).is_err());
    }

    #[test]
    fn test_select_unknown_band_fails() {
        let image = RasterImage::no_data("a", grid(2, 2), &["X"]);
        assert!(matches!(
            image.select(&["Q"]),
            Err(HeatScanError::Configuration(_))
        ));
    }

    #[test]
    fn test_clip_masks_outside_pixels() {
        let image = RasterImage::new("a", grid(2, 2))
            .with_band("X", Array2::from_elem((2, 2), 5.0))
            .unwrap();
        let area = AreaOfInterest {
            center_lon: 0.5,
            center_lat: -0.5,
            bounds: BoundingBox {
                min_lon: 0.0,
                max_lon: 1.0,
                min_lat: -1.0,
                max_lat: 0.0,
            },
        };

        let clipped = image.clip(&area);
        let band = clipped.band("X").unwrap();
        assert_eq!(band[[0, 0]], 5.0);
        assert!(band[[0, 1]].is_nan());
        assert!(band[[1, 1]].is_nan());
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let set = SamplePointSet {
            fields: vec!["x".into(), "y".into()],
            points: (0..5)
                .map(|i| SamplePoint {
                    lon: 0.0,
                    lat: 0.0,
                    values: vec![i as f32, 2.0 * i as f32 + 1.0],
                })
                .collect(),
        };
        let fit = set.linear_fit("x", "y").unwrap().unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!((fit.intercept - 1.0).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }
}
