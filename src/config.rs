//! Analysis configuration
//!
//! All literals of the recipe live here: area of interest, years, date window,
//! resolution, cloud threshold, palettes, sampling and export settings. The
//! defaults reproduce the GIFT City May 2015 vs May 2022 comparison; an XML
//! document can override any subset of them.

use crate::types::{AreaOfInterest, DateWindow, HeatScanError, HeatScanResult, RasterGrid};
use chrono::NaiveDate;
use quick_xml::de::from_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Landsat 8 Collection 2 Tier 1 Level-2 surface reflectance / temperature
pub const LANDSAT8_L2: &str = "LANDSAT/LC08/C02/T1_L2";

/// Map layer styling: value stretch and color stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl VisParams {
    pub fn new(min: f64, max: f64, palette: &[&str]) -> Self {
        Self {
            min,
            max,
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Palettes for every rendered layer kind
#[derive(Debug, Clone, PartialEq)]
pub struct Palettes {
    pub lst: VisParams,
    pub ndvi: VisParams,
    pub ndbi: VisParams,
    pub mndwi: VisParams,
    pub delta_lst: VisParams,
    pub delta_ndvi: VisParams,
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            lst: VisParams::new(
                30.0,
                45.0,
                &["blue", "cyan", "lime", "yellow", "orange", "red", "darkred"],
            ),
            ndvi: VisParams::new(
                0.0,
                0.6,
                &["brown", "beige", "lightgreen", "green", "darkgreen"],
            ),
            ndbi: VisParams::new(-0.2, 0.4, &["navy", "purple", "grey", "orange", "red"]),
            mndwi: VisParams::new(-0.5, 0.5, &["brown", "khaki", "aqua", "blue"]),
            delta_lst: VisParams::new(-2.0, 4.0, &["green", "white", "red"]),
            delta_ndvi: VisParams::new(-0.2, 0.2, &["red", "white", "green"]),
        }
    }
}

/// Complete configuration of one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub site_name: String,
    pub center_lon: f64,
    pub center_lat: f64,
    pub buffer_meters: f64,
    /// Year labels, processed in this order
    pub years: Vec<String>,
    pub window: DateWindow,
    /// Metres per pixel
    pub scale: f64,
    pub product_id: String,
    pub cloud_cover_field: String,
    /// Images must have cloud cover strictly below this percentage
    pub cloud_cover_max: f64,
    /// Pixel cap handed to region reductions and exports
    pub max_pixels: f64,
    pub sample_count: usize,
    pub sample_seed: u64,
    pub export_enabled: bool,
    pub export_folder: String,
    pub palettes: Palettes,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            site_name: "GIFT City".to_string(),
            center_lon: 72.6836,
            center_lat: 23.1550,
            buffer_meters: 15000.0,
            years: vec!["2015".to_string(), "2022".to_string()],
            window: DateWindow::new("05-01", "05-31"),
            scale: 30.0,
            product_id: LANDSAT8_L2.to_string(),
            cloud_cover_field: "CLOUD_COVER".to_string(),
            cloud_cover_max: 10.0,
            max_pixels: 1e13,
            sample_count: 5000,
            sample_seed: 42,
            export_enabled: false,
            export_folder: "EarthEngineExports".to_string(),
            palettes: Palettes::default(),
        }
    }
}

impl AnalysisConfig {
    /// Rejects malformed years and windows and impossible geometry
    pub fn validate(&self) -> HeatScanResult<()> {
        let year_re = Regex::new(r"^\d{4}$").map_err(|e| {
            HeatScanError::Configuration(format!("Year pattern failed to compile: {}", e))
        })?;
        let month_day_re = Regex::new(r"^(\d{2})-(\d{2})$").map_err(|e| {
            HeatScanError::Configuration(format!("Month-day pattern failed to compile: {}", e))
        })?;

        if self.years.len() < 2 {
            return Err(HeatScanError::Configuration(format!(
                "At least two years are needed for a comparison, got {:?}",
                self.years
            )));
        }
        for (i, year) in self.years.iter().enumerate() {
            if !year_re.is_match(year) {
                return Err(HeatScanError::Configuration(format!(
                    "Malformed year label '{}'",
                    year
                )));
            }
            if self.years[..i].contains(year) {
                return Err(HeatScanError::Configuration(format!(
                    "Year '{}' is configured twice",
                    year
                )));
            }
        }

        for month_day in [&self.window.start, &self.window.end] {
            let caps = month_day_re.captures(month_day).ok_or_else(|| {
                HeatScanError::Configuration(format!(
                    "Malformed month-day '{}', expected MM-DD",
                    month_day
                ))
            })?;
            let month: u32 = caps[1].parse().unwrap_or(0);
            let day: u32 = caps[2].parse().unwrap_or(0);
            // 2000 is a leap year, so 02-29 is accepted here
            if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
                return Err(HeatScanError::Configuration(format!(
                    "Month-day '{}' is not a calendar date",
                    month_day
                )));
            }
        }
        for year in &self.years {
            self.window.for_year(year)?;
        }

        if !(self.cloud_cover_max.is_finite() && self.cloud_cover_max >= 0.0) {
            return Err(HeatScanError::Configuration(format!(
                "Cloud cover threshold must be a non-negative percentage, got {}",
                self.cloud_cover_max
            )));
        }
        if !(self.max_pixels >= 1.0) {
            return Err(HeatScanError::Configuration(format!(
                "Pixel cap must be at least 1, got {}",
                self.max_pixels
            )));
        }

        let area = self.area()?;
        RasterGrid::covering(&area, self.scale)?;
        Ok(())
    }

    pub fn area(&self) -> HeatScanResult<AreaOfInterest> {
        AreaOfInterest::from_buffered_point(self.center_lon, self.center_lat, self.buffer_meters)
    }

    pub fn grid(&self) -> HeatScanResult<RasterGrid> {
        RasterGrid::covering(&self.area()?, self.scale)
    }

    /// Earliest and latest configured year, the pair compared by the deltas
    pub fn comparison_years(&self) -> HeatScanResult<(&str, &str)> {
        match (self.years.first(), self.years.last()) {
            (Some(first), Some(last)) if first != last => Ok((first.as_str(), last.as_str())),
            _ => Err(HeatScanError::Configuration(
                "Need two distinct years to compare".to_string(),
            )),
        }
    }

    /// Parse an XML configuration; elements that are absent keep their defaults
    pub fn from_xml_str(xml: &str) -> HeatScanResult<Self> {
        let file: ConfigFile =
            from_str(xml).map_err(|e| HeatScanError::XmlParsing(format!("{}", e)))?;
        let config = file.apply(Self::default());
        config.validate()?;
        Ok(config)
    }

    pub fn from_xml_file<P: AsRef<Path>>(path: P) -> HeatScanResult<Self> {
        log::info!("Reading analysis configuration: {}", path.as_ref().display());
        let xml = std::fs::read_to_string(path)?;
        Self::from_xml_str(&xml)
    }
}

/// XML document layout; every element is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename = "analysis")]
struct ConfigFile {
    #[serde(rename = "siteName")]
    site_name: Option<String>,
    area: Option<AreaElement>,
    years: Option<YearList>,
    window: Option<WindowElement>,
    scale: Option<f64>,
    #[serde(rename = "productId")]
    product_id: Option<String>,
    #[serde(rename = "cloudCoverField")]
    cloud_cover_field: Option<String>,
    #[serde(rename = "cloudCoverMax")]
    cloud_cover_max: Option<f64>,
    #[serde(rename = "maxPixels")]
    max_pixels: Option<f64>,
    sample: Option<SampleElement>,
    export: Option<ExportElement>,
}

#[derive(Debug, Deserialize)]
struct AreaElement {
    #[serde(rename = "centerLon")]
    center_lon: f64,
    #[serde(rename = "centerLat")]
    center_lat: f64,
    #[serde(rename = "bufferMeters")]
    buffer_meters: f64,
}

#[derive(Debug, Deserialize)]
struct YearList {
    #[serde(rename = "year", default)]
    years: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WindowElement {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct SampleElement {
    count: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ExportElement {
    enabled: Option<bool>,
    folder: Option<String>,
}

impl ConfigFile {
    fn apply(self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(name) = self.site_name {
            config.site_name = name;
        }
        if let Some(area) = self.area {
            config.center_lon = area.center_lon;
            config.center_lat = area.center_lat;
            config.buffer_meters = area.buffer_meters;
        }
        if let Some(years) = self.years {
            config.years = years.years.into_iter().map(|y| y.trim().to_string()).collect();
        }
        if let Some(window) = self.window {
            config.window = DateWindow::new(window.start.trim(), window.end.trim());
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(product) = self.product_id {
            config.product_id = product;
        }
        if let Some(field) = self.cloud_cover_field {
            config.cloud_cover_field = field;
        }
        if let Some(max) = self.cloud_cover_max {
            config.cloud_cover_max = max;
        }
        if let Some(cap) = self.max_pixels {
            config.max_pixels = cap;
        }
        if let Some(sample) = self.sample {
            config.sample_count = sample.count.unwrap_or(config.sample_count);
            config.sample_seed = sample.seed.unwrap_or(config.sample_seed);
        }
        if let Some(export) = self.export {
            config.export_enabled = export.enabled.unwrap_or(config.export_enabled);
            if let Some(folder) = export.folder {
                config.export_folder = folder;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.comparison_years().unwrap(), ("2015", "2022"));
        assert!(!config.export_enabled);
    }

    #[test]
    fn test_malformed_year_rejected() {
        let config = AnalysisConfig {
            years: vec!["2015".to_string(), "22".to_string()],
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HeatScanError::Configuration(_))
        ));
    }

    #[test]
    fn test_duplicate_year_rejected() {
        let config = AnalysisConfig {
            years: vec!["2015".to_string(), "2015".to_string()],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_window_rejected() {
        let mut config = AnalysisConfig::default();
        config.window = DateWindow::new("05-01", "13-01");
        assert!(config.validate().is_err());

        config.window = DateWindow::new("5-1", "05-31");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_xml_overrides_defaults() {
        let xml = r#"
        <analysis>
            <siteName>Ahmedabad</siteName>
            <years>
                <year>2016</year>
                <year>2019</year>
                <year>2023</year>
            </years>
            <window>
                <start>04-01</start>
                <end>04-30</end>
            </window>
            <cloudCoverMax>20</cloudCoverMax>
            <sample>
                <seed>7</seed>
            </sample>
            <export>
                <enabled>true</enabled>
            </export>
        </analysis>
        "#;

        let config = AnalysisConfig::from_xml_str(xml).unwrap();
        assert_eq!(config.site_name, "Ahmedabad");
        assert_eq!(config.years, vec!["2016", "2019", "2023"]);
        assert_eq!(config.window, DateWindow::new("04-01", "04-30"));
        assert_eq!(config.cloud_cover_max, 20.0);
        assert_eq!(config.sample_seed, 7);
        assert_eq!(config.sample_count, 5000);
        assert!(config.export_enabled);
        assert_eq!(config.scale, 30.0);
        assert_eq!(config.comparison_years().unwrap(), ("2016", "2023"));
    }

    #[test]
    fn test_xml_invalid_year_rejected() {
        let xml = "<analysis><years><year>2015</year><year>abcd</year></years></analysis>";
        assert!(AnalysisConfig::from_xml_str(xml).is_err());
    }
}
