use crate::types::{HeatScanError, HeatScanResult, RasterImage};
use std::ops::Index;

/// Year label to composite, in insertion (configured) order. Each label is
/// written once and never replaced.
#[derive(Debug, Clone, Default)]
pub struct YearlyStore {
    entries: Vec<(String, RasterImage)>,
}

impl YearlyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, year: &str, image: RasterImage) -> HeatScanResult<()> {
        if self.contains(year) {
            return Err(HeatScanError::Processing(format!(
                "Composite for {} already stored",
                year
            )));
        }
        log::debug!("Storing composite for {}", year);
        self.entries.push((year.to_string(), image));
        Ok(())
    }

    pub fn get(&self, year: &str) -> HeatScanResult<&RasterImage> {
        self.entries
            .iter()
            .find(|(label, _)| label == year)
            .map(|(_, image)| image)
            .ok_or_else(|| {
                HeatScanError::Configuration(format!(
                    "No composite stored for year '{}' (stored: {:?})",
                    year,
                    self.years()
                ))
            })
    }

    pub fn contains(&self, year: &str) -> bool {
        self.entries.iter().any(|(label, _)| label == year)
    }

    pub fn years(&self) -> Vec<&str> {
        self.entries.iter().map(|(label, _)| label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RasterImage)> {
        self.entries.iter().map(|(label, image)| (label.as_str(), image))
    }
}

impl Index<&str> for YearlyStore {
    type Output = RasterImage;

    /// Panics on a year that was never stored
    fn index(&self, year: &str) -> &RasterImage {
        match self.get(year) {
            Ok(image) => image,
            Err(e) => panic!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, RasterGrid};

    fn image(id: &str) -> RasterImage {
        let grid = RasterGrid {
            rows: 1,
            cols: 1,
            geo_transform: GeoTransform {
                top_left_x: 0.0,
                pixel_width: 1.0,
                top_left_y: 0.0,
                pixel_height: -1.0,
            },
            scale: 30.0,
        };
        RasterImage::no_data(id, grid, &["X"])
    }

    #[test]
    fn test_put_then_get_returns_same_image() {
        let mut store = YearlyStore::new();
        store.put("2015", image("a")).unwrap();
        store.put("2022", image("b")).unwrap();

        assert_eq!(store.get("2015").unwrap().id, "a");
        assert_eq!(store["2022"].id, "b");
        assert_eq!(store.years(), vec!["2015", "2022"]);
    }

    #[test]
    fn test_order_follows_insertion() {
        let mut store = YearlyStore::new();
        for year in ["2022", "2001", "2015"] {
            store.put(year, image(year)).unwrap();
        }
        let order: Vec<&str> = store.iter().map(|(year, _)| year).collect();
        assert_eq!(order, vec!["2022", "2001", "2015"]);
    }

    #[test]
    fn test_written_once() {
        let mut store = YearlyStore::new();
        store.put("2015", image("a")).unwrap();
        assert!(store.put("2015", image("b")).is_err());
        assert_eq!(store.get("2015").unwrap().id, "a");
    }

    #[test]
    fn test_unknown_year() {
        let store = YearlyStore::new();
        assert!(matches!(
            store.get("1999"),
            Err(HeatScanError::Configuration(_))
        ));
    }

    #[test]
    #[should_panic(expected = "1999")]
    fn test_index_unknown_year_panics() {
        let store = YearlyStore::new();
        let _ = &store["1999"];
    }
}
