//! The full analysis: yearly composites, per-year layers and mean statistics,
//! difference layers between the first and last year, a sampled NDVI vs LST
//! scatter chart, and the optional export of the latest temperature map.

use crate::config::{AnalysisConfig, VisParams};
use crate::core::composite::{CompositeParams, ImageCompositor};
use crate::core::delta::delta;
use crate::core::reduce::ReductionEngine;
use crate::core::sample::sample;
use crate::core::yearly_store::YearlyStore;
use crate::core::zonal::summarize_mean;
use crate::io::archive::ImageArchive;
use crate::io::presentation::{
    ChartKind, ChartSpec, ExportRequest, LayerContent, LayerRequest, LayerStyle, PresentationSink,
};
use crate::types::{
    bands, AreaOfInterest, HeatScanResult, LinearFit, RasterImage, SamplePointSet, ZonalStats,
};

/// Zoom level the map is centered at
pub const MAP_ZOOM: u8 = 12;

/// What happened for one configured year
#[derive(Debug, Clone)]
pub struct YearSummary {
    pub year: String,
    pub queried: usize,
    pub scene_count: usize,
    pub stats: ZonalStats,
}

/// Everything one run produced
#[derive(Debug)]
pub struct PipelineReport {
    pub years: Vec<YearSummary>,
    pub store: YearlyStore,
    /// Δ_LST_C then Δ_NDVI, latest minus earliest year
    pub deltas: Vec<RasterImage>,
    pub sample: SamplePointSet,
    pub trendline: Option<LinearFit>,
    pub exported: bool,
}

impl PipelineReport {
    pub fn year(&self, year: &str) -> Option<&YearSummary> {
        self.years.iter().find(|y| y.year == year)
    }
}

pub struct HeatScanPipeline<'a, A: ImageArchive + ?Sized, E: ReductionEngine + ?Sized> {
    config: &'a AnalysisConfig,
    archive: &'a A,
    engine: &'a E,
}

impl<'a, A: ImageArchive + ?Sized, E: ReductionEngine + ?Sized> HeatScanPipeline<'a, A, E> {
    pub fn new(config: &'a AnalysisConfig, archive: &'a A, engine: &'a E) -> Self {
        Self {
            config,
            archive,
            engine,
        }
    }

    pub fn run(&self, presentation: &mut dyn PresentationSink) -> HeatScanResult<PipelineReport> {
        let config = self.config;
        config.validate()?;
        let area = config.area()?;
        let grid = config.grid()?;
        log::info!(
            "Heat scan of {}: years {:?}, window {}..{}, {}x{} pixels at {} m",
            config.site_name,
            config.years,
            config.window.start,
            config.window.end,
            grid.rows,
            grid.cols,
            config.scale
        );

        let compositor = ImageCompositor::new(
            self.archive,
            self.engine,
            CompositeParams {
                product_id: config.product_id.clone(),
                cloud_cover_field: config.cloud_cover_field.clone(),
                cloud_cover_max: config.cloud_cover_max,
            },
        );

        let mut store = YearlyStore::new();
        let mut years = Vec::with_capacity(config.years.len());
        for year in &config.years {
            let composite = compositor
                .composite(&area, &grid, year, &config.window)
                .map_err(|e| e.in_year(year))?;

            self.add_year_layers(presentation, year, &composite.image)
                .map_err(|e| e.in_year(year))?;

            let stats = summarize_mean(
                self.engine,
                &composite.image,
                &area,
                config.scale,
                config.max_pixels,
            )
            .map_err(|e| e.in_year(year))?;
            log::info!("Mean values for {}: {}", year, stats);

            years.push(YearSummary {
                year: year.clone(),
                queried: composite.queried,
                scene_count: composite.scene_count,
                stats,
            });
            store.put(year, composite.image)?;
        }

        let (earlier, later) = config.comparison_years()?;
        let deltas = self
            .add_delta_layers(presentation, &store, earlier, later)
            .map_err(|e| e.in_year(later))?;

        let (points, trendline) = self
            .add_scatter_chart(presentation, &store, &area, later)
            .map_err(|e| e.in_year(later))?;

        let exported = if config.export_enabled {
            self.export_latest(presentation, &store, &area, later)
                .map_err(|e| e.in_year(later))?;
            true
        } else {
            log::debug!("Export disabled");
            false
        };

        presentation.center_on(config.center_lon, config.center_lat, MAP_ZOOM)?;
        presentation.add_layer(LayerRequest {
            name: "AOI Boundary".to_string(),
            content: LayerContent::Boundary(area.clone()),
            style: LayerStyle::Outline {
                color: "white".to_string(),
            },
            visible: false,
        })?;

        Ok(PipelineReport {
            years,
            store,
            deltas,
            sample: points,
            trendline,
            exported,
        })
    }

    fn add_year_layers(
        &self,
        presentation: &mut dyn PresentationSink,
        year: &str,
        image: &RasterImage,
    ) -> HeatScanResult<()> {
        let palettes = &self.config.palettes;
        let layers: [(&str, &str, &VisParams, bool); 4] = [
            (bands::LST, "LST", &palettes.lst, true),
            (bands::NDVI, "NDVI", &palettes.ndvi, false),
            (bands::NDBI, "NDBI", &palettes.ndbi, false),
            (bands::MNDWI, "MNDWI", &palettes.mndwi, false),
        ];

        for (band, label, vis, visible) in layers {
            presentation.add_layer(LayerRequest {
                name: format!("{} {}", label, year),
                content: LayerContent::Raster(image.select(&[band])?),
                style: LayerStyle::Palette(vis.clone()),
                visible,
            })?;
        }
        Ok(())
    }

    fn add_delta_layers(
        &self,
        presentation: &mut dyn PresentationSink,
        store: &YearlyStore,
        earlier: &str,
        later: &str,
    ) -> HeatScanResult<Vec<RasterImage>> {
        let palettes = &self.config.palettes;
        let span = format!("{}-{}", short_year(later), short_year(earlier));
        let later_image = store.get(later)?;
        let earlier_image = store.get(earlier)?;

        let delta_lst = delta(bands::LST, later_image, earlier_image)?;
        let delta_ndvi = delta(bands::NDVI, later_image, earlier_image)?;

        presentation.add_layer(LayerRequest {
            name: format!("Δ LST ({})", span),
            content: LayerContent::Raster(delta_lst.clone()),
            style: LayerStyle::Palette(palettes.delta_lst.clone()),
            visible: true,
        })?;
        presentation.add_layer(LayerRequest {
            name: format!("Δ NDVI ({})", span),
            content: LayerContent::Raster(delta_ndvi.clone()),
            style: LayerStyle::Palette(palettes.delta_ndvi.clone()),
            visible: false,
        })?;

        Ok(vec![delta_lst, delta_ndvi])
    }

    fn add_scatter_chart(
        &self,
        presentation: &mut dyn PresentationSink,
        store: &YearlyStore,
        area: &AreaOfInterest,
        year: &str,
    ) -> HeatScanResult<(SamplePointSet, Option<LinearFit>)> {
        let config = self.config;
        let points = sample(
            self.engine,
            store.get(year)?,
            &[bands::NDVI, bands::LST],
            area,
            config.scale,
            config.sample_count,
            config.sample_seed,
        )?;
        let trendline = points.linear_fit(bands::NDVI, bands::LST)?;

        presentation.show_chart(ChartSpec {
            title: format!("{} {}: NDVI vs LST", config.site_name, year),
            kind: ChartKind::Scatter,
            points: points.clone(),
            x_field: bands::NDVI.to_string(),
            y_fields: vec![bands::LST.to_string()],
            x_axis_title: "NDVI (green cover)".to_string(),
            y_axis_title: "LST °C".to_string(),
            point_size: 3,
            trendline,
        })?;

        Ok((points, trendline))
    }

    fn export_latest(
        &self,
        presentation: &mut dyn PresentationSink,
        store: &YearlyStore,
        area: &AreaOfInterest,
        year: &str,
    ) -> HeatScanResult<()> {
        let config = self.config;
        let prefix = config
            .site_name
            .split_whitespace()
            .next()
            .unwrap_or("SITE")
            .to_uppercase();
        let name = format!("{}_LST_{}", prefix, year);

        presentation.export(ExportRequest {
            image: store.get(year)?.select(&[bands::LST])?,
            description: name.clone(),
            folder: config.export_folder.clone(),
            file_name_prefix: name,
            region: area.clone(),
            scale: config.scale,
            max_pixels: config.max_pixels,
        })
    }
}

/// Last two digits of a four-digit year label
fn short_year(year: &str) -> &str {
    year.get(year.len().saturating_sub(2)..).unwrap_or(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_year() {
        assert_eq!(short_year("2022"), "22");
        assert_eq!(short_year("2015"), "15");
    }
}
