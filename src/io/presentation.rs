//! Presentation service: map layers, charts and export requests produced by the
//! pipeline. Rendering itself happens outside this crate.

use crate::config::VisParams;
use crate::io::export::FileExporter;
use crate::types::{AreaOfInterest, HeatScanError, HeatScanResult, LinearFit, RasterImage, SamplePointSet};

/// What a map layer shows
#[derive(Debug, Clone)]
pub enum LayerContent {
    Raster(RasterImage),
    Boundary(AreaOfInterest),
}

/// How a map layer is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum LayerStyle {
    Palette(VisParams),
    Outline { color: String },
}

#[derive(Debug, Clone)]
pub struct LayerRequest {
    pub name: String,
    pub content: LayerContent,
    pub style: LayerStyle,
    /// Shown when the map first opens
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
}

/// Chart of sampled points: one x field against one or more y fields
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub points: SamplePointSet,
    pub x_field: String,
    pub y_fields: Vec<String>,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub point_size: u32,
    /// Least-squares trendline shown with its R²
    pub trendline: Option<LinearFit>,
}

/// Request to write one image to an export destination
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub image: RasterImage,
    pub description: String,
    pub folder: String,
    pub file_name_prefix: String,
    pub region: AreaOfInterest,
    pub scale: f64,
    pub max_pixels: f64,
}

/// Consumer of everything the pipeline wants shown or exported
pub trait PresentationSink {
    fn add_layer(&mut self, layer: LayerRequest) -> HeatScanResult<()>;

    fn show_chart(&mut self, chart: ChartSpec) -> HeatScanResult<()>;

    fn export(&mut self, request: ExportRequest) -> HeatScanResult<()>;

    fn center_on(&mut self, lon: f64, lat: f64, zoom: u8) -> HeatScanResult<()> {
        log::debug!("Map centered on ({}, {}) at zoom {}", lon, lat, zoom);
        Ok(())
    }
}

/// Sink that reports layers and charts through the log and writes exports
/// with a `FileExporter` when one is attached
#[derive(Default)]
pub struct LogPresentation {
    exporter: Option<FileExporter>,
}

impl LogPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exporter(exporter: FileExporter) -> Self {
        Self {
            exporter: Some(exporter),
        }
    }
}

impl PresentationSink for LogPresentation {
    fn add_layer(&mut self, layer: LayerRequest) -> HeatScanResult<()> {
        let what = match &layer.content {
            LayerContent::Raster(image) => format!("bands {:?}", image.band_names()),
            LayerContent::Boundary(area) => format!("boundary {:?}", area.bounds),
        };
        let style = match &layer.style {
            LayerStyle::Palette(vis) => {
                format!("{}..{} {:?}", vis.min, vis.max, vis.palette)
            }
            LayerStyle::Outline { color } => format!("outline {}", color),
        };
        log::info!(
            "Layer '{}' ({}), {}, {}",
            layer.name,
            what,
            style,
            if layer.visible { "shown" } else { "hidden" }
        );
        Ok(())
    }

    fn show_chart(&mut self, chart: ChartSpec) -> HeatScanResult<()> {
        log::info!(
            "{:?} chart '{}': {} points, {} vs {:?}",
            chart.kind,
            chart.title,
            chart.points.len(),
            chart.x_field,
            chart.y_fields
        );
        if let Some(fit) = chart.trendline {
            log::info!(
                "  trendline {} = {:.4} * {} + {:.4} (R² = {:.4})",
                chart.y_axis_title,
                fit.slope,
                chart.x_axis_title,
                fit.intercept,
                fit.r_squared
            );
        }
        Ok(())
    }

    fn export(&mut self, request: ExportRequest) -> HeatScanResult<()> {
        match &self.exporter {
            Some(exporter) => {
                exporter.export(&request)?;
                Ok(())
            }
            None => Err(HeatScanError::external(
                "export",
                format!("no export destination for '{}'", request.description),
            )),
        }
    }
}

/// Sink that keeps every request in memory
#[derive(Debug, Default)]
pub struct RecordingPresentation {
    pub layers: Vec<LayerRequest>,
    pub charts: Vec<ChartSpec>,
    pub exports: Vec<ExportRequest>,
    pub center: Option<(f64, f64, u8)>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerRequest> {
        self.layers.iter().find(|l| l.name == name)
    }
}

impl PresentationSink for RecordingPresentation {
    fn add_layer(&mut self, layer: LayerRequest) -> HeatScanResult<()> {
        self.layers.push(layer);
        Ok(())
    }

    fn show_chart(&mut self, chart: ChartSpec) -> HeatScanResult<()> {
        self.charts.push(chart);
        Ok(())
    }

    fn export(&mut self, request: ExportRequest) -> HeatScanResult<()> {
        self.exports.push(request);
        Ok(())
    }

    fn center_on(&mut self, lon: f64, lat: f64, zoom: u8) -> HeatScanResult<()> {
        self.center = Some((lon, lat, zoom));
        Ok(())
    }
}
