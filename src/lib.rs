//! heatscan: multi-year urban heat and land cover composites from Landsat 8
//!
//! For a fixed area and a set of years, this library builds cloud-filtered
//! median composites carrying land surface temperature (`LST_C`) and three
//! normalized-difference indices (`NDVI`, `NDBI`, `MNDWI`), then derives
//! difference rasters, zonal means and a seeded pixel sample for scatter charts.
//! Imagery access, map rendering and export destinations sit behind traits in
//! [`io`]; the in-process [`core::reduce::LocalReductionEngine`] does the pixel work.

pub mod config;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::config::{AnalysisConfig, VisParams};
pub use crate::types::{
    AreaOfInterest, DateRange, DateWindow, HeatScanError, HeatScanResult, ImageCollection,
    RasterGrid, RasterImage, Reducer, SamplePointSet, ZonalStats,
};

pub use crate::core::{HeatScanPipeline, LocalReductionEngine, PipelineReport, YearlyStore};
pub use crate::io::{ImageArchive, InMemoryArchive, PresentationSink, SceneDirectoryArchive};
