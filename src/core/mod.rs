//! Core compositing and analysis modules

pub mod band_math;
pub mod composite;
pub mod delta;
pub mod pipeline;
pub mod reduce;
pub mod resample;
pub mod sample;
pub mod yearly_store;
pub mod zonal;

// Re-export main types
pub use band_math::{
    add_all_indices, built_up_index, normalized_difference, temperature_celsius,
    vegetation_index, water_index,
};
pub use composite::{CompositeParams, ImageCompositor, YearComposite};
pub use delta::delta;
pub use pipeline::{HeatScanPipeline, PipelineReport, YearSummary};
pub use reduce::{LocalReductionEngine, ReductionEngine};
pub use resample::resample_to_grid;
pub use sample::sample;
pub use yearly_store::YearlyStore;
pub use zonal::{summarize, summarize_mean};
