//! Archive, presentation and export collaborators

pub mod archive;
pub mod export;
pub mod geotiff;
pub mod presentation;

pub use archive::{ImageArchive, InMemoryArchive, SceneDirectoryArchive, SceneManifest};
pub use export::FileExporter;
pub use geotiff::{read_geotiff, write_geotiff, GeoTiffBand};
pub use presentation::{
    ChartKind, ChartSpec, ExportRequest, LayerContent, LayerRequest, LayerStyle, LogPresentation,
    PresentationSink, RecordingPresentation,
};
