//! Run the heat scan against a local scene archive.

use anyhow::{Context, Result};
use clap::Parser;
use heatscan::io::{FileExporter, LogPresentation};
use heatscan::{AnalysisConfig, HeatScanPipeline, LocalReductionEngine, SceneDirectoryArchive};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "heatscan")]
#[command(version, about = "Multi-year Landsat surface temperature and index compositing", long_about = None)]
struct Args {
    /// Directory of scene folders, each with a scene.xml manifest and band GeoTIFFs
    scene_dir: PathBuf,

    /// Analysis configuration XML (defaults to the built-in site)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory for exports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_xml_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    let archive = SceneDirectoryArchive::new(&args.scene_dir)
        .with_context(|| format!("opening scene archive {}", args.scene_dir.display()))?;
    let engine = LocalReductionEngine::new();
    let mut presentation = LogPresentation::with_exporter(FileExporter::new(&args.output_dir));

    let report = HeatScanPipeline::new(&config, &archive, &engine)
        .run(&mut presentation)
        .context("heat scan failed")?;

    for year in &report.years {
        println!(
            "{}: {} scenes ({} queried) mean {}",
            year.year, year.scene_count, year.queried, year.stats
        );
    }
    if let Some(fit) = report.trendline {
        println!(
            "NDVI vs LST: slope {:.3} °C per NDVI unit, R² {:.3} over {} points",
            fit.slope,
            fit.r_squared,
            report.sample.len()
        );
    }
    Ok(())
}
