mod common;

use approx::assert_abs_diff_eq;
use common::*;
use heatscan::config::LANDSAT8_L2;
use heatscan::io::read_geotiff;
use heatscan::io::{FileExporter, LogPresentation};
use heatscan::types::bands;
use heatscan::{
    AnalysisConfig, HeatScanError, HeatScanPipeline, ImageArchive, LocalReductionEngine,
    SceneDirectoryArchive,
};
use tempfile::TempDir;

fn write_archive(dir: &std::path::Path, config: &AnalysisConfig) {
    let grid = config.grid().unwrap();
    let scenes = [
        scene(&grid, "LC08_2015_0510", (2015, 5, 10), 5.0, &RURAL_2015, 0.0),
        scene(&grid, "LC08_2022_0505", (2022, 5, 5), 0.0, &URBAN_2022_A, 0.001),
        scene(&grid, "LC08_2022_0521", (2022, 5, 21), 0.0, &URBAN_2022_B, 0.0),
        scene(&grid, "LC08_2022_0513", (2022, 5, 13), 35.0, &RURAL_2015, 0.0),
    ];
    for image in &scenes {
        SceneDirectoryArchive::write_scene(dir, LANDSAT8_L2, image).unwrap();
    }
}

#[test]
fn test_written_scene_reads_back() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let grid = config.grid().unwrap();
    let original = scene(&grid, "LC08_2022_0505", (2022, 5, 5), 3.5, &URBAN_2022_A, 0.001);

    let scene_dir = SceneDirectoryArchive::write_scene(dir.path(), LANDSAT8_L2, &original).unwrap();
    let loaded = SceneDirectoryArchive::read_scene(&scene_dir).unwrap();

    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.acquired, original.acquired);
    assert_eq!(loaded.property("CLOUD_COVER"), Some(3.5));
    assert_eq!(loaded.band_names(), original.band_names());
    assert_eq!(loaded.grid.shape(), grid.shape());
    assert_eq!(loaded.band(bands::RED).unwrap(), original.band(bands::RED).unwrap());
}

#[test]
fn test_query_filters_product_date_and_bounds() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    write_archive(dir.path(), &config);

    let archive = SceneDirectoryArchive::new(dir.path()).unwrap();
    let area = config.area().unwrap();
    let range = config.window.for_year("2022").unwrap();

    let collection = archive.query_collection(LANDSAT8_L2, &range, &area).unwrap();
    assert_eq!(collection.len(), 3);

    let far_away = heatscan::AreaOfInterest::from_buffered_point(-0.1276, 51.5072, 150.0).unwrap();
    assert!(archive
        .query_collection(LANDSAT8_L2, &range, &far_away)
        .unwrap()
        .is_empty());
    assert!(archive
        .query_collection("LANDSAT/LC09/C02/T1_L2", &range, &area)
        .unwrap()
        .is_empty());
}

#[test]
fn test_scene_bands_are_georeferenced_tiffs() {
    let dir = TempDir::new().unwrap();
    let config = small_config();
    let grid = config.grid().unwrap();
    let tile = padded_grid(&grid, 2);
    let image = scene(&tile, "LC08_2022_0505", (2022, 5, 5), 1.0, &URBAN_2022_A, 0.0);

    let scene_dir = SceneDirectoryArchive::write_scene(dir.path(), LANDSAT8_L2, &image).unwrap();
    let band = read_geotiff(scene_dir.join("ST_B10.tif"), None).unwrap();
    assert_eq!(band.data.dim(), (14, 14));
    let gt = band.geo_transform.unwrap();
    assert_abs_diff_eq!(gt.top_left_x, tile.geo_transform.top_left_x, epsilon = 1e-9);
    assert_abs_diff_eq!(gt.pixel_height, tile.geo_transform.pixel_height, epsilon = 1e-12);

    let loaded = SceneDirectoryArchive::read_scene(&scene_dir).unwrap();
    assert_eq!(loaded.grid.shape(), (14, 14));
}

#[test]
fn test_missing_archive_directory() {
    assert!(SceneDirectoryArchive::new("/definitely/not/here").is_err());
}

#[test]
fn test_pipeline_from_disk_with_export() {
    init_logging();
    let scenes = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let config = AnalysisConfig {
        export_enabled: true,
        ..small_config()
    };
    write_archive(scenes.path(), &config);

    let archive = SceneDirectoryArchive::new(scenes.path()).unwrap();
    let engine = LocalReductionEngine::new();
    let mut presentation = LogPresentation::with_exporter(FileExporter::new(output.path()));

    let report = HeatScanPipeline::new(&config, &archive, &engine)
        .run(&mut presentation)
        .unwrap();
    assert!(report.exported);

    let raster = output
        .path()
        .join("EarthEngineExports")
        .join("GIFT_LST_2022.tif");
    assert!(raster.is_file());

    let grid = config.grid().unwrap();
    let exported = read_geotiff(&raster, None).unwrap();
    assert_eq!(exported.data.dim(), grid.shape());
    let gt = exported.geo_transform.unwrap();
    assert_abs_diff_eq!(gt.top_left_x, grid.geo_transform.top_left_x, epsilon = 1e-9);
    assert_abs_diff_eq!(gt.top_left_y, grid.geo_transform.top_left_y, epsilon = 1e-9);
    let expected = (celsius(URBAN_2022_A.thermal) + celsius(URBAN_2022_B.thermal)) / 2.0;
    assert_abs_diff_eq!(exported.data[[5, 5]] as f64, expected, epsilon = 1e-3);
}

#[test]
fn test_export_without_destination_fails() {
    let scenes = TempDir::new().unwrap();
    let config = AnalysisConfig {
        export_enabled: true,
        ..small_config()
    };
    write_archive(scenes.path(), &config);

    let archive = SceneDirectoryArchive::new(scenes.path()).unwrap();
    let engine = LocalReductionEngine::new();
    let mut presentation = LogPresentation::new();

    let err = HeatScanPipeline::new(&config, &archive, &engine)
        .run(&mut presentation)
        .unwrap_err();
    match err {
        HeatScanError::Year { year, source } => {
            assert_eq!(year, "2022");
            assert!(matches!(*source, HeatScanError::ExternalService { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
}
