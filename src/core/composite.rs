use crate::core::band_math::add_all_indices;
use crate::core::reduce::ReductionEngine;
use crate::core::resample::resample_to_grid;
use crate::io::archive::ImageArchive;
use crate::types::{
    bands, AreaOfInterest, DateRange, DateWindow, HeatScanResult, MetadataFilter, RasterGrid,
    RasterImage,
};

/// Property recording how many scenes went into a composite
pub const SCENE_COUNT_PROPERTY: &str = "SCENE_COUNT";

/// Compositing parameters fixed for a whole run
#[derive(Debug, Clone)]
pub struct CompositeParams {
    pub product_id: String,
    pub cloud_cover_field: String,
    /// Scenes must have cloud cover strictly below this value
    pub cloud_cover_max: f64,
}

/// Median composite of one year plus the facts needed to interpret it
#[derive(Debug, Clone)]
pub struct YearComposite {
    pub year: String,
    pub date_range: DateRange,
    /// Scenes returned by the archive query
    pub queried: usize,
    /// Scenes left after cloud filtering, i.e. reduced into the median
    pub scene_count: usize,
    pub image: RasterImage,
}

impl YearComposite {
    /// True when no scene survived filtering and the image is all no-data
    pub fn is_empty(&self) -> bool {
        self.scene_count == 0
    }
}

/// Builds yearly cloud-filtered median composites through the archive and
/// reduction services
pub struct ImageCompositor<'a, A: ImageArchive + ?Sized, E: ReductionEngine + ?Sized> {
    archive: &'a A,
    engine: &'a E,
    params: CompositeParams,
}

impl<'a, A: ImageArchive + ?Sized, E: ReductionEngine + ?Sized> ImageCompositor<'a, A, E> {
    pub fn new(archive: &'a A, engine: &'a E, params: CompositeParams) -> Self {
        Self {
            archive,
            engine,
            params,
        }
    }

    pub fn params(&self) -> &CompositeParams {
        &self.params
    }

    /// Query, cloud-filter, place every scene on `grid`, derive indices,
    /// median-reduce and clip one year.
    ///
    /// An empty filtered collection is not an error: the result is a no-data
    /// image on `grid` carrying every source and derived band.
    pub fn composite(
        &self,
        area: &AreaOfInterest,
        grid: &RasterGrid,
        year: &str,
        window: &DateWindow,
    ) -> HeatScanResult<YearComposite> {
        let date_range = window.for_year(year)?;
        log::info!(
            "Compositing {} for {} ({} to {}, cloud cover < {})",
            self.params.product_id,
            year,
            date_range.start,
            date_range.end,
            self.params.cloud_cover_max
        );

        let collection = self
            .archive
            .query_collection(&self.params.product_id, &date_range, area)?;
        let queried = collection.len();

        let filtered = self.archive.filter_by_metadata(
            collection,
            &self.params.cloud_cover_field,
            MetadataFilter::LessThan,
            self.params.cloud_cover_max,
        );
        let scene_count = filtered.len();
        log::info!(
            "{}: {} scenes queried, {} pass cloud filter",
            year,
            queried,
            scene_count
        );
        for img in filtered.images() {
            log::debug!(
                "  scene {} acquired {:?} cloud cover {:?}",
                img.id,
                img.acquired,
                img.property(&self.params.cloud_cover_field)
            );
        }

        let id = format!("composite_{}", year);
        let median = if filtered.is_empty() {
            log::warn!(
                "{}: no scenes left after filtering, composite is all no-data",
                year
            );
            let names: Vec<&str> = bands::SOURCE
                .iter()
                .chain(bands::DERIVED.iter())
                .copied()
                .collect();
            RasterImage::no_data(id, *grid, &names)
        } else {
            let indexed = filtered
                .map(|scene| resample_to_grid(scene, grid))?
                .map(add_all_indices)?;
            let mut median = self.engine.median_reduce(&indexed)?;
            median.id = id;
            median
        };

        let image = median
            .clip(area)
            .with_property(SCENE_COUNT_PROPERTY, scene_count as f64);

        Ok(YearComposite {
            year: year.to_string(),
            date_range,
            queried,
            scene_count,
            image,
        })
    }
}
