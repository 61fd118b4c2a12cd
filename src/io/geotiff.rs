//! Single-band GeoTIFF reading and writing on top of the `tiff` crate.
//!
//! Georeferencing uses ModelPixelScaleTag + ModelTiepointTag (north-up, no
//! rotation). The GDAL no-data tag is written as `nan` and honoured on read.

use crate::types::{BandData, GeoTransform, HeatScanError, HeatScanResult};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// One band read from a GeoTIFF
#[derive(Debug, Clone)]
pub struct GeoTiffBand {
    pub data: BandData,
    pub geo_transform: Option<GeoTransform>,
}

/// Read the first band of a GeoTIFF. Pixels equal to `fill_value`, or to the
/// file's GDAL no-data value when `fill_value` is `None`, become no-data.
pub fn read_geotiff<P: AsRef<Path>>(path: P, fill_value: Option<f32>) -> HeatScanResult<GeoTiffBand> {
    let path = path.as_ref();
    let mut decoder = Decoder::new(File::open(path)?)?;
    let (width, height) = decoder.dimensions()?;
    let (rows, cols) = (height as usize, width as usize);

    let fill_value = fill_value.or_else(|| {
        decoder
            .get_tag_ascii_string(GDAL_NODATA)
            .ok()
            .and_then(|text| text.trim_matches(char::from(0)).trim().parse::<f32>().ok())
            .filter(|v| v.is_finite())
    });

    let values: Vec<f32> = match decoder.read_image()? {
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.iter().map(|&v| v as f32).collect(),
        _ => {
            return Err(HeatScanError::external(
                "read_geotiff",
                format!("{} has an unsupported pixel format", path.display()),
            ))
        }
    };

    if values.len() != rows * cols {
        return Err(HeatScanError::external(
            "read_geotiff",
            format!(
                "{} holds {} samples, expected {}x{} single-band pixels",
                path.display(),
                values.len(),
                rows,
                cols
            ),
        ));
    }

    let values = match fill_value {
        Some(fill) => values
            .into_iter()
            .map(|v| if v == fill { f32::NAN } else { v })
            .collect(),
        None => values,
    };

    let data = BandData::from_shape_vec((rows, cols), values)
        .map_err(|e| HeatScanError::Processing(format!("Band shape error: {}", e)))?;

    Ok(GeoTiffBand {
        data,
        geo_transform: read_geo_transform(&mut decoder),
    })
}

fn read_geo_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: raster (I, J, K) maps to model (X, Y, Z)
    Some(GeoTransform {
        top_left_x: tiepoint[3] - tiepoint[0] * scale[0],
        pixel_width: scale[0],
        top_left_y: tiepoint[4] + tiepoint[1] * scale[1],
        pixel_height: -scale[1],
    })
}

/// Write `data` as a 32-bit float GeoTIFF in geographic WGS 84 coordinates
pub fn write_geotiff<P: AsRef<Path>>(
    path: P,
    data: &BandData,
    transform: &GeoTransform,
) -> HeatScanResult<()> {
    let (rows, cols) = data.dim();
    let mut encoder = TiffEncoder::new(File::create(path.as_ref())?)?;
    let mut image = encoder.new_image::<Gray32Float>(cols as u32, rows as u32)?;

    let scale = [transform.pixel_width, transform.pixel_height.abs(), 0.0];
    image.encoder().write_tag(MODEL_PIXEL_SCALE, &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, transform.top_left_x, transform.top_left_y, 0.0];
    image.encoder().write_tag(MODEL_TIEPOINT, &tiepoint[..])?;

    // GTModelType = geographic, GTRasterType = pixel is area, GeographicType = EPSG:4326
    let geo_keys: [u16; 16] = [1, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326];
    image.encoder().write_tag(GEO_KEY_DIRECTORY, &geo_keys[..])?;
    image.encoder().write_tag(GDAL_NODATA, "nan")?;

    let values: Vec<f32> = data.iter().copied().collect();
    image.write_data(&values)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;
    use tiff::encoder::colortype::Gray16;

    fn transform() -> GeoTransform {
        GeoTransform {
            top_left_x: 72.5,
            pixel_width: 0.0003,
            top_left_y: 23.3,
            pixel_height: -0.0003,
        }
    }

    #[test]
    fn test_written_band_keeps_values_and_georeferencing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lst.tif");
        let data = array![[31.5, f32::NAN, 29.0], [30.25, 28.0, 33.0]];

        write_geotiff(&path, &data, &transform()).unwrap();
        let band = read_geotiff(&path, None).unwrap();

        assert_eq!(band.data.dim(), (2, 3));
        assert_eq!(band.data[[0, 0]], 31.5);
        assert!(band.data[[0, 1]].is_nan());
        assert_eq!(band.data[[1, 2]], 33.0);
        let gt = band.geo_transform.unwrap();
        assert!((gt.top_left_x - 72.5).abs() < 1e-12);
        assert!((gt.top_left_y - 23.3).abs() < 1e-12);
        assert!((gt.pixel_height + 0.0003).abs() < 1e-12);
    }

    #[test]
    fn test_integer_band_with_fill_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ST_B10.tif");
        {
            let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
            encoder
                .write_image::<Gray16>(2, 2, &[0u16, 44000, 45000, 0])
                .unwrap();
        }

        let band = read_geotiff(&path, Some(0.0)).unwrap();
        assert!(band.data[[0, 0]].is_nan());
        assert_eq!(band.data[[0, 1]], 44000.0);
        assert_eq!(band.data[[1, 0]], 45000.0);
        assert!(band.data[[1, 1]].is_nan());
        assert!(band.geo_transform.is_none());
    }
}
