use std::path::{Path, PathBuf};

use dicom::{
    object::{DefaultDicomObject, OpenFileOptions, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::tags;
use log::{debug, warn};
use ndarray::Array2;
use rayon::prelude::*;

use crate::{
    enums::{Dimension, SortBy},
    error::{Error, Result},
    image::{DynImage, Image, Metadata},
    io::{ImageFormat, ImageInfo},
    pixel::{ComponentType, Pixel, Rgb8},
};

/// Pixel layout of a DICOM image, read from the image pixel module
#[derive(Clone, Copy, Debug, PartialEq)]
struct PixelLayout {
    rows: usize,
    columns: usize,
    frames: usize,
    samples_per_pixel: usize,
    bits_allocated: u16,
    bits_stored: u16,
    signed: bool,
    rescale_slope: f64,
    rescale_intercept: f64,
}

impl PixelLayout {
    fn read(dicom_object: &DefaultDicomObject) -> Result<Self> {
        let rows = get_int(dicom_object, tags::ROWS).ok_or(Error::MissingAttribute("Rows"))?;
        let columns =
            get_int(dicom_object, tags::COLUMNS).ok_or(Error::MissingAttribute("Columns"))?;
        let bits_allocated = get_int(dicom_object, tags::BITS_ALLOCATED)
            .ok_or(Error::MissingAttribute("BitsAllocated"))?;
        let bits_stored = get_int(dicom_object, tags::BITS_STORED).unwrap_or(bits_allocated);

        Ok(Self {
            rows: rows as usize,
            columns: columns as usize,
            frames: get_int(dicom_object, tags::NUMBER_OF_FRAMES)
                .unwrap_or(1)
                .max(1) as usize,
            samples_per_pixel: get_int(dicom_object, tags::SAMPLES_PER_PIXEL).unwrap_or(1)
                as usize,
            bits_allocated: bits_allocated as u16,
            bits_stored: bits_stored as u16,
            signed: get_int(dicom_object, tags::PIXEL_REPRESENTATION).unwrap_or(0) == 1,
            rescale_slope: get_f64(dicom_object, tags::RESCALE_SLOPE).unwrap_or(1.0),
            rescale_intercept: get_f64(dicom_object, tags::RESCALE_INTERCEPT).unwrap_or(0.0),
        })
    }

    fn has_rescale(&self) -> bool {
        self.rescale_slope != 1.0 || self.rescale_intercept != 0.0
    }

    /// Range of stored values before the modality LUT
    fn stored_range(&self) -> (f64, f64) {
        let bits = self.bits_stored.clamp(1, 32) as i32;
        if self.signed {
            (-(2f64.powi(bits - 1)), 2f64.powi(bits - 1) - 1.0)
        } else {
            (0.0, 2f64.powi(bits) - 1.0)
        }
    }

    /// Component type that holds every value after the modality LUT.
    ///
    /// Without a rescale the stored type is kept. Integral rescales are
    /// promoted to the smallest of short, unsigned short and int that covers
    /// the rescaled range; fractional ones become float.
    fn component_type(&self) -> Result<ComponentType> {
        let unsupported = || Error::UnsupportedPixelType {
            pixel: format!(
                "{} bit {}",
                self.bits_allocated,
                if self.signed { "signed" } else { "unsigned" }
            ),
            format: "DICOM".to_string(),
        };

        if self.samples_per_pixel == 3 {
            return if self.bits_allocated == 8 {
                Ok(ComponentType::U8)
            } else {
                Err(unsupported())
            };
        }
        if self.samples_per_pixel != 1 {
            return Err(Error::UnsupportedComponents(self.samples_per_pixel));
        }

        if !self.has_rescale() {
            return match (self.bits_allocated, self.signed) {
                (8, false) => Ok(ComponentType::U8),
                (8, true) => Ok(ComponentType::I8),
                (16, false) => Ok(ComponentType::U16),
                (16, true) => Ok(ComponentType::I16),
                (32, false) => Ok(ComponentType::U32),
                (32, true) => Ok(ComponentType::I32),
                _ => Err(unsupported()),
            };
        }

        if self.rescale_slope.fract() != 0.0 || self.rescale_intercept.fract() != 0.0 {
            return Ok(ComponentType::F32);
        }

        let (low, high) = self.stored_range();
        let a = low * self.rescale_slope + self.rescale_intercept;
        let b = high * self.rescale_slope + self.rescale_intercept;
        let (low, high) = (a.min(b), a.max(b));
        let component_type = if low >= i16::MIN as f64 && high <= i16::MAX as f64 {
            ComponentType::I16
        } else if low >= 0.0 && high <= u16::MAX as f64 {
            ComponentType::U16
        } else if low >= i32::MIN as f64 && high <= i32::MAX as f64 {
            ComponentType::I32
        } else {
            ComponentType::F64
        };
        Ok(component_type)
    }
}

/// Loads DICOM files and series into images.
///
/// Pixel values go through the modality LUT (rescale slope and intercept)
/// but never through a VOI LUT, so they keep their physical meaning
/// (Hounsfield units for CT).
pub struct DicomLoader;

impl DicomLoader {
    /// Read the image attributes of a file, stopping before the pixel data
    pub fn read_information(path: &Path) -> Result<ImageInfo> {
        let dicom_object = OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)?;
        let layout = PixelLayout::read(&dicom_object)?;

        Ok(ImageInfo {
            format: ImageFormat::Dicom,
            dimension: if layout.frames > 1 {
                Dimension::Three
            } else {
                Dimension::Two
            },
            component_type: layout.component_type()?,
            components: layout.samples_per_pixel,
            size: [layout.columns, layout.rows, layout.frames],
            spacing: Self::get_spacing(&dicom_object),
        })
    }

    /// Load a single file. Multi-frame objects become a volume.
    pub fn load_file(path: &Path) -> Result<DynImage> {
        let dicom_object = open_file(path)?;
        Self::load_from_dicom_objects(vec![dicom_object], SortBy::None)
    }

    /// Load several files as the slices of one volume
    pub fn load_series(paths: &[PathBuf], sort_by: SortBy) -> Result<DynImage> {
        let objects = paths
            .par_iter()
            .map(|path| open_file(path).map_err(Error::from))
            .collect::<Result<Vec<_>>>()?;

        Self::load_from_dicom_objects(objects, sort_by)
    }

    /// Build an image from DICOM objects
    ///
    /// # Errors
    ///
    /// Returns an error if the objects have no pixel data, or if their pixel
    /// types or dimensions differ
    pub fn load_from_dicom_objects(
        mut dicom_objects: Vec<DefaultDicomObject>,
        sort_by: SortBy,
    ) -> Result<DynImage> {
        if dicom_objects.is_empty() {
            return Err(Error::NoInput);
        }
        Self::sort_objects(&mut dicom_objects, sort_by);

        let layouts = dicom_objects
            .iter()
            .map(PixelLayout::read)
            .collect::<Result<Vec<_>>>()?;
        let component_type = layouts[0].component_type()?;
        let samples_per_pixel = layouts[0].samples_per_pixel;
        for layout in &layouts[1..] {
            let found = layout.component_type()?;
            if found != component_type || layout.samples_per_pixel != samples_per_pixel {
                return Err(Error::InconsistentPixelType {
                    expected: component_type.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let objects: Vec<_> = dicom_objects.iter().zip(&layouts).collect();
        if samples_per_pixel == 3 {
            return Self::build_image::<Rgb8>(&objects).map(DynImage::from);
        }

        match component_type {
            ComponentType::U8 => Self::build_image::<u8>(&objects).map(DynImage::from),
            ComponentType::I8 => Self::build_image::<i8>(&objects).map(DynImage::from),
            ComponentType::U16 => Self::build_image::<u16>(&objects).map(DynImage::from),
            ComponentType::I16 => Self::build_image::<i16>(&objects).map(DynImage::from),
            ComponentType::U32 => Self::build_image::<u32>(&objects).map(DynImage::from),
            ComponentType::I32 => Self::build_image::<i32>(&objects).map(DynImage::from),
            ComponentType::U64 => Self::build_image::<u64>(&objects).map(DynImage::from),
            ComponentType::I64 => Self::build_image::<i64>(&objects).map(DynImage::from),
            ComponentType::F32 => Self::build_image::<f32>(&objects).map(DynImage::from),
            ComponentType::F64 => Self::build_image::<f64>(&objects).map(DynImage::from),
        }
    }

    fn build_image<P: Pixel>(objects: &[(&DefaultDicomObject, &PixelLayout)]) -> Result<Image<P>> {
        let frames = objects
            .par_iter()
            .map(|(dicom_object, layout)| Self::decode_frames::<P>(dicom_object, layout))
            .collect::<Result<Vec<_>>>()?;
        let slices: Vec<Array2<P>> = frames.into_iter().flatten().collect();

        let (first, _) = objects[0];
        let mut spacing = Self::get_spacing(first);
        if let Some(z) = Self::get_slice_distance(objects) {
            spacing[2] = z;
        }

        Ok(Image::from_slices(&slices)?
            .with_spacing(spacing)
            .with_origin(get_position(first).unwrap_or([0.0; 3]))
            .with_metadata(Self::get_metadata(first)))
    }

    fn decode_frames<P: Pixel>(
        dicom_object: &DefaultDicomObject,
        layout: &PixelLayout,
    ) -> Result<Vec<Array2<P>>> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let stored: Vec<f64> = pixel_data.to_vec_with_options(&options)?;

        let samples = layout.samples_per_pixel.max(1);
        let frame_len = layout.rows * layout.columns;
        if stored.len() < frame_len * samples * layout.frames {
            return Err(Error::InconsistentDimensions);
        }

        let (slope, intercept) = if samples == 1 {
            (layout.rescale_slope, layout.rescale_intercept)
        } else {
            (1.0, 0.0)
        };
        let pixels: Vec<P> = stored
            .chunks_exact(samples)
            .take(frame_len * layout.frames)
            .map(|channels| {
                let mut rescaled = [0.0; 4];
                for (out, value) in rescaled.iter_mut().zip(channels) {
                    *out = value.mul_add(slope, intercept);
                }
                P::from_channels(&rescaled[..samples.min(4)])
            })
            .collect();

        pixels
            .chunks_exact(frame_len)
            .map(|frame| {
                Array2::from_shape_vec((layout.rows, layout.columns), frame.to_vec())
                    .map_err(|_| Error::InconsistentDimensions)
            })
            .collect()
    }

    fn sort_objects(dicom_objects: &mut [DefaultDicomObject], sort_by: SortBy) {
        if matches!(sort_by, SortBy::None) {
            return;
        }

        dicom_objects.sort_by(|a, b| {
            let a = Self::get_sort_order(a, sort_by);
            let b = Self::get_sort_order(b, sort_by);
            a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
        });

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            dicom_objects.reverse();
        }
    }

    fn get_sort_order(dicom_object: &DefaultDicomObject, sort_by: SortBy) -> Option<f64> {
        match sort_by {
            SortBy::ImagePositionPatient => get_position(dicom_object).map(|pos| pos[2]),
            SortBy::TablePosition => get_f64(dicom_object, tags::TABLE_POSITION),
            SortBy::InstanceNumber => {
                get_int(dicom_object, tags::INSTANCE_NUMBER).map(|n| n as f64)
            }
            SortBy::None => Some(0.0),
        }
    }

    /// In-plane spacing from PixelSpacing (row spacing first), slice spacing
    /// from SpacingBetweenSlices or SliceThickness
    fn get_spacing(dicom_object: &DefaultDicomObject) -> [f64; 3] {
        let (x, y) = match get_f64_vec(dicom_object, tags::PIXEL_SPACING).as_deref() {
            Some([row_spacing, column_spacing, ..]) => (*column_spacing, *row_spacing),
            _ => {
                debug!("No PixelSpacing, assuming 1 mm");
                (1.0, 1.0)
            }
        };
        let z = get_f64(dicom_object, tags::SPACING_BETWEEN_SLICES)
            .or_else(|| get_f64(dicom_object, tags::SLICE_THICKNESS))
            .unwrap_or(1.0);
        [x, y, z]
    }

    /// Distance between the first two slices of a series, when both carry a
    /// position
    fn get_slice_distance(objects: &[(&DefaultDicomObject, &PixelLayout)]) -> Option<f64> {
        let [(first, _), (second, _), ..] = objects else {
            return None;
        };
        let a = get_position(first)?;
        let b = get_position(second)?;
        let distance = a
            .iter()
            .zip(&b)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        if distance > 0.0 {
            Some(distance)
        } else {
            warn!("Consecutive slices share the same ImagePositionPatient");
            None
        }
    }

    fn get_metadata(dicom_object: &DefaultDicomObject) -> Metadata {
        Metadata {
            modality: dicom_object
                .element(tags::MODALITY)
                .ok()
                .and_then(|element| element.to_str().ok())
                .map(|modality| modality.trim().to_string()),
            window_center: get_f64_vec(dicom_object, tags::WINDOW_CENTER)
                .and_then(|values| values.first().copied()),
            window_width: get_f64_vec(dicom_object, tags::WINDOW_WIDTH)
                .and_then(|values| values.first().copied()),
        }
    }
}

fn get_int(dicom_object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<i64> {
    dicom_object.element(tag).ok()?.to_int::<i64>().ok()
}

fn get_f64(dicom_object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<f64> {
    dicom_object.element(tag).ok()?.to_float64().ok()
}

fn get_f64_vec(dicom_object: &DefaultDicomObject, tag: dicom::core::Tag) -> Option<Vec<f64>> {
    dicom_object.element(tag).ok()?.to_multi_float64().ok()
}

fn get_position(dicom_object: &DefaultDicomObject) -> Option<[f64; 3]> {
    match get_f64_vec(dicom_object, tags::IMAGE_POSITION_PATIENT)?.as_slice() {
        [x, y, z, ..] => Some([*x, *y, *z]),
        _ => None,
    }
}
