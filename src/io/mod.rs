//! Reading and writing images in DICOM, MetaImage and raster formats.
//!
//! Formats are chosen from the file extension. Files without a known
//! extension are checked for the DICOM preamble, so series exported without
//! a `.dcm` suffix still load.

pub mod dicom_loader;
pub mod metaimage;
pub mod raster;

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use log::debug;
use ndarray::Array2;

use crate::{
    enums::{Dimension, SortBy},
    error::{Error, Result},
    image::{DynImage, Image, dispatch},
    pixel::{ComponentType, Pixel},
};

const DICOM_MAGIC_OFFSET: usize = 128;
const DICOM_MAGIC: &[u8; 4] = b"DICM";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Dicom,
    MetaImage,
    Raster(image::ImageFormat),
}

impl ImageFormat {
    /// Detect the format from the extension alone
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "dcm" | "dicom" => Some(ImageFormat::Dicom),
            "mha" | "mhd" => Some(ImageFormat::MetaImage),
            _ => image::ImageFormat::from_extension(&ext).map(ImageFormat::Raster),
        }
    }

    /// Detect the format of an existing file, falling back to the DICOM
    /// preamble when the extension is missing or unknown.
    pub fn detect(path: &Path) -> Result<Self> {
        if let Some(format) = Self::from_extension(path) {
            return Ok(format);
        }
        if has_dicom_preamble(path)? {
            return Ok(ImageFormat::Dicom);
        }
        Err(Error::UnsupportedFormat(path.to_path_buf()))
    }

    pub fn name(&self) -> String {
        match self {
            ImageFormat::Dicom => "DICOM".to_string(),
            ImageFormat::MetaImage => "MetaImage".to_string(),
            ImageFormat::Raster(format) => format!("{format:?}"),
        }
    }
}

fn has_dicom_preamble(path: &Path) -> Result<bool> {
    let mut header = [0u8; DICOM_MAGIC_OFFSET + 4];
    let mut file = File::open(path)?;
    match file.read_exact(&mut header) {
        Ok(()) => Ok(&header[DICOM_MAGIC_OFFSET..] == DICOM_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Image properties known before the pixel data is decoded
#[derive(Clone, Debug, PartialEq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub dimension: Dimension,
    pub component_type: ComponentType,
    pub components: usize,
    /// Number of pixels along x, y and z
    pub size: [usize; 3],
    pub spacing: [f64; 3],
}

/// Read the header of an image file without decoding its pixels
pub fn read_image_information(path: impl AsRef<Path>) -> Result<ImageInfo> {
    let path = path.as_ref();
    match ImageFormat::detect(path)? {
        ImageFormat::Dicom => dicom_loader::DicomLoader::read_information(path),
        ImageFormat::MetaImage => metaimage::read_information(path),
        ImageFormat::Raster(format) => raster::read_information(path, format),
    }
}

/// Read a single image file
pub fn read_image(path: impl AsRef<Path>) -> Result<DynImage> {
    let path = path.as_ref();
    let format = ImageFormat::detect(path)?;
    debug!("Reading {} as {}", path.display(), format.name());
    match format {
        ImageFormat::Dicom => dicom_loader::DicomLoader::load_file(path),
        ImageFormat::MetaImage => metaimage::read(path),
        ImageFormat::Raster(_) => raster::read(path),
    }
}

/// Read a list of files as one image.
///
/// A single file is read as is. Several files must share one format and are
/// stacked into a volume in the given order, or in the order selected by
/// `sort_by` for DICOM series.
pub fn read_series(paths: &[PathBuf], sort_by: SortBy) -> Result<DynImage> {
    let (first, rest) = paths.split_first().ok_or(Error::NoInput)?;
    if rest.is_empty() {
        return read_image(first);
    }

    let format = ImageFormat::detect(first)?;
    for path in rest {
        let found = ImageFormat::detect(path)?;
        if found != format {
            return Err(Error::InconsistentFormat {
                expected: format.name(),
                found: found.name(),
            });
        }
    }

    if format == ImageFormat::Dicom {
        return dicom_loader::DicomLoader::load_series(paths, sort_by);
    }

    let images = paths.iter().map(read_image).collect::<Result<Vec<_>>>()?;
    stack_images(images)
}

/// Stack the slices of several images of the same pixel type into a volume
fn stack_images(mut images: Vec<DynImage>) -> Result<DynImage> {
    if images.is_empty() {
        return Err(Error::NoInput);
    }
    let expected = images[0].pixel_description();
    if let Some(other) = images
        .iter()
        .find(|image| image.pixel_description() != expected)
    {
        return Err(Error::InconsistentPixelType {
            expected,
            found: other.pixel_description(),
        });
    }

    let rest = images.split_off(1);
    let first = images.remove(0);
    dispatch!(first, typed => stack_typed(typed, rest))
}

fn stack_typed<P: Pixel>(first: Image<P>, rest: Vec<DynImage>) -> Result<DynImage>
where
    Image<P>: TryFrom<DynImage, Error = DynImage> + Into<DynImage>,
{
    let mut images = Vec::with_capacity(rest.len() + 1);
    images.push(first);
    for image in rest {
        let typed = Image::<P>::try_from(image).map_err(|other| Error::InconsistentPixelType {
            expected: P::COMPONENT_TYPE.to_string(),
            found: other.pixel_description(),
        })?;
        images.push(typed);
    }

    let slices: Vec<Array2<P>> = images
        .iter()
        .flat_map(|image| (0..image.dim().0).filter_map(move |z| image.slice(z)))
        .map(|slice| slice.to_owned())
        .collect();

    let first = &images[0];
    let stacked = Image::from_slices(&slices)?
        .with_spacing(first.spacing)
        .with_origin(first.origin)
        .with_metadata(first.metadata.clone());
    Ok(stacked.into())
}

/// Write an image, choosing the format from the output extension
pub fn write_image(path: impl AsRef<Path>, image: &DynImage) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_extension(path)
        .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    debug!(
        "Writing {} {} image to {}",
        image.pixel_description(),
        format.name(),
        path.display()
    );
    match format {
        ImageFormat::MetaImage => metaimage::write(path, image),
        ImageFormat::Raster(format) => raster::write(path, image, format),
        ImageFormat::Dicom => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn detects_formats_from_extension() {
        assert_eq!(
            ImageFormat::from_extension(Path::new("slice.DCM")),
            Some(ImageFormat::Dicom)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("out/label.mha")),
            Some(ImageFormat::MetaImage)
        );
        assert_eq!(
            ImageFormat::from_extension(Path::new("thumb.png")),
            Some(ImageFormat::Raster(image::ImageFormat::Png))
        );
        assert_eq!(ImageFormat::from_extension(Path::new("IM0001")), None);
    }

    #[test]
    fn sniffs_dicom_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IM0001");
        let mut bytes = vec![0u8; 128];
        bytes.extend_from_slice(b"DICM");
        bytes.extend_from_slice(&[0; 16]);
        std::fs::write(&path, bytes).unwrap();
        assert_eq!(ImageFormat::detect(&path).unwrap(), ImageFormat::Dicom);

        let short = dir.path().join("short");
        std::fs::write(&short, b"tiny").unwrap();
        assert!(matches!(
            ImageFormat::detect(&short),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn dicom_output_is_unsupported() {
        let image = DynImage::from(Image::from_2d(array![[1u8]]));
        assert!(matches!(
            write_image("out.dcm", &image),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn stacking_rejects_mixed_pixel_types() {
        let images = vec![
            DynImage::from(Image::from_2d(array![[1u8, 2]])),
            DynImage::from(Image::from_2d(array![[1u16, 2]])),
        ];
        assert!(matches!(
            stack_images(images),
            Err(Error::InconsistentPixelType { .. })
        ));
    }

    #[test]
    fn stacking_builds_volume() {
        let images = vec![
            DynImage::from(Image::from_2d(array![[1i16, 2]]).with_spacing([0.5, 0.5, 1.0])),
            DynImage::from(Image::from_2d(array![[3i16, 4]])),
            DynImage::from(Image::from_2d(array![[5i16, 6]])),
        ];
        let stacked = stack_images(images).unwrap();
        assert_eq!(stacked.dimension(), Dimension::Three);
        assert_eq!(stacked.size(), [2, 1, 3]);
        assert_eq!(stacked.spacing(), [0.5, 0.5, 1.0]);
    }

    #[test]
    fn series_rejects_mixed_formats() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("slice0.png");
        let mha = dir.path().join("slice1.mha");
        let slice = DynImage::from(Image::from_2d(array![[1u8, 2], [3, 4]]));
        write_image(&png, &slice).unwrap();
        write_image(&mha, &slice).unwrap();

        assert!(matches!(
            read_series(&[png, mha], SortBy::None),
            Err(Error::InconsistentFormat { .. })
        ));
    }
}
