//! # DICOM segmentation library
//!
//! This crate provides two small medical imaging pipelines built on the
//! dicom-rs ecosystem:
//!
//!  - Binary threshold segmentation of a CT series. The slices of a DICOM
//!    series (or a single MetaImage/raster volume) are stacked into one image
//!    and every pixel inside the threshold range is labeled.
//!  - Conversion of an image for display. The image is resampled to a fixed
//!    number of rows with square pixels and written as 8-bit gray or RGBA,
//!    optionally through an intensity window.
//!
//! Images are typed by their pixel, see [`Image`]. Since the pixel type of a
//! file is only known at runtime, files are read into a [`DynImage`] which
//! holds one of the supported pixel types. DICOM series are decoded in
//! parallel using rayon.
//!
//! Supported formats:
//!   - DICOM (read only), single and multi-frame, with the modality LUT
//!     (rescale slope and intercept) applied
//!   - MetaImage `.mha` and `.mhd`/`.raw`, uncompressed
//!   - Raster formats supported by the `image` crate (PNG, JPEG, TIFF, ...)
//!
//! # Examples
//!
//! ## Segmenting a DICOM series
//!
//! ```no_run
//! # use dicom_segmentation::{BinaryThreshold, SegmentationConfig, SortBy, segmentation};
//! # use std::path::PathBuf;
//! let inputs = vec![PathBuf::from("ct/0001.dcm"), PathBuf::from("ct/0002.dcm")];
//! let mut config = SegmentationConfig::new(inputs, "bone.mha");
//! config.threshold = BinaryThreshold::new(500.0, 1500.0).expect("valid threshold range");
//! config.sort_by = SortBy::ImagePositionPatient;
//! segmentation::execute(&config).expect("should have written the label image");
//! ```
//!
//! ## Converting an image for display
//!
//! ```no_run
//! # use dicom_segmentation::{ConversionConfig, WindowMode, conversion};
//! let mut config = ConversionConfig::new("ct/0001.dcm", "preview.png");
//! config.window = WindowMode::Auto;
//! conversion::execute(&config).expect("should have written the preview");
//! ```

pub mod conversion;
pub mod enums;
pub mod error;
pub mod filters;
pub mod image;
mod interpolator;
pub mod io;
pub mod pixel;
pub mod segmentation;

pub use crate::conversion::{ConversionConfig, WindowMode};
pub use crate::enums::{Dimension, Interpolation, SortBy};
pub use crate::error::{Error, Result};
pub use crate::filters::{BinaryThreshold, IntensityWindow, Resampler};
pub use crate::image::{DynImage, Image, Metadata};
pub use crate::io::{
    ImageFormat, ImageInfo, read_image, read_image_information, read_series, write_image,
};
pub use crate::pixel::{Component, ComponentType, Pixel, Rgb8, Rgba8};
pub use crate::segmentation::SegmentationConfig;
