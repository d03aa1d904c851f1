use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No input files given")]
    NoInput,

    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Unsupported image dimension: {0}")]
    UnsupportedDimension(usize),

    #[error("Unsupported number of components: {0}")]
    UnsupportedComponents(usize),

    #[error("Unsupported pixel type {pixel} for {format} output")]
    UnsupportedPixelType { pixel: String, format: String },

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Series mixes file formats: expected {expected}, found {found}")]
    InconsistentFormat { expected: String, found: String },

    #[error("Series mixes pixel types: expected {expected}, found {found}")]
    InconsistentPixelType { expected: String, found: String },

    #[error("Invalid threshold: lower {lower} is greater than upper {upper}")]
    InvalidThreshold { lower: f64, upper: f64 },

    #[error("Invalid intensity window width {0}, must be at least 1")]
    InvalidWindow(f64),

    #[error("Invalid output size: {0}")]
    InvalidSize(String),

    #[error("Malformed MetaImage header: {0}")]
    MetaImageHeader(String),

    #[error("Missing DICOM attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("DICOM pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
