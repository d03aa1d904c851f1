//! The filters used by the segmentation and conversion pipelines

pub mod cast;
pub mod resample;
pub mod threshold;
pub mod window;

pub use cast::{cast, to_display};
pub use resample::{Geometry, Resampler};
pub use threshold::BinaryThreshold;
pub use window::IntensityWindow;
