use crate::{
    error::{Error, Result},
    image::{Image, Metadata},
    pixel::Component,
};

/// Window applied to CT data when no explicit window is requested
pub const CT_WINDOW: IntensityWindow = IntensityWindow {
    width: 1500.0,
    center: 500.0,
};

/// Linear display window mapping `[center - width / 2, center + width / 2]`
/// onto the 8-bit range, following the DICOM VOI LUT function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensityWindow {
    pub width: f64,
    pub center: f64,
}

impl IntensityWindow {
    pub fn new(width: f64, center: f64) -> Result<Self> {
        if width.is_nan() || width < 1.0 {
            return Err(Error::InvalidWindow(width));
        }
        Ok(Self { width, center })
    }

    /// Pick a window from the acquisition attributes: the fixed CT window
    /// for CT data, the stored window otherwise.
    pub fn for_metadata(metadata: &Metadata) -> Option<Self> {
        if metadata
            .modality
            .as_deref()
            .is_some_and(|modality| modality.eq_ignore_ascii_case("CT"))
        {
            return Some(CT_WINDOW);
        }

        let width = metadata.window_width?;
        let center = metadata.window_center?;
        Self::new(width, center).ok()
    }

    #[inline]
    pub fn map_value(&self, value: f64) -> u8 {
        let center = self.center - 0.5;
        let half_width = (self.width - 1.0) / 2.0;

        if value <= center - half_width {
            0
        } else if value > center + half_width {
            u8::MAX
        } else {
            let scaled = ((value - center) / (self.width - 1.0) + 0.5) * 255.0;
            u8::from_f64_saturating(scaled)
        }
    }

    pub fn apply<T: Component>(&self, image: &Image<T>) -> Image<u8> {
        image.map(|p| self.map_value(p.to_f64()))
    }
}
