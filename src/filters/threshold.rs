use crate::{
    error::{Error, Result},
    image::{DynImage, Image, dispatch_scalar},
    pixel::Component,
};

pub const DEFAULT_LOWER_THRESHOLD: f64 = 500.0;
pub const DEFAULT_UPPER_THRESHOLD: f64 = 1500.0;
pub const DEFAULT_INSIDE_VALUE: f64 = 127.0;
pub const DEFAULT_OUTSIDE_VALUE: f64 = 0.0;

/// Binary segmentation by intensity range.
///
/// A pixel becomes `inside` when `lower <= value <= upper` and `outside`
/// otherwise. The output keeps the component type of the input, so the
/// label values saturate into that type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BinaryThreshold {
    pub lower: f64,
    pub upper: f64,
    pub inside: f64,
    pub outside: f64,
}

impl Default for BinaryThreshold {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER_THRESHOLD,
            upper: DEFAULT_UPPER_THRESHOLD,
            inside: DEFAULT_INSIDE_VALUE,
            outside: DEFAULT_OUTSIDE_VALUE,
        }
    }
}

impl BinaryThreshold {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        let threshold = Self {
            lower,
            upper,
            ..Self::default()
        };
        threshold.validate()?;
        Ok(threshold)
    }

    pub fn with_values(self, inside: f64, outside: f64) -> Self {
        Self {
            inside,
            outside,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.lower.is_nan() || self.upper.is_nan() || self.lower > self.upper {
            return Err(Error::InvalidThreshold {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn apply<T: Component>(&self, image: &Image<T>) -> Result<Image<T>> {
        self.validate()?;
        let inside = T::from_f64_saturating(self.inside);
        let outside = T::from_f64_saturating(self.outside);
        Ok(image.map(|p| {
            if self.contains(p.to_f64()) {
                inside
            } else {
                outside
            }
        }))
    }

    /// Segment a scalar image of any component type
    pub fn apply_dyn(&self, image: &DynImage) -> Result<DynImage> {
        dispatch_scalar!(
            image,
            typed => self.apply(typed).map(DynImage::from),
            color => Err(Error::UnsupportedComponents(color.components()))
        )
    }
}
