use crate::{
    filters::window::IntensityWindow,
    image::{DynImage, Image, dispatch_scalar},
    pixel::{Pixel, Rgba8, cast_pixel},
};

/// Convert every pixel to `Q`, saturating per channel.
pub fn cast<P: Pixel, Q: Pixel>(image: &Image<P>) -> Image<Q> {
    image.map(cast_pixel::<P, Q>)
}

/// Convert an image to a displayable 8-bit form.
///
/// Scalar images are windowed when a window is given and saturated into
/// `u8` otherwise. Color images become opaque RGBA.
pub fn to_display(image: &DynImage, window: Option<IntensityWindow>) -> DynImage {
    dispatch_scalar!(
        image,
        typed => match window {
            Some(window) => DynImage::U8(window.apply(typed)),
            None => DynImage::U8(cast::<_, u8>(typed)),
        },
        color => match color {
            DynImage::Rgb8(rgb) => DynImage::Rgba8(cast::<_, Rgba8>(rgb)),
            other => other.clone(),
        }
    )
}
