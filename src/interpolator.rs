use ndarray::ArrayView2;

use crate::pixel::Pixel;

pub(crate) struct Interpolator;

impl Interpolator {
    /// A continuous index is inside the buffer when it lies within half a
    /// pixel of a valid sample on both axes.
    #[inline]
    fn is_inside(dim: (usize, usize), y: f64, x: f64) -> bool {
        let (height, width) = dim;
        y >= -0.5 && y < height as f64 - 0.5 && x >= -0.5 && x < width as f64 - 0.5
    }

    /// Nearest-neighbour sample, rounding half up
    #[inline]
    pub(crate) fn nearest_interpolate<P: Pixel>(
        slice: &ArrayView2<'_, P>,
        y: f64,
        x: f64,
    ) -> Option<P> {
        if !Self::is_inside(slice.dim(), y, x) {
            return None;
        }
        let row = (y + 0.5).floor() as usize;
        let col = (x + 0.5).floor() as usize;
        slice.get([row, col]).copied()
    }

    #[inline]
    pub(crate) fn bilinear_interpolate<P: Pixel>(
        slice: &ArrayView2<'_, P>,
        y: f64,
        x: f64,
    ) -> Option<P> {
        let (height, width) = slice.dim();
        if !Self::is_inside((height, width), y, x) {
            return None;
        }

        let y = y.clamp(0.0, (height - 1) as f64);
        let x = x.clamp(0.0, (width - 1) as f64);

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f64;
        let dx = x - x0 as f64;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = slice[[y0, x0]];
        let v01 = slice[[y0, x1]];
        let v10 = slice[[y1, x0]];
        let v11 = slice[[y1, x1]];

        let mut channels = [0.0; 4];
        for (c, out) in channels.iter_mut().enumerate().take(P::CHANNELS) {
            let v0 = v00.channel(c).mul_add(one_minus_dx, v01.channel(c) * dx);
            let v1 = v10.channel(c).mul_add(one_minus_dx, v11.channel(c) * dx);
            *out = v0.mul_add(one_minus_dy, v1 * dy);
        }

        Some(P::from_channels(&channels[..P::CHANNELS]))
    }
}
