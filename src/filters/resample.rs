use ndarray::Array2;
use rayon::prelude::*;

use crate::{
    enums::{Dimension, Interpolation},
    error::{Error, Result},
    image::{DynImage, Image, dispatch},
    interpolator::Interpolator,
    pixel::Pixel,
};

/// Number of output rows used for display thumbnails
pub const DEFAULT_OUTPUT_ROWS: usize = 320;

// rounding slack for the spacing round trip
const SIZE_TOLERANCE: f64 = 1e-9;

/// Output grid of a resample: size as (columns, rows) and spacing as (x, y)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub size: [usize; 2],
    pub spacing: [f64; 2],
}

/// Resamples a 2D image onto a grid with a fixed number of rows and square
/// pixels that cover the same physical extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resampler {
    pub rows: usize,
    pub interpolation: Interpolation,
}

impl Default for Resampler {
    fn default() -> Self {
        Self {
            rows: DEFAULT_OUTPUT_ROWS,
            interpolation: Interpolation::NearestNeighbor,
        }
    }
}

impl Resampler {
    pub fn new(rows: usize, interpolation: Interpolation) -> Self {
        Self {
            rows,
            interpolation,
        }
    }

    /// Compute the output grid for an input of `size` (columns, rows) with
    /// `spacing` (x, y).
    pub fn output_geometry(&self, size: [usize; 2], spacing: [f64; 2]) -> Result<Geometry> {
        let [columns, rows] = size;
        if self.rows == 0 {
            return Err(Error::InvalidSize("output row count must be positive".into()));
        }
        if columns == 0 || rows == 0 {
            return Err(Error::InvalidSize(format!("empty input image {columns}x{rows}")));
        }
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::InvalidSize(format!("invalid spacing {spacing:?}")));
        }

        let spacing_y = spacing[1] * rows as f64 / self.rows as f64;
        let spacing_x = spacing_y;
        let out_columns =
            (spacing[0] * columns as f64 / spacing_x + SIZE_TOLERANCE).floor() as usize;
        if out_columns == 0 {
            return Err(Error::InvalidSize(format!(
                "{columns}x{rows} image at spacing {spacing:?} has no columns at {} rows",
                self.rows
            )));
        }

        Ok(Geometry {
            size: [out_columns, self.rows],
            spacing: [spacing_x, spacing_y],
        })
    }

    pub fn apply<P: Pixel>(&self, image: &Image<P>) -> Result<Image<P>> {
        let image = match image.dimension {
            Dimension::Two => image.clone(),
            Dimension::Three => image.first_slice()?,
        };
        let [columns, rows, _] = image.size();
        let geometry =
            self.output_geometry([columns, rows], [image.spacing[0], image.spacing[1]])?;
        let [out_columns, out_rows] = geometry.size;

        // output index to input continuous index
        let step_x = geometry.spacing[0] / image.spacing[0];
        let step_y = geometry.spacing[1] / image.spacing[1];

        let slice = image.slice(0).ok_or(Error::InconsistentDimensions)?;
        let slice = &slice;
        let interpolation = self.interpolation;

        let pixels: Vec<P> = (0..out_rows)
            .into_par_iter()
            .flat_map_iter(move |j| {
                let y = j as f64 * step_y;
                (0..out_columns).map(move |i| {
                    let x = i as f64 * step_x;
                    let sample = match interpolation {
                        Interpolation::NearestNeighbor => {
                            Interpolator::nearest_interpolate(slice, y, x)
                        }
                        Interpolation::Linear => Interpolator::bilinear_interpolate(slice, y, x),
                    };
                    sample.unwrap_or_default()
                })
            })
            .collect();

        let data = Array2::from_shape_vec((out_rows, out_columns), pixels)
            .map_err(|e| Error::InvalidSize(e.to_string()))?;

        Ok(Image::from_2d(data)
            .with_spacing([geometry.spacing[0], geometry.spacing[1], image.spacing[2]])
            .with_origin(image.origin)
            .with_metadata(image.metadata.clone()))
    }

    pub fn apply_dyn(&self, image: &DynImage) -> Result<DynImage> {
        dispatch!(image, typed => self.apply(typed).map(DynImage::from))
    }
}
