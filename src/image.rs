use ndarray::{Array2, Array3, ArrayView2, Axis, Zip, s};

use crate::{
    enums::Dimension,
    error::{Error, Result},
    pixel::{ComponentType, Pixel, Rgb8, Rgba8},
};

/// Acquisition attributes carried along with the pixels, when the source
/// format knows them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub modality: Option<String>,
    pub window_center: Option<f64>,
    pub window_width: Option<f64>,
}

/// A 2D or 3D image with physical geometry.
///
/// Pixels are stored as `(depth, height, width)`. A 2D image has a depth of
/// one. `spacing` and `origin` are given in (x, y, z) order, in millimetres.
#[derive(Clone, Debug)]
pub struct Image<P> {
    pub data: Array3<P>,
    pub dimension: Dimension,
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub metadata: Metadata,
}

impl<P: Pixel> Image<P> {
    pub fn from_2d(data: Array2<P>) -> Self {
        Self {
            data: data.insert_axis(Axis(0)),
            dimension: Dimension::Two,
            spacing: [1.0; 3],
            origin: [0.0; 3],
            metadata: Metadata::default(),
        }
    }

    pub fn from_3d(data: Array3<P>) -> Self {
        Self {
            data,
            dimension: Dimension::Three,
            spacing: [1.0; 3],
            origin: [0.0; 3],
            metadata: Metadata::default(),
        }
    }

    /// Stack equally sized slices into a volume. A single slice stays 2D.
    pub fn from_slices(slices: &[Array2<P>]) -> Result<Self> {
        let first = slices.first().ok_or(Error::NoInput)?;
        let (height, width) = first.dim();
        if slices.iter().any(|slice| slice.dim() != (height, width)) {
            return Err(Error::InconsistentDimensions);
        }

        if slices.len() == 1 {
            return Ok(Self::from_2d(first.clone()));
        }

        let mut volume = Array3::<P>::default((slices.len(), height, width));
        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(slice);
        }
        Ok(Self::from_3d(volume))
    }

    pub fn with_spacing(mut self, spacing: [f64; 3]) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Get the dimensions of the image (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of pixels along x, y and z
    pub fn size(&self) -> [usize; 3] {
        let (depth, height, width) = self.data.dim();
        [width, height, depth]
    }

    pub fn slice(&self, index: usize) -> Option<ArrayView2<'_, P>> {
        (index < self.data.dim().0).then(|| self.data.slice(s![index, .., ..]))
    }

    /// The first slice as a 2D image with the same in-plane geometry
    pub fn first_slice(&self) -> Result<Image<P>> {
        let slice = self.slice(0).ok_or(Error::InconsistentDimensions)?;
        Ok(Image {
            data: slice.to_owned().insert_axis(Axis(0)),
            dimension: Dimension::Two,
            spacing: self.spacing,
            origin: self.origin,
            metadata: self.metadata.clone(),
        })
    }

    /// Apply `f` to every pixel in parallel, keeping the geometry.
    pub fn map<Q, F>(&self, f: F) -> Image<Q>
    where
        Q: Pixel,
        F: Fn(P) -> Q + Sync + Send,
    {
        Image {
            data: Zip::from(&self.data).par_map_collect(|&p| f(p)),
            dimension: self.dimension,
            spacing: self.spacing,
            origin: self.origin,
            metadata: self.metadata.clone(),
        }
    }
}

/// An image whose pixel type is only known at runtime.
#[derive(Clone, Debug)]
pub enum DynImage {
    U8(Image<u8>),
    I8(Image<i8>),
    U16(Image<u16>),
    I16(Image<i16>),
    U32(Image<u32>),
    I32(Image<i32>),
    U64(Image<u64>),
    I64(Image<i64>),
    F32(Image<f32>),
    F64(Image<f64>),
    Rgb8(Image<Rgb8>),
    Rgba8(Image<Rgba8>),
}

/// Run `$body` with `$img` bound to the typed image inside a [`DynImage`]
/// holding scalar pixels. Color variants go to `$rest`.
macro_rules! dispatch_scalar {
    ($image:expr, $img:ident => $body:expr, $rest:pat => $fallback:expr) => {
        match $image {
            $crate::image::DynImage::U8($img) => $body,
            $crate::image::DynImage::I8($img) => $body,
            $crate::image::DynImage::U16($img) => $body,
            $crate::image::DynImage::I16($img) => $body,
            $crate::image::DynImage::U32($img) => $body,
            $crate::image::DynImage::I32($img) => $body,
            $crate::image::DynImage::U64($img) => $body,
            $crate::image::DynImage::I64($img) => $body,
            $crate::image::DynImage::F32($img) => $body,
            $crate::image::DynImage::F64($img) => $body,
            $rest => $fallback,
        }
    };
}

/// Run `$body` with `$img` bound to whatever typed image the
/// [`DynImage`] holds.
macro_rules! dispatch {
    ($image:expr, $img:ident => $body:expr) => {
        $crate::image::dispatch_scalar!($image, $img => $body, other => match other {
            $crate::image::DynImage::Rgb8($img) => $body,
            $crate::image::DynImage::Rgba8($img) => $body,
            _ => unreachable!("scalar variants are matched first"),
        })
    };
}

pub(crate) use dispatch;
pub(crate) use dispatch_scalar;

macro_rules! impl_from_image {
    ($($pixel:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Image<$pixel>> for DynImage {
                fn from(image: Image<$pixel>) -> Self {
                    DynImage::$variant(image)
                }
            }

            impl TryFrom<DynImage> for Image<$pixel> {
                type Error = DynImage;

                fn try_from(image: DynImage) -> Result<Self, Self::Error> {
                    match image {
                        DynImage::$variant(image) => Ok(image),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_image!(
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Rgb8 => Rgb8,
    Rgba8 => Rgba8,
);

impl DynImage {
    pub fn component_type(&self) -> ComponentType {
        fn component_of<P: Pixel>(_: &Image<P>) -> ComponentType {
            P::COMPONENT_TYPE
        }
        dispatch!(self, image => component_of(image))
    }

    pub fn components(&self) -> usize {
        fn channels_of<P: Pixel>(_: &Image<P>) -> usize {
            P::CHANNELS
        }
        dispatch!(self, image => channels_of(image))
    }

    pub fn dimension(&self) -> Dimension {
        dispatch!(self, image => image.dimension)
    }

    pub fn size(&self) -> [usize; 3] {
        dispatch!(self, image => image.size())
    }

    pub fn spacing(&self) -> [f64; 3] {
        dispatch!(self, image => image.spacing)
    }

    pub fn metadata(&self) -> &Metadata {
        dispatch!(self, image => &image.metadata)
    }

    /// Short description of the pixel type, e.g. `short` or `RGBA unsigned char`
    pub fn pixel_description(&self) -> String {
        match self {
            DynImage::Rgb8(_) => "RGB unsigned char".to_string(),
            DynImage::Rgba8(_) => "RGBA unsigned char".to_string(),
            scalar => scalar.component_type().to_string(),
        }
    }

    /// Reduce a volume to its first slice. 2D images are returned unchanged.
    pub fn into_first_slice(self) -> Result<DynImage> {
        if self.dimension() == Dimension::Two {
            return Ok(self);
        }
        dispatch!(self, image => image.first_slice().map(DynImage::from))
    }
}
