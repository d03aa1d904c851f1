use std::fmt;

use bytemuck::Pod;

/// Runtime tag of a scalar pixel component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ComponentType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            ComponentType::U8 | ComponentType::I8 => 1,
            ComponentType::U16 | ComponentType::I16 => 2,
            ComponentType::U32 | ComponentType::I32 | ComponentType::F32 => 4,
            ComponentType::U64 | ComponentType::I64 | ComponentType::F64 => 8,
        }
    }

    /// Name used in the `ElementType` field of MetaImage headers
    pub fn metaimage_name(self) -> &'static str {
        match self {
            ComponentType::U8 => "MET_UCHAR",
            ComponentType::I8 => "MET_CHAR",
            ComponentType::U16 => "MET_USHORT",
            ComponentType::I16 => "MET_SHORT",
            ComponentType::U32 => "MET_UINT",
            ComponentType::I32 => "MET_INT",
            ComponentType::U64 => "MET_ULONG_LONG",
            ComponentType::I64 => "MET_LONG_LONG",
            ComponentType::F32 => "MET_FLOAT",
            ComponentType::F64 => "MET_DOUBLE",
        }
    }

    pub fn from_metaimage_name(name: &str) -> Option<Self> {
        let component_type = match name {
            "MET_UCHAR" => ComponentType::U8,
            "MET_CHAR" => ComponentType::I8,
            "MET_USHORT" => ComponentType::U16,
            "MET_SHORT" => ComponentType::I16,
            "MET_UINT" => ComponentType::U32,
            "MET_INT" => ComponentType::I32,
            "MET_ULONG_LONG" | "MET_ULONG" => ComponentType::U64,
            "MET_LONG_LONG" | "MET_LONG" => ComponentType::I64,
            "MET_FLOAT" => ComponentType::F32,
            "MET_DOUBLE" => ComponentType::F64,
            _ => return None,
        };
        Some(component_type)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComponentType::U8 => "unsigned char",
            ComponentType::I8 => "char",
            ComponentType::U16 => "unsigned short",
            ComponentType::I16 => "short",
            ComponentType::U32 => "unsigned int",
            ComponentType::I32 => "int",
            ComponentType::U64 => "unsigned long",
            ComponentType::I64 => "long",
            ComponentType::F32 => "float",
            ComponentType::F64 => "double",
        };
        f.write_str(name)
    }
}

/// A pixel made of one or more channels of the same component type.
pub trait Pixel: Pod + Default + Send + Sync {
    const COMPONENT_TYPE: ComponentType;
    const CHANNELS: usize;

    fn channel(&self, index: usize) -> f64;

    /// Build a pixel from per-channel values, saturating each one.
    /// Missing trailing channels take their default.
    fn from_channels(channels: &[f64]) -> Self;

    /// Reverse the byte order of every channel
    fn swap_bytes(self) -> Self;
}

/// A scalar pixel component
pub trait Component: Pixel + PartialOrd {
    fn to_f64(self) -> f64;

    /// Convert with rounding to nearest and clamping to the representable
    /// range. NaN maps to zero.
    fn from_f64_saturating(value: f64) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty => $tag:ident, $from:expr, $swap:expr;)*) => {
        $(
            impl Pixel for $ty {
                const COMPONENT_TYPE: ComponentType = ComponentType::$tag;
                const CHANNELS: usize = 1;

                #[inline]
                fn channel(&self, _index: usize) -> f64 {
                    *self as f64
                }

                #[inline]
                fn from_channels(channels: &[f64]) -> Self {
                    channels
                        .first()
                        .map_or(0 as $ty, |&v| <$ty>::from_f64_saturating(v))
                }

                #[inline]
                fn swap_bytes(self) -> Self {
                    let swap: fn($ty) -> $ty = $swap;
                    swap(self)
                }
            }

            impl Component for $ty {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64_saturating(value: f64) -> Self {
                    let convert: fn(f64) -> $ty = $from;
                    convert(value)
                }
            }
        )*
    };
}

// `as` saturates float-to-int conversions and maps NaN to 0
impl_scalar! {
    u8 => U8, |v| v.round() as u8, u8::swap_bytes;
    i8 => I8, |v| v.round() as i8, i8::swap_bytes;
    u16 => U16, |v| v.round() as u16, u16::swap_bytes;
    i16 => I16, |v| v.round() as i16, i16::swap_bytes;
    u32 => U32, |v| v.round() as u32, u32::swap_bytes;
    i32 => I32, |v| v.round() as i32, i32::swap_bytes;
    u64 => U64, |v| v.round() as u64, u64::swap_bytes;
    i64 => I64, |v| v.round() as i64, i64::swap_bytes;
    f32 => F32, |v| if v.is_nan() { 0.0 } else { v.clamp(f32::MIN as f64, f32::MAX as f64) as f32 },
        |v| f32::from_bits(v.to_bits().swap_bytes());
    f64 => F64, |v| if v.is_nan() { 0.0 } else { v }, |v| f64::from_bits(v.to_bits().swap_bytes());
}

pub type Rgb8 = [u8; 3];
pub type Rgba8 = [u8; 4];

impl Pixel for Rgb8 {
    const COMPONENT_TYPE: ComponentType = ComponentType::U8;
    const CHANNELS: usize = 3;

    #[inline]
    fn channel(&self, index: usize) -> f64 {
        self[index] as f64
    }

    fn from_channels(channels: &[f64]) -> Self {
        let mut pixel = [0u8; 3];
        for (out, &v) in pixel.iter_mut().zip(channels) {
            *out = u8::from_f64_saturating(v);
        }
        pixel
    }

    #[inline]
    fn swap_bytes(self) -> Self {
        self
    }
}

impl Pixel for Rgba8 {
    const COMPONENT_TYPE: ComponentType = ComponentType::U8;
    const CHANNELS: usize = 4;

    #[inline]
    fn channel(&self, index: usize) -> f64 {
        self[index] as f64
    }

    /// Three channels produce an opaque pixel.
    fn from_channels(channels: &[f64]) -> Self {
        let mut pixel = [0, 0, 0, u8::MAX];
        for (out, &v) in pixel.iter_mut().zip(channels) {
            *out = u8::from_f64_saturating(v);
        }
        pixel
    }

    #[inline]
    fn swap_bytes(self) -> Self {
        self
    }
}

/// Convert a pixel channel by channel, saturating into the target type.
pub fn cast_pixel<P: Pixel, Q: Pixel>(pixel: P) -> Q {
    let mut channels = [0.0; 4];
    for (i, channel) in channels.iter_mut().enumerate().take(P::CHANNELS) {
        *channel = pixel.channel(i);
    }
    Q::from_channels(&channels[..P::CHANNELS])
}
