//! MetaImage (`.mha` / `.mhd`) reading and writing.
//!
//! Only uncompressed binary data is handled. `.mha` files carry the data
//! after the header (`ElementDataFile = LOCAL`); `.mhd` headers point at a
//! sibling `.raw` file.

use std::{
    borrow::Cow,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Seek, Write},
    path::{Path, PathBuf},
};

use ndarray::Array3;

use crate::{
    enums::Dimension,
    error::{Error, Result},
    image::{DynImage, Image, dispatch},
    io::{ImageFormat, ImageInfo},
    pixel::{ComponentType, Pixel, Rgb8, Rgba8},
};

const LOCAL_DATA_FILE: &str = "LOCAL";

#[derive(Clone, Debug, PartialEq)]
pub struct MetaImageHeader {
    pub dimension: Dimension,
    /// Number of pixels along x, y and z
    pub size: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
    pub channels: usize,
    pub component_type: ComponentType,
    pub big_endian: bool,
    pub data_file: String,
}

impl MetaImageHeader {
    /// Size of the pixel payload in bytes
    fn data_len(&self) -> Result<usize> {
        std::iter::once(self.channels)
            .chain(self.size)
            .try_fold(self.component_type.size_in_bytes(), |len, n| {
                len.checked_mul(n)
            })
            .ok_or_else(|| header_error(format!("DimSize {:?} is too large", self.size)))
    }

    /// Parse header lines up to and including `ElementDataFile`.
    pub fn parse(reader: &mut impl BufRead) -> Result<Self> {
        let mut ndims = None;
        let mut size = None;
        let mut spacing = None;
        let mut origin = None;
        let mut channels = 1;
        let mut component_type = None;
        let mut big_endian = false;
        let mut data_file = None;

        let mut line = String::new();
        while data_file.is_none() {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(header_error("missing ElementDataFile"));
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "ObjectType" if !value.eq_ignore_ascii_case("Image") => {
                    return Err(header_error(format!("unsupported ObjectType {value}")));
                }
                "NDims" => ndims = Some(parse_value::<usize>("NDims", value)?),
                "DimSize" => size = Some(parse_list::<usize>("DimSize", value)?),
                "ElementSpacing" => spacing = Some(parse_list::<f64>("ElementSpacing", value)?),
                "ElementSize" if spacing.is_none() => {
                    spacing = Some(parse_list::<f64>("ElementSize", value)?)
                }
                "Offset" | "Origin" | "Position" => {
                    origin = Some(parse_list::<f64>("Offset", value)?)
                }
                "ElementNumberOfChannels" => {
                    channels = parse_value::<usize>("ElementNumberOfChannels", value)?
                }
                "ElementType" => {
                    component_type = Some(ComponentType::from_metaimage_name(value).ok_or_else(
                        || header_error(format!("unsupported ElementType {value}")),
                    )?)
                }
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                    big_endian = parse_bool(value)?
                }
                "BinaryData" if !parse_bool(value)? => {
                    return Err(header_error("ASCII data is not supported"));
                }
                "CompressedData" if parse_bool(value)? => {
                    return Err(header_error("compressed data is not supported"));
                }
                "ElementDataFile" => data_file = Some(value.to_string()),
                _ => {}
            }
        }

        let ndims = ndims.ok_or_else(|| header_error("missing NDims"))?;
        let dimension = match ndims {
            2 => Dimension::Two,
            3 => Dimension::Three,
            other => return Err(Error::UnsupportedDimension(other)),
        };
        let size = size.ok_or_else(|| header_error("missing DimSize"))?;
        let component_type = component_type.ok_or_else(|| header_error("missing ElementType"))?;
        if size.len() != ndims {
            return Err(header_error(format!(
                "DimSize has {} values for {ndims} dimensions",
                size.len()
            )));
        }

        Ok(Self {
            dimension,
            size: pad(&size, 1),
            spacing: pad(&spacing.unwrap_or_default(), 1.0),
            origin: pad(&origin.unwrap_or_default(), 0.0),
            channels,
            component_type,
            big_endian,
            data_file: data_file.unwrap_or_default(),
        })
    }

    fn write(&self, writer: &mut impl Write) -> std::io::Result<()> {
        let n = self.dimension.as_usize();
        let join = |values: &[f64]| {
            values[..n]
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        writeln!(writer, "ObjectType = Image")?;
        writeln!(writer, "NDims = {n}")?;
        writeln!(writer, "BinaryData = True")?;
        writeln!(
            writer,
            "BinaryDataByteOrderMSB = {}",
            if self.big_endian { "True" } else { "False" }
        )?;
        writeln!(writer, "CompressedData = False")?;
        writeln!(writer, "Offset = {}", join(&self.origin))?;
        writeln!(writer, "ElementSpacing = {}", join(&self.spacing))?;
        writeln!(
            writer,
            "DimSize = {}",
            self.size[..n]
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        )?;
        if self.channels > 1 {
            writeln!(writer, "ElementNumberOfChannels = {}", self.channels)?;
        }
        writeln!(writer, "ElementType = {}", self.component_type.metaimage_name())?;
        writeln!(writer, "ElementDataFile = {}", self.data_file)
    }
}

fn header_error(message: impl Into<String>) -> Error {
    Error::MetaImageHeader(message.into())
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| header_error(format!("invalid {key} value {value:?}")))
}

fn parse_list<T: std::str::FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split_whitespace()
        .map(|item| parse_value(key, item))
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(header_error(format!("invalid boolean {value:?}"))),
    }
}

fn pad<T: Copy>(values: &[T], fill: T) -> [T; 3] {
    let mut out = [fill; 3];
    for (out, value) in out.iter_mut().zip(values) {
        *out = *value;
    }
    out
}

fn open_header(path: &Path) -> Result<(MetaImageHeader, BufReader<File>)> {
    let mut reader = BufReader::new(File::open(path)?);
    let header = MetaImageHeader::parse(&mut reader)?;
    Ok((header, reader))
}

pub fn read_information(path: &Path) -> Result<ImageInfo> {
    let (header, _) = open_header(path)?;
    Ok(ImageInfo {
        format: ImageFormat::MetaImage,
        dimension: header.dimension,
        component_type: header.component_type,
        components: header.channels,
        size: header.size,
        spacing: header.spacing,
    })
}

pub fn read(path: &Path) -> Result<DynImage> {
    let (header, mut reader) = open_header(path)?;

    match (header.channels, header.component_type) {
        (1, _) | (3 | 4, ComponentType::U8) => {}
        (3 | 4, other) => {
            return Err(Error::UnsupportedPixelType {
                pixel: format!("{} channel {other}", header.channels),
                format: "MetaImage".to_string(),
            });
        }
        (channels, _) => return Err(Error::UnsupportedComponents(channels)),
    }

    let data_len = header.data_len()?;
    let bytes = if header.data_file.eq_ignore_ascii_case(LOCAL_DATA_FILE) {
        let available = reader
            .get_ref()
            .metadata()?
            .len()
            .saturating_sub(reader.stream_position()?);
        read_payload(&mut reader, data_len, available)?
    } else {
        let data_path = path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&header.data_file);
        let file = File::open(data_path)?;
        let available = file.metadata()?.len();
        read_payload(&mut BufReader::new(file), data_len, available)?
    };

    match (header.channels, header.component_type) {
        (1, ComponentType::U8) => decode::<u8>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::I8) => decode::<i8>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::U16) => decode::<u16>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::I16) => decode::<i16>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::U32) => decode::<u32>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::I32) => decode::<i32>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::U64) => decode::<u64>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::I64) => decode::<i64>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::F32) => decode::<f32>(&header, &bytes).map(DynImage::from),
        (1, ComponentType::F64) => decode::<f64>(&header, &bytes).map(DynImage::from),
        (3, _) => decode::<Rgb8>(&header, &bytes).map(DynImage::from),
        _ => decode::<Rgba8>(&header, &bytes).map(DynImage::from),
    }
}

/// Read `len` bytes after checking that the source holds that many
fn read_payload(reader: &mut impl Read, len: usize, available: u64) -> Result<Vec<u8>> {
    if (len as u64) > available {
        return Err(header_error(format!(
            "header describes {len} bytes of pixel data, only {available} available"
        )));
    }
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn decode<P: Pixel>(header: &MetaImageHeader, bytes: &[u8]) -> Result<Image<P>> {
    let mut pixels: Vec<P> = bytemuck::pod_collect_to_vec(bytes);
    if header.big_endian != cfg!(target_endian = "big") {
        pixels.iter_mut().for_each(|p| *p = p.swap_bytes());
    }

    let [x, y, z] = header.size;
    let data =
        Array3::from_shape_vec((z, y, x), pixels).map_err(|_| Error::InconsistentDimensions)?;
    let image = match header.dimension {
        Dimension::Two => Image::from_2d(data.index_axis_move(ndarray::Axis(0), 0)),
        Dimension::Three => Image::from_3d(data),
    };
    Ok(image.with_spacing(header.spacing).with_origin(header.origin))
}

/// Write an image. `.mhd` paths get their pixels in a sibling `.raw` file.
pub fn write(path: &Path, image: &DynImage) -> Result<()> {
    dispatch!(image, typed => write_typed(path, typed))
}

fn write_typed<P: Pixel>(path: &Path, image: &Image<P>) -> Result<()> {
    let detached = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mhd"));
    let raw_path: Option<PathBuf> = detached.then(|| path.with_extension("raw"));

    let data_file = match &raw_path {
        Some(raw_path) => raw_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        None => LOCAL_DATA_FILE.to_string(),
    };

    let header = MetaImageHeader {
        dimension: image.dimension,
        size: image.size(),
        spacing: image.spacing,
        origin: image.origin,
        channels: P::CHANNELS,
        component_type: P::COMPONENT_TYPE,
        big_endian: cfg!(target_endian = "big"),
        data_file,
    };

    let pixels: Cow<'_, [P]> = match image.data.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(image.data.iter().copied().collect()),
    };
    let bytes: &[u8] = bytemuck::cast_slice::<P, u8>(&pixels);

    let mut writer = BufWriter::new(File::create(path)?);
    header.write(&mut writer)?;
    match raw_path {
        Some(raw_path) => {
            writer.flush()?;
            let mut raw = BufWriter::new(File::create(raw_path)?);
            raw.write_all(bytes)?;
            raw.flush()?;
        }
        None => {
            writer.write_all(bytes)?;
            writer.flush()?;
        }
    }
    Ok(())
}
