use std::path::Path;

use image::{
    ColorType, DynamicImage, GrayImage, ImageBuffer, ImageDecoder, ImageReader, Luma, RgbImage,
    RgbaImage,
};
use ndarray::Array2;

use crate::{
    enums::Dimension,
    error::{Error, Result},
    image::{DynImage, Image},
    io::{ImageFormat, ImageInfo},
    pixel::{ComponentType, Pixel, Rgb8, Rgba8},
};

fn color_layout(color_type: ColorType) -> Option<(ComponentType, usize)> {
    let layout = match color_type {
        ColorType::L8 => (ComponentType::U8, 1),
        ColorType::La8 => (ComponentType::U8, 2),
        ColorType::Rgb8 => (ComponentType::U8, 3),
        ColorType::Rgba8 => (ComponentType::U8, 4),
        ColorType::L16 => (ComponentType::U16, 1),
        ColorType::La16 => (ComponentType::U16, 2),
        ColorType::Rgb16 => (ComponentType::U16, 3),
        ColorType::Rgba16 => (ComponentType::U16, 4),
        ColorType::Rgb32F => (ComponentType::F32, 3),
        ColorType::Rgba32F => (ComponentType::F32, 4),
        _ => return None,
    };
    Some(layout)
}

pub fn read_information(path: &Path, format: image::ImageFormat) -> Result<ImageInfo> {
    let decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let (width, height) = decoder.dimensions();
    let (component_type, components) = color_layout(decoder.color_type())
        .ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;

    Ok(ImageInfo {
        format: ImageFormat::Raster(format),
        dimension: Dimension::Two,
        component_type,
        components,
        size: [width as usize, height as usize, 1],
        spacing: [1.0; 3],
    })
}

fn from_raw<P: Pixel>(width: u32, height: u32, pixels: Vec<P>) -> Result<Image<P>> {
    let data = Array2::from_shape_vec((height as usize, width as usize), pixels)
        .map_err(|_| Error::InconsistentDimensions)?;
    Ok(Image::from_2d(data))
}

/// Read a raster image. Gray images keep their bit depth; color images are
/// reduced to 8-bit RGB or RGBA.
pub fn read(path: &Path) -> Result<DynImage> {
    let decoded = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let (width, height) = (decoded.width(), decoded.height());

    let image: DynImage = match decoded {
        DynamicImage::ImageLuma8(buffer) => from_raw(width, height, buffer.into_raw())?.into(),
        DynamicImage::ImageLuma16(buffer) => from_raw(width, height, buffer.into_raw())?.into(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            return Err(Error::UnsupportedComponents(2));
        }
        DynamicImage::ImageRgb8(buffer) => rgb_image(width, height, &buffer.into_raw())?,
        DynamicImage::ImageRgba8(buffer) => rgba_image(width, height, &buffer.into_raw())?,
        other if other.color().has_alpha() => {
            rgba_image(width, height, &other.to_rgba8().into_raw())?
        }
        other => rgb_image(width, height, &other.to_rgb8().into_raw())?,
    };
    Ok(image)
}

fn rgb_image(width: u32, height: u32, raw: &[u8]) -> Result<DynImage> {
    let pixels: Vec<Rgb8> = bytemuck::cast_slice(raw).to_vec();
    Ok(from_raw(width, height, pixels)?.into())
}

fn rgba_image(width: u32, height: u32, raw: &[u8]) -> Result<DynImage> {
    let pixels: Vec<Rgba8> = bytemuck::cast_slice(raw).to_vec();
    Ok(from_raw(width, height, pixels)?.into())
}

/// Flatten a single-slice image into row-major pixels with its (width, height)
fn plane<P: Pixel>(image: &Image<P>) -> Result<(u32, u32, Vec<P>)> {
    let [width, height, depth] = image.size();
    if depth != 1 {
        return Err(Error::UnsupportedDimension(3));
    }
    let pixels = image.data.iter().copied().collect();
    Ok((width as u32, height as u32, pixels))
}

/// Write a single-slice image. Only pixel types with a raster equivalent
/// are accepted: unsigned char, unsigned short, RGB and RGBA.
pub fn write(path: &Path, image: &DynImage, format: image::ImageFormat) -> Result<()> {
    let invalid = || Error::InconsistentDimensions;
    match image {
        DynImage::U8(image) => {
            let (width, height, pixels) = plane(image)?;
            GrayImage::from_raw(width, height, pixels)
                .ok_or_else(invalid)?
                .save_with_format(path, format)?;
        }
        DynImage::U16(image) => {
            let (width, height, pixels) = plane(image)?;
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, pixels)
                .ok_or_else(invalid)?
                .save_with_format(path, format)?;
        }
        DynImage::Rgb8(image) => {
            let (width, height, pixels) = plane(image)?;
            RgbImage::from_raw(width, height, bytemuck::cast_slice(pixels.as_slice()).to_vec())
                .ok_or_else(invalid)?
                .save_with_format(path, format)?;
        }
        DynImage::Rgba8(image) => {
            let (width, height, pixels) = plane(image)?;
            RgbaImage::from_raw(width, height, bytemuck::cast_slice(pixels.as_slice()).to_vec())
                .ok_or_else(invalid)?
                .save_with_format(path, format)?;
        }
        other => {
            return Err(Error::UnsupportedPixelType {
                pixel: other.pixel_description(),
                format: format!("{format:?}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn gray_png_keeps_bit_depth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray16.png");
        let image = DynImage::from(Image::from_2d(array![[0u16, 1000], [40000, 65535]]));
        write(&path, &image, image::ImageFormat::Png).unwrap();

        let info = read_information(&path, image::ImageFormat::Png).unwrap();
        assert_eq!(info.component_type, ComponentType::U16);
        assert_eq!(info.components, 1);
        assert_eq!(info.size, [2, 2, 1]);

        match read(&path).unwrap() {
            DynImage::U16(read_back) => {
                assert_eq!(read_back.data[[0, 1, 0]], 40000);
                assert_eq!(read_back.data[[0, 1, 1]], 65535);
            }
            other => panic!("unexpected pixel type {}", other.pixel_description()),
        }
    }

    #[test]
    fn rgba_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        let image = DynImage::from(Image::from_2d(Array2::from_elem((3, 5), [9u8, 8, 7, 255])));
        write(&path, &image, image::ImageFormat::Png).unwrap();

        match read(&path).unwrap() {
            DynImage::Rgba8(read_back) => {
                assert_eq!(read_back.size(), [5, 3, 1]);
                assert!(read_back.data.iter().all(|p| *p == [9, 8, 7, 255]));
            }
            other => panic!("unexpected pixel type {}", other.pixel_description()),
        }
    }

    #[test]
    fn signed_pixels_cannot_be_png() {
        let dir = tempfile::tempdir().unwrap();
        let image = DynImage::from(Image::from_2d(array![[-1i16, 1]]));
        assert!(matches!(
            write(&dir.path().join("out.png"), &image, image::ImageFormat::Png),
            Err(Error::UnsupportedPixelType { .. })
        ));
    }

    #[test]
    fn volumes_cannot_be_png() {
        let dir = tempfile::tempdir().unwrap();
        let image = DynImage::from(Image::from_3d(ndarray::Array3::<u8>::zeros((2, 2, 2))));
        assert!(matches!(
            write(&dir.path().join("out.png"), &image, image::ImageFormat::Png),
            Err(Error::UnsupportedDimension(3))
        ));
    }
}
