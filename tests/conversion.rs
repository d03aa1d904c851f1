mod common;

use dicom_segmentation::{
    ConversionConfig, DynImage, Image, IntensityWindow, Interpolation, WindowMode, conversion,
    write_image,
};
use image::GenericImageView;
use ndarray::Array2;

use common::{CtSlice, stored, write_ct_slice, write_rgb_slice};

#[test]
fn gray_png_is_resampled_to_320_rows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gray.png");
    let output = dir.path().join("thumb.png");
    image::GrayImage::from_fn(8, 4, |x, y| image::Luma([(x + 10 * y) as u8]))
        .save(&input)
        .unwrap();

    conversion::execute(&ConversionConfig::new(&input, &output)).unwrap();

    let thumb = image::open(&output).unwrap();
    assert_eq!(thumb.dimensions(), (640, 320));
    let thumb = thumb.to_luma8();
    assert_eq!(thumb.get_pixel(0, 0).0, [0]);
    // 80 output pixels per input pixel
    assert_eq!(thumb.get_pixel(80, 80).0, [11]);
    assert_eq!(thumb.get_pixel(210, 250).0, [33]);
}

#[test]
fn anisotropic_spacing_keeps_physical_aspect() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("slice.mha");
    let output = dir.path().join("slice.png");
    let slice = Image::from_2d(Array2::from_shape_fn((5, 10), |(y, x)| (y * 10 + x) as i16))
        .with_spacing([0.5, 2.0, 1.0]);
    write_image(&input, &DynImage::from(slice)).unwrap();

    let config = ConversionConfig {
        rows: 20,
        ..ConversionConfig::new(&input, &output)
    };
    conversion::execute(&config).unwrap();

    // 10 mm tall and 5 mm wide at 0.5 mm per output pixel
    let thumb = image::open(&output).unwrap().to_luma8();
    assert_eq!(thumb.dimensions(), (10, 20));
    assert_eq!(thumb.get_pixel(2, 4).0, [12]);
}

#[test]
fn rgb_input_becomes_rgba() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo_small.png");
    image::RgbImage::from_pixel(16, 16, image::Rgb([30, 60, 90]))
        .save(&input)
        .unwrap();

    let config = ConversionConfig {
        interpolation: Interpolation::Linear,
        ..ConversionConfig::new(&input, &output)
    };
    conversion::execute(&config).unwrap();

    let thumb = image::open(&output).unwrap();
    assert_eq!(thumb.color(), image::ColorType::Rgba8);
    assert_eq!(thumb.dimensions(), (320, 320));
    assert_eq!(thumb.to_rgba8().get_pixel(100, 100).0, [30, 60, 90, 255]);
}

#[test]
fn rgb_dicom_becomes_rgba() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("capture.dcm");
    let output = dir.path().join("capture.png");
    write_rgb_slice(
        &input,
        2,
        2,
        &[[255, 0, 0], [0, 255, 0], [0, 0, 255], [10, 20, 30]],
    );

    let config = ConversionConfig {
        rows: 4,
        ..ConversionConfig::new(&input, &output)
    };
    conversion::execute(&config).unwrap();

    let thumb = image::open(&output).unwrap();
    assert_eq!(thumb.color(), image::ColorType::Rgba8);
    assert_eq!(thumb.dimensions(), (4, 4));
    let thumb = thumb.to_rgba8();
    assert_eq!(thumb.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(thumb.get_pixel(2, 0).0, [0, 255, 0, 255]);
    assert_eq!(thumb.get_pixel(2, 2).0, [10, 20, 30, 255]);
}

fn write_ct(path: &std::path::Path) {
    let hounsfield = [-1000, -1000, 3000, 3000];
    let stored: Vec<u16> = hounsfield.into_iter().map(stored).collect();
    write_ct_slice(
        path,
        &CtSlice {
            rows: 2,
            columns: 2,
            instance_number: 1,
            position_z: Some(0.0),
            stored: &stored,
            ..Default::default()
        },
    );
}

#[test]
fn ct_slice_uses_ct_window() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ct.dcm");
    let output = dir.path().join("ct.png");
    write_ct(&input);

    let config = ConversionConfig {
        rows: 4,
        window: WindowMode::Auto,
        ..ConversionConfig::new(&input, &output)
    };
    conversion::execute(&config).unwrap();

    // pixel spacing is 0.5 mm between rows and 0.25 mm between columns
    let thumb = image::open(&output).unwrap().to_luma8();
    assert_eq!(thumb.dimensions(), (2, 4));
    assert_eq!(thumb.get_pixel(0, 0).0, [0]);
    assert_eq!(thumb.get_pixel(0, 2).0, [255]);
}

#[test]
fn fixed_window_overrides_stored_values() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ct.dcm");
    let output = dir.path().join("ct.png");
    write_ct(&input);

    let config = ConversionConfig {
        rows: 2,
        window: WindowMode::Fixed(IntensityWindow::new(4000.0, 1000.0).unwrap()),
        ..ConversionConfig::new(&input, &output)
    };
    conversion::execute(&config).unwrap();

    let thumb = image::open(&output).unwrap().to_luma8();
    assert_eq!(thumb.get_pixel(0, 0).0, [0]);
    assert_eq!(thumb.get_pixel(0, 1).0, [255]);
}
