//! Convert an image for display.
//!
//! The image is resampled to a fixed number of rows with square pixels and
//! written as 8-bit gray or RGBA.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use dicom_segmentation::{
    conversion::{ConversionConfig, WindowMode, execute},
    enums::Interpolation,
    filters::{IntensityWindow, resample::DEFAULT_OUTPUT_ROWS},
};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "convert-and-resample",
    about = "Convert and resample an image to PNG for display",
    long_about = None
)]
struct Args {
    /// Input image (DICOM, MetaImage or raster)
    input: Option<String>,

    /// Output image, usually .png
    output: Option<String>,

    /// Number of rows of the output image
    #[arg(long, default_value_t = DEFAULT_OUTPUT_ROWS)]
    rows: usize,

    #[arg(long, value_enum, default_value_t = Interpolation::NearestNeighbor)]
    interpolation: Interpolation,

    /// Window width applied to scalar images
    #[arg(long, requires = "level", conflicts_with = "auto_window")]
    window: Option<f64>,

    /// Window center applied to scalar images
    #[arg(long, requires = "window", allow_negative_numbers = true)]
    level: Option<f64>,

    /// Use the CT window for CT data, the stored DICOM window otherwise
    #[arg(long)]
    auto_window: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "Command line: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let args = Args::parse();
    let (Some(input), Some(output)) = (args.input, args.output) else {
        Args::command().print_help()?;
        return Ok(());
    };

    let window = match (args.window, args.level) {
        (Some(width), Some(center)) => WindowMode::Fixed(IntensityWindow::new(width, center)?),
        _ if args.auto_window => WindowMode::Auto,
        _ => WindowMode::None,
    };

    let config = ConversionConfig {
        rows: args.rows,
        interpolation: args.interpolation,
        window,
        ..ConversionConfig::new(&input, &output)
    };

    execute(&config).with_context(|| format!("conversion of {input} into {output} failed"))
}
