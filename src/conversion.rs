use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use log::{info, warn};

use crate::{
    enums::Interpolation,
    error::{Error, Result},
    filters::{IntensityWindow, Resampler, resample::DEFAULT_OUTPUT_ROWS, to_display},
    io::{read_image, read_image_information, write_image},
};

/// How scalar intensities are brought into the 8-bit display range
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum WindowMode {
    /// Saturate values into `0..=255`
    #[default]
    None,
    Fixed(IntensityWindow),
    /// CT window for CT data, the stored DICOM window otherwise
    Auto,
}

#[derive(Clone, Debug)]
pub struct ConversionConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub interpolation: Interpolation,
    pub window: WindowMode,
}

impl ConversionConfig {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            rows: DEFAULT_OUTPUT_ROWS,
            interpolation: Interpolation::default(),
            window: WindowMode::default(),
        }
    }
}

/// Convert an image for display: resample it to the configured number of
/// rows and write it as 8-bit gray or RGBA.
pub fn execute(config: &ConversionConfig) -> Result<()> {
    info!("Convert and resample...");
    let start = Instant::now();

    let image_info = read_image_information(&config.input)?;
    // color is reduced to 8 bits per channel by the readers that support it
    if !matches!(image_info.components, 1 | 3 | 4) {
        return Err(Error::UnsupportedComponents(image_info.components));
    }

    let image = read_image(&config.input)?.into_first_slice()?;
    let resampler = Resampler::new(config.rows, config.interpolation);
    let resampled = resampler.apply_dyn(&image)?;
    let [columns, rows, _] = resampled.size();
    info!(
        "Resampled {} image to {columns}x{rows}",
        image.pixel_description()
    );

    let window = match config.window {
        WindowMode::None => None,
        WindowMode::Fixed(window) => Some(window),
        WindowMode::Auto => {
            let window = IntensityWindow::for_metadata(image.metadata());
            if window.is_none() {
                warn!("No window found in {}, no rescaling applied", config.input.display());
            }
            window
        }
    };
    if let Some(window) = window {
        info!("Rescaling with window {} level {}", window.width, window.center);
    }

    write_image(&config.output, &to_display(&resampled, window))?;
    info!(
        "Conversion took: {:.3} seconds",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
