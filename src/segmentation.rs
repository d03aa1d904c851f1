use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use log::info;

use crate::{
    enums::SortBy,
    error::{Error, Result},
    filters::BinaryThreshold,
    io::{read_image_information, read_series, write_image},
};

/// Inputs of a threshold segmentation run
#[derive(Clone, Debug)]
pub struct SegmentationConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    pub threshold: BinaryThreshold,
    pub sort_by: SortBy,
}

impl SegmentationConfig {
    pub fn new(inputs: Vec<PathBuf>, output: impl AsRef<Path>) -> Self {
        Self {
            inputs,
            output: output.as_ref().to_path_buf(),
            threshold: BinaryThreshold::default(),
            sort_by: SortBy::default(),
        }
    }
}

/// Split a comma separated list of files. Whitespace around each entry is
/// trimmed and empty entries are skipped.
pub fn split_file_list(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Read the input series, segment it and write the label image.
///
/// The pixel type is read from the first file. The label image has the
/// same component type as the input.
pub fn execute(config: &SegmentationConfig) -> Result<()> {
    config.threshold.validate()?;
    let first = config.inputs.first().ok_or(Error::NoInput)?;
    info!(
        "Checking type with first file in list: {} ({})",
        first.display(),
        config.inputs.len()
    );

    let image_info = read_image_information(first)?;
    info!(
        "imageDimension={} componentType={} nComponents={}",
        image_info.dimension.as_usize(),
        image_info.component_type,
        image_info.components
    );
    if image_info.components != 1 {
        return Err(Error::UnsupportedComponents(image_info.components));
    }

    let start = Instant::now();
    let image = read_series(&config.inputs, config.sort_by)?;
    let [x, y, z] = image.size();
    info!(
        "Segmenting {x}x{y}x{z} {} image with thresholds [{}, {}]",
        image.pixel_description(),
        config.threshold.lower,
        config.threshold.upper
    );

    let segmented = config.threshold.apply_dyn(&image)?;
    write_image(&config.output, &segmented)?;
    info!(
        "Filtering took: {:.3} seconds",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_separated_files() {
        assert_eq!(
            split_file_list("/raw/a.dcm,/raw/b.dcm, /raw/c.dcm,"),
            vec![
                PathBuf::from("/raw/a.dcm"),
                PathBuf::from("/raw/b.dcm"),
                PathBuf::from("/raw/c.dcm")
            ]
        );
        assert_eq!(split_file_list("single.mha"), vec![PathBuf::from("single.mha")]);
        assert!(split_file_list(",,").is_empty());
    }

    #[test]
    fn empty_input_list_is_rejected() {
        let config = SegmentationConfig::new(Vec::new(), "out.mha");
        assert!(matches!(execute(&config), Err(Error::NoInput)));
    }
}
