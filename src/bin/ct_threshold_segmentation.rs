//! Binary threshold segmentation of a CT series.
//!
//! Pixels inside `[LOWER, UPPER]` are labeled with the inside value, all
//! other pixels with the outside value. The pixel type of the label image
//! follows the pixel type of the first input file.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use dicom_segmentation::{
    enums::SortBy,
    filters::{
        BinaryThreshold,
        threshold::{
            DEFAULT_INSIDE_VALUE, DEFAULT_LOWER_THRESHOLD, DEFAULT_OUTSIDE_VALUE,
            DEFAULT_UPPER_THRESHOLD,
        },
    },
    segmentation::{SegmentationConfig, execute, split_file_list},
};
use log::info;

#[derive(Parser, Debug)]
#[command(
    name = "ct-threshold-segmentation",
    about = "Segment a CT image series with a binary threshold",
    long_about = None
)]
struct Args {
    /// Comma separated list of input files (DICOM slices or a single volume)
    inputs: Option<String>,

    /// Output label image (.mha, .mhd, .png, ...)
    output: Option<String>,

    /// Lower threshold, inclusive
    #[arg(default_value_t = DEFAULT_LOWER_THRESHOLD, allow_negative_numbers = true)]
    lower: f64,

    /// Upper threshold, inclusive
    #[arg(default_value_t = DEFAULT_UPPER_THRESHOLD, allow_negative_numbers = true)]
    upper: f64,

    /// Order in which DICOM slices are stacked
    #[arg(long, value_enum, default_value_t = SortBy::None)]
    sort_by: SortBy,

    /// Label of pixels inside the threshold range
    #[arg(long, default_value_t = DEFAULT_INSIDE_VALUE)]
    inside: f64,

    /// Label of pixels outside the threshold range
    #[arg(long, default_value_t = DEFAULT_OUTSIDE_VALUE, allow_negative_numbers = true)]
    outside: f64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "Command line: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let args = Args::parse();
    let (Some(inputs), Some(output)) = (args.inputs, args.output) else {
        Args::command().print_help()?;
        return Ok(());
    };

    let threshold =
        BinaryThreshold::new(args.lower, args.upper)?.with_values(args.inside, args.outside);
    let config = SegmentationConfig {
        inputs: split_file_list(&inputs),
        output: output.into(),
        threshold,
        sort_by: args.sort_by,
    };

    execute(&config).with_context(|| {
        format!(
            "segmentation of {} file(s) into {} failed",
            config.inputs.len(),
            config.output.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(
            std::iter::once("ct-threshold-segmentation").chain(args.iter().copied()),
        )
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn missing_output_is_not_a_parse_error() {
        let args = parse(&["in.mha"]).unwrap();
        assert_eq!(args.inputs.as_deref(), Some("in.mha"));
        assert!(args.output.is_none());
        assert_eq!(args.lower, DEFAULT_LOWER_THRESHOLD);
        assert_eq!(args.upper, DEFAULT_UPPER_THRESHOLD);
    }

    #[test]
    fn negative_thresholds_are_accepted() {
        let args = parse(&[
            "a.dcm,b.dcm",
            "out.mha",
            "-1100",
            "-900",
            "--outside",
            "-1",
        ])
        .unwrap();
        assert_eq!(args.lower, -1100.0);
        assert_eq!(args.upper, -900.0);
        assert_eq!(args.outside, -1.0);
        assert_eq!(args.sort_by, SortBy::None);
    }

    #[test]
    fn sort_order_is_parsed() {
        let args = parse(&["a.dcm", "out.mha", "--sort-by", "image-position-patient"]).unwrap();
        assert_eq!(args.sort_by, SortBy::ImagePositionPatient);
    }

    #[test]
    fn non_numeric_threshold_is_a_usage_error() {
        let err = parse(&["in.mha", "out.mha", "abc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn extra_positional_is_a_usage_error() {
        let err = parse(&["in.mha", "out.mha", "1", "2", "3"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
