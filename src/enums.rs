use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    pub fn as_usize(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Interpolation {
    #[default]
    #[value(name = "nearest")]
    NearestNeighbor,
    Linear,
}

/// Order in which the slices of a DICOM series are stacked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    /// Keep the order in which the files were given
    #[default]
    None,
}
