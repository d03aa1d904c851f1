#![allow(dead_code)]

use std::path::Path;

use dicom::{
    core::{DataElement, PrimitiveValue, VR},
    object::{FileMetaTableBuilder, InMemDicomObject},
};
use dicom_dictionary_std::{tags, uids};

/// A 12-bit CT image stored as unsigned 16-bit with the usual -1024
/// intercept. `stored` holds all frames back to back.
pub struct CtSlice<'a> {
    pub rows: u16,
    pub columns: u16,
    pub frames: u16,
    pub instance_number: i32,
    pub position_z: Option<f64>,
    pub table_position: Option<f64>,
    pub spacing_between_slices: Option<f64>,
    pub stored: &'a [u16],
}

impl Default for CtSlice<'_> {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 1,
            frames: 1,
            instance_number: 1,
            position_z: None,
            table_position: None,
            spacing_between_slices: None,
            stored: &[],
        }
    }
}

/// Slice thickness written to every CT file, distinct from the position
/// steps used by the tests
pub const SLICE_THICKNESS: f64 = 1.25;

fn strs(values: &[String]) -> PrimitiveValue {
    PrimitiveValue::Strs(values.iter().cloned().collect())
}

fn write_file(path: &Path, object: InMemDicomObject, sop_class_uid: &str, sop_instance_uid: &str) {
    let file_object = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(sop_class_uid)
                .media_storage_sop_instance_uid(sop_instance_uid),
        )
        .expect("should have built file meta group");
    file_object
        .write_to_file(path)
        .expect("should have written DICOM file");
}

pub fn write_ct_slice(path: &Path, slice: &CtSlice<'_>) {
    assert_eq!(
        slice.stored.len(),
        slice.rows as usize * slice.columns as usize * slice.frames as usize
    );
    let sop_instance_uid = format!("2.25.1000{}", slice.instance_number);

    let mut object = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::CT_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid.as_str()),
        ),
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")),
        DataElement::new(
            tags::SLICE_THICKNESS,
            VR::DS,
            PrimitiveValue::from(SLICE_THICKNESS.to_string()),
        ),
        DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(slice.instance_number.to_string()),
        ),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(slice.rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(slice.columns)),
        DataElement::new(
            tags::PIXEL_SPACING,
            VR::DS,
            strs(&["0.5".to_string(), "0.25".to_string()]),
        ),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(12_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(11_u16)),
        DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ),
        DataElement::new(
            tags::RESCALE_INTERCEPT,
            VR::DS,
            PrimitiveValue::from("-1024"),
        ),
        DataElement::new(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from("1")),
        DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(slice.stored.iter().copied().collect()),
        ),
    ]);

    if slice.frames > 1 {
        object.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(slice.frames.to_string()),
        ));
    }
    if let Some(z) = slice.position_z {
        object.put(DataElement::new(
            tags::IMAGE_POSITION_PATIENT,
            VR::DS,
            strs(&["-10".to_string(), "-20".to_string(), z.to_string()]),
        ));
    }
    if let Some(table_position) = slice.table_position {
        object.put(DataElement::new(
            tags::TABLE_POSITION,
            VR::FD,
            PrimitiveValue::F64([table_position].into_iter().collect()),
        ));
    }
    if let Some(spacing) = slice.spacing_between_slices {
        object.put(DataElement::new(
            tags::SPACING_BETWEEN_SLICES,
            VR::DS,
            PrimitiveValue::from(spacing.to_string()),
        ));
    }

    write_file(path, object, uids::CT_IMAGE_STORAGE, &sop_instance_uid);
}

/// Write an 8-bit RGB secondary capture with interleaved samples
pub fn write_rgb_slice(path: &Path, rows: u16, columns: u16, rgb: &[[u8; 3]]) {
    assert_eq!(rgb.len(), rows as usize * columns as usize);
    let sop_instance_uid = "2.25.2000";

    let object = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
        ),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(sop_instance_uid),
        ),
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("OT")),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(3_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("RGB"),
        ),
        DataElement::new(
            tags::PLANAR_CONFIGURATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(8_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(8_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(7_u16)),
        DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            PrimitiveValue::from(0_u16),
        ),
        DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::U8(rgb.iter().flatten().copied().collect()),
        ),
    ]);

    write_file(
        path,
        object,
        uids::SECONDARY_CAPTURE_IMAGE_STORAGE,
        sop_instance_uid,
    );
}

/// Stored value of a Hounsfield unit in [`write_ct_slice`] files
pub fn stored(hounsfield: i32) -> u16 {
    (hounsfield + 1024) as u16
}
