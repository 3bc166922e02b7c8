mod common;

use common::*;
use jp2::*;

// Signature, File Type, JP2 Header and Contiguous Codestream boxes for a
// three component sRGB image.
fn jp2_boxes() -> Vec<Jp2Box> {
    init_logger();
    wrap_codestream(codestream(64, 64, 3)).unwrap()
}

fn file_type(brand: [u8; 4], compatibility_list: Vec<[u8; 4]>) -> Jp2Box {
    Jp2Box::new(BoxPayload::FileType(FileTypeBox::new(
        brand,
        0,
        compatibility_list,
    )))
}

// Replaces the children of the JP2 Header box.
fn with_header_children(mut boxes: Vec<Jp2Box>, extra: Vec<Jp2Box>) -> Vec<Jp2Box> {
    let mut children = boxes[2].children().to_vec();
    children.extend(extra);
    boxes[2] = Jp2Box::superbox(BOX_TYPE_HEADER, children);
    boxes
}

fn channel_definition(channels: &[(u16, u16, u16)]) -> Jp2Box {
    Jp2Box::new(BoxPayload::ChannelDefinition(ChannelDefinitionBox::new(
        channels
            .iter()
            .map(|(index, channel_type, association)| {
                Channel::new(*index, ChannelTypes::new(*channel_type), *association)
            })
            .collect(),
    )))
}

fn label(text: &str) -> Jp2Box {
    Jp2Box::new(BoxPayload::Label(LabelBox::new(text)))
}

#[test]
fn test_wrapped_codestream_is_valid() {
    assert!(validate_jp2_box_sequence(&jp2_boxes()).is_ok());
}

#[test]
fn test_missing_signature() {
    let mut boxes = jp2_boxes();
    boxes.remove(0);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxUnexpected {
            box_type: BOX_TYPE_FILE_TYPE,
            ..
        })
    ));
    assert!(matches!(
        validate_jp2_box_sequence(&[]),
        Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_SIGNATURE
        })
    ));
}

#[test]
fn test_file_type_must_be_second() {
    let mut boxes = jp2_boxes();
    boxes.swap(1, 2);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxUnexpected {
            box_type: BOX_TYPE_HEADER,
            ..
        })
    ));
}

#[test]
fn test_not_compatible() {
    let mut boxes = jp2_boxes();
    boxes[1] = file_type(BRAND_JP2, vec![BRAND_JPX]);
    match validate_jp2_box_sequence(&boxes) {
        Err(JP2Error::NotCompatible { compatibility_list }) => {
            assert_eq!(compatibility_list, vec!["jpx ".to_owned()]);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_missing_codestream() {
    let mut boxes = jp2_boxes();
    boxes.pop();
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM
        })
    ));
}

#[test]
fn test_codestream_before_header() {
    let mut boxes = jp2_boxes();
    boxes.swap(2, 3);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxUnexpected {
            box_type: BOX_TYPE_CONTIGUOUS_CODESTREAM,
            ..
        })
    ));
}

#[test]
fn test_image_header_at_top_level() {
    let mut boxes = jp2_boxes();
    let ihdr = boxes[2].children()[0].clone();
    boxes.push(ihdr);
    match validate_jp2_box_sequence(&boxes) {
        Err(JP2Error::BoxMisplaced { box_type, parent }) => {
            assert_eq!(box_type, BOX_TYPE_IMAGE_HEADER);
            assert_eq!(parent, "top-level");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_header_must_start_with_image_header() {
    let mut boxes = jp2_boxes();
    let mut children = boxes[2].children().to_vec();
    children.reverse();
    boxes[2] = Jp2Box::superbox(BOX_TYPE_HEADER, children);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxUnexpected {
            box_type: BOX_TYPE_COLOUR_SPECIFICATION,
            ..
        })
    ));

    boxes[2] = Jp2Box::superbox(BOX_TYPE_HEADER, vec![]);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxMalformed {
            box_type: BOX_TYPE_HEADER,
            ..
        })
    ));
}

#[test]
fn test_missing_colour_specification() {
    let mut boxes = jp2_boxes();
    let ihdr = boxes[2].children()[0].clone();
    boxes[2] = Jp2Box::superbox(BOX_TYPE_HEADER, vec![ihdr]);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_COLOUR_SPECIFICATION
        })
    ));
}

#[test]
fn test_complete_channel_definition() {
    let boxes = with_header_children(
        jp2_boxes(),
        vec![channel_definition(&[(0, 0, 1), (1, 0, 2), (2, 0, 3), (3, 1, 0)])],
    );
    assert!(validate_jp2_box_sequence(&boxes).is_ok());
}

#[test]
fn test_incomplete_channel_definition() {
    let boxes = with_header_children(
        jp2_boxes(),
        vec![channel_definition(&[(0, 0, 1), (1, 0, 2), (2, 1, 0)])],
    );
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxMalformed {
            box_type: BOX_TYPE_CHANNEL_DEFINITION,
            ..
        })
    ));
}

#[test]
fn test_duplicate_channel_definition() {
    let cdef = channel_definition(&[(0, 0, 1), (1, 0, 2), (2, 0, 3)]);
    let boxes = with_header_children(jp2_boxes(), vec![cdef.clone(), cdef]);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxDuplicate {
            box_type: BOX_TYPE_CHANNEL_DEFINITION,
            ..
        })
    ));
}

#[test]
fn test_jpx_box_needs_jpx_brand() {
    let mut boxes = jp2_boxes();
    let rreq = ReaderRequirementsBox::new(2, 0xFFFF, 0xF8F0, vec![], vec![]).unwrap();
    boxes.insert(2, Jp2Box::new(BoxPayload::ReaderRequirements(rreq)));
    match validate_jp2_box_sequence(&boxes) {
        Err(JP2Error::BrandRequired { box_type, brand }) => {
            assert_eq!(box_type, BOX_TYPE_READER_REQUIREMENTS);
            assert_eq!(brand, BRAND_JPX);
        }
        other => panic!("unexpected result {:?}", other),
    }

    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2, BRAND_JPX]);
    assert!(validate_jp2_box_sequence(&boxes).is_ok());
}

#[test]
fn test_number_list_needs_jpx_compatibility() {
    let mut boxes = jp2_boxes();
    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2]);
    let association = Jp2Box::superbox(
        BOX_TYPE_ASSOCIATION,
        vec![
            Jp2Box::new(BoxPayload::NumberList(NumberListBox::new(vec![0x0100_0000]))),
            label("codestream"),
        ],
    );
    boxes.push(association);
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BrandRequired {
            box_type: BOX_TYPE_ASSOCIATION,
            ..
        })
    ));

    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2, BRAND_JPXB]);
    assert!(validate_jp2_box_sequence(&boxes).is_ok());
}

#[test]
fn test_label_outside_association() {
    let mut boxes = jp2_boxes();
    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2, BRAND_JPX]);
    boxes.push(label("stray"));
    match validate_jp2_box_sequence(&boxes) {
        Err(JP2Error::BoxMisplaced { box_type, parent }) => {
            assert_eq!(box_type, BOX_TYPE_LABEL);
            assert_eq!(parent, "top-level");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_data_reference_needs_fragment_table() {
    let mut boxes = jp2_boxes();
    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2, BRAND_JPX]);
    let dtbl = Jp2Box::new(BoxPayload::DataReference(DataReferenceBox::new(vec![
        DataEntryURLBox::new("file:///tmp/tile.j2c"),
    ])));
    boxes.push(dtbl.clone());
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxMissing {
            box_type: BOX_TYPE_FRAGMENT_TABLE
        })
    ));

    boxes.push(dtbl.clone());
    assert!(matches!(
        validate_jp2_box_sequence(&boxes),
        Err(JP2Error::BoxDuplicate {
            box_type: BOX_TYPE_DATA_REFERENCE,
            ..
        })
    ));

    boxes.pop();
    boxes.push(Jp2Box::superbox(
        BOX_TYPE_FRAGMENT_TABLE,
        vec![Jp2Box::new(BoxPayload::FragmentList(FragmentListBox::new(
            vec![Fragment::new(0, 1024, 1)],
        )))],
    ));
    assert!(validate_jp2_box_sequence(&boxes).is_ok());
}

#[test]
fn test_nested_data_reference() {
    let mut boxes = jp2_boxes();
    boxes[1] = file_type(BRAND_JPX, vec![BRAND_JP2, BRAND_JPX]);
    let dtbl = Jp2Box::new(BoxPayload::DataReference(DataReferenceBox::new(vec![])));
    boxes.push(Jp2Box::superbox(BOX_TYPE_FRAGMENT_TABLE, vec![dtbl]));
    match validate_jp2_box_sequence(&boxes) {
        Err(JP2Error::BoxMisplaced { box_type, parent }) => {
            assert_eq!(box_type, BOX_TYPE_DATA_REFERENCE);
            assert_eq!(parent, "ftbl");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_encode_writes_nothing_when_invalid() {
    let mut boxes = jp2_boxes();
    boxes.pop();

    let mut output = Vec::new();
    assert!(encode_jp2(&mut output, &boxes).is_err());
    assert!(output.is_empty());
}
