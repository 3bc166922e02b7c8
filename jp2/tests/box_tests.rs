mod common;

use std::io::Cursor;

use common::*;
use icc::DeviceClass;
use jp2::{
    decode_jp2, encode_jp2, wrap_codestream, BitDepth, BoxPayload, ColourSpecificationMethods,
    DecodeOptions, Document, EnumeratedColourSpaces, FreeBox, GeneratedComponent, Jp2Box,
    JP2Error, PaletteBox, UUIDBox, XMLBox, UUID_XMP,
};
use jpc::Diagnostics;

fn decode(bytes: &[u8]) -> (Vec<Jp2Box>, Diagnostics) {
    init_logger();
    let mut diagnostics = Diagnostics::new();
    let boxes = decode_jp2(
        &mut Cursor::new(bytes.to_vec()),
        &DecodeOptions::default(),
        &mut diagnostics,
    )
    .unwrap();
    (boxes, diagnostics)
}

fn types(boxes: &[Jp2Box]) -> Vec<String> {
    boxes.iter().map(|jbox| jbox.box_type_str()).collect()
}

#[test]
fn test_jp2_box_tree() {
    let (boxes, diagnostics) = decode(&jp2_file());

    assert!(diagnostics.is_empty(), "{:?}", diagnostics.warnings());
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);

    let positions: Vec<(u64, u64)> = boxes
        .iter()
        .map(|jbox| (jbox.offset(), jbox.length()))
        .collect();
    assert_eq!(positions, vec![(0, 12), (12, 20), (32, 45), (77, 102)]);

    let header = &boxes[2];
    assert!(header.is_superbox());
    assert_eq!(types(header.children()), vec!["ihdr", "colr"]);
    assert_eq!(header.children()[0].offset(), 40);
    assert_eq!(header.children()[0].length(), 22);
    assert_eq!(header.children()[1].offset(), 62);
    assert_eq!(header.children()[1].length(), 15);

    match header.children()[0].payload() {
        BoxPayload::ImageHeader(ihdr) => {
            assert_eq!(ihdr.height(), 1456);
            assert_eq!(ihdr.width(), 2592);
            assert_eq!(ihdr.components_num(), 3);
            assert_eq!(ihdr.bit_depth().unwrap().bit_depth(), 8);
            assert_eq!(ihdr.compression_type(), 7);
        }
        other => panic!("unexpected payload {:?}", other),
    }
    match header.children()[1].payload() {
        BoxPayload::ColourSpecification(colr) => {
            assert_eq!(colr.method(), ColourSpecificationMethods::EnumeratedColourSpace);
            assert_eq!(
                colr.enumerated_colour_space(),
                Some(EnumeratedColourSpaces::sRGB)
            );
        }
        other => panic!("unexpected payload {:?}", other),
    }
    match boxes[3].payload() {
        BoxPayload::ContiguousCodestream(jp2c) => {
            let codestream = jp2c.codestream().unwrap();
            assert_eq!(codestream.offset(), 85);
            let siz = codestream.image_and_tile_size_marker_segment().unwrap();
            assert_eq!(siz.width(), 2592);
            assert_eq!(siz.no_components(), 3);
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_document_shape() {
    init_logger();
    let mut diagnostics = Diagnostics::new();
    let document = Document::decode(
        &mut Cursor::new(jp2_file()),
        &DecodeOptions::default(),
        &mut diagnostics,
    )
    .unwrap();
    assert_eq!(document.boxes().len(), 4);
    assert_eq!(document.shape(), Some((1456, 2592, 3)));
    assert!(document.codestream().is_some());

    let raw = codestream(640, 480, 1);
    let document = Document::decode(
        &mut Cursor::new(raw),
        &DecodeOptions::default(),
        &mut diagnostics,
    )
    .unwrap();
    assert!(matches!(document, Document::Codestream { .. }));
    assert!(document.boxes().is_empty());
    assert_eq!(document.shape(), Some((480, 640, 1)));
    assert!(diagnostics.is_empty());
}

#[test]
fn test_icc_colour_specification() {
    let header = [image_header(1456, 2592, 3), icc_colour(2, &romm_profile())].concat();
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &header),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();
    let (boxes, diagnostics) = decode(&bytes);
    assert!(diagnostics.is_empty());

    let colr = match boxes[2].children()[1].payload() {
        BoxPayload::ColourSpecification(colr) => colr,
        other => panic!("unexpected payload {:?}", other),
    };
    assert_eq!(colr.method(), ColourSpecificationMethods::RestrictedICCProfile);
    assert_eq!(colr.icc_profile_bytes().unwrap().len(), 546);
    assert!(colr.enumerated_colour_space().is_none());

    let profile = colr.icc_profile().unwrap();
    assert_eq!(profile.size(), Some(546));
    assert_eq!(profile.device_class(), Some(DeviceClass::Input));
    assert_eq!(profile.colour_space().unwrap().to_string(), "RGB");
    assert_eq!(
        profile.date_time().unwrap().to_string(),
        "2001-08-30 13:32:37"
    );
}

#[test]
fn test_any_icc_profile_warns_with_jp2_brand() {
    let header = [image_header(1456, 2592, 3), icc_colour(3, &romm_profile())].concat();
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &header),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();
    let (_, diagnostics) = decode(&bytes);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 62);
}

#[test]
fn test_extended_and_open_ended_lengths() {
    let mut xml = vec![0, 0, 0, 1];
    xml.extend_from_slice(b"xml ");
    xml.extend_from_slice(&24u64.to_be_bytes());
    xml.extend_from_slice(b"<a></a>\n");

    let mut bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &[image_header(1, 1, 1), enumerated_colour(17)].concat()),
        xml,
    ]
    .concat();
    let jp2c_offset = bytes.len() as u64;
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(b"jp2c");
    bytes.resize(1000, 0);

    let (boxes, _) = decode(&bytes);
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "xml ", "jp2c"]);

    let xml = &boxes[3];
    assert_eq!(xml.header_length(), 16);
    assert_eq!(xml.length(), 24);
    match xml.payload() {
        BoxPayload::Xml(xml) => assert_eq!(xml.format().unwrap(), "<a></a>\n"),
        other => panic!("unexpected payload {:?}", other),
    }

    let jp2c = &boxes[4];
    assert_eq!(jp2c.offset(), jp2c_offset);
    assert_eq!(jp2c.length(), 1000 - jp2c_offset);
}

#[test]
fn test_child_overrun_is_truncated() {
    // The colr box claims 40 bytes but only 15 remain in jp2h.
    let mut colr = enumerated_colour(16);
    colr[3] = 40;
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &[image_header(1456, 2592, 3), colr].concat()),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();

    let (boxes, diagnostics) = decode(&bytes);
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);
    assert_eq!(boxes[2].children()[1].length(), 15);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 62);
}

#[test]
fn test_malformed_payload_kept_opaque() {
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &[jbox(b"ihdr", &[0, 0, 1]), enumerated_colour(16)].concat()),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();

    let (boxes, diagnostics) = decode(&bytes);
    let ihdr = &boxes[2].children()[0];
    match ihdr.payload() {
        BoxPayload::Unknown(unknown) => assert_eq!(unknown.data(), &[0, 0, 1]),
        other => panic!("unexpected payload {:?}", other),
    }
    assert_eq!(ihdr.long_name(), "Image Header");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 48);
}

#[test]
fn test_short_trailing_bytes_warn() {
    let mut bytes = jp2_file();
    bytes.extend_from_slice(&[0, 0, 0]);
    let (boxes, diagnostics) = decode(&bytes);
    assert_eq!(boxes.len(), 4);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 179);
}

#[test]
fn test_truncated_extended_length_warns() {
    let mut bytes = jp2_file();
    bytes.extend_from_slice(&[0, 0, 0, 1]);
    bytes.extend_from_slice(b"free");
    bytes.extend_from_slice(&[0, 0]);

    let (boxes, diagnostics) = decode(&bytes);
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 179);
    assert_eq!(
        diagnostics.warnings()[0].message(),
        "'free' box extended length runs past byte offset 189"
    );
}

#[test]
fn test_icc_profile_warnings_are_collected() {
    let mut profile = romm_profile();
    profile[36..40].copy_from_slice(b"xxxx");
    let header = [image_header(1456, 2592, 3), icc_colour(2, &profile)].concat();
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &header),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();

    let (boxes, diagnostics) = decode(&bytes);
    assert!(matches!(
        boxes[2].children()[1].payload(),
        BoxPayload::ColourSpecification(_)
    ));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 73 + 36);
    assert_eq!(
        diagnostics.warnings()[0].message(),
        "ICC profile signature is xxxx, expected acsp"
    );
}

#[test]
fn test_broken_codestream_is_a_warning() {
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &[image_header(1, 1, 1), enumerated_colour(17)].concat()),
        jbox(b"jp2c", &[0xFF, 0x4F, 0xFF, 0x52, 0x00]),
    ]
    .concat();
    let (boxes, diagnostics) = decode(&bytes);
    match boxes[3].payload() {
        BoxPayload::ContiguousCodestream(jp2c) => {
            assert!(jp2c.codestream().is_none());
            assert_eq!(jp2c.data().len(), 5);
        }
        other => panic!("unexpected payload {:?}", other),
    }
    assert!(!diagnostics.is_empty());
}

#[test]
fn test_bad_signature() {
    init_logger();
    let mut bytes = jp2_file();
    bytes[11] = 0x0B;
    let result = decode_jp2(
        &mut Cursor::new(bytes),
        &DecodeOptions::default(),
        &mut Diagnostics::new(),
    );
    assert!(matches!(result, Err(JP2Error::InvalidSignature { .. })));
}

#[test]
fn test_encode_round_trip() {
    let bytes = jp2_file();
    let (boxes, _) = decode(&bytes);

    let mut buffer = Vec::new();
    encode_jp2(&mut buffer, &boxes).unwrap();
    assert_eq!(buffer, bytes);
}

#[test]
fn test_uneven_palette_is_not_encoded() {
    let depth = BitDepth::new(8, false);
    let pclr = PaletteBox::new(vec![
        GeneratedComponent::new(depth, vec![7, 9, 2]),
        GeneratedComponent::new(depth, vec![7]),
    ]);
    assert_eq!(pclr.num_entries(), 3);

    let mut buffer = Vec::new();
    let result = Jp2Box::new(BoxPayload::Palette(pclr)).encode(&mut buffer);
    assert!(matches!(result, Err(JP2Error::BoxMalformed { .. })));
    assert!(buffer.is_empty());

    let empty = PaletteBox::new(vec![GeneratedComponent::new(depth, vec![])]);
    let result = Jp2Box::new(BoxPayload::Palette(empty)).encode(&mut buffer);
    assert!(matches!(result, Err(JP2Error::BoxMalformed { .. })));
    assert!(buffer.is_empty());

    let pclr = PaletteBox::new(vec![
        GeneratedComponent::new(depth, vec![7, 9]),
        GeneratedComponent::new(depth, vec![1, 2]),
    ]);
    Jp2Box::new(BoxPayload::Palette(pclr))
        .encode(&mut buffer)
        .unwrap();
    assert_eq!(
        buffer,
        vec![0, 0, 0, 17, b'p', b'c', b'l', b'r', 0, 2, 2, 7, 7, 7, 1, 9, 2]
    );
}

#[test]
fn test_wrap_codestream() {
    init_logger();
    let boxes = wrap_codestream(codestream(2592, 1456, 3)).unwrap();
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);

    let mut buffer = Vec::new();
    encode_jp2(&mut buffer, &boxes).unwrap();
    assert_eq!(buffer, jp2_file());

    let (decoded, diagnostics) = decode(&buffer);
    assert!(diagnostics.is_empty());
    assert_eq!(types(&decoded), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);
    assert_eq!(types(decoded[2].children()), vec!["ihdr", "colr"]);
}

#[test]
fn test_wrap_greyscale_codestream() {
    init_logger();
    let boxes = wrap_codestream(codestream(64, 32, 1)).unwrap();
    match boxes[2].children()[1].payload() {
        BoxPayload::ColourSpecification(colr) => assert_eq!(
            colr.enumerated_colour_space(),
            Some(EnumeratedColourSpaces::Greyscale)
        ),
        other => panic!("unexpected payload {:?}", other),
    }
    match boxes[2].children()[0].payload() {
        BoxPayload::ImageHeader(ihdr) => {
            assert_eq!((ihdr.height(), ihdr.width()), (32, 64));
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn test_rewrap_keeps_colour_space() {
    init_logger();
    let header = [image_header(1456, 2592, 3), enumerated_colour(18)].concat();
    let bytes = [
        signature(),
        file_type(b"jp2 ", &[b"jp2 "]),
        jbox(b"jp2h", &header),
        jbox(b"xml ", b"<a/>"),
        jbox(b"jp2c", &codestream(2592, 1456, 3)),
    ]
    .concat();
    let document = Document::decode(
        &mut Cursor::new(bytes),
        &DecodeOptions::default(),
        &mut Diagnostics::new(),
    )
    .unwrap();

    let boxes = document.rewrap().unwrap();
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c"]);
    match boxes[2].children()[1].payload() {
        BoxPayload::ColourSpecification(colr) => assert_eq!(
            colr.enumerated_colour_space(),
            Some(EnumeratedColourSpaces::sYCC)
        ),
        other => panic!("unexpected payload {:?}", other),
    }
}

fn decode_document(bytes: Vec<u8>) -> Document {
    init_logger();
    let mut diagnostics = Diagnostics::new();
    let document = Document::decode(
        &mut Cursor::new(bytes),
        &DecodeOptions::default(),
        &mut diagnostics,
    )
    .unwrap();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.warnings());
    document
}

#[test]
fn test_append_xml_after_open_ended_codestream() {
    // The same file with the Contiguous Codestream box length left at 0.
    let mut bytes = jp2_file();
    bytes[77..81].copy_from_slice(&[0, 0, 0, 0]);
    let document = decode_document(bytes);

    let xml = Jp2Box::new(BoxPayload::Xml(XMLBox::new("<a/>")));
    let boxes = document.append(xml).unwrap();
    assert_eq!(types(&boxes), vec!["jP  ", "ftyp", "jp2h", "jp2c", "xml "]);

    let mut buffer = Vec::new();
    encode_jp2(&mut buffer, &boxes).unwrap();
    assert_eq!(buffer, [jp2_file(), jbox(b"xml ", b"<a/>")].concat());
}

#[test]
fn test_append_xmp_uuid() {
    let document = decode_document(jp2_file());
    let xmp = UUIDBox::new(UUID_XMP, b"<x:xmpmeta/>".to_vec());

    let boxes = document
        .append(Jp2Box::new(BoxPayload::Uuid(xmp)))
        .unwrap();
    assert_eq!(boxes.len(), 5);
    assert_eq!(boxes[4].box_type_str(), "uuid");
}

#[test]
fn test_append_refused() {
    let document = decode_document(jp2_file());
    for jbox in [
        Jp2Box::new(BoxPayload::Uuid(UUIDBox::new([1; 16], vec![]))),
        Jp2Box::new(BoxPayload::Free(FreeBox::default())),
    ] {
        assert!(matches!(
            document.append(jbox),
            Err(JP2Error::AppendRefused { .. })
        ));
    }

    let document = decode_document(codestream(64, 64, 3));
    let xml = Jp2Box::new(BoxPayload::Xml(XMLBox::new("<a/>")));
    match document.append(xml) {
        Err(JP2Error::AppendRefused { box_type, reason }) => {
            assert_eq!(&box_type, b"xml ");
            assert_eq!(reason, "a raw codestream has no boxes");
        }
        other => panic!("unexpected result {:?}", other),
    }
}
