mod common;

use std::io::Cursor;

use common::*;
use jpc::{decode_jpc, Codestream, CodestreamError, Diagnostics, MarkerSegment};

fn decode(bytes: &[u8], header_only: bool) -> (Result<Codestream, CodestreamError>, Diagnostics) {
    init_logger();
    let mut reader = Cursor::new(bytes.to_vec());
    let mut diagnostics = Diagnostics::new();
    let result = decode_jpc(&mut reader, bytes.len() as u64, header_only, &mut diagnostics);
    (result, diagnostics)
}

fn marker_ids(codestream: &Codestream) -> Vec<String> {
    codestream
        .segments()
        .iter()
        .map(|segment| segment.marker_id())
        .collect()
}

#[test]
fn test_header_only_stops_at_sod() {
    let bytes = single_tile_codestream(18, &[0x12, 0x34, 0x56, 0x78]);
    let (result, diagnostics) = decode(&bytes, true);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    assert!(codestream.header_only());
    assert_eq!(
        marker_ids(&codestream),
        vec!["SOC", "SIZ", "COD", "QCD", "SOT", "SOD"]
    );
    let offsets: Vec<u64> = codestream.segments().iter().map(|s| s.offset()).collect();
    assert_eq!(offsets, vec![0, 2, 51, 65, 74, 86]);
    assert!(codestream.tile_parts().is_empty());
    assert_eq!(codestream.length(), 88);

    let siz = codestream.image_and_tile_size_marker_segment().unwrap();
    assert_eq!(siz.length(), 47);
    assert_eq!(siz.no_components(), 3);
    assert_eq!(siz.reference_grid_width(), 2592);
    assert_eq!(siz.reference_grid_height(), 1456);
    assert_eq!(siz.bit_depths(), vec![8, 8, 8]);
    assert_eq!(siz.signed(), vec![false, false, false]);

    let cod = codestream.coding_style_marker_segment().unwrap();
    assert_eq!(cod.no_layers(), 1);
    assert_eq!(cod.coding_style_parameters().code_block_width(), 64);

    let qcd = codestream.quantization_default_marker_segment().unwrap();
    assert_eq!(qcd.quantization_exponents(), vec![8, 9, 9, 10]);
    assert_eq!(codestream.main_header().len(), 4);
}

#[test]
fn test_full_parse_records_tile_part() {
    let bytes = single_tile_codestream(18, &[0x12, 0x34, 0x56, 0x78]);
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    assert!(!codestream.header_only());
    assert_eq!(
        marker_ids(&codestream),
        vec!["SOC", "SIZ", "COD", "QCD", "SOT", "SOD", "EOC"]
    );
    assert_eq!(codestream.segments().last().unwrap().offset(), 92);
    assert_eq!(codestream.length(), 94);

    let tile_parts = codestream.tile_parts();
    assert_eq!(tile_parts.len(), 1);
    assert_eq!(tile_parts[0].tile_index(), 0);
    assert_eq!(tile_parts[0].tile_part_index(), 0);
    assert_eq!(tile_parts[0].offset(), 74);
    assert_eq!(tile_parts[0].data_offset(), 88);
    assert_eq!(tile_parts[0].end(), 92);
    assert_eq!(tile_parts[0].length(), 18);
    assert_eq!(tile_parts[0].data_length(), 4);
}

#[test]
fn test_psot_zero_runs_to_eoc() {
    let bytes = single_tile_codestream(0, &[0x12, 0x34, 0x56, 0x78, 0x9A]);
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    let tile_parts = codestream.tile_parts();
    assert_eq!(tile_parts.len(), 1);
    assert_eq!(tile_parts[0].end(), 93);
    assert_eq!(marker_ids(&codestream).last().unwrap(), "EOC");
}

#[test]
fn test_psot_zero_runs_to_next_sot() {
    let bytes = [
        main_header(),
        sot(0, 0, 0, 2),
        SOD.to_vec(),
        vec![0x01, 0x02],
        sot(0, 16, 1, 2),
        SOD.to_vec(),
        vec![0x03, 0x04],
        EOC.to_vec(),
    ]
    .concat();
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    let tile_parts = codestream.tile_parts();
    assert_eq!(tile_parts.len(), 2);
    assert_eq!(tile_parts[0].end(), 90);
    assert_eq!(tile_parts[1].offset(), 90);
    assert_eq!(tile_parts[1].tile_part_index(), 1);
    assert_eq!(tile_parts[1].end(), 106);
    assert_eq!(
        marker_ids(&codestream),
        vec!["SOC", "SIZ", "COD", "QCD", "SOT", "SOD", "SOT", "SOD", "EOC"]
    );
}

#[test]
fn test_psot_overrun() {
    let bytes = single_tile_codestream(200, &[0x12, 0x34]);

    let (result, _) = decode(&bytes, false);
    match result {
        Err(CodestreamError::TilePartOverrun { offset, psot, end }) => {
            assert_eq!(offset, 74);
            assert_eq!(psot, 200);
            assert_eq!(end, 92);
        }
        other => panic!("expected TilePartOverrun, got {:?}", other),
    }

    // The tile-part length is never followed in header-only mode.
    let (result, _) = decode(&bytes, true);
    assert!(result.is_ok());
}

#[test]
fn test_missing_soc() {
    let bytes = [siz(1, 1, 1), EOC.to_vec()].concat();
    let (result, _) = decode(&bytes, true);
    match result {
        Err(CodestreamError::MarkerUnexpected { marker, offset }) => {
            assert_eq!(marker, [0xFF, 0x51]);
            assert_eq!(offset, 0);
        }
        other => panic!("expected MarkerUnexpected, got {:?}", other),
    }
}

#[test]
fn test_invalid_marker() {
    let bytes = [
        SOC.to_vec(),
        siz(2592, 1456, 3),
        vec![0x12, 0x34, 0x00, 0x04],
        qcd(),
    ]
    .concat();
    let (result, _) = decode(&bytes, true);
    match result {
        Err(CodestreamError::InvalidMarker { marker, offset }) => {
            assert_eq!(marker, [0x12, 0x34]);
            assert_eq!(offset, 51);
        }
        other => panic!("expected InvalidMarker, got {:?}", other),
    }
}

#[test]
fn test_segment_length_past_end() {
    let mut bytes = [SOC.to_vec(), siz(2592, 1456, 3)].concat();
    bytes.truncate(40);
    let (result, _) = decode(&bytes, true);
    match result {
        Err(CodestreamError::InvalidMarker { marker, offset }) => {
            assert_eq!(marker, [0xFF, 0x51]);
            assert_eq!(offset, 2);
        }
        other => panic!("expected InvalidMarker, got {:?}", other),
    }
}

#[test]
fn test_unknown_markers_are_kept() {
    let bytes = [
        main_header(),
        vec![0xFF, 0x70, 0x00, 0x04, 0xAB, 0xCD],
        vec![0xFF, 0x30],
        sot(0, 14, 0, 1),
        SOD.to_vec(),
        EOC.to_vec(),
    ]
    .concat();
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    assert_eq!(
        marker_ids(&codestream),
        vec!["SOC", "SIZ", "COD", "QCD", "0xff70", "0xff30", "SOT", "SOD", "EOC"]
    );
    match &codestream.segments()[4] {
        MarkerSegment::Unknown(segment) => {
            assert_eq!(segment.offset(), 74);
            assert_eq!(segment.length(), 4);
            assert_eq!(segment.data(), &[0xAB, 0xCD]);
        }
        other => panic!("expected an unknown segment, got {:?}", other),
    }
    match &codestream.segments()[5] {
        MarkerSegment::Unknown(segment) => {
            assert_eq!(segment.offset(), 80);
            assert_eq!(segment.length(), 0);
            assert!(segment.data().is_empty());
        }
        other => panic!("expected an unknown segment, got {:?}", other),
    }
}

#[test]
fn test_short_siz_is_kept_opaque() {
    let bytes = [
        SOC.to_vec(),
        vec![0xFF, 0x51, 0x00, 0x0A, 0, 0, 0, 0, 0, 1, 0, 0],
        qcd(),
        SOD.to_vec(),
    ]
    .concat();
    let (result, diagnostics) = decode(&bytes, true);
    let codestream = result.unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 2);
    assert!(codestream.image_and_tile_size_marker_segment().is_none());
    match &codestream.segments()[1] {
        MarkerSegment::Unknown(segment) => {
            assert_eq!(segment.marker(), [0xFF, 0x51]);
            assert_eq!(segment.data().len(), 8);
        }
        other => panic!("expected an unknown segment, got {:?}", other),
    }
    assert_eq!(marker_ids(&codestream).last().unwrap(), "SOD");
}

#[test]
fn test_siz_with_missing_components() {
    let mut siz = siz(64, 64, 3);
    siz[3] = 44;
    siz.truncate(2 + 44);
    let bytes = [SOC.to_vec(), siz, SOD.to_vec()].concat();
    let (result, diagnostics) = decode(&bytes, true);
    let codestream = result.unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.warnings()[0].message().contains("SIZ declares 3 components"));
    let siz = codestream.image_and_tile_size_marker_segment().unwrap();
    assert_eq!(siz.no_components(), 3);
    assert_eq!(siz.components().len(), 2);
}

#[test]
fn test_packet_markers_are_found() {
    let data = vec![
        0xFF, 0x91, 0x00, 0x04, 0x00, 0x00, 0x80, 0xFF, 0x92, 0x11, 0xFF, 0x91, 0x00, 0x04,
        0x00, 0x01, 0xFF, 0x92,
    ];
    let bytes = [
        SOC.to_vec(),
        siz(2592, 1456, 3),
        cod(0x06, 0x01),
        qcd(),
        sot(0, 14 + data.len() as u32, 0, 1),
        SOD.to_vec(),
        data,
        EOC.to_vec(),
    ]
    .concat();
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert!(diagnostics.is_empty());
    let cod = codestream.coding_style_marker_segment().unwrap();
    assert!(cod.uses_sop());
    assert!(cod.uses_eph());
    assert_eq!(
        marker_ids(&codestream),
        vec!["SOC", "SIZ", "COD", "QCD", "SOT", "SOD", "SOP", "EPH", "SOP", "EPH", "EOC"]
    );

    let packets: Vec<(u64, Option<u16>)> = codestream.segments()[6..10]
        .iter()
        .map(|segment| match segment {
            MarkerSegment::StartOfPacket(sop) => (sop.offset(), Some(sop.sequence_number())),
            other => (other.offset(), None),
        })
        .collect();
    assert_eq!(
        packets,
        vec![(88, Some(0)), (95, None), (98, Some(1)), (104, None)]
    );
}

#[test]
fn test_multiple_component_transformation_needs_three_components() {
    let bytes = [SOC.to_vec(), siz(16, 16, 1), cod(0x00, 0x01), qcd(), SOD.to_vec()].concat();
    let (result, diagnostics) = decode(&bytes, true);
    assert!(result.is_ok());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 45);
}

#[test]
fn test_sod_without_sot() {
    let bytes = [main_header(), SOD.to_vec(), EOC.to_vec()].concat();
    let (result, _) = decode(&bytes, false);
    match result {
        Err(CodestreamError::MarkerUnexpected { marker, offset }) => {
            assert_eq!(marker, [0xFF, 0x93]);
            assert_eq!(offset, 74);
        }
        other => panic!("expected MarkerUnexpected, got {:?}", other),
    }
}

#[test]
fn test_missing_eoc_is_a_warning() {
    let mut bytes = single_tile_codestream(16, &[0x01, 0x02]);
    bytes.truncate(bytes.len() - 2);
    let (result, diagnostics) = decode(&bytes, false);
    let codestream = result.unwrap();

    assert_eq!(codestream.tile_parts().len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 90);
}

#[test]
fn test_repeated_soc_is_a_warning() {
    let bytes = [main_header(), SOC.to_vec(), SOD.to_vec()].concat();
    let (result, diagnostics) = decode(&bytes, true);
    let codestream = result.unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.warnings()[0].offset(), 74);
    assert_eq!(marker_ids(&codestream)[4], "SOC");
}

#[test]
fn test_header_round_trip() {
    let bytes = [main_header(), sot(0, 14, 0, 1), SOD.to_vec()].concat();
    let (result, _) = decode(&bytes, true);
    let codestream = result.unwrap();

    let mut encoded = vec![];
    codestream.encode(&mut encoded).unwrap();
    assert_eq!(encoded, bytes);
}

#[test]
fn test_full_parse_cannot_be_encoded() {
    let bytes = single_tile_codestream(16, &[0x01, 0x02]);
    let (result, _) = decode(&bytes, false);
    let codestream = result.unwrap();

    let mut encoded = vec![];
    assert!(codestream.encode(&mut encoded).is_err());
    assert!(encoded.is_empty());
}

#[test]
fn test_encode_requires_siz_after_soc() {
    let codestream = Codestream::new(vec![
        MarkerSegment::StartOfCodestream { offset: 0 },
        MarkerSegment::EndOfCodestream { offset: 0 },
    ]);
    let mut encoded = vec![];
    match codestream.encode(&mut encoded) {
        Err(CodestreamError::MarkerMissing(marker)) => assert_eq!(marker, [0xFF, 0x51]),
        other => panic!("expected MarkerMissing, got {:?}", other),
    }
}
