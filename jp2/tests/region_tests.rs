mod common;

use std::error;
use std::io::Cursor;

use common::*;
use jp2::{
    DecodeOptions, DecodeParameters, DecodedRegion, Document, JP2Error, PixelCodec,
    RegionRequest,
};
use jpc::{Codestream, Diagnostics, ProgressionOrder, TransformationFilter};

// A 64x64 three component codestream split in four 32x32 tiles, with data
// for tile 0 only.
fn tiled_codestream() -> Vec<u8> {
    let mut bytes = codestream(64, 64, 3);
    bytes[24..28].copy_from_slice(&32u32.to_be_bytes());
    bytes[28..32].copy_from_slice(&32u32.to_be_bytes());
    bytes
}

fn document(bytes: Vec<u8>, header_only: bool) -> Document {
    init_logger();
    let mut diagnostics = Diagnostics::new();
    let document = Document::decode(
        &mut Cursor::new(bytes),
        &DecodeOptions { header_only },
        &mut diagnostics,
    )
    .unwrap();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics.warnings());
    document
}

// Returns a mid-grey region and keeps the parameters it was called with.
#[derive(Default)]
struct RecordingCodec {
    parameters: Option<DecodeParameters>,
}

impl PixelCodec for RecordingCodec {
    fn decode(
        &mut self,
        _codestream: &Codestream,
        parameters: &DecodeParameters,
    ) -> Result<DecodedRegion, Box<dyn error::Error + Send + Sync>> {
        let width = (parameters.x1 - parameters.x0) >> parameters.reduction;
        let height = (parameters.y1 - parameters.y0) >> parameters.reduction;
        self.parameters = Some(parameters.clone());
        Ok(DecodedRegion {
            width,
            height,
            components: vec![vec![128; (width * height) as usize]; parameters.components.len()],
        })
    }
}

struct FailingCodec;

impl PixelCodec for FailingCodec {
    fn decode(
        &mut self,
        _codestream: &Codestream,
        _parameters: &DecodeParameters,
    ) -> Result<DecodedRegion, Box<dyn error::Error + Send + Sync>> {
        Err("code-block decoding is not supported".into())
    }
}

#[test]
fn test_read_tile() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    let region = document
        .read_region(&mut codec, &RegionRequest::tile(0))
        .unwrap();
    assert_eq!((region.width, region.height), (32, 32));
    assert_eq!(region.components.len(), 3);

    let parameters = codec.parameters.unwrap();
    assert_eq!(parameters.tile, Some(0));
    assert_eq!(
        (parameters.x0, parameters.y0, parameters.x1, parameters.y1),
        (0, 0, 32, 32)
    );
    assert_eq!(parameters.reference_tile_width, 32);
    assert!(matches!(parameters.progression_order, ProgressionOrder::LRCP));
    assert!(matches!(
        parameters.transformation,
        TransformationFilter::Reversible
    ));
    assert_eq!(parameters.layers, 1);
    assert_eq!(parameters.codestream_offset, 0);
    assert_eq!(parameters.codestream_length, 94);

    assert_eq!(parameters.tile_parts.len(), 1);
    let tile_part = parameters.tile_parts[0];
    assert_eq!(tile_part.offset(), 74);
    assert_eq!(tile_part.data_offset(), 88);

    for (index, component) in parameters.components.iter().enumerate() {
        assert_eq!(component.index as usize, index);
        assert_eq!(component.bit_depth, 8);
        assert!(!component.signed);
        assert_eq!(component.decomposition_levels, 5);
    }
}

#[test]
fn test_read_last_tile() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    document
        .read_region(&mut codec, &RegionRequest::tile(3))
        .unwrap();

    let parameters = codec.parameters.unwrap();
    assert_eq!(
        (parameters.x0, parameters.y0, parameters.x1, parameters.y1),
        (32, 32, 64, 64)
    );
    assert!(parameters.tile_parts.is_empty());
}

#[test]
fn test_read_window() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();
    let request = RegionRequest::window(8..24, 16..48)
        .with_reduction(1)
        .with_components(vec![2]);

    let region = document.read_region(&mut codec, &request).unwrap();
    assert_eq!((region.width, region.height), (16, 8));
    assert_eq!(region.components.len(), 1);

    let parameters = codec.parameters.unwrap();
    assert_eq!(parameters.tile, None);
    assert_eq!(
        (parameters.x0, parameters.y0, parameters.x1, parameters.y1),
        (16, 8, 48, 24)
    );
    assert_eq!(parameters.reduction, 1);
    assert_eq!(parameters.components.len(), 1);
    assert_eq!(parameters.components[0].index, 2);
    assert_eq!(parameters.tile_parts.len(), 1);
}

#[test]
fn test_header_only_document_is_refused() {
    let raw = document(codestream(64, 64, 3), true);
    let jp2 = document(jp2_file(), true);
    let mut codec = RecordingCodec::default();

    match raw.read_region(&mut codec, &RegionRequest::tile(0)) {
        Err(JP2Error::Region(reason)) => assert!(reason.contains("header_only")),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(matches!(
        jp2.read_region(&mut codec, &RegionRequest::window(0..10, 0..10)),
        Err(JP2Error::Region(_))
    ));
    assert!(codec.parameters.is_none());
}

#[test]
fn test_tile_out_of_range() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    let result = document.read_region(&mut codec, &RegionRequest::tile(4));
    assert!(matches!(result, Err(JP2Error::Region(_))));
    assert!(codec.parameters.is_none());
}

#[test]
fn test_reduction_beyond_decomposition_levels() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    let request = RegionRequest::tile(0).with_reduction(6);
    assert!(matches!(
        document.read_region(&mut codec, &request),
        Err(JP2Error::Region(_))
    ));

    let request = RegionRequest::tile(0).with_reduction(5);
    assert!(document.read_region(&mut codec, &request).is_ok());
}

#[test]
fn test_component_out_of_range() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    let request = RegionRequest::tile(0).with_components(vec![0, 3]);
    assert!(matches!(
        document.read_region(&mut codec, &request),
        Err(JP2Error::Region(_))
    ));

    let request = RegionRequest::tile(0).with_components(vec![]);
    assert!(matches!(
        document.read_region(&mut codec, &request),
        Err(JP2Error::Region(_))
    ));
}

#[test]
fn test_window_out_of_bounds() {
    let document = document(tiled_codestream(), false);
    let mut codec = RecordingCodec::default();

    for request in [
        RegionRequest::window(0..65, 0..64),
        RegionRequest::window(0..64, 10..10),
        RegionRequest::window(32..16, 0..64),
    ] {
        assert!(matches!(
            document.read_region(&mut codec, &request),
            Err(JP2Error::Region(_))
        ));
    }
}

#[test]
fn test_codec_failure() {
    let document = document(tiled_codestream(), false);

    match document.read_region(&mut FailingCodec, &RegionRequest::tile(0)) {
        Err(JP2Error::Codec(error)) => {
            assert_eq!(error.to_string(), "code-block decoding is not supported");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_region_from_jp2_file() {
    let document = document(jp2_file(), false);
    let mut codec = RecordingCodec::default();

    document
        .read_region(&mut codec, &RegionRequest::window(0..10, 0..10))
        .unwrap();

    let parameters = codec.parameters.unwrap();
    assert_eq!(parameters.codestream_offset, 85);
    assert_eq!(parameters.tile_parts[0].offset(), 85 + 74);
}
