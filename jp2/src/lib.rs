use jpc::{ByteReader, CodestreamError, Diagnostics};
use log::info;
use std::io;
use std::str;
use thiserror::Error;

mod codestream;
mod colour_specification;
mod document;
mod header;
mod image;
mod jpx;
mod metadata;
mod region;
mod resolution;
mod signature;
mod tree;
mod uuid;
mod validate;

pub use codestream::ContiguousCodestreamBox;
pub use colour_specification::{
    ColourSpecificationBox, ColourSpecificationMethods, EnumeratedColourSpaces,
};
pub use document::{wrap_codestream, DecodeOptions, Document};
pub use header::{decode_box_header, encode_box_header, BoxHeader};
pub use image::{
    BitDepth, BitsPerComponentBox, Channel, ChannelDefinitionBox, ChannelTypes, ComponentMap,
    ComponentMapType, ComponentMappingBox, GeneratedComponent, ImageHeaderBox, PaletteBox,
};
pub use jpx::{
    Association, DataReferenceBox, Fragment, FragmentListBox, NumberListBox, ReaderRequirementsBox,
    StandardFeature, VendorFeature,
};
pub use metadata::{FreeBox, IntellectualPropertyBox, LabelBox, UnknownBox, XMLBox};
pub use region::{
    ComponentParameters, DecodeParameters, DecodedRegion, PixelCodec, RegionRequest,
    RegionSelector,
};
pub use resolution::{CaptureResolutionBox, DefaultDisplayResolutionBox, GridResolution};
pub use signature::{FileTypeBox, SignatureBox};
pub use tree::{decode_boxes, long_name, BoxPayload, Jp2Box};
pub use uuid::{DataEntryURLBox, UUIDBox, UUIDListBox, UUID_XMP};
pub use validate::validate_jp2_box_sequence;

#[derive(Debug, Error)]
pub enum JP2Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid signature {signature:?} at offset {offset}")]
    InvalidSignature { signature: [u8; 4], offset: u64 },

    #[error("invalid brand '{}' at offset {offset}", box_type_str(.brand))]
    InvalidBrand { brand: [u8; 4], offset: u64 },

    #[error("'jp2 ' not found in compatibility list '{}'", .compatibility_list.join(", "))]
    NotCompatible { compatibility_list: Vec<String> },

    #[error("unexpected box type '{}' at offset {offset}", box_type_str(.box_type))]
    BoxUnexpected { box_type: BoxType, offset: u64 },

    #[error("unexpected duplicate box type '{}' at offset {offset}", box_type_str(.box_type))]
    BoxDuplicate { box_type: BoxType, offset: u64 },

    #[error("malformed box type '{}': {reason}", box_type_str(.box_type))]
    BoxMalformed { box_type: BoxType, reason: String },

    #[error("box type '{}' missing", box_type_str(.box_type))]
    BoxMissing { box_type: BoxType },

    #[error("a '{}' box cannot be nested in {parent}", box_type_str(.box_type))]
    BoxMisplaced { box_type: BoxType, parent: String },

    #[error("a '{}' box requires '{}' in the file type box", box_type_str(.box_type), box_type_str(.brand))]
    BrandRequired { box_type: BoxType, brand: [u8; 4] },

    #[error("cannot append a '{}' box: {reason}", box_type_str(.box_type))]
    AppendRefused { box_type: BoxType, reason: String },

    #[error(transparent)]
    Codestream(#[from] CodestreamError),

    #[error("invalid region request: {0}")]
    Region(String),

    #[error("pixel codec failed: {0}")]
    Codec(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl JP2Error {
    pub(crate) fn malformed(box_type: BoxType, reason: impl Into<String>) -> Self {
        JP2Error::BoxMalformed {
            box_type,
            reason: reason.into(),
        }
    }
}

pub type BoxType = [u8; 4];

/// Four character code of a box type, with non-printable bytes escaped.
pub fn box_type_str(box_type: &BoxType) -> String {
    match str::from_utf8(box_type) {
        Ok(value) if box_type.iter().all(|b| b.is_ascii_graphic() || *b == b' ') => {
            value.to_owned()
        }
        _ => format!("0x{:08x}", u32::from_be_bytes(*box_type)),
    }
}

// ISO/IEC 15444-1 Annex I
pub const BOX_TYPE_SIGNATURE: BoxType = *b"jP  ";
pub const BOX_TYPE_FILE_TYPE: BoxType = *b"ftyp";
pub const BOX_TYPE_HEADER: BoxType = *b"jp2h";
pub const BOX_TYPE_IMAGE_HEADER: BoxType = *b"ihdr";
pub const BOX_TYPE_BITS_PER_COMPONENT: BoxType = *b"bpcc";
pub const BOX_TYPE_COLOUR_SPECIFICATION: BoxType = *b"colr";
pub const BOX_TYPE_PALETTE: BoxType = *b"pclr";
pub const BOX_TYPE_COMPONENT_MAPPING: BoxType = *b"cmap";
pub const BOX_TYPE_CHANNEL_DEFINITION: BoxType = *b"cdef";
pub const BOX_TYPE_RESOLUTION: BoxType = *b"res ";
pub const BOX_TYPE_CAPTURE_RESOLUTION: BoxType = *b"resc";
pub const BOX_TYPE_DEFAULT_DISPLAY_RESOLUTION: BoxType = *b"resd";
pub const BOX_TYPE_CONTIGUOUS_CODESTREAM: BoxType = *b"jp2c";
pub const BOX_TYPE_INTELLECTUAL_PROPERTY: BoxType = *b"jp2i";
pub const BOX_TYPE_XML: BoxType = *b"xml ";
pub const BOX_TYPE_UUID: BoxType = *b"uuid";
pub const BOX_TYPE_UUID_INFO: BoxType = *b"uinf";
pub const BOX_TYPE_UUID_LIST: BoxType = *b"ulst";
pub const BOX_TYPE_DATA_ENTRY_URL: BoxType = *b"url ";

// ISO/IEC 15444-2 Annex M
pub const BOX_TYPE_ASSOCIATION: BoxType = *b"asoc";
pub const BOX_TYPE_LABEL: BoxType = *b"lbl ";
pub const BOX_TYPE_NUMBER_LIST: BoxType = *b"nlst";
pub const BOX_TYPE_READER_REQUIREMENTS: BoxType = *b"rreq";
pub const BOX_TYPE_CODESTREAM_HEADER: BoxType = *b"jpch";
pub const BOX_TYPE_COMPOSITING_LAYER_HEADER: BoxType = *b"jplh";
pub const BOX_TYPE_FRAGMENT_TABLE: BoxType = *b"ftbl";
pub const BOX_TYPE_FRAGMENT_LIST: BoxType = *b"flst";
pub const BOX_TYPE_DATA_REFERENCE: BoxType = *b"dtbl";
pub const BOX_TYPE_FREE: BoxType = *b"free";

// jp2\040
pub const BRAND_JP2: [u8; 4] = *b"jp2 ";

// jpx\040
pub const BRAND_JPX: [u8; 4] = *b"jpx ";

// Baseline JPX
pub const BRAND_JPXB: [u8; 4] = *b"jpxb";

// <CR><LF><0x87><LF> (0x0D0A 870A).
pub const SIGNATURE_MAGIC: [u8; 4] = [13, 10, 135, 10];

/// JPEG 2000 box trait.
///
/// The building-block of the JP2 file format is called a box.
///
/// All information contained within the JP2 file is encapsulated in boxes.
/// The definition of each specific box type defines the kinds of information
/// that may be found within a box of that type.
///
/// Implementations decode their payload from a reader positioned at the
/// first payload byte and bounded to the payload, and encode the payload
/// only: the box header is written by [`Jp2Box`].
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.4.
pub trait JBox {
    fn identifier(&self) -> BoxType;

    /// Decodes the payload. Offsets given to `diagnostics` are relative to
    /// the first payload byte.
    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error>;

    /// Number of bytes [`JBox::encode`] writes.
    fn payload_length(&self) -> u64;

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error>;
}

/// Decodes every box of a JP2 or JPX file.
///
/// The file must start with the 12 byte Signature box. Structural anomalies
/// further in are recorded on `diagnostics` and the affected boxes are
/// clamped or kept opaque.
pub fn decode_jp2<R: io::Read + io::Seek>(
    reader: &mut R,
    options: &DecodeOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Jp2Box>, JP2Error> {
    let start = reader.byte_offset()?;
    let end = start + reader.remaining_bytes()?;

    // For file verification purposes, this box can be considered a
    // fixed-length 12-byte string which shall have the value:
    // 0x0000 000C 6A50 2020 0D0A 870A.
    let length = reader.read_u32()?;
    let box_type: BoxType = reader.read_array()?;
    if length != 12 || box_type != BOX_TYPE_SIGNATURE {
        return Err(JP2Error::BoxUnexpected {
            box_type,
            offset: start,
        });
    }
    let signature: [u8; 4] = reader.read_array()?;
    if signature != SIGNATURE_MAGIC {
        return Err(JP2Error::InvalidSignature {
            signature,
            offset: start + 8,
        });
    }

    info!("JP2 start at byte offset {:?}", start);
    let boxes = tree::decode_boxes(reader, start, end, options, diagnostics)?;
    info!("JP2 end at byte offset {:?}", end);

    validate::inspect_jp2_box_sequence(&boxes, diagnostics);

    Ok(boxes)
}

/// Validates the box sequence then writes every box.
///
/// Nothing is written when validation or payload encoding fails.
pub fn encode_jp2<W: io::Write>(writer: &mut W, boxes: &[Jp2Box]) -> Result<(), JP2Error> {
    validate_jp2_box_sequence(boxes)?;

    let mut buffer = Vec::new();
    for jbox in boxes {
        jbox.encode(&mut buffer)?;
    }
    writer.write_all(&buffer)?;
    Ok(())
}
