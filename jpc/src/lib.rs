use std::io;
use thiserror::Error;

mod codestream;
mod coding_style;
mod diagnostics;
mod informational;
mod marker;
mod pointer;
mod progression;
mod quantization;
mod reader;
mod region;
mod size;
mod tile;

pub use codestream::{Codestream, TilePart};
pub use coding_style::{
    CodingBlockStyle, CodingStyleComponentSegment, CodingStyleMarkerSegment,
    CodingStyleParameters, MultipleComponentTransformation, PrecinctSize, ProgressionOrder,
    TransformationFilter,
};
pub use diagnostics::{Diagnostics, Warning};
pub use informational::{
    CommentMarkerSegment, CommentRegistrationValue, ComponentRegistrationSegment,
};
pub use marker::{MarkerSegment, UnknownMarkerSegment};
pub use pointer::{
    PackedPacketHeaderSegment, PacketLengthSegment, TilePackedPacketHeaderSegment,
    TilePacketLengthSegment, TilePartLength, TilePartLengthsSegment,
};
pub use progression::{Progression, ProgressionOrderChangeSegment};
pub use quantization::{
    QuantizationComponentSegment, QuantizationDefaultMarkerSegment, QuantizationStyle,
    QuantizationValue,
};
pub use reader::ByteReader;
pub use region::{RegionOfInterestSegment, RegionOfInterestStyle};
pub use size::{ComponentSize, DecoderCapability, ImageAndTileSizeMarkerSegment, TileBounds};
pub use tile::{StartOfPacketSegment, StartOfTileSegment};

#[derive(Debug, Error)]
pub enum CodestreamError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("codestream truncated at byte offset {offset}")]
    Truncated { offset: u64 },

    #[error("unexpected marker 0x{:0>2X}{:0>2X} at byte offset {offset}", .marker[0], .marker[1])]
    MarkerUnexpected { marker: MarkerSymbol, offset: u64 },

    #[error("invalid marker 0x{:0>2X}{:0>2X} at byte offset {offset}", .marker[0], .marker[1])]
    InvalidMarker { marker: MarkerSymbol, offset: u64 },

    #[error("required marker 0x{:0>2X}{:0>2X} is missing", .0[0], .0[1])]
    MarkerMissing(MarkerSymbol),

    #[error("tile-part at byte offset {offset} with Psot = {psot} extends past the end of the codestream at byte offset {end}")]
    TilePartOverrun { offset: u64, psot: u32, end: u64 },

    #[error("marker 0x{:0>2X}{:0>2X} error {error:?}", .marker[0], .marker[1])]
    MarkerError { marker: MarkerSymbol, error: String },

    // XTsiz + XTOsiz > XOsiz
    // YTsiz + YTOsiz > YOsiz
    #[error("tile size overflow: XOsiz = {image_horizontal_offset:?}, YOsiz = {image_vertical_offset:?}, XTOsiz = {tile_horizontal_offset:?}, YTOsiz = {tile_vertical_offset:?}, XTsiz = {reference_tile_width:?}, YTsiz = {reference_tile_height:?}")]
    TileSizeOverflow {
        image_horizontal_offset: u32,
        image_vertical_offset: u32,
        tile_horizontal_offset: u32,
        tile_vertical_offset: u32,
        reference_tile_width: u32,
        reference_tile_height: u32,
    },

    #[error("tile grid offset overflow: XOsiz = {image_horizontal_offset:?}, YOsiz = {image_vertical_offset:?}, XTOsiz = {tile_horizontal_offset:?}, YTOsiz = {tile_vertical_offset:?}")]
    TileGridOffsetOverflow {
        tile_horizontal_offset: u32,
        tile_vertical_offset: u32,
        image_horizontal_offset: u32,
        image_vertical_offset: u32,
    },
}

impl CodestreamError {
    pub(crate) fn marker(marker: MarkerSymbol, error: impl Into<String>) -> Self {
        CodestreamError::MarkerError {
            marker,
            error: error.into(),
        }
    }
}

pub type MarkerSymbol = [u8; 2];

// Delimiting markers and marker segments
pub const MARKER_SYMBOL_SOC: MarkerSymbol = [255, 79]; // Start of code stream
pub const MARKER_SYMBOL_SOT: MarkerSymbol = [255, 144]; // Start of tile-part
pub const MARKER_SYMBOL_SOD: MarkerSymbol = [255, 147]; // Start of data
pub const MARKER_SYMBOL_EOC: MarkerSymbol = [255, 217]; // End of codestream

// Fixed information marker segments
pub const MARKER_SYMBOL_SIZ: MarkerSymbol = [255, 81]; // Image and tile size

// Functional marker segments
pub const MARKER_SYMBOL_COD: MarkerSymbol = [255, 82]; // Coding style default
pub const MARKER_SYMBOL_COC: MarkerSymbol = [255, 83]; // Coding style component
pub const MARKER_SYMBOL_RGN: MarkerSymbol = [255, 94]; // Region-of-interest
pub const MARKER_SYMBOL_QCD: MarkerSymbol = [255, 92]; // Quantization default
pub const MARKER_SYMBOL_QCC: MarkerSymbol = [255, 93]; // Quantization component
pub const MARKER_SYMBOL_POC: MarkerSymbol = [255, 95]; // Progression order change

// Pointer marker segments
pub const MARKER_SYMBOL_TLM: MarkerSymbol = [255, 85]; // Tile-part lengths
pub const MARKER_SYMBOL_PLM: MarkerSymbol = [255, 87]; // Packet length, main header
pub const MARKER_SYMBOL_PLT: MarkerSymbol = [255, 88]; // Packet length, tile-part header
pub const MARKER_SYMBOL_PPM: MarkerSymbol = [255, 96]; // Packed packet headers, main header
pub const MARKER_SYMBOL_PPT: MarkerSymbol = [255, 97]; // Packed packet headers, tile-part header

// In bit stream markers and marker segments
pub const MARKER_SYMBOL_SOP: MarkerSymbol = [255, 145]; // Start of packet
pub const MARKER_SYMBOL_EPH: MarkerSymbol = [255, 146]; // End of packet header

// Informational marker segments
pub const MARKER_SYMBOL_CRG: MarkerSymbol = [255, 99]; // Component registration
pub const MARKER_SYMBOL_COM: MarkerSymbol = [255, 100]; // Comment

/// Decodes a codestream occupying the next `length` bytes of `reader`.
///
/// With `header_only` set, decoding stops after the first SOD marker. Byte
/// offsets recorded on each segment are absolute positions in `reader`.
pub fn decode_jpc<R: io::Read + io::Seek>(
    reader: &mut R,
    length: u64,
    header_only: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Codestream, CodestreamError> {
    codestream::decode(reader, length, header_only, diagnostics)
}
