use crate::coding_style::{CodingStyleComponentSegment, CodingStyleMarkerSegment};
use crate::diagnostics::Diagnostics;
use crate::informational::{CommentMarkerSegment, ComponentRegistrationSegment};
use crate::pointer::{
    PackedPacketHeaderSegment, PacketLengthSegment, TilePackedPacketHeaderSegment,
    TilePacketLengthSegment, TilePartLengthsSegment,
};
use crate::progression::ProgressionOrderChangeSegment;
use crate::quantization::{QuantizationComponentSegment, QuantizationDefaultMarkerSegment};
use crate::reader::ByteReader;
use crate::region::RegionOfInterestSegment;
use crate::size::ImageAndTileSizeMarkerSegment;
use crate::tile::{StartOfPacketSegment, StartOfTileSegment};
use crate::*;
use std::io;

/// One marker or marker segment of a codestream, in byte order.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerSegment {
    StartOfCodestream { offset: u64 },
    ImageAndTileSize(ImageAndTileSizeMarkerSegment),
    CodingStyle(CodingStyleMarkerSegment),
    CodingStyleComponent(CodingStyleComponentSegment),
    QuantizationDefault(QuantizationDefaultMarkerSegment),
    QuantizationComponent(QuantizationComponentSegment),
    RegionOfInterest(RegionOfInterestSegment),
    ProgressionOrderChange(ProgressionOrderChangeSegment),
    TilePartLengths(TilePartLengthsSegment),
    PacketLength(PacketLengthSegment),
    TilePacketLength(TilePacketLengthSegment),
    PackedPacketHeader(PackedPacketHeaderSegment),
    TilePackedPacketHeader(TilePackedPacketHeaderSegment),
    ComponentRegistration(ComponentRegistrationSegment),
    Comment(CommentMarkerSegment),
    StartOfTile(StartOfTileSegment),
    StartOfPacket(StartOfPacketSegment),
    EndOfPacketHeader { offset: u64 },
    StartOfData { offset: u64 },
    EndOfCodestream { offset: u64 },
    Unknown(UnknownMarkerSegment),
}

impl MarkerSegment {
    pub fn marker(&self) -> MarkerSymbol {
        match self {
            Self::StartOfCodestream { .. } => MARKER_SYMBOL_SOC,
            Self::ImageAndTileSize(_) => MARKER_SYMBOL_SIZ,
            Self::CodingStyle(_) => MARKER_SYMBOL_COD,
            Self::CodingStyleComponent(_) => MARKER_SYMBOL_COC,
            Self::QuantizationDefault(_) => MARKER_SYMBOL_QCD,
            Self::QuantizationComponent(_) => MARKER_SYMBOL_QCC,
            Self::RegionOfInterest(_) => MARKER_SYMBOL_RGN,
            Self::ProgressionOrderChange(_) => MARKER_SYMBOL_POC,
            Self::TilePartLengths(_) => MARKER_SYMBOL_TLM,
            Self::PacketLength(_) => MARKER_SYMBOL_PLM,
            Self::TilePacketLength(_) => MARKER_SYMBOL_PLT,
            Self::PackedPacketHeader(_) => MARKER_SYMBOL_PPM,
            Self::TilePackedPacketHeader(_) => MARKER_SYMBOL_PPT,
            Self::ComponentRegistration(_) => MARKER_SYMBOL_CRG,
            Self::Comment(_) => MARKER_SYMBOL_COM,
            Self::StartOfTile(_) => MARKER_SYMBOL_SOT,
            Self::StartOfPacket(_) => MARKER_SYMBOL_SOP,
            Self::EndOfPacketHeader { .. } => MARKER_SYMBOL_EPH,
            Self::StartOfData { .. } => MARKER_SYMBOL_SOD,
            Self::EndOfCodestream { .. } => MARKER_SYMBOL_EOC,
            Self::Unknown(segment) => segment.marker(),
        }
    }

    /// Three letter mnemonic of the marker, or the hexadecimal code for
    /// markers this crate does not model.
    pub fn marker_id(&self) -> String {
        let id = match self {
            Self::StartOfCodestream { .. } => "SOC",
            Self::ImageAndTileSize(_) => "SIZ",
            Self::CodingStyle(_) => "COD",
            Self::CodingStyleComponent(_) => "COC",
            Self::QuantizationDefault(_) => "QCD",
            Self::QuantizationComponent(_) => "QCC",
            Self::RegionOfInterest(_) => "RGN",
            Self::ProgressionOrderChange(_) => "POD",
            Self::TilePartLengths(_) => "TLM",
            Self::PacketLength(_) => "PLM",
            Self::TilePacketLength(_) => "PLT",
            Self::PackedPacketHeader(_) => "PPM",
            Self::TilePackedPacketHeader(_) => "PPT",
            Self::ComponentRegistration(_) => "CRG",
            Self::Comment(_) => "CME",
            Self::StartOfTile(_) => "SOT",
            Self::StartOfPacket(_) => "SOP",
            Self::EndOfPacketHeader { .. } => "EPH",
            Self::StartOfData { .. } => "SOD",
            Self::EndOfCodestream { .. } => "EOC",
            Self::Unknown(segment) => {
                return format!("0x{:0>2x}{:0>2x}", segment.marker[0], segment.marker[1])
            }
        };
        id.to_string()
    }

    /// Absolute byte offset of the marker code.
    pub fn offset(&self) -> u64 {
        match self {
            Self::StartOfCodestream { offset }
            | Self::EndOfPacketHeader { offset }
            | Self::StartOfData { offset }
            | Self::EndOfCodestream { offset } => *offset,
            Self::ImageAndTileSize(segment) => segment.offset(),
            Self::CodingStyle(segment) => segment.offset(),
            Self::CodingStyleComponent(segment) => segment.offset(),
            Self::QuantizationDefault(segment) => segment.offset(),
            Self::QuantizationComponent(segment) => segment.offset(),
            Self::RegionOfInterest(segment) => segment.offset(),
            Self::ProgressionOrderChange(segment) => segment.offset(),
            Self::TilePartLengths(segment) => segment.offset(),
            Self::PacketLength(segment) => segment.offset(),
            Self::TilePacketLength(segment) => segment.offset(),
            Self::PackedPacketHeader(segment) => segment.offset(),
            Self::TilePackedPacketHeader(segment) => segment.offset(),
            Self::ComponentRegistration(segment) => segment.offset(),
            Self::Comment(segment) => segment.offset(),
            Self::StartOfTile(segment) => segment.offset(),
            Self::StartOfPacket(segment) => segment.offset(),
            Self::Unknown(segment) => segment.offset(),
        }
    }

    /// The marker segment length parameter as encoded, zero for markers
    /// without a length field.
    pub fn length(&self) -> u16 {
        match self {
            Self::StartOfCodestream { .. }
            | Self::EndOfPacketHeader { .. }
            | Self::StartOfData { .. }
            | Self::EndOfCodestream { .. } => 0,
            Self::ImageAndTileSize(segment) => segment.length(),
            Self::CodingStyle(segment) => segment.length(),
            Self::CodingStyleComponent(segment) => segment.length(),
            Self::QuantizationDefault(segment) => segment.length(),
            Self::QuantizationComponent(segment) => segment.length(),
            Self::RegionOfInterest(segment) => segment.length(),
            Self::ProgressionOrderChange(segment) => segment.length(),
            Self::TilePartLengths(segment) => segment.length(),
            Self::PacketLength(segment) => segment.length(),
            Self::TilePacketLength(segment) => segment.length(),
            Self::PackedPacketHeader(segment) => segment.length(),
            Self::TilePackedPacketHeader(segment) => segment.length(),
            Self::ComponentRegistration(segment) => segment.length(),
            Self::Comment(segment) => segment.length(),
            Self::StartOfTile(segment) => segment.length(),
            Self::StartOfPacket(segment) => segment.length(),
            Self::Unknown(segment) => segment.length(),
        }
    }

    /// Writes the marker, its length parameter and its body. Field
    /// constraints are checked before anything is written.
    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        match self {
            Self::StartOfCodestream { .. }
            | Self::EndOfPacketHeader { .. }
            | Self::StartOfData { .. }
            | Self::EndOfCodestream { .. } => {
                writer.write_all(&self.marker())?;
                Ok(())
            }
            Self::ImageAndTileSize(segment) => segment.encode(writer),
            Self::CodingStyle(segment) => segment.encode(writer),
            Self::CodingStyleComponent(segment) => segment.encode(writer),
            Self::QuantizationDefault(segment) => segment.encode(writer),
            Self::QuantizationComponent(segment) => segment.encode(writer),
            Self::RegionOfInterest(segment) => segment.encode(writer),
            Self::ProgressionOrderChange(segment) => segment.encode(writer),
            Self::TilePartLengths(segment) => segment.encode(writer),
            Self::PacketLength(segment) => segment.encode(writer),
            Self::TilePacketLength(segment) => segment.encode(writer),
            Self::PackedPacketHeader(segment) => segment.encode(writer),
            Self::TilePackedPacketHeader(segment) => segment.encode(writer),
            Self::ComponentRegistration(segment) => segment.encode(writer),
            Self::Comment(segment) => segment.encode(writer),
            Self::StartOfTile(segment) => segment.encode(writer),
            Self::StartOfPacket(segment) => segment.encode(writer),
            Self::Unknown(segment) => segment.encode(writer),
        }
    }
}

/// A marker this crate does not model.
///
/// Markers in the reserved range 0xFF30 to 0xFF3F carry no length parameter;
/// every other unknown marker is assumed to follow the standard framing and
/// keeps its body verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMarkerSegment {
    marker: MarkerSymbol,
    offset: u64,
    length: u16,
    data: Vec<u8>,
}

impl UnknownMarkerSegment {
    pub fn new(marker: MarkerSymbol, data: Vec<u8>) -> Self {
        let length = if is_unframed(marker) {
            0
        } else {
            (data.len() + 2) as u16
        };
        UnknownMarkerSegment {
            marker,
            offset: 0,
            length,
            data,
        }
    }

    pub(crate) fn decoded(marker: MarkerSymbol, offset: u64, length: u16, data: Vec<u8>) -> Self {
        UnknownMarkerSegment {
            marker,
            offset,
            length,
            data,
        }
    }

    pub fn marker(&self) -> MarkerSymbol {
        self.marker
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        if is_unframed(self.marker) {
            if !self.data.is_empty() {
                return Err(CodestreamError::marker(
                    self.marker,
                    "reserved markers have no segment body",
                ));
            }
            writer.write_all(&self.marker)?;
            return Ok(());
        }
        let length = encoded_length(self.marker, 2 + self.data.len())?;
        write_marker_header(writer, self.marker, length)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

/// Markers that are never followed by a length parameter.
pub(crate) fn is_unframed(marker: MarkerSymbol) -> bool {
    matches!(
        marker,
        MARKER_SYMBOL_SOC | MARKER_SYMBOL_SOD | MARKER_SYMBOL_EOC | MARKER_SYMBOL_EPH
    ) || (marker[0] == 0xFF && (0x30..=0x3F).contains(&marker[1]))
}

pub(crate) fn write_marker_header<W: io::Write>(
    writer: &mut W,
    marker: MarkerSymbol,
    length: u16,
) -> Result<(), CodestreamError> {
    writer.write_all(&marker)?;
    writer.write_all(&length.to_be_bytes())?;
    Ok(())
}

/// Checks that a computed segment length fits the 16 bit length parameter.
pub(crate) fn encoded_length(marker: MarkerSymbol, length: usize) -> Result<u16, CodestreamError> {
    if length > u16::MAX as usize {
        return Err(CodestreamError::marker(
            marker,
            format!("segment length {} exceeds 65535 bytes", length),
        ));
    }
    Ok(length as u16)
}

// Component indices (Ccoc, Cqcc, Crgn, CSpoc, CEpoc) are 8 bits when Csiz < 257
// and 16 bits otherwise.
pub(crate) fn component_index_size(no_components: u16) -> usize {
    if no_components < 257 {
        1
    } else {
        2
    }
}

pub(crate) fn decode_component_index<R: io::Read + io::Seek>(
    reader: &mut R,
    index_size: usize,
) -> io::Result<u16> {
    if index_size == 1 {
        Ok(reader.read_u8()? as u16)
    } else {
        reader.read_u16()
    }
}

pub(crate) fn encode_component_index(buffer: &mut Vec<u8>, index: u16, index_size: usize) {
    if index_size == 1 {
        buffer.push(index as u8);
    } else {
        buffer.extend_from_slice(&index.to_be_bytes());
    }
}

/// Decodes the body of a length framed marker segment.
///
/// `body` holds exactly `length - 2` bytes, so no segment decoder can read
/// past the segment's declared length.
pub(crate) fn decode_segment(
    marker: MarkerSymbol,
    offset: u64,
    length: u16,
    body: Vec<u8>,
    no_components: u16,
    diagnostics: &mut Diagnostics,
) -> Result<MarkerSegment, CodestreamError> {
    let reader = &mut io::Cursor::new(body);
    let segment = match marker {
        MARKER_SYMBOL_SIZ => MarkerSegment::ImageAndTileSize(
            ImageAndTileSizeMarkerSegment::decode(reader, offset, length, diagnostics)?,
        ),
        MARKER_SYMBOL_COD => MarkerSegment::CodingStyle(CodingStyleMarkerSegment::decode(
            reader,
            offset,
            length,
            diagnostics,
        )?),
        MARKER_SYMBOL_COC => {
            MarkerSegment::CodingStyleComponent(CodingStyleComponentSegment::decode(
                reader,
                offset,
                length,
                no_components,
                diagnostics,
            )?)
        }
        MARKER_SYMBOL_QCD => MarkerSegment::QuantizationDefault(
            QuantizationDefaultMarkerSegment::decode(reader, offset, length, diagnostics)?,
        ),
        MARKER_SYMBOL_QCC => {
            MarkerSegment::QuantizationComponent(QuantizationComponentSegment::decode(
                reader,
                offset,
                length,
                no_components,
                diagnostics,
            )?)
        }
        MARKER_SYMBOL_RGN => MarkerSegment::RegionOfInterest(RegionOfInterestSegment::decode(
            reader,
            offset,
            length,
            no_components,
        )?),
        MARKER_SYMBOL_POC => {
            MarkerSegment::ProgressionOrderChange(ProgressionOrderChangeSegment::decode(
                reader,
                offset,
                length,
                no_components,
            )?)
        }
        MARKER_SYMBOL_TLM => MarkerSegment::TilePartLengths(TilePartLengthsSegment::decode(
            reader, offset, length,
        )?),
        MARKER_SYMBOL_PLM => MarkerSegment::PacketLength(PacketLengthSegment::decode(
            reader, offset, length,
        )?),
        MARKER_SYMBOL_PLT => MarkerSegment::TilePacketLength(TilePacketLengthSegment::decode(
            reader, offset, length,
        )?),
        MARKER_SYMBOL_PPM => MarkerSegment::PackedPacketHeader(
            PackedPacketHeaderSegment::decode(reader, offset, length)?,
        ),
        MARKER_SYMBOL_PPT => MarkerSegment::TilePackedPacketHeader(
            TilePackedPacketHeaderSegment::decode(reader, offset, length)?,
        ),
        MARKER_SYMBOL_CRG => {
            MarkerSegment::ComponentRegistration(ComponentRegistrationSegment::decode(
                reader,
                offset,
                length,
                no_components,
                diagnostics,
            )?)
        }
        MARKER_SYMBOL_COM => MarkerSegment::Comment(CommentMarkerSegment::decode(
            reader, offset, length,
        )?),
        MARKER_SYMBOL_SOT => {
            MarkerSegment::StartOfTile(StartOfTileSegment::decode(reader, offset, length)?)
        }
        MARKER_SYMBOL_SOP => {
            MarkerSegment::StartOfPacket(StartOfPacketSegment::decode(reader, offset, length)?)
        }
        _ => {
            let body = reader.get_ref().clone();
            reader.set_position(body.len() as u64);
            MarkerSegment::Unknown(UnknownMarkerSegment::decoded(marker, offset, length, body))
        }
    };

    let consumed = reader.position();
    let available = reader.get_ref().len() as u64;
    if consumed < available {
        diagnostics.warn(
            offset,
            format!(
                "{} marker segment has {} unread trailing bytes",
                segment.marker_id(),
                available - consumed
            ),
        );
    }

    Ok(segment)
}
