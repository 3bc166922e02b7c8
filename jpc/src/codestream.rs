use crate::coding_style::{CodingStyleComponentSegment, CodingStyleMarkerSegment};
use crate::diagnostics::Diagnostics;
use crate::marker::{decode_segment, is_unframed, MarkerSegment, UnknownMarkerSegment};
use crate::quantization::{QuantizationComponentSegment, QuantizationDefaultMarkerSegment};
use crate::reader::ByteReader;
use crate::size::ImageAndTileSizeMarkerSegment;
use crate::tile::StartOfPacketSegment;
use crate::*;
use log::{debug, info};
use std::io;

/// Byte range of one tile-part within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePart {
    tile_index: u16,
    tile_part_index: u8,

    // Absolute offset of the SOT marker.
    offset: u64,

    // Absolute offset of the first byte after the SOD marker.
    data_offset: u64,

    // Absolute offset one past the last byte of the tile-part.
    end: u64,
}

impl TilePart {
    pub fn tile_index(&self) -> u16 {
        self.tile_index
    }

    pub fn tile_part_index(&self) -> u8 {
        self.tile_part_index
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn length(&self) -> u64 {
        self.end - self.offset
    }

    pub fn data_length(&self) -> u64 {
        self.end - self.data_offset
    }
}

// Contiguous Codestream
//
// The codestream is a linear stream of bits from the first bit to the last
// bit. It is divided into marker segments: a main header starting with SOC,
// tile-part headers each starting with SOT and ending with SOD followed by the
// tile-part's packet data, and finally EOC.
#[derive(Debug, Clone, PartialEq)]
pub struct Codestream {
    offset: u64,
    length: u64,
    segments: Vec<MarkerSegment>,
    tile_parts: Vec<TilePart>,
    header_only: bool,
}

impl Codestream {
    /// A codestream assembled from segments, for writing.
    pub fn new(segments: Vec<MarkerSegment>) -> Self {
        Codestream {
            offset: 0,
            length: 0,
            segments,
            tile_parts: vec![],
            header_only: true,
        }
    }

    /// Decodes a codestream running from the reader's position to the end of
    /// the source.
    pub fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        header_only: bool,
        diagnostics: &mut Diagnostics,
    ) -> Result<Codestream, CodestreamError> {
        let length = reader.remaining_bytes()?;
        decode(reader, length, header_only, diagnostics)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of bytes consumed by the parse.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn segments(&self) -> &[MarkerSegment] {
        &self.segments
    }

    pub fn header_only(&self) -> bool {
        self.header_only
    }

    pub fn tile_parts(&self) -> &[TilePart] {
        &self.tile_parts
    }

    /// Segments of the main header, from SOC up to the first SOT.
    pub fn main_header(&self) -> &[MarkerSegment] {
        let end = self
            .segments
            .iter()
            .position(|segment| {
                matches!(
                    segment,
                    MarkerSegment::StartOfTile(_) | MarkerSegment::StartOfData { .. }
                )
            })
            .unwrap_or(self.segments.len());
        &self.segments[..end]
    }

    pub fn image_and_tile_size_marker_segment(&self) -> Option<&ImageAndTileSizeMarkerSegment> {
        self.main_header().iter().find_map(|segment| match segment {
            MarkerSegment::ImageAndTileSize(siz) => Some(siz),
            _ => None,
        })
    }

    pub fn coding_style_marker_segment(&self) -> Option<&CodingStyleMarkerSegment> {
        self.main_header().iter().find_map(|segment| match segment {
            MarkerSegment::CodingStyle(cod) => Some(cod),
            _ => None,
        })
    }

    pub fn coding_style_component_segment(
        &self,
        component_index: u16,
    ) -> Option<&CodingStyleComponentSegment> {
        self.main_header().iter().find_map(|segment| match segment {
            MarkerSegment::CodingStyleComponent(coc)
                if coc.component_index() == component_index =>
            {
                Some(coc)
            }
            _ => None,
        })
    }

    pub fn quantization_default_marker_segment(&self) -> Option<&QuantizationDefaultMarkerSegment> {
        self.main_header().iter().find_map(|segment| match segment {
            MarkerSegment::QuantizationDefault(qcd) => Some(qcd),
            _ => None,
        })
    }

    pub fn quantization_component_segment(
        &self,
        component_index: u16,
    ) -> Option<&QuantizationComponentSegment> {
        self.main_header().iter().find_map(|segment| match segment {
            MarkerSegment::QuantizationComponent(qcc)
                if qcc.component_index() == component_index =>
            {
                Some(qcc)
            }
            _ => None,
        })
    }

    /// Writes every segment in order.
    ///
    /// Packet data is not retained by a parse, so only codestreams decoded in
    /// header-only mode or assembled with `Codestream::new` can be written.
    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        self.validate()?;
        for segment in &self.segments {
            segment.encode(writer)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), CodestreamError> {
        if !self.header_only {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_SOD,
                "packet data of a fully parsed codestream is not retained",
            ));
        }
        match self.segments.first() {
            Some(MarkerSegment::StartOfCodestream { .. }) => {}
            _ => return Err(CodestreamError::MarkerMissing(MARKER_SYMBOL_SOC)),
        }
        let siz = match self.segments.get(1) {
            Some(MarkerSegment::ImageAndTileSize(siz)) => siz,
            _ => return Err(CodestreamError::MarkerMissing(MARKER_SYMBOL_SIZ)),
        };
        for segment in &self.segments {
            if let MarkerSegment::CodingStyle(cod) = segment {
                cod.validate(siz.no_components())?;
            }
        }
        Ok(())
    }
}

// The tile-part being decoded, from its SOT marker segment.
struct OpenTilePart {
    offset: u64,
    psot: u32,
    tile_index: u16,
    tile_part_index: u8,
    sop: bool,
    eph: bool,
}

pub(crate) fn decode<R: io::Read + io::Seek>(
    reader: &mut R,
    length: u64,
    header_only: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Codestream, CodestreamError> {
    let start = reader.byte_offset()?;
    let end = start + length;

    if length < 2 {
        return Err(CodestreamError::Truncated { offset: start });
    }

    // The main header is found at the beginning of the codestream and always
    // starts with SOC.
    let marker: MarkerSymbol = reader.read_array()?;
    if marker != MARKER_SYMBOL_SOC {
        return Err(CodestreamError::MarkerUnexpected {
            marker,
            offset: start,
        });
    }
    info!("SOC start at byte offset {}", start);

    let mut segments = vec![MarkerSegment::StartOfCodestream { offset: start }];
    let mut tile_parts = vec![];
    let mut no_components: u16 = 0;
    let mut main_sop = false;
    let mut main_eph = false;
    let mut open_tile_part: Option<OpenTilePart> = None;

    loop {
        let offset = reader.byte_offset()?;
        if offset >= end {
            if header_only {
                diagnostics.warn(offset, "codestream header ends without an SOD marker");
            } else {
                diagnostics.warn(offset, "codestream ends without an EOC marker");
            }
            break;
        }
        if end - offset < 2 {
            diagnostics.warn(offset, "trailing byte after the last marker");
            break;
        }

        let marker: MarkerSymbol = reader.read_array()?;
        if marker[0] != 0xFF {
            return Err(CodestreamError::InvalidMarker { marker, offset });
        }

        match marker {
            MARKER_SYMBOL_SOC => {
                diagnostics.warn(offset, "repeated SOC marker");
                segments.push(MarkerSegment::StartOfCodestream { offset });
            }
            MARKER_SYMBOL_EOC => {
                info!("EOC at byte offset {}", offset);
                segments.push(MarkerSegment::EndOfCodestream { offset });
                break;
            }
            MARKER_SYMBOL_EPH => {
                segments.push(MarkerSegment::EndOfPacketHeader { offset });
            }
            MARKER_SYMBOL_SOD => {
                info!("SOD at byte offset {}", offset);
                segments.push(MarkerSegment::StartOfData { offset });
                if header_only {
                    break;
                }

                let tile_part = match open_tile_part.take() {
                    Some(tile_part) => tile_part,
                    None => {
                        return Err(CodestreamError::MarkerUnexpected {
                            marker: MARKER_SYMBOL_SOD,
                            offset,
                        })
                    }
                };
                let data_offset = reader.byte_offset()?;
                let tile_end = tile_part_end(reader, &tile_part, data_offset, end)?;

                if tile_part.sop || tile_part.eph {
                    find_packet_markers(
                        reader,
                        data_offset,
                        tile_end,
                        tile_part.sop,
                        tile_part.eph,
                        &mut segments,
                    )?;
                }

                debug!(
                    "tile {} part {} data from byte offset {} to {}",
                    tile_part.tile_index, tile_part.tile_part_index, data_offset, tile_end
                );
                tile_parts.push(TilePart {
                    tile_index: tile_part.tile_index,
                    tile_part_index: tile_part.tile_part_index,
                    offset: tile_part.offset,
                    data_offset,
                    end: tile_end,
                });
                reader.seek_to(tile_end)?;
            }
            _ if is_unframed(marker) => {
                segments.push(MarkerSegment::Unknown(UnknownMarkerSegment::decoded(
                    marker,
                    offset,
                    0,
                    vec![],
                )));
            }
            _ => {
                // Every other marker is followed by a length parameter that
                // counts itself but not the marker.
                if end - offset < 4 {
                    return Err(CodestreamError::Truncated { offset });
                }
                let length = reader.read_u16()?;
                if length < 2 || offset + 2 + length as u64 > end {
                    return Err(CodestreamError::InvalidMarker { marker, offset });
                }
                let body = reader
                    .read_bytes(length as u64 - 2)
                    .map_err(|_| CodestreamError::Truncated { offset })?;

                let segment = match decode_segment(
                    marker,
                    offset,
                    length,
                    body.clone(),
                    no_components,
                    diagnostics,
                ) {
                    Ok(segment) => segment,
                    Err(error) => {
                        diagnostics.warn(offset, format!("{}, kept as opaque bytes", error));
                        MarkerSegment::Unknown(UnknownMarkerSegment::decoded(
                            marker, offset, length, body,
                        ))
                    }
                };

                match &segment {
                    MarkerSegment::ImageAndTileSize(siz) => {
                        if segments.len() != 1 {
                            diagnostics.warn(offset, "SIZ does not directly follow SOC");
                        }
                        no_components = siz.no_components();
                    }
                    MarkerSegment::CodingStyle(cod) => {
                        if no_components > 0 {
                            if let Err(error) = cod.validate(no_components) {
                                diagnostics.warn(offset, error.to_string());
                            }
                        }
                        match open_tile_part.as_mut() {
                            Some(tile_part) => {
                                tile_part.sop = cod.uses_sop();
                                tile_part.eph = cod.uses_eph();
                            }
                            None => {
                                main_sop = cod.uses_sop();
                                main_eph = cod.uses_eph();
                            }
                        }
                    }
                    MarkerSegment::StartOfTile(sot) => {
                        if let Some(previous) = &open_tile_part {
                            diagnostics.warn(
                                previous.offset,
                                "tile-part header without an SOD marker",
                            );
                        }
                        open_tile_part = Some(OpenTilePart {
                            offset,
                            psot: sot.tile_length(),
                            tile_index: sot.tile_index(),
                            tile_part_index: sot.tile_part_index(),
                            sop: main_sop,
                            eph: main_eph,
                        });
                    }
                    _ => {}
                }

                segments.push(segment);
            }
        }
    }

    let length = reader.byte_offset()? - start;
    Ok(Codestream {
        offset: start,
        length,
        segments,
        tile_parts,
        header_only,
    })
}

// The end of a tile-part is Psot bytes after its SOT marker. A Psot of zero
// means the tile-part runs up to the next SOT marker or the EOC marker.
fn tile_part_end<R: io::Read + io::Seek>(
    reader: &mut R,
    tile_part: &OpenTilePart,
    data_offset: u64,
    end: u64,
) -> Result<u64, CodestreamError> {
    if tile_part.psot == 0 {
        let data = reader.read_bytes(end - data_offset)?;
        reader.seek_to(data_offset)?;
        let position = data
            .windows(2)
            .position(|pair| pair == MARKER_SYMBOL_SOT || pair == MARKER_SYMBOL_EOC);
        return Ok(match position {
            Some(position) => data_offset + position as u64,
            None => end,
        });
    }

    let tile_end = tile_part.offset + tile_part.psot as u64;
    if tile_end > end {
        return Err(CodestreamError::TilePartOverrun {
            offset: tile_part.offset,
            psot: tile_part.psot,
            end,
        });
    }
    if tile_end < data_offset {
        return Err(CodestreamError::marker(
            MARKER_SYMBOL_SOT,
            format!(
                "Psot of {} ends inside the tile-part header at byte offset {}",
                tile_part.psot, tile_part.offset
            ),
        ));
    }
    Ok(tile_end)
}

// Records the SOP marker segments and EPH markers found in the packet data of
// one tile-part. Coded data never contains a 0xFF byte followed by a value
// above 0x8F, so any such pair is a marker.
fn find_packet_markers<R: io::Read + io::Seek>(
    reader: &mut R,
    data_offset: u64,
    tile_end: u64,
    sop: bool,
    eph: bool,
    segments: &mut Vec<MarkerSegment>,
) -> Result<(), CodestreamError> {
    let data = reader.read_bytes(tile_end - data_offset)?;

    let mut i = 0;
    while i + 1 < data.len() {
        let offset = data_offset + i as u64;
        match [data[i], data[i + 1]] {
            MARKER_SYMBOL_SOP if sop && i + 6 <= data.len() && data[i + 2..i + 4] == [0, 4] => {
                let sequence_number = u16::from_be_bytes([data[i + 4], data[i + 5]]);
                segments.push(MarkerSegment::StartOfPacket(StartOfPacketSegment::found(
                    offset,
                    sequence_number,
                )));
                i += 6;
            }
            MARKER_SYMBOL_EPH if eph => {
                segments.push(MarkerSegment::EndOfPacketHeader { offset });
                i += 2;
            }
            _ => i += 1,
        }
    }

    Ok(())
}
