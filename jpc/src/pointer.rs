use crate::marker::{encoded_length, write_marker_header};
use crate::reader::ByteReader;
use crate::*;
use log::info;
use std::cmp;
use std::io;

// Iplm and Iplt values are broken into 7-bit segments, sent from the most
// significant segment to the least significant. The high bit of each byte is
// set on every segment except the last one.
pub(crate) fn decode_packet_lengths(data: &[u8]) -> Vec<u32> {
    let mut packet_lengths = vec![];
    let mut packet_length: u32 = 0;
    for byte in data {
        packet_length = (packet_length << 7) | (byte & 0x7F) as u32;
        // 0xxx xxxx - Last 7 bits of packet length, terminate number
        if byte & 0x80 == 0 {
            packet_lengths.push(packet_length);
            packet_length = 0;
        }
    }
    packet_lengths
}

pub(crate) fn encode_packet_length(packet_length: u32, data: &mut Vec<u8>) {
    let mut groups = vec![(packet_length & 0x7F) as u8];
    let mut remainder = packet_length >> 7;
    while remainder != 0 {
        groups.push(0x80 | (remainder & 0x7F) as u8);
        remainder >>= 7;
    }
    data.extend(groups.iter().rev());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePartLength {
    // Ttlm^i: Tile index of the ith tile-part, absent when ST = 0 and the
    // tiles are in order with one tile-part each.
    tile_index: Option<u16>,

    // Ptlm^i: Length in bytes, from the beginning of the SOT marker of the ith
    // tile-part to the end of the bit stream data for that tile-part.
    tile_length: u32,
}

impl TilePartLength {
    pub fn new(tile_index: Option<u16>, tile_length: u32) -> Self {
        TilePartLength {
            tile_index,
            tile_length,
        }
    }

    pub fn tile_index(&self) -> Option<u16> {
        self.tile_index
    }

    pub fn tile_length(&self) -> u32 {
        self.tile_length
    }
}

// A.7.1
//
// Tile-part lengths (TLM)
//
// Function: Describes the length of every tile-part in the codestream. Each
// tile-part's length is measured from the first byte of the SOT marker segment
// to the end of the bit-stream data of that tile-part. The value of each
// individual tile-part length in the TLM marker segment is the same as the
// value in the corresponding Psot in the SOT marker segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePartLengthsSegment {
    offset: u64,

    // Ltlm: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Ztlm: Index of this marker segment relative to all other TLM marker
    // segments present in the current header.
    index: [u8; 1],

    // Stlm: Size of the Ttlm and Ptlm parameters
    parameter_sizes: [u8; 1],

    tile_part_lengths: Vec<TilePartLength>,
}

impl TilePartLengthsSegment {
    /// `tile_index_size` is the size of Ttlm in bytes (0, 1 or 2) and
    /// `tile_length_size` the size of Ptlm in bytes (2 or 4).
    pub fn new(
        index: u8,
        tile_index_size: u8,
        tile_length_size: u8,
        tile_part_lengths: Vec<TilePartLength>,
    ) -> Self {
        let st = cmp::min(tile_index_size, 3);
        let sp: u8 = if tile_length_size == 4 { 1 } else { 0 };
        let entry_size = st as usize + 2 + 2 * sp as usize;
        TilePartLengthsSegment {
            offset: 0,
            length: (4 + entry_size * tile_part_lengths.len()) as u16,
            index: [index],
            parameter_sizes: [(st << 4) | (sp << 6)],
            tile_part_lengths,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    // ST, bits 4 and 5: Ttlm is 0, 8 or 16 bits.
    pub fn tile_index_size(&self) -> u8 {
        (self.parameter_sizes[0] >> 4) & 0b11
    }

    // SP, bit 6: Ptlm is 16 or 32 bits.
    pub fn tile_length_size(&self) -> u8 {
        if self.parameter_sizes[0] & 0b0100_0000 == 0 {
            2
        } else {
            4
        }
    }

    pub fn tile_part_lengths(&self) -> &[TilePartLength] {
        &self.tile_part_lengths
    }

    fn check_parameter_sizes(&self) -> Result<(), CodestreamError> {
        if self.tile_index_size() == 3 || self.parameter_sizes[0] & 0b1000_1111 != 0 {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_TLM,
                format!("reserved Stlm value {:#04x}", self.parameter_sizes[0]),
            ));
        }
        Ok(())
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<TilePartLengthsSegment, CodestreamError> {
        info!("TLM start at byte offset {}", offset);
        let mut segment = TilePartLengthsSegment {
            offset,
            length,
            index: reader.read_array()?,
            parameter_sizes: reader.read_array()?,
            tile_part_lengths: vec![],
        };
        segment.check_parameter_sizes()?;

        let entry_size = (segment.tile_index_size() + segment.tile_length_size()) as u64;
        let available = reader.remaining_bytes()?;
        if available % entry_size != 0 {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_TLM,
                format!("{} bytes do not divide into {} byte entries", available, entry_size),
            ));
        }

        // number of tile lengths
        let no_tile_part_lengths = available / entry_size;
        segment.tile_part_lengths = Vec::with_capacity(no_tile_part_lengths as usize);
        for _ in 0..no_tile_part_lengths {
            // Ttlm
            let tile_index = match segment.tile_index_size() {
                0 => None,
                1 => Some(reader.read_u8()? as u16),
                _ => Some(reader.read_u16()?),
            };

            // Ptlm
            let tile_length = match segment.tile_length_size() {
                2 => reader.read_u16()? as u32,
                _ => reader.read_u32()?,
            };

            segment.tile_part_lengths.push(TilePartLength {
                tile_index,
                tile_length,
            });
        }

        info!("TLM end at byte offset {}", offset + 2 + length as u64);
        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        self.check_parameter_sizes()?;

        let mut body = vec![self.index[0], self.parameter_sizes[0]];
        for tile_part_length in &self.tile_part_lengths {
            match (self.tile_index_size(), tile_part_length.tile_index) {
                (0, None) => {}
                (1, Some(tile_index)) if tile_index <= u8::MAX as u16 => {
                    body.push(tile_index as u8)
                }
                (2, Some(tile_index)) => body.extend_from_slice(&tile_index.to_be_bytes()),
                _ => {
                    return Err(CodestreamError::marker(
                        MARKER_SYMBOL_TLM,
                        "tile index does not fit the Ttlm size",
                    ))
                }
            }
            if self.tile_length_size() == 2 {
                if tile_part_length.tile_length > u16::MAX as u32 {
                    return Err(CodestreamError::marker(
                        MARKER_SYMBOL_TLM,
                        "tile-part length does not fit a 16 bit Ptlm",
                    ));
                }
                body.extend_from_slice(&(tile_part_length.tile_length as u16).to_be_bytes());
            } else {
                body.extend_from_slice(&tile_part_length.tile_length.to_be_bytes());
            }
        }

        let length = encoded_length(MARKER_SYMBOL_TLM, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_TLM, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

// A.7.2
//
// Packet length, main header (PLM)
//
// Function: A list of packet lengths in the tile-parts for every tile-part in
// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketLengthSegment {
    offset: u64,

    // Lplm: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Zplm: Index of this marker segment relative to all other PLM marker
    // segments present in the current header.
    //
    // The sequence of (Nplm^i, Iplm^i) parameters from this marker segment is
    // concatenated, in the order of increasing Zplm, with the sequences of
    // parameters from other marker segments.
    index: [u8; 1],

    // Iplm^ij bytes for each tile-part, each group prefixed by its Nplm^i
    // byte count when encoded.
    tile_parts: Vec<Vec<u8>>,
}

impl PacketLengthSegment {
    /// One list of packet lengths per tile-part.
    pub fn new(index: u8, packet_lengths: &[Vec<u32>]) -> Self {
        let tile_parts: Vec<Vec<u8>> = packet_lengths
            .iter()
            .map(|lengths| {
                let mut data = vec![];
                for packet_length in lengths {
                    encode_packet_length(*packet_length, &mut data);
                }
                data
            })
            .collect();
        let length = 3 + tile_parts.iter().map(|part| 1 + part.len()).sum::<usize>();
        PacketLengthSegment {
            offset: 0,
            length: length as u16,
            index: [index],
            tile_parts,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    pub fn packet_lengths(&self) -> Vec<Vec<u32>> {
        self.tile_parts
            .iter()
            .map(|part| decode_packet_lengths(part))
            .collect()
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<PacketLengthSegment, CodestreamError> {
        info!("PLM start at byte offset {}", offset);
        let mut segment = PacketLengthSegment {
            offset,
            length,
            index: reader.read_array()?,
            tile_parts: vec![],
        };

        let mut available = reader.remaining_bytes()?;
        while available > 0 {
            // Nplm^i
            let no_bytes = reader.read_u8()? as u64;
            available -= 1;
            if no_bytes > available {
                return Err(CodestreamError::marker(
                    MARKER_SYMBOL_PLM,
                    format!(
                        "Nplm of {} bytes exceeds the {} bytes left in the segment",
                        no_bytes, available
                    ),
                ));
            }
            segment.tile_parts.push(reader.read_bytes(no_bytes)?);
            available -= no_bytes;
        }

        info!("PLM end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let mut body = vec![self.index[0]];
        for part in &self.tile_parts {
            if part.len() > u8::MAX as usize {
                return Err(CodestreamError::marker(
                    MARKER_SYMBOL_PLM,
                    format!("{} bytes of packet lengths exceed Nplm", part.len()),
                ));
            }
            body.push(part.len() as u8);
            body.extend_from_slice(part);
        }
        let length = encoded_length(MARKER_SYMBOL_PLM, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_PLM, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

// A.7.3
//
// Packet length, tile-part header (PLT)
//
// Function: A list of packet lengths in the tile-part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePacketLengthSegment {
    offset: u64,

    // Lplt: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Zplt: Index of this marker segment relative to all other PLT marker
    // segments present in the current header.
    index: [u8; 1],

    // Iplt^i: Length of the ith packet, continuation coded.
    //
    // If packet headers are stored with the packet, this length includes the
    // packet header. If packet headers are stored in the PPM or PPT, this
    // length does not include the packet header lengths.
    packet_length: Vec<u8>,
}

impl TilePacketLengthSegment {
    pub fn new(index: u8, packet_lengths: &[u32]) -> Self {
        let mut packet_length = vec![];
        for value in packet_lengths {
            encode_packet_length(*value, &mut packet_length);
        }
        TilePacketLengthSegment {
            offset: 0,
            length: (3 + packet_length.len()) as u16,
            index: [index],
            packet_length,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    pub fn packet_lengths(&self) -> Vec<u32> {
        decode_packet_lengths(&self.packet_length)
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<TilePacketLengthSegment, CodestreamError> {
        info!("PLT start at byte offset {}", offset);
        let index = reader.read_array()?;
        let available = reader.remaining_bytes()?;
        let segment = TilePacketLengthSegment {
            offset,
            length,
            index,
            packet_length: reader.read_bytes(available)?,
        };
        info!("PLT end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let length = encoded_length(MARKER_SYMBOL_PLT, 3 + self.packet_length.len())?;
        write_marker_header(writer, MARKER_SYMBOL_PLT, length)?;
        writer.write_all(&self.index)?;
        writer.write_all(&self.packet_length)?;
        Ok(())
    }
}

// A.7.4
//
// Packed packet headers, main header (PPM)
//
// Function: A collection of the packet headers from all tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedPacketHeaderSegment {
    offset: u64,

    // Lppm: Length of marker segment in bytes, not including the marker.
    length: u16,

    // Zppm: Index of this marker segment relative to all other PPM marker
    // segments present in the main header.
    index: [u8; 1],

    // (Nppm^i, Ippm^ij) pairs. A series may continue from the previous PPM
    // marker segment without a leading Nppm, so the bytes are kept as they
    // were encoded.
    data: Vec<u8>,
}

impl PackedPacketHeaderSegment {
    pub fn new(index: u8, data: Vec<u8>) -> Self {
        PackedPacketHeaderSegment {
            offset: 0,
            length: (3 + data.len()) as u16,
            index: [index],
            data,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<PackedPacketHeaderSegment, CodestreamError> {
        info!("PPM start at byte offset {}", offset);
        let index = reader.read_array()?;
        let available = reader.remaining_bytes()?;
        let segment = PackedPacketHeaderSegment {
            offset,
            length,
            index,
            data: reader.read_bytes(available)?,
        };
        info!("PPM end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let length = encoded_length(MARKER_SYMBOL_PPM, 3 + self.data.len())?;
        write_marker_header(writer, MARKER_SYMBOL_PPM, length)?;
        writer.write_all(&self.index)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

// A.7.5
//
// Packed packet headers, tile-part header (PPT)
//
// Function: A collection of the packet headers from one tile or tile-part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePackedPacketHeaderSegment {
    offset: u64,

    // Lppt: Length of marker segment in bytes, not including the marker.
    length: u16,

    // Zppt: Index of this marker segment relative to all other PPT marker
    // segments present in the current header.
    index: [u8; 1],

    // Ippt^i: Packet header for every packet in order in the tile-part.
    data: Vec<u8>,
}

impl TilePackedPacketHeaderSegment {
    pub fn new(index: u8, data: Vec<u8>) -> Self {
        TilePackedPacketHeaderSegment {
            offset: 0,
            length: (3 + data.len()) as u16,
            index: [index],
            data,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn index(&self) -> u8 {
        self.index[0]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<TilePackedPacketHeaderSegment, CodestreamError> {
        info!("PPT start at byte offset {}", offset);
        let index = reader.read_array()?;
        let available = reader.remaining_bytes()?;
        let segment = TilePackedPacketHeaderSegment {
            offset,
            length,
            index,
            data: reader.read_bytes(available)?,
        };
        info!("PPT end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let length = encoded_length(MARKER_SYMBOL_PPT, 3 + self.data.len())?;
        write_marker_header(writer, MARKER_SYMBOL_PPT, length)?;
        writer.write_all(&self.index)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_length_continuation() {
        let mut data = vec![];
        encode_packet_length(5, &mut data);
        encode_packet_length(300, &mut data);
        encode_packet_length(0x4000, &mut data);
        assert_eq!(data, vec![0x05, 0x82, 0x2C, 0x81, 0x80, 0x00]);
        assert_eq!(decode_packet_lengths(&data), vec![5, 300, 0x4000]);
    }
}
