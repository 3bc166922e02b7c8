use crate::marker::write_marker_header;
use crate::reader::ByteReader;
use crate::*;
use log::info;
use std::io;

// A.4.2
//
// Start of tile-part (SOT)
//
// Function: Marks the beginning of a tile-part, the index of its tile, and the
// index of its tile-part. The tile-parts of a given tile shall appear in order
// (see TPsot) in the codestream. However, tile-parts from other tiles may be
// interleaved in the codestream. Therefore, the tile-parts from a given tile
// may not appear contiguously in the codestream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOfTileSegment {
    offset: u64,
    length: u16,

    // Isot: Tile index.
    //
    // This number refers to the tiles in raster order starting at the number 0
    tile_index: [u8; 2],

    // Psot: Length, in bytes, from the beginning of the first byte of this SOT
    // marker segment of the tile-part to the end of the data of that tile-part.
    //
    // Only the last tile-part in the codestream may contain a 0 for Psot.
    //
    // If the Psot is 0, this tile-part is assumed to contain all data until the
    // EOC marker.
    tile_length: [u8; 4],

    // TPsot: Tile-part index.
    //
    // There is a specific order required for decoding tile-parts; this index
    // denotes the order from 0.
    tile_part_index: [u8; 1],

    // TNsot: Number of tile-parts of a tile in the codestream.
    //
    // A zero value indicates that the number of tile-parts of this tile is not
    // specified in this tile-part.
    no_tile_parts: [u8; 1],
}

impl StartOfTileSegment {
    pub fn new(tile_index: u16, tile_length: u32, tile_part_index: u8, no_tile_parts: u8) -> Self {
        StartOfTileSegment {
            offset: 0,
            length: 10,
            tile_index: tile_index.to_be_bytes(),
            tile_length: tile_length.to_be_bytes(),
            tile_part_index: [tile_part_index],
            no_tile_parts: [no_tile_parts],
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn tile_index(&self) -> u16 {
        u16::from_be_bytes(self.tile_index)
    }

    pub fn tile_length(&self) -> u32 {
        u32::from_be_bytes(self.tile_length)
    }

    pub fn tile_part_index(&self) -> u8 {
        self.tile_part_index[0]
    }

    pub fn no_tile_parts(&self) -> u8 {
        self.no_tile_parts[0]
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<StartOfTileSegment, CodestreamError> {
        info!("SOT start at byte offset {}", offset);
        let segment = StartOfTileSegment {
            offset,
            length,
            tile_index: reader.read_array()?,
            tile_length: reader.read_array()?,
            tile_part_index: reader.read_array()?,
            no_tile_parts: reader.read_array()?,
        };
        info!("SOT end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        write_marker_header(writer, MARKER_SYMBOL_SOT, 10)?;
        writer.write_all(&self.tile_index)?;
        writer.write_all(&self.tile_length)?;
        writer.write_all(&self.tile_part_index)?;
        writer.write_all(&self.no_tile_parts)?;
        Ok(())
    }
}

// A.8.1
//
// Start of packet (SOP)
//
// Function: Marks the beginning of a packet within a codestream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOfPacketSegment {
    offset: u64,

    // Lsop: Length of marker segment in bytes, not including the marker.
    length: u16,

    // Nsop: Packet sequence number. The first packet in a coded tile is
    // assigned the value zero. This number wraps at 65535.
    sequence_number: [u8; 2],
}

impl StartOfPacketSegment {
    pub fn new(sequence_number: u16) -> Self {
        StartOfPacketSegment {
            offset: 0,
            length: 4,
            sequence_number: sequence_number.to_be_bytes(),
        }
    }

    pub(crate) fn found(offset: u64, sequence_number: u16) -> Self {
        StartOfPacketSegment {
            offset,
            ..StartOfPacketSegment::new(sequence_number)
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn sequence_number(&self) -> u16 {
        u16::from_be_bytes(self.sequence_number)
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<StartOfPacketSegment, CodestreamError> {
        Ok(StartOfPacketSegment {
            offset,
            length,
            sequence_number: reader.read_array()?,
        })
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        write_marker_header(writer, MARKER_SYMBOL_SOP, 4)?;
        writer.write_all(&self.sequence_number)?;
        Ok(())
    }
}
