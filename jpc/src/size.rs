use crate::diagnostics::Diagnostics;
use crate::marker::{encoded_length, write_marker_header};
use crate::reader::ByteReader;
use crate::*;
use log::{debug, info};
use std::cmp;
use std::fmt;
use std::io;

// Rsiz, ISO/IEC 15444-1 Table A.10 and its amendments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderCapability {
    // Capabilities specified in this Recommendation | International Standard only
    NoProfile,
    // Codestream restricted as described for Profile 0 from Table A.45
    Profile0,
    // Codestream restricted as described for Profile 1 from Table A.45
    Profile1,
    // 2K and 4K digital cinema profiles, 15444-1 AMD1
    Cinema2K,
    Cinema4K,
    // Scalable digital cinema profiles and long term storage, 15444-1 AMD2
    ScalableCinema2K,
    ScalableCinema4K,
    LongTermStorage,
    // Broadcast profiles, 15444-1 AMD3
    BroadcastSingle,
    BroadcastMulti,
    BroadcastMultiReversible,
    // Interoperable master format profiles, 15444-1 AMD8
    IMF2K,
    IMF4K,
    IMF8K,
    IMF2KReversible,
    IMF4KReversible,
    IMF8KReversible,
    // Capabilities defined in ISO/IEC 15444-2
    Part2,

    // All other values retained verbatim
    Reserved { value: u16 },
}

impl DecoderCapability {
    pub fn new(value: u16) -> DecoderCapability {
        match value {
            0x0000 => DecoderCapability::NoProfile,
            0x0001 => DecoderCapability::Profile0,
            0x0002 => DecoderCapability::Profile1,
            0x0003 => DecoderCapability::Cinema2K,
            0x0004 => DecoderCapability::Cinema4K,
            0x0005 => DecoderCapability::ScalableCinema2K,
            0x0006 => DecoderCapability::ScalableCinema4K,
            0x0007 => DecoderCapability::LongTermStorage,
            0x0100 => DecoderCapability::BroadcastSingle,
            0x0200 => DecoderCapability::BroadcastMulti,
            0x0300 => DecoderCapability::BroadcastMultiReversible,
            0x0400 => DecoderCapability::IMF2K,
            0x0401 => DecoderCapability::IMF4K,
            0x0402 => DecoderCapability::IMF8K,
            0x0403 => DecoderCapability::IMF2KReversible,
            0x0800 => DecoderCapability::IMF4KReversible,
            0x0801 => DecoderCapability::IMF8KReversible,
            0x8000 => DecoderCapability::Part2,
            _ => DecoderCapability::Reserved { value },
        }
    }
}

impl fmt::Display for DecoderCapability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::NoProfile => "no profile",
            Self::Profile0 => "profile 0",
            Self::Profile1 => "profile 1",
            Self::Cinema2K => "2K cinema",
            Self::Cinema4K => "4K cinema",
            Self::ScalableCinema2K => "scalable 2K cinema",
            Self::ScalableCinema4K => "scalable 4K cinema",
            Self::LongTermStorage => "long term storage",
            Self::BroadcastSingle => "broadcast single tile",
            Self::BroadcastMulti => "broadcast multi tile",
            Self::BroadcastMultiReversible => "broadcast multi tile reversible",
            Self::IMF2K => "2K single tile lossy IMF",
            Self::IMF4K => "4K single tile lossy IMF",
            Self::IMF8K => "8K single tile lossy IMF",
            Self::IMF2KReversible => "2K single/multi tile reversible IMF",
            Self::IMF4KReversible => "4K single/multi tile reversible IMF",
            Self::IMF8KReversible => "8K single/multi tile reversible IMF",
            Self::Part2 => "part 2",
            Self::Reserved { value } => return write!(f, "{}", value),
        };
        f.write_str(name)
    }
}

/// Precision and sub-sampling of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSize {
    // Ssiz: Precision (depth) in bits and sign of the component samples.
    //
    // The high bit is set for signed values, the low 7 bits hold the bit
    // depth minus one.
    precision: [u8; 1],

    // XRsiz: Horizontal separation of a sample of the component with respect
    // to the reference grid.
    horizontal_separation: [u8; 1],

    // YRsiz: Vertical separation of a sample of the component with respect to
    // the reference grid.
    vertical_separation: [u8; 1],
}

impl ComponentSize {
    pub fn new(bit_depth: u8, signed: bool, horizontal_separation: u8, vertical_separation: u8) -> Self {
        let sign = if signed { 0x80 } else { 0x00 };
        ComponentSize {
            precision: [sign | (bit_depth.wrapping_sub(1) & 0x7F)],
            horizontal_separation: [horizontal_separation],
            vertical_separation: [vertical_separation],
        }
    }

    pub fn bit_depth(&self) -> u8 {
        // ISO/IEC 15444-1:2019 Table A.11, component bit depth is value + 1.
        (self.precision[0] & 0x7F) + 1
    }

    pub fn is_signed(&self) -> bool {
        self.precision[0] & 0x80 == 0x80
    }

    pub fn horizontal_separation(&self) -> u8 {
        self.horizontal_separation[0]
    }

    pub fn vertical_separation(&self) -> u8 {
        self.vertical_separation[0]
    }
}

/// Reference grid coordinates of one tile, upper bounds exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileBounds {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

// A.5.1
//
// Image and tile size (SIZ)
//
// Function: Provides information about the uncompressed image such as the
// width and height of the reference grid, the width and height of the tiles,
// the number of components, component bit depth, and the separation of
// component samples with respect to the reference grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAndTileSizeMarkerSegment {
    offset: u64,
    length: u16,

    // Rsiz: Denotes capabilities that a decoder needs to properly decode the
    // codestream.
    decoder_capabilities: [u8; 2],

    // XSiz: Width of the reference grid.
    reference_grid_width: [u8; 4],

    // YSiz: Height of the reference grid.
    reference_grid_height: [u8; 4],

    // XOsiz: Horizontal offset from the origin of the reference grid to the
    // left side of the image area.
    image_horizontal_offset: [u8; 4],

    // YOsiz: Vertical offset from the origin of the reference grid to the top
    // side of the image area.
    image_vertical_offset: [u8; 4],

    // XTsiz: Width of one reference tile with respect to the reference grid
    reference_tile_width: [u8; 4],

    // YTsiz: Height of one reference tile with respect to the reference grid.
    reference_tile_height: [u8; 4],

    // XTOsiz: Horizontal offset from the origin of the reference grid to the
    // left side of the first tile.
    tile_horizontal_offset: [u8; 4],

    // YTOsiz: Vertical offset from the origin of the reference grid to the
    // top side of the first tile.
    tile_vertical_offset: [u8; 4],

    // Csiz: Number of components in the image.
    no_components: [u8; 2],

    // Ssiz, XRsiz, YRsiz for each component in component index order.
    components: Vec<ComponentSize>,
}

impl ImageAndTileSizeMarkerSegment {
    /// Builds a segment from reference grid, image offset, tile size and tile
    /// offset pairs, each given as (horizontal, vertical).
    pub fn new(
        decoder_capabilities: u16,
        reference_grid: (u32, u32),
        image_offset: (u32, u32),
        reference_tile: (u32, u32),
        tile_offset: (u32, u32),
        components: Vec<ComponentSize>,
    ) -> Self {
        ImageAndTileSizeMarkerSegment {
            offset: 0,
            length: (38 + 3 * components.len()) as u16,
            decoder_capabilities: decoder_capabilities.to_be_bytes(),
            reference_grid_width: reference_grid.0.to_be_bytes(),
            reference_grid_height: reference_grid.1.to_be_bytes(),
            image_horizontal_offset: image_offset.0.to_be_bytes(),
            image_vertical_offset: image_offset.1.to_be_bytes(),
            reference_tile_width: reference_tile.0.to_be_bytes(),
            reference_tile_height: reference_tile.1.to_be_bytes(),
            tile_horizontal_offset: tile_offset.0.to_be_bytes(),
            tile_vertical_offset: tile_offset.1.to_be_bytes(),
            no_components: (components.len() as u16).to_be_bytes(),
            components,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn decoder_capabilities(&self) -> u16 {
        u16::from_be_bytes(self.decoder_capabilities)
    }

    pub fn decoder_capability(&self) -> DecoderCapability {
        DecoderCapability::new(self.decoder_capabilities())
    }

    pub fn reference_grid_width(&self) -> u32 {
        u32::from_be_bytes(self.reference_grid_width)
    }
    pub fn reference_grid_height(&self) -> u32 {
        u32::from_be_bytes(self.reference_grid_height)
    }

    pub fn image_horizontal_offset(&self) -> u32 {
        u32::from_be_bytes(self.image_horizontal_offset)
    }
    pub fn image_vertical_offset(&self) -> u32 {
        u32::from_be_bytes(self.image_vertical_offset)
    }

    pub fn reference_tile_width(&self) -> u32 {
        u32::from_be_bytes(self.reference_tile_width)
    }
    pub fn reference_tile_height(&self) -> u32 {
        u32::from_be_bytes(self.reference_tile_height)
    }

    pub fn tile_horizontal_offset(&self) -> u32 {
        u32::from_be_bytes(self.tile_horizontal_offset)
    }
    pub fn tile_vertical_offset(&self) -> u32 {
        u32::from_be_bytes(self.tile_vertical_offset)
    }

    pub fn no_components(&self) -> u16 {
        u16::from_be_bytes(self.no_components)
    }

    pub fn components(&self) -> &[ComponentSize] {
        &self.components
    }

    pub fn bit_depths(&self) -> Vec<u8> {
        self.components.iter().map(|c| c.bit_depth()).collect()
    }

    pub fn signed(&self) -> Vec<bool> {
        self.components.iter().map(|c| c.is_signed()).collect()
    }

    pub fn horizontal_separations(&self) -> Vec<u8> {
        self.components
            .iter()
            .map(|c| c.horizontal_separation())
            .collect()
    }

    pub fn vertical_separations(&self) -> Vec<u8> {
        self.components
            .iter()
            .map(|c| c.vertical_separation())
            .collect()
    }

    // Width and height of the image area, Xsiz - XOsiz by Ysiz - YOsiz.
    pub fn width(&self) -> u32 {
        self.reference_grid_width()
            .saturating_sub(self.image_horizontal_offset())
    }

    pub fn height(&self) -> u32 {
        self.reference_grid_height()
            .saturating_sub(self.image_vertical_offset())
    }

    // The number of tiles in the X direction (numXtiles) and the Y direction
    // (numYtiles) is the following
    //
    // numXtiles = ⌈(Xsiz - XTOsiz) / XTsiz⌉
    // numYtiles = ⌈(Ysiz - YTOsiz) / YTsiz⌉
    pub fn num_x_tiles(&self) -> u32 {
        ceil_div(
            self.reference_grid_width()
                .saturating_sub(self.tile_horizontal_offset()),
            self.reference_tile_width(),
        )
    }

    pub fn num_y_tiles(&self) -> u32 {
        ceil_div(
            self.reference_grid_height()
                .saturating_sub(self.tile_vertical_offset()),
            self.reference_tile_height(),
        )
    }

    pub fn num_tiles(&self) -> u64 {
        self.num_x_tiles() as u64 * self.num_y_tiles() as u64
    }

    /// Bounds of tile `t` on the reference grid, or `None` when `t` is not a
    /// tile of this image.
    //
    // p = mod(t, numXtiles), q = ⌊t / numXtiles⌋
    // tx0(p,q) = max(XTOsiz + p · XTsiz, XOsiz)
    // ty0(p,q) = max(YTOsiz + q · YTsiz, YOsiz)
    // tx1(p,q) = min(XTOsiz + (p + 1) · XTsiz, Xsiz)
    // ty1(p,q) = min(YTOsiz + (q + 1) · YTsiz, Ysiz)
    pub fn tile_bounds(&self, t: u32) -> Option<TileBounds> {
        if t as u64 >= self.num_tiles() {
            return None;
        }
        let p = (t % self.num_x_tiles()) as u64;
        let q = (t / self.num_x_tiles()) as u64;
        let xt = self.reference_tile_width() as u64;
        let yt = self.reference_tile_height() as u64;
        let xto = self.tile_horizontal_offset() as u64;
        let yto = self.tile_vertical_offset() as u64;

        Some(TileBounds {
            x0: cmp::max(xto + p * xt, self.image_horizontal_offset() as u64) as u32,
            y0: cmp::max(yto + q * yt, self.image_vertical_offset() as u64) as u32,
            x1: cmp::min(xto + (p + 1) * xt, self.reference_grid_width() as u64) as u32,
            y1: cmp::min(yto + (q + 1) * yt, self.reference_grid_height() as u64) as u32,
        })
    }

    // The tile grid offsets (XTOsiz, YTOsiz) are constrained to be no greater
    // than the image area offsets.
    //
    // 0 ≤ XTOsiz ≤ XOsiz
    // 0 ≤ YTOsiz ≤ YOsiz
    //
    // Also, the tile size plus the tile offset shall be greater than the image
    // area offset. This ensures that the first tile (tile 0) will contain at
    // least one reference grid point from the image area.
    //
    // XTsiz + XTOsiz > XOsiz
    // YTsiz + YTOsiz > YOsiz
    pub(crate) fn check_tile_grid(&self) -> Result<(), CodestreamError> {
        if self.tile_horizontal_offset() > self.image_horizontal_offset()
            || self.tile_vertical_offset() > self.image_vertical_offset()
        {
            return Err(CodestreamError::TileGridOffsetOverflow {
                tile_horizontal_offset: self.tile_horizontal_offset(),
                image_horizontal_offset: self.image_horizontal_offset(),
                tile_vertical_offset: self.tile_vertical_offset(),
                image_vertical_offset: self.image_vertical_offset(),
            });
        }

        if (self.reference_tile_width() as u64 + self.tile_horizontal_offset() as u64)
            <= self.image_horizontal_offset() as u64
            || (self.reference_tile_height() as u64 + self.tile_vertical_offset() as u64)
                <= self.image_vertical_offset() as u64
        {
            return Err(CodestreamError::TileSizeOverflow {
                reference_tile_width: self.reference_tile_width(),
                tile_horizontal_offset: self.tile_horizontal_offset(),
                image_horizontal_offset: self.image_horizontal_offset(),
                reference_tile_height: self.reference_tile_height(),
                tile_vertical_offset: self.tile_vertical_offset(),
                image_vertical_offset: self.image_vertical_offset(),
            });
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), CodestreamError> {
        if self.components.len() != self.no_components() as usize {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_SIZ,
                format!(
                    "Csiz is {} but {} components are described",
                    self.no_components(),
                    self.components.len()
                ),
            ));
        }
        if self.components.is_empty() {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_SIZ,
                "at least one component is required",
            ));
        }
        if self.reference_tile_width() == 0 || self.reference_tile_height() == 0 {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_SIZ,
                "tile size must be non-zero",
            ));
        }
        for (i, component) in self.components.iter().enumerate() {
            if component.bit_depth() > 38 {
                return Err(CodestreamError::marker(
                    MARKER_SYMBOL_SIZ,
                    format!("component {} bit depth {} exceeds 38", i, component.bit_depth()),
                ));
            }
            if component.horizontal_separation() == 0 || component.vertical_separation() == 0 {
                return Err(CodestreamError::marker(
                    MARKER_SYMBOL_SIZ,
                    format!("component {} sample separation must be non-zero", i),
                ));
            }
        }
        self.check_tile_grid()
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<ImageAndTileSizeMarkerSegment, CodestreamError> {
        info!("SIZ start at byte offset {}", offset);
        let mut segment = ImageAndTileSizeMarkerSegment {
            offset,
            length,
            decoder_capabilities: reader.read_array()?,
            reference_grid_width: reader.read_array()?,
            reference_grid_height: reader.read_array()?,
            image_horizontal_offset: reader.read_array()?,
            image_vertical_offset: reader.read_array()?,
            reference_tile_width: reader.read_array()?,
            reference_tile_height: reader.read_array()?,
            tile_horizontal_offset: reader.read_array()?,
            tile_vertical_offset: reader.read_array()?,
            no_components: reader.read_array()?,
            components: vec![],
        };

        let no_components = segment.no_components() as u64;
        let available = reader.remaining_bytes()? / 3;
        if available < no_components {
            diagnostics.warn(
                offset,
                format!(
                    "SIZ declares {} components but only {} fit in the segment",
                    no_components, available
                ),
            );
        }

        let count = cmp::min(no_components, available) as usize;
        segment.components = Vec::with_capacity(count);
        for _ in 0..count {
            segment.components.push(ComponentSize {
                precision: reader.read_array()?,
                horizontal_separation: reader.read_array()?,
                vertical_separation: reader.read_array()?,
            });
        }

        if let Err(error) = segment.check_tile_grid() {
            diagnostics.warn(offset, error.to_string());
        }
        debug!(
            "SIZ {}x{} with {} components",
            segment.reference_grid_width(),
            segment.reference_grid_height(),
            segment.no_components()
        );
        info!("SIZ end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        self.validate()?;

        let mut body = Vec::with_capacity(36 + 3 * self.components.len());
        body.extend_from_slice(&self.decoder_capabilities);
        body.extend_from_slice(&self.reference_grid_width);
        body.extend_from_slice(&self.reference_grid_height);
        body.extend_from_slice(&self.image_horizontal_offset);
        body.extend_from_slice(&self.image_vertical_offset);
        body.extend_from_slice(&self.reference_tile_width);
        body.extend_from_slice(&self.reference_tile_height);
        body.extend_from_slice(&self.tile_horizontal_offset);
        body.extend_from_slice(&self.tile_vertical_offset);
        body.extend_from_slice(&self.no_components);
        for component in &self.components {
            body.extend_from_slice(&component.precision);
            body.extend_from_slice(&component.horizontal_separation);
            body.extend_from_slice(&component.vertical_separation);
        }

        let length = encoded_length(MARKER_SYMBOL_SIZ, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_SIZ, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

fn ceil_div(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((numerator as u64 + denominator as u64 - 1) / denominator as u64) as u32
}
