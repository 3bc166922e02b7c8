use crate::*;
use jpc::{Codestream, ProgressionOrder, TilePart, TransformationFilter};
use log::debug;
use std::error;
use std::ops::Range;

/// Which part of the image to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelector {
    /// A single tile, by index in raster order.
    Tile(u32),

    /// Rows and columns of the image area, upper bounds exclusive.
    Window { rows: Range<u32>, cols: Range<u32> },
}

/// A request to decode part of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRequest {
    selector: RegionSelector,

    // Number of resolution levels to discard.
    reduction: u8,

    // Component indices to decode, all of them when `None`.
    components: Option<Vec<u16>>,
}

impl RegionRequest {
    pub fn tile(index: u32) -> Self {
        RegionRequest {
            selector: RegionSelector::Tile(index),
            reduction: 0,
            components: None,
        }
    }

    pub fn window(rows: Range<u32>, cols: Range<u32>) -> Self {
        RegionRequest {
            selector: RegionSelector::Window { rows, cols },
            reduction: 0,
            components: None,
        }
    }

    pub fn with_reduction(mut self, reduction: u8) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_components(mut self, components: Vec<u16>) -> Self {
        self.components = Some(components);
        self
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn reduction(&self) -> u8 {
        self.reduction
    }

    pub fn components(&self) -> Option<&[u16]> {
        self.components.as_deref()
    }
}

/// Sample layout of one codestream component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentParameters {
    pub index: u16,
    pub bit_depth: u8,
    pub signed: bool,
    pub horizontal_separation: u8,
    pub vertical_separation: u8,
    pub decomposition_levels: u8,
}

/// Everything a pixel codec needs to decode a validated region.
///
/// Coordinates are on the reference grid, upper bounds exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeParameters {
    pub reference_grid_width: u32,
    pub reference_grid_height: u32,
    pub image_horizontal_offset: u32,
    pub image_vertical_offset: u32,
    pub reference_tile_width: u32,
    pub reference_tile_height: u32,
    pub tile_horizontal_offset: u32,
    pub tile_vertical_offset: u32,

    pub components: Vec<ComponentParameters>,

    pub tile: Option<u32>,
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,

    pub reduction: u8,
    pub progression_order: ProgressionOrder,
    pub layers: u16,
    pub transformation: TransformationFilter,

    // Tile-parts covering the region; every tile-part for a window.
    pub tile_parts: Vec<TilePart>,

    pub codestream_offset: u64,
    pub codestream_length: u64,
}

impl DecodeParameters {
    /// Validates `request` against the codestream headers.
    ///
    /// The codestream must come from a full parse, one that located the
    /// tile-parts.
    pub fn new(codestream: &Codestream, request: &RegionRequest) -> Result<Self, JP2Error> {
        if codestream.header_only() {
            return Err(JP2Error::Region(
                "tile-parts not located, decode with header_only = false".to_owned(),
            ));
        }
        let siz = codestream
            .image_and_tile_size_marker_segment()
            .ok_or_else(|| JP2Error::Region("codestream has no SIZ marker segment".to_owned()))?;
        let cod = codestream
            .coding_style_marker_segment()
            .ok_or_else(|| JP2Error::Region("codestream has no COD marker segment".to_owned()))?;

        let indices: Vec<u16> = match request.components() {
            Some(indices) => indices.to_vec(),
            None => (0..siz.no_components()).collect(),
        };
        if indices.is_empty() {
            return Err(JP2Error::Region("no components selected".to_owned()));
        }

        let mut components = Vec::with_capacity(indices.len());
        for index in indices {
            let size = siz.components().get(index as usize).ok_or_else(|| {
                JP2Error::Region(format!(
                    "component {} out of range, the image has {}",
                    index,
                    siz.no_components()
                ))
            })?;
            let decomposition_levels = codestream
                .coding_style_component_segment(index)
                .map_or(cod.coding_style_parameters(), |coc| {
                    coc.coding_style_parameters()
                })
                .no_decomposition_levels();
            components.push(ComponentParameters {
                index,
                bit_depth: size.bit_depth(),
                signed: size.is_signed(),
                horizontal_separation: size.horizontal_separation(),
                vertical_separation: size.vertical_separation(),
                decomposition_levels,
            });
        }

        // A reduction cannot discard more resolutions than every selected
        // component has.
        let levels = components
            .iter()
            .map(|c| c.decomposition_levels)
            .min()
            .unwrap_or(0);
        if request.reduction() > levels {
            return Err(JP2Error::Region(format!(
                "reduction {} exceeds {} decomposition levels",
                request.reduction(),
                levels
            )));
        }

        let (tile, x0, y0, x1, y1, tile_parts) = match request.selector() {
            RegionSelector::Tile(index) => {
                let bounds = siz.tile_bounds(*index).ok_or_else(|| {
                    JP2Error::Region(format!(
                        "tile {} out of range, the image has {}",
                        index,
                        siz.num_tiles()
                    ))
                })?;
                let tile_parts = codestream
                    .tile_parts()
                    .iter()
                    .filter(|part| part.tile_index() as u32 == *index)
                    .copied()
                    .collect();
                (Some(*index), bounds.x0, bounds.y0, bounds.x1, bounds.y1, tile_parts)
            }
            RegionSelector::Window { rows, cols } => {
                if rows.start >= rows.end || rows.end > siz.height() {
                    return Err(JP2Error::Region(format!(
                        "rows {:?} outside image height {}",
                        rows,
                        siz.height()
                    )));
                }
                if cols.start >= cols.end || cols.end > siz.width() {
                    return Err(JP2Error::Region(format!(
                        "columns {:?} outside image width {}",
                        cols,
                        siz.width()
                    )));
                }
                let x = siz.image_horizontal_offset();
                let y = siz.image_vertical_offset();
                (
                    None,
                    x + cols.start,
                    y + rows.start,
                    x + cols.end,
                    y + rows.end,
                    codestream.tile_parts().to_vec(),
                )
            }
        };

        debug!(
            "Region ({}, {}) to ({}, {}) at reduction {}",
            x0,
            y0,
            x1,
            y1,
            request.reduction()
        );

        Ok(DecodeParameters {
            reference_grid_width: siz.reference_grid_width(),
            reference_grid_height: siz.reference_grid_height(),
            image_horizontal_offset: siz.image_horizontal_offset(),
            image_vertical_offset: siz.image_vertical_offset(),
            reference_tile_width: siz.reference_tile_width(),
            reference_tile_height: siz.reference_tile_height(),
            tile_horizontal_offset: siz.tile_horizontal_offset(),
            tile_vertical_offset: siz.tile_vertical_offset(),
            components,
            tile,
            x0,
            y0,
            x1,
            y1,
            reduction: request.reduction(),
            progression_order: cod.progression_order(),
            layers: cod.no_layers(),
            transformation: cod.coding_style_parameters().transformation(),
            tile_parts,
            codestream_offset: codestream.offset(),
            codestream_length: codestream.length(),
        })
    }
}

/// Samples of a decoded region, one plane per selected component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRegion {
    pub width: u32,
    pub height: u32,
    pub components: Vec<Vec<i32>>,
}

/// Boundary to an external wavelet decoder.
///
/// Metadata parsing never depends on an implementation; only
/// [`Document::read_region`] calls one.
pub trait PixelCodec {
    fn decode(
        &mut self,
        codestream: &Codestream,
        parameters: &DecodeParameters,
    ) -> Result<DecodedRegion, Box<dyn error::Error + Send + Sync>>;
}
