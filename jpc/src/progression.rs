use crate::coding_style::ProgressionOrder;
use crate::marker::{
    component_index_size, decode_component_index, encode_component_index, encoded_length,
    write_marker_header,
};
use crate::reader::ByteReader;
use crate::*;
use log::info;
use std::io;

/// One progression of a POC marker segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    // RSpoc: Resolution level index (inclusive) for the start of a progression.
    resolution_level_index_start: u8,

    // CSpoc: Component index (inclusive) for the start of a progression.
    component_index_start: u16,

    // LYEpoc: Layer index (exclusive) for the end of a progression.
    // The layer index always starts at zero for every progression. Packets
    // that have already been included in the codestream are not included again
    layer_index_end: u16,

    // REpoc: Resolution Level index (exclusive) for the end of a progression.
    resolution_level_index_end: u8,

    // CEpoc: Component index (exclusive) for the end of a progression. With
    // 8 bit indices a value of 0 is interpreted as 256.
    component_index_end: u16,

    // Ppoc: Progression order.
    progression_order: u8,
}

impl Progression {
    pub fn new(
        resolution_level_index_start: u8,
        component_index_start: u16,
        layer_index_end: u16,
        resolution_level_index_end: u8,
        component_index_end: u16,
        progression_order: ProgressionOrder,
    ) -> Self {
        Progression {
            resolution_level_index_start,
            component_index_start,
            layer_index_end,
            resolution_level_index_end,
            component_index_end,
            progression_order: progression_order.value(),
        }
    }

    pub fn resolution_level_index_start(&self) -> u8 {
        self.resolution_level_index_start
    }

    pub fn component_index_start(&self) -> u16 {
        self.component_index_start
    }

    pub fn layer_index_end(&self) -> u16 {
        self.layer_index_end
    }

    pub fn resolution_level_index_end(&self) -> u8 {
        self.resolution_level_index_end
    }

    pub fn component_index_end(&self) -> u16 {
        self.component_index_end
    }

    pub fn progression_order(&self) -> ProgressionOrder {
        ProgressionOrder::new(self.progression_order)
    }
}

// A.6.6
//
// Progression order change (POC)
//
// Function: Describes the bounds and progression order for any progression
// order other than specified in the COD marker segments in the codestream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionOrderChangeSegment {
    offset: u64,
    length: u16,

    index_size: usize,

    progressions: Vec<Progression>,
}

impl ProgressionOrderChangeSegment {
    pub fn new(no_components: u16, progressions: Vec<Progression>) -> Self {
        let index_size = component_index_size(no_components);
        ProgressionOrderChangeSegment {
            offset: 0,
            length: (2 + progressions.len() * (5 + 2 * index_size)) as u16,
            index_size,
            progressions,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        no_components: u16,
    ) -> Result<ProgressionOrderChangeSegment, CodestreamError> {
        info!("POC start at byte offset {}", offset);
        let index_size = component_index_size(no_components);

        // The number of progression changes can be derived from the length of
        // the marker segment.
        let entry_size = 5 + 2 * index_size as u64;
        let available = reader.remaining_bytes()?;
        if available == 0 || available % entry_size != 0 {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_POC,
                format!("{} bytes do not divide into {} byte progressions", available, entry_size),
            ));
        }

        let no_progression_order_change = available / entry_size;
        let mut progressions = Vec::with_capacity(no_progression_order_change as usize);
        for _ in 0..no_progression_order_change {
            progressions.push(Progression {
                resolution_level_index_start: reader.read_u8()?,
                component_index_start: decode_component_index(reader, index_size)?,
                layer_index_end: reader.read_u16()?,
                resolution_level_index_end: reader.read_u8()?,
                component_index_end: decode_component_index(reader, index_size)?,
                progression_order: reader.read_u8()?,
            });
        }
        info!("POC end at byte offset {}", offset + 2 + length as u64);

        Ok(ProgressionOrderChangeSegment {
            offset,
            length,
            index_size,
            progressions,
        })
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        if self.progressions.is_empty() {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_POC,
                "at least one progression is required",
            ));
        }

        let mut body = vec![];
        for progression in &self.progressions {
            body.push(progression.resolution_level_index_start);
            encode_component_index(&mut body, progression.component_index_start, self.index_size);
            body.extend_from_slice(&progression.layer_index_end.to_be_bytes());
            body.push(progression.resolution_level_index_end);
            encode_component_index(&mut body, progression.component_index_end, self.index_size);
            body.push(progression.progression_order);
        }
        let length = encoded_length(MARKER_SYMBOL_POC, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_POC, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}
