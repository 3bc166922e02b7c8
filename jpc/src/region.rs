use crate::marker::{
    component_index_size, decode_component_index, encode_component_index, encoded_length,
    write_marker_header,
};
use crate::reader::ByteReader;
use crate::*;
use log::info;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOfInterestStyle {
    ImplicitRegionOfInterest,
    Reserved { value: u8 },
}

impl RegionOfInterestStyle {
    pub fn new(value: u8) -> RegionOfInterestStyle {
        match value {
            0 => RegionOfInterestStyle::ImplicitRegionOfInterest,
            _ => RegionOfInterestStyle::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            RegionOfInterestStyle::ImplicitRegionOfInterest => 0,
            RegionOfInterestStyle::Reserved { value } => *value,
        }
    }
}

// A.6.3
//
// Region of interest (RGN)
//
// Function: Signals the presence of an ROI in the codestream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionOfInterestSegment {
    offset: u64,

    // Lrgn: Length of marker segment in bytes (not including the marker)
    length: u16,

    // Crgn: The index of the component to which this marker segment relates.
    // The components are indexed 0, 1, 2, etc.
    component_index: u16,

    index_size: usize,

    // Srgn: ROI style for the current ROI.
    region_of_interest_style: [u8; 1],

    // SPrgn: Parameter for ROI style designated in Srgn, the implicit ROI
    // shift.
    region_of_interest_style_parameter: [u8; 1],
}

impl RegionOfInterestSegment {
    pub fn new(
        component_index: u16,
        no_components: u16,
        region_of_interest_style: RegionOfInterestStyle,
        shift: u8,
    ) -> Self {
        let index_size = component_index_size(no_components);
        RegionOfInterestSegment {
            offset: 0,
            length: (4 + index_size) as u16,
            component_index,
            index_size,
            region_of_interest_style: [region_of_interest_style.value()],
            region_of_interest_style_parameter: [shift],
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn component_index(&self) -> u16 {
        self.component_index
    }

    pub fn region_of_interest_style(&self) -> RegionOfInterestStyle {
        RegionOfInterestStyle::new(self.region_of_interest_style[0])
    }

    pub fn shift(&self) -> u8 {
        self.region_of_interest_style_parameter[0]
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        no_components: u16,
    ) -> Result<RegionOfInterestSegment, CodestreamError> {
        info!("RGN start at byte offset {}", offset);
        let index_size = component_index_size(no_components);
        let segment = RegionOfInterestSegment {
            offset,
            length,
            component_index: decode_component_index(reader, index_size)?,
            index_size,
            region_of_interest_style: reader.read_array()?,
            region_of_interest_style_parameter: reader.read_array()?,
        };
        info!("RGN end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let mut body = vec![];
        encode_component_index(&mut body, self.component_index, self.index_size);
        body.push(self.region_of_interest_style[0]);
        body.push(self.region_of_interest_style_parameter[0]);
        let length = encoded_length(MARKER_SYMBOL_RGN, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_RGN, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}
