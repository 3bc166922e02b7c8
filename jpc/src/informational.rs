use crate::diagnostics::Diagnostics;
use crate::marker::{encoded_length, write_marker_header};
use crate::reader::ByteReader;
use crate::*;
use log::info;
use std::io;
use std::str;

// A.9.1
//
// Component registration (CRG)
//
// Function: Allows specific registration of components with respect to each
// other. For coding purposes the samples of components are considered to be
// located at reference grid points that are integer multiples of XRsiz and
// YRsiz.
//
// However, this may be inappropriate for rendering the image. The CRG marker
// segment describes the "centre of mass" of each component's samples with
// respect to the separation.
//
// This marker segment has no effect on decoding the codestream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRegistrationSegment {
    offset: u64,

    // Lcrg: Length of marker segment in bytes (not including the marker).
    length: u16,

    // (Xcrg^i, Ycrg^i): Horizontal and vertical offset, in units of 1/65536
    // of the separation XRsiz^i and YRsiz^i, for the ith component.
    //
    // Thus, values range from 0/65536 (sample occupies its reference grid
    // point) to 65535/65536 (just before the next sample's reference grid
    // point).
    offsets: Vec<(u16, u16)>,
}

impl ComponentRegistrationSegment {
    pub fn new(offsets: Vec<(u16, u16)>) -> Self {
        ComponentRegistrationSegment {
            offset: 0,
            length: (2 + 4 * offsets.len()) as u16,
            offsets,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn offsets(&self) -> &[(u16, u16)] {
        &self.offsets
    }

    pub fn horizontal_offsets(&self) -> Vec<u16> {
        self.offsets.iter().map(|(x, _)| *x).collect()
    }

    pub fn vertical_offsets(&self) -> Vec<u16> {
        self.offsets.iter().map(|(_, y)| *y).collect()
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        no_components: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<ComponentRegistrationSegment, CodestreamError> {
        info!("CRG start at byte offset {}", offset);
        let available = reader.remaining_bytes()?;
        if available % 4 != 0 {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_CRG,
                format!("{} bytes do not divide into component offsets", available),
            ));
        }

        let count = available / 4;
        if count != no_components as u64 {
            diagnostics.warn(
                offset,
                format!(
                    "CRG describes {} components but SIZ declares {}",
                    count, no_components
                ),
            );
        }

        let mut offsets = Vec::with_capacity(count as usize);
        for _ in 0..count {
            offsets.push((reader.read_u16()?, reader.read_u16()?));
        }
        info!("CRG end at byte offset {}", offset + 2 + length as u64);

        Ok(ComponentRegistrationSegment {
            offset,
            length,
            offsets,
        })
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let mut body = Vec::with_capacity(4 * self.offsets.len());
        for (x, y) in &self.offsets {
            body.extend_from_slice(&x.to_be_bytes());
            body.extend_from_slice(&y.to_be_bytes());
        }
        let length = encoded_length(MARKER_SYMBOL_CRG, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_CRG, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRegistrationValue {
    // General use (binary values)
    Binary,

    // General use (ISO 8859-15:1999 (Latin) values)
    Latin,

    // All other values reserved
    Reserved { value: u16 },
}

impl CommentRegistrationValue {
    pub fn new(value: u16) -> CommentRegistrationValue {
        match value {
            // See ISO/IEC 15444-1:2019 Table A.44
            0 => CommentRegistrationValue::Binary,
            1 => CommentRegistrationValue::Latin,
            _ => CommentRegistrationValue::Reserved { value },
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            CommentRegistrationValue::Binary => 0,
            CommentRegistrationValue::Latin => 1,
            CommentRegistrationValue::Reserved { value } => *value,
        }
    }
}

// A.9.2
//
// Comment (COM)
//
// Allows unstructured data in the main and tile-part header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMarkerSegment {
    offset: u64,

    // Lcom: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Rcom: Registration value of the marker segment
    registration_value: [u8; 2],

    // Ccom^i: Byte of unstructured data
    comment: Vec<u8>,
}

impl CommentMarkerSegment {
    pub fn new(registration_value: CommentRegistrationValue, comment: Vec<u8>) -> Self {
        CommentMarkerSegment {
            offset: 0,
            length: (4 + comment.len()) as u16,
            registration_value: registration_value.value().to_be_bytes(),
            comment,
        }
    }

    /// A Latin-1 comment. Characters outside Latin-1 are replaced by '?'.
    pub fn from_text(text: &str) -> Self {
        let comment = text
            .chars()
            .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
            .collect();
        CommentMarkerSegment::new(CommentRegistrationValue::Latin, comment)
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn registration_value(&self) -> CommentRegistrationValue {
        CommentRegistrationValue::new(u16::from_be_bytes(self.registration_value))
    }

    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    pub fn comment_utf8(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.comment)
    }

    /// The comment decoded as text when registered as Latin-1.
    pub fn text(&self) -> Option<String> {
        match self.registration_value() {
            CommentRegistrationValue::Latin => {
                Some(self.comment.iter().map(|byte| *byte as char).collect())
            }
            _ => None,
        }
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
    ) -> Result<CommentMarkerSegment, CodestreamError> {
        info!("COM start at byte offset {}", offset);
        let registration_value = reader.read_array()?;
        let available = reader.remaining_bytes()?;
        let segment = CommentMarkerSegment {
            offset,
            length,
            registration_value,
            comment: reader.read_bytes(available)?,
        };
        info!("COM end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        let length = encoded_length(MARKER_SYMBOL_COM, 4 + self.comment.len())?;
        write_marker_header(writer, MARKER_SYMBOL_COM, length)?;
        writer.write_all(&self.registration_value)?;
        writer.write_all(&self.comment)?;
        Ok(())
    }
}
