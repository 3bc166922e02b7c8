use crate::diagnostics::Diagnostics;
use crate::marker::{
    component_index_size, decode_component_index, encode_component_index, encoded_length,
    write_marker_header,
};
use crate::reader::ByteReader;
use crate::*;
use log::{debug, info};
use std::fmt;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizationStyle {
    No { guard: u8 },
    ScalarDerived { guard: u8 },
    ScalarExpounded { guard: u8 },
    Reserved { value: u8 },
}

impl QuantizationStyle {
    pub fn new(byte: u8) -> QuantizationStyle {
        let value = byte & 0b0001_1111;

        // 000x xxxx to 111x xxxx, Number of guard bits: 0 to 7
        let guard = byte >> 5;

        match value {
            // No quantization
            0b0000_0000 => QuantizationStyle::No { guard },
            // Scalar derived (values signalled for NLLL subband only).
            0b0000_0001 => QuantizationStyle::ScalarDerived { guard },
            // Scalar expounded (values signalled for each subband). There are
            // as many step sizes signalled as there are subbands.
            0b0000_0010 => QuantizationStyle::ScalarExpounded { guard },

            _ => QuantizationStyle::Reserved { value: byte },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            QuantizationStyle::No { guard } => guard << 5,
            QuantizationStyle::ScalarDerived { guard } => (guard << 5) | 0b01,
            QuantizationStyle::ScalarExpounded { guard } => (guard << 5) | 0b10,
            QuantizationStyle::Reserved { value } => *value,
        }
    }

    pub fn guard_bits(&self) -> Option<u8> {
        match self {
            QuantizationStyle::No { guard }
            | QuantizationStyle::ScalarDerived { guard }
            | QuantizationStyle::ScalarExpounded { guard } => Some(*guard),
            QuantizationStyle::Reserved { .. } => None,
        }
    }

    // Entries of the no quantization style are a single byte, scalar entries
    // are two bytes.
    fn entry_size(&self) -> usize {
        match self {
            QuantizationStyle::No { .. } | QuantizationStyle::Reserved { .. } => 1,
            QuantizationStyle::ScalarDerived { .. } | QuantizationStyle::ScalarExpounded { .. } => {
                2
            }
        }
    }
}

impl fmt::Display for QuantizationStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuantizationStyle::No { .. } => f.write_str("no quantization"),
            QuantizationStyle::ScalarDerived { .. } => f.write_str("scalar implicit"),
            QuantizationStyle::ScalarExpounded { .. } => f.write_str("scalar explicit"),
            QuantizationStyle::Reserved { value } => write!(f, "reserved ({:#04x})", value),
        }
    }
}

/// Step size of one subband, Table A.30 and Table A.31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizationValue {
    Reversible { value: [u8; 1] },
    Irreversible { value: [u8; 2] },
}

impl QuantizationValue {
    pub fn reversible(exponent: u8) -> Self {
        QuantizationValue::Reversible {
            value: [exponent << 3],
        }
    }

    pub fn irreversible(exponent: u8, mantissa: u16) -> Self {
        let value = ((exponent as u16) << 11) | (mantissa & 0x07FF);
        QuantizationValue::Irreversible {
            value: value.to_be_bytes(),
        }
    }

    pub fn value(&self) -> u16 {
        match &self {
            QuantizationValue::Reversible { value } => value[0] as u16,
            QuantizationValue::Irreversible { value } => u16::from_be_bytes(*value),
        }
    }

    // The 5 most significant bits hold the exponent in both layouts.
    pub fn exponent(&self) -> u8 {
        match &self {
            QuantizationValue::Reversible { value } => value[0] >> 3,
            QuantizationValue::Irreversible { value } => value[0] >> 3,
        }
    }

    // The 11 least significant bits of a scalar entry.
    pub fn mantissa(&self) -> Option<u16> {
        match &self {
            QuantizationValue::Reversible { .. } => None,
            QuantizationValue::Irreversible { value } => {
                Some(u16::from_be_bytes([value[0] & 0b0000_0111, value[1]]))
            }
        }
    }

    fn encode(&self, body: &mut Vec<u8>) {
        match self {
            QuantizationValue::Reversible { value } => body.extend_from_slice(value),
            QuantizationValue::Irreversible { value } => body.extend_from_slice(value),
        }
    }
}

// Sqcx followed by SPqcx, shared by QCD and QCC.
fn decode_quantization_values<R: io::Read + io::Seek>(
    reader: &mut R,
    marker: MarkerSymbol,
    quantization_style: QuantizationStyle,
    offset: u64,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<QuantizationValue>, CodestreamError> {
    // The number of subbands is not stored; it follows from the bytes left in
    // the segment and the size of each entry.
    let available = reader.remaining_bytes()? as usize;
    let entry_size = quantization_style.entry_size();
    let no_values = available / entry_size;

    if available % entry_size != 0 {
        return Err(CodestreamError::marker(
            marker,
            format!("{} quantization bytes do not divide into 16 bit entries", available),
        ));
    }

    match quantization_style {
        QuantizationStyle::ScalarDerived { .. } if no_values != 1 => {
            diagnostics.warn(
                offset,
                format!("scalar derived quantization with {} step sizes", no_values),
            );
        }
        QuantizationStyle::Reserved { value } => {
            diagnostics.warn(
                offset,
                format!("reserved quantization style {:#04x}", value),
            );
        }
        _ => {}
    }

    let mut quantization_values = Vec::with_capacity(no_values);
    for _ in 0..no_values {
        let quantization_value = match entry_size {
            // Reversible transformation values
            1 => QuantizationValue::Reversible {
                value: reader.read_array()?,
            },
            // Irreversible transformation values
            _ => QuantizationValue::Irreversible {
                value: reader.read_array()?,
            },
        };
        quantization_values.push(quantization_value);
    }

    Ok(quantization_values)
}

fn check_quantization_values(
    marker: MarkerSymbol,
    quantization_style: QuantizationStyle,
    values: &[QuantizationValue],
) -> Result<(), CodestreamError> {
    let consistent = values.iter().all(|value| match quantization_style {
        QuantizationStyle::No { .. } => matches!(value, QuantizationValue::Reversible { .. }),
        QuantizationStyle::ScalarDerived { .. } | QuantizationStyle::ScalarExpounded { .. } => {
            matches!(value, QuantizationValue::Irreversible { .. })
        }
        QuantizationStyle::Reserved { .. } => false,
    });
    if !consistent {
        return Err(CodestreamError::marker(
            marker,
            format!("step sizes do not match quantization style {}", quantization_style),
        ));
    }
    if values.is_empty() {
        return Err(CodestreamError::marker(marker, "no step sizes"));
    }
    if matches!(quantization_style, QuantizationStyle::ScalarDerived { .. }) && values.len() != 1 {
        return Err(CodestreamError::marker(
            marker,
            "scalar derived quantization carries exactly one step size",
        ));
    }
    Ok(())
}

// A.6.4
//
// Quantization default (QCD)
//
// Function: Describes the quantization default used for compressing all
// components not defined by a QCC marker segment. The parameter values can be
// overridden for an individual component by a QCC marker segment in either the
// main or tile-part header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationDefaultMarkerSegment {
    offset: u64,

    // Lqcd: Length of marker segment in bytes (not including the marker).
    length: u16,

    // Sqcd: Quantization style for all components
    quantization_style: [u8; 1],

    // SPqcd^i: Quantization step size value for the ith subband in the defined
    // order.
    values: Vec<QuantizationValue>,
}

impl QuantizationDefaultMarkerSegment {
    pub fn new(quantization_style: QuantizationStyle, values: Vec<QuantizationValue>) -> Self {
        let entry_size = quantization_style.entry_size();
        QuantizationDefaultMarkerSegment {
            offset: 0,
            length: (3 + values.len() * entry_size) as u16,
            quantization_style: [quantization_style.value()],
            values,
        }
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn quantization_style_u8(&self) -> u8 {
        self.quantization_style[0]
    }

    pub fn quantization_style(&self) -> QuantizationStyle {
        QuantizationStyle::new(self.quantization_style[0])
    }

    pub fn values(&self) -> &[QuantizationValue] {
        &self.values
    }

    pub fn quantization_values(&self) -> Vec<u16> {
        self.values.iter().map(|e| e.value()).collect()
    }

    pub fn quantization_exponents(&self) -> Vec<u8> {
        self.values.iter().map(|e| e.exponent()).collect()
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<QuantizationDefaultMarkerSegment, CodestreamError> {
        info!("QCD start at byte offset {}", offset);
        let quantization_style: [u8; 1] = reader.read_array()?;
        let values = decode_quantization_values(
            reader,
            MARKER_SYMBOL_QCD,
            QuantizationStyle::new(quantization_style[0]),
            offset,
            diagnostics,
        )?;
        debug!("QCD {} step sizes", values.len());
        info!("QCD end at byte offset {}", offset + 2 + length as u64);

        Ok(QuantizationDefaultMarkerSegment {
            offset,
            length,
            quantization_style,
            values,
        })
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        check_quantization_values(MARKER_SYMBOL_QCD, self.quantization_style(), &self.values)?;

        let mut body = vec![self.quantization_style[0]];
        for value in &self.values {
            value.encode(&mut body);
        }
        let length = encoded_length(MARKER_SYMBOL_QCD, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_QCD, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

// A.6.5
//
// Quantization component (QCC)
//
// Function: Describes the quantization used for compressing a particular
// component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizationComponentSegment {
    offset: u64,

    // Lqcc
    length: u16,

    // Cqcc: The index of the component to which this marker segment relates.
    component_index: u16,

    index_size: usize,

    // Sqcc: Quantization style for this component.
    quantization_style: [u8; 1],

    // SPqcci: Quantization value for each subband in the defined order.
    values: Vec<QuantizationValue>,
}

impl QuantizationComponentSegment {
    pub fn new(
        component_index: u16,
        no_components: u16,
        quantization_style: QuantizationStyle,
        values: Vec<QuantizationValue>,
    ) -> Self {
        let index_size = component_index_size(no_components);
        QuantizationComponentSegment {
            offset: 0,
            length: (3 + index_size + values.len() * quantization_style.entry_size()) as u16,
            component_index,
            index_size,
            quantization_style: [quantization_style.value()],
            values,
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

    pub fn quantization_style_u8(&self) -> u8 {
        self.quantization_style[0]
    }

    pub fn quantization_style(&self) -> QuantizationStyle {
        QuantizationStyle::new(self.quantization_style[0])
    }

    pub fn values(&self) -> &[QuantizationValue] {
        &self.values
    }

    pub fn quantization_exponents(&self) -> Vec<u8> {
        self.values.iter().map(|e| e.exponent()).collect()
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        no_components: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<QuantizationComponentSegment, CodestreamError> {
        info!("QCC start at byte offset {}", offset);
        let index_size = component_index_size(no_components);
        let component_index = decode_component_index(reader, index_size)?;
        let quantization_style: [u8; 1] = reader.read_array()?;
        let values = decode_quantization_values(
            reader,
            MARKER_SYMBOL_QCC,
            QuantizationStyle::new(quantization_style[0]),
            offset,
            diagnostics,
        )?;
        info!("QCC end at byte offset {}", offset + 2 + length as u64);

        Ok(QuantizationComponentSegment {
            offset,
            length,
            component_index,
            index_size,
            quantization_style,
            values,
        })
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        check_quantization_values(MARKER_SYMBOL_QCC, self.quantization_style(), &self.values)?;

        let mut body = vec![];
        encode_component_index(&mut body, self.component_index, self.index_size);
        body.push(self.quantization_style[0]);
        for value in &self.values {
            value.encode(&mut body);
        }
        let length = encoded_length(MARKER_SYMBOL_QCC, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_QCC, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}
