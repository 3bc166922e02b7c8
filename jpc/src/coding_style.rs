use crate::diagnostics::Diagnostics;
use crate::marker::{
    component_index_size, decode_component_index, encode_component_index, encoded_length,
    write_marker_header,
};
use crate::reader::ByteReader;
use crate::*;
use log::{debug, info};
use std::cmp;
use std::fmt;
use std::io;

// Scod / Scoc bits, Table A.13
const CODING_STYLE_PRECINCTS_DEFINED: u8 = 0b0000_0001;
const CODING_STYLE_SOP: u8 = 0b0000_0010;
const CODING_STYLE_EPH: u8 = 0b0000_0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionOrder {
    // 0000 0000 Layer-resolution level-component-position progression
    LRCP,

    // 0000 0001 Resolution level-layer-component-position progression
    RLCP,

    // 0000 0010 Resolution level-position-component-layer progression
    RPCL,

    // 0000 0011 Position-component-resolution level-layer progression
    PCRL,

    // 0000 0100 Component-position-resolution level-layer progression
    CPRL,

    // All other values reserved
    Reserved { value: u8 },
}

impl ProgressionOrder {
    pub fn new(value: u8) -> ProgressionOrder {
        match value {
            0b0000_0000 => ProgressionOrder::LRCP,
            0b0000_0001 => ProgressionOrder::RLCP,
            0b0000_0010 => ProgressionOrder::RPCL,
            0b0000_0011 => ProgressionOrder::PCRL,
            0b0000_0100 => ProgressionOrder::CPRL,
            _ => ProgressionOrder::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            ProgressionOrder::LRCP => 0,
            ProgressionOrder::RLCP => 1,
            ProgressionOrder::RPCL => 2,
            ProgressionOrder::PCRL => 3,
            ProgressionOrder::CPRL => 4,
            ProgressionOrder::Reserved { value } => *value,
        }
    }
}

impl fmt::Display for ProgressionOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProgressionOrder::LRCP => f.write_str("LRCP"),
            ProgressionOrder::RLCP => f.write_str("RLCP"),
            ProgressionOrder::RPCL => f.write_str("RPCL"),
            ProgressionOrder::PCRL => f.write_str("PCRL"),
            ProgressionOrder::CPRL => f.write_str("CPRL"),
            ProgressionOrder::Reserved { value } => write!(f, "invalid progression order ({})", value),
        }
    }
}

/// Code-block style flags, Table A.19. Only the flags that are set are
/// reported by `CodingBlockStyle::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingBlockStyle {
    // xxxx xxx1 - Selective arithmetic coding bypass
    SelectiveArithmeticCodingBypass,

    // xxxx xx1x - Reset context probabilities on coding pass boundaries
    ResetContextProbabilities,

    // xxxx x1xx - Termination on each coding pass
    TerminationOnEachCodingPass,

    // xxxx 1xxx - Vertically causal context
    VerticallyCausalContext,

    // xxx1 xxxx - Predictable termination
    PredictableTermination,

    // xx1x xxxx - Segmentation symbols are used
    SegmentationSymbolsAreUsed,

    // x1xx xxxx - High throughput block coding (HTJ2K)
    HighThroughput,
}

impl CodingBlockStyle {
    const ALL: [(u8, CodingBlockStyle); 7] = [
        (0b0000_0001, CodingBlockStyle::SelectiveArithmeticCodingBypass),
        (0b0000_0010, CodingBlockStyle::ResetContextProbabilities),
        (0b0000_0100, CodingBlockStyle::TerminationOnEachCodingPass),
        (0b0000_1000, CodingBlockStyle::VerticallyCausalContext),
        (0b0001_0000, CodingBlockStyle::PredictableTermination),
        (0b0010_0000, CodingBlockStyle::SegmentationSymbolsAreUsed),
        (0b0100_0000, CodingBlockStyle::HighThroughput),
    ];

    pub fn new(value: u8) -> Vec<CodingBlockStyle> {
        CodingBlockStyle::ALL
            .iter()
            .filter(|(bit, _)| value & bit != 0)
            .map(|(_, style)| *style)
            .collect()
    }

    pub fn bit(&self) -> u8 {
        CodingBlockStyle::ALL
            .iter()
            .find(|(_, style)| style == self)
            .map(|(bit, _)| *bit)
            .unwrap_or(0)
    }
}

const MULTIPLE_COMPONENT_TRANSFORMATION_NONE: u8 = 0b_0000_0000;
const MULTIPLE_COMPONENT_TRANSFORMATION_MULTIPLE: u8 = 0b_0000_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipleComponentTransformation {
    // No multiple component transformation specified.
    None,

    // Component transformation used on components 0, 1, 2 for coding efficiency.
    // Irreversible component transformation used with the 9-7 irreversible filter.
    // Reversible component transformation used with the 5-3 reversible filter.
    Multiple,

    // All other values reserved
    Reserved { value: u8 },
}

impl MultipleComponentTransformation {
    pub fn new(value: u8) -> MultipleComponentTransformation {
        match value {
            MULTIPLE_COMPONENT_TRANSFORMATION_NONE => MultipleComponentTransformation::None,
            MULTIPLE_COMPONENT_TRANSFORMATION_MULTIPLE => MultipleComponentTransformation::Multiple,
            _ => MultipleComponentTransformation::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            MultipleComponentTransformation::None => MULTIPLE_COMPONENT_TRANSFORMATION_NONE,
            MultipleComponentTransformation::Multiple => {
                MULTIPLE_COMPONENT_TRANSFORMATION_MULTIPLE
            }
            MultipleComponentTransformation::Reserved { value } => *value,
        }
    }
}

const TRANSFORMATION_FILTER_IRREVERSIBLE: u8 = 0;
const TRANSFORMATION_FILTER_REVERSIBLE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationFilter {
    // 9-7 irreversible filter
    Irreversible,
    // 5-3 reversible filter
    Reversible,

    // All other values reserved
    Reserved { value: u8 },
}

impl TransformationFilter {
    pub fn new(value: u8) -> TransformationFilter {
        match value {
            TRANSFORMATION_FILTER_IRREVERSIBLE => TransformationFilter::Irreversible,
            TRANSFORMATION_FILTER_REVERSIBLE => TransformationFilter::Reversible,
            _ => TransformationFilter::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            TransformationFilter::Irreversible => TRANSFORMATION_FILTER_IRREVERSIBLE,
            TransformationFilter::Reversible => TRANSFORMATION_FILTER_REVERSIBLE,
            TransformationFilter::Reserved { value } => *value,
        }
    }
}

impl fmt::Display for TransformationFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransformationFilter::Irreversible => f.write_str("9-7 irreversible"),
            TransformationFilter::Reversible => f.write_str("5-3 reversible"),
            TransformationFilter::Reserved { value } => {
                write!(f, "non-standard transform ({})", value)
            }
        }
    }
}

/// One precinct size byte, Table A.21.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecinctSize {
    value: u8,
}

impl PrecinctSize {
    pub fn new(width_exponent: u8, height_exponent: u8) -> Self {
        PrecinctSize {
            value: (height_exponent << 4) | (width_exponent & 0x0F),
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    // 4 LSBs are the precinct width exponent, PPx
    pub fn width_exponent(&self) -> u8 {
        self.value & 0x0F
    }

    // 4 MSBs are the precinct height exponent, PPy
    pub fn height_exponent(&self) -> u8 {
        self.value >> 4
    }

    pub fn width(&self) -> u32 {
        1 << self.width_exponent()
    }

    pub fn height(&self) -> u32 {
        1 << self.height_exponent()
    }
}

// Entropy coder, precincts with PPx = 15 and PPy = 15
const DEFAULT_PRECINCT_SIZE: PrecinctSize = PrecinctSize { value: 0xFF };

// A.12 – Coding style parameter values shared by SPcod and SPcoc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingStyleParameters {
    // Number of decomposition levels, N_L, Zero implies no transformation
    no_decomposition_levels: [u8; 1],

    // Code-block width exponent offset value, xcb
    code_block_width: [u8; 1],

    // Code-block height exponent offset value, ycb
    code_block_height: [u8; 1],

    // Style of the code-block coding passes
    code_block_style: [u8; 1],

    // Wavelet transformation used.
    transformation: [u8; 1],

    // If Scod or Scoc = xxxx xxx0, this parameter is not present; otherwise
    // this indicates precinct width and height. The first byte corresponds to
    // the N_L LL sub-band, each successive byte to the next resolution level.
    precinct_sizes: Option<Vec<u8>>,
}

impl CodingStyleParameters {
    /// `code_block_width_exponent` and `code_block_height_exponent` are the
    /// encoded offsets, so a value of 4 means 2^(4+2) = 64 samples.
    pub fn new(
        no_decomposition_levels: u8,
        code_block_width_exponent: u8,
        code_block_height_exponent: u8,
        code_block_styles: &[CodingBlockStyle],
        transformation: TransformationFilter,
        precinct_sizes: Option<Vec<PrecinctSize>>,
    ) -> Self {
        let code_block_style = code_block_styles
            .iter()
            .fold(0u8, |value, style| value | style.bit());
        CodingStyleParameters {
            no_decomposition_levels: [no_decomposition_levels],
            code_block_width: [code_block_width_exponent],
            code_block_height: [code_block_height_exponent],
            code_block_style: [code_block_style],
            transformation: [transformation.value()],
            precinct_sizes: precinct_sizes
                .map(|sizes| sizes.iter().map(|size| size.value()).collect()),
        }
    }

    pub fn no_decomposition_levels(&self) -> u8 {
        self.no_decomposition_levels[0]
    }

    // A.18
    //
    // Code-block width and height exponent offset value xcb = value + 2 or
    // ycb = value + 2. The code-block width and height are limited to powers
    // of two with the minimum size being 2^2 and the maximum being 2^10.
    pub fn code_block_width_exponent(&self) -> u8 {
        self.code_block_width[0]
    }

    pub fn code_block_height_exponent(&self) -> u8 {
        self.code_block_height[0]
    }

    pub fn code_block_width(&self) -> u32 {
        1u32 << (cmp::min(self.code_block_width[0], 29) + 2)
    }

    pub fn code_block_height(&self) -> u32 {
        1u32 << (cmp::min(self.code_block_height[0], 29) + 2)
    }

    pub fn code_block_style(&self) -> u8 {
        self.code_block_style[0]
    }

    pub fn coding_block_styles(&self) -> Vec<CodingBlockStyle> {
        CodingBlockStyle::new(self.code_block_style[0])
    }

    pub fn transformation(&self) -> TransformationFilter {
        TransformationFilter::new(self.transformation[0])
    }

    pub fn has_defined_precinct_size(&self) -> bool {
        self.precinct_sizes.is_some()
    }

    /// Precinct sizes per resolution level, or a single implicit 2^15 by
    /// 2^15 precinct when the coding style does not define them.
    pub fn precinct_sizes(&self) -> Vec<PrecinctSize> {
        match &self.precinct_sizes {
            None => vec![DEFAULT_PRECINCT_SIZE],
            Some(values) => values
                .iter()
                .map(|value| PrecinctSize { value: *value })
                .collect(),
        }
    }

    fn constraint_violation(&self) -> Option<String> {
        let xcb = self.code_block_width_exponent();
        let ycb = self.code_block_height_exponent();
        // Code-block size is restricted so that xcb + ycb <= 12, where each
        // exponent here is the encoded offset from 2.
        if xcb > 8 || ycb > 8 {
            return Some(format!(
                "code-block exponents xcb = {}, ycb = {} exceed 1024 samples",
                xcb + 2,
                ycb + 2
            ));
        }
        if xcb + ycb > 8 {
            return Some(format!(
                "code-block of {}x{} exceeds 4096 samples",
                self.code_block_width(),
                self.code_block_height()
            ));
        }
        if self.code_block_style() & 0b1000_0000 != 0 {
            return Some(format!(
                "reserved code-block style bit set in {:#04x}",
                self.code_block_style()
            ));
        }
        if self.no_decomposition_levels() > 32 {
            return Some(format!(
                "{} decomposition levels exceeds 32",
                self.no_decomposition_levels()
            ));
        }
        if let Some(values) = &self.precinct_sizes {
            let expected = self.no_decomposition_levels() as usize + 1;
            if values.len() != expected {
                return Some(format!(
                    "{} precinct sizes given for {} resolution levels",
                    values.len(),
                    expected
                ));
            }
            // Only the N_L LL resolution level may use an exponent of zero.
            for (level, value) in values.iter().enumerate().skip(1) {
                let size = PrecinctSize { value: *value };
                if size.width_exponent() == 0 || size.height_exponent() == 0 {
                    return Some(format!(
                        "precinct exponent of zero at resolution level {}",
                        level
                    ));
                }
            }
        }
        None
    }

    fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        precincts_defined: bool,
        offset: u64,
        diagnostics: &mut Diagnostics,
    ) -> Result<CodingStyleParameters, CodestreamError> {
        let mut parameters = CodingStyleParameters {
            no_decomposition_levels: reader.read_array()?,
            code_block_width: reader.read_array()?,
            code_block_height: reader.read_array()?,
            code_block_style: reader.read_array()?,
            transformation: reader.read_array()?,
            precinct_sizes: None,
        };

        if precincts_defined {
            let expected = parameters.no_decomposition_levels() as u64 + 1;
            let available = reader.remaining_bytes()?;
            if available < expected {
                diagnostics.warn(
                    offset,
                    format!(
                        "{} precinct sizes expected but only {} bytes remain",
                        expected, available
                    ),
                );
            }
            parameters.precinct_sizes = Some(reader.read_bytes(cmp::min(expected, available))?);
        }

        if let Some(violation) = parameters.constraint_violation() {
            diagnostics.warn(offset, violation);
        }

        Ok(parameters)
    }

    fn encode(&self, body: &mut Vec<u8>) {
        body.extend_from_slice(&self.no_decomposition_levels);
        body.extend_from_slice(&self.code_block_width);
        body.extend_from_slice(&self.code_block_height);
        body.extend_from_slice(&self.code_block_style);
        body.extend_from_slice(&self.transformation);
        if let Some(values) = &self.precinct_sizes {
            body.extend_from_slice(values);
        }
    }
}

// A.6.1
//
// Coding style default (COD)
//
// Function: Describes the coding style, number of decomposition levels,
// and layering that is the default used for compressing all components of
// an image (if in the main header) or a tile (if in the tile-part header).
//
// The parameter values can be overridden for an individual component by a
// COC marker segment in either the main or tile-part header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingStyleMarkerSegment {
    offset: u64,

    length: u16,

    // Scod: Coding style for all components
    coding_style: [u8; 1],

    // Progression order
    progression_order: [u8; 1],

    // Number of layers
    no_layers: [u8; 2],

    // Multiple component transformation
    multiple_component_transformation: [u8; 1],

    coding_style_parameters: CodingStyleParameters,
}

impl CodingStyleMarkerSegment {
    pub fn new(
        sop: bool,
        eph: bool,
        progression_order: ProgressionOrder,
        no_layers: u16,
        multiple_component_transformation: MultipleComponentTransformation,
        coding_style_parameters: CodingStyleParameters,
    ) -> Self {
        let mut coding_style = 0;
        if coding_style_parameters.has_defined_precinct_size() {
            coding_style |= CODING_STYLE_PRECINCTS_DEFINED;
        }
        if sop {
            coding_style |= CODING_STYLE_SOP;
        }
        if eph {
            coding_style |= CODING_STYLE_EPH;
        }
        let mut segment = CodingStyleMarkerSegment {
            offset: 0,
            length: 0,
            coding_style: [coding_style],
            progression_order: [progression_order.value()],
            no_layers: no_layers.to_be_bytes(),
            multiple_component_transformation: [multiple_component_transformation.value()],
            coding_style_parameters,
        };
        segment.length = (2 + segment.body().len()) as u16;
        segment
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn coding_style(&self) -> u8 {
        self.coding_style[0]
    }

    pub fn has_defined_precinct_size(&self) -> bool {
        self.coding_style[0] & CODING_STYLE_PRECINCTS_DEFINED != 0
    }

    pub fn uses_sop(&self) -> bool {
        self.coding_style[0] & CODING_STYLE_SOP != 0
    }

    pub fn uses_eph(&self) -> bool {
        self.coding_style[0] & CODING_STYLE_EPH != 0
    }

    pub fn progression_order(&self) -> ProgressionOrder {
        ProgressionOrder::new(self.progression_order[0])
    }

    pub fn no_layers(&self) -> u16 {
        u16::from_be_bytes(self.no_layers)
    }

    pub fn multiple_component_transformation(&self) -> MultipleComponentTransformation {
        MultipleComponentTransformation::new(self.multiple_component_transformation[0])
    }

    pub fn coding_style_parameters(&self) -> &CodingStyleParameters {
        &self.coding_style_parameters
    }

    /// Checks the constraints that depend on the image, the multiple
    /// component transformation needs at least three components.
    pub fn validate(&self, no_components: u16) -> Result<(), CodestreamError> {
        if self.multiple_component_transformation() == MultipleComponentTransformation::Multiple
            && no_components < 3
        {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_COD,
                format!(
                    "multiple component transformation requires 3 components, found {}",
                    no_components
                ),
            ));
        }
        Ok(())
    }

    fn body(&self) -> Vec<u8> {
        let mut body = vec![
            self.coding_style[0],
            self.progression_order[0],
            self.no_layers[0],
            self.no_layers[1],
            self.multiple_component_transformation[0],
        ];
        self.coding_style_parameters.encode(&mut body);
        body
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<CodingStyleMarkerSegment, CodestreamError> {
        info!("COD start at byte offset {}", offset);
        let coding_style: [u8; 1] = reader.read_array()?;
        let progression_order = reader.read_array()?;
        let no_layers = reader.read_array()?;
        let multiple_component_transformation = reader.read_array()?;

        let segment = CodingStyleMarkerSegment {
            offset,
            length,
            coding_style,
            progression_order,
            no_layers,
            multiple_component_transformation,
            coding_style_parameters: CodingStyleParameters::decode(
                reader,
                coding_style[0] & CODING_STYLE_PRECINCTS_DEFINED != 0,
                offset,
                diagnostics,
            )?,
        };

        debug!(
            "COD progression order {}, {} layers, {} decomposition levels",
            segment.progression_order(),
            segment.no_layers(),
            segment.coding_style_parameters.no_decomposition_levels()
        );
        info!("COD end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        if let Some(violation) = self.coding_style_parameters.constraint_violation() {
            return Err(CodestreamError::marker(MARKER_SYMBOL_COD, violation));
        }
        if self.has_defined_precinct_size() != self.coding_style_parameters.has_defined_precinct_size() {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_COD,
                "Scod precinct flag disagrees with the precinct sizes present",
            ));
        }

        let body = self.body();
        let length = encoded_length(MARKER_SYMBOL_COD, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_COD, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

// A.6.2
//
// Coding style component (COC)
//
// Function: Describes the coding style, number of decomposition levels, and
// layering used for compressing a particular component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingStyleComponentSegment {
    offset: u64,

    length: u16,

    // Ccoc: The index of the component to which this marker segment relates.
    index: u16,

    // 1 byte when Csiz < 257, 2 bytes otherwise.
    index_size: usize,

    // Scoc: Coding style for this component
    coding_style: [u8; 1],

    // SPcoc: Parameters for coding style designated in Scoc.
    coding_style_parameters: CodingStyleParameters,
}

impl CodingStyleComponentSegment {
    pub fn new(
        component_index: u16,
        no_components: u16,
        coding_style_parameters: CodingStyleParameters,
    ) -> Self {
        let coding_style = if coding_style_parameters.has_defined_precinct_size() {
            CODING_STYLE_PRECINCTS_DEFINED
        } else {
            0
        };
        let mut segment = CodingStyleComponentSegment {
            offset: 0,
            length: 0,
            index: component_index,
            index_size: component_index_size(no_components),
            coding_style: [coding_style],
            coding_style_parameters,
        };
        segment.length = (2 + segment.body().len()) as u16;
        segment
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn component_index(&self) -> u16 {
        self.index
    }

    pub fn coding_style(&self) -> u8 {
        self.coding_style[0]
    }

    pub fn has_defined_precinct_size(&self) -> bool {
        self.coding_style[0] & CODING_STYLE_PRECINCTS_DEFINED != 0
    }

    pub fn coding_style_parameters(&self) -> &CodingStyleParameters {
        &self.coding_style_parameters
    }

    fn body(&self) -> Vec<u8> {
        let mut body = vec![];
        encode_component_index(&mut body, self.index, self.index_size);
        body.push(self.coding_style[0]);
        self.coding_style_parameters.encode(&mut body);
        body
    }

    pub(crate) fn decode<R: io::Read + io::Seek>(
        reader: &mut R,
        offset: u64,
        length: u16,
        no_components: u16,
        diagnostics: &mut Diagnostics,
    ) -> Result<CodingStyleComponentSegment, CodestreamError> {
        info!("COC start at byte offset {}", offset);
        let index_size = component_index_size(no_components);
        let index = decode_component_index(reader, index_size)?;
        let coding_style: [u8; 1] = reader.read_array()?;

        let segment = CodingStyleComponentSegment {
            offset,
            length,
            index,
            index_size,
            coding_style,
            coding_style_parameters: CodingStyleParameters::decode(
                reader,
                coding_style[0] & CODING_STYLE_PRECINCTS_DEFINED != 0,
                offset,
                diagnostics,
            )?,
        };
        info!("COC end at byte offset {}", offset + 2 + length as u64);

        Ok(segment)
    }

    pub fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), CodestreamError> {
        if let Some(violation) = self.coding_style_parameters.constraint_violation() {
            return Err(CodestreamError::marker(MARKER_SYMBOL_COC, violation));
        }
        if self.has_defined_precinct_size() != self.coding_style_parameters.has_defined_precinct_size() {
            return Err(CodestreamError::marker(
                MARKER_SYMBOL_COC,
                "Scoc precinct flag disagrees with the precinct sizes present",
            ));
        }

        let body = self.body();
        let length = encoded_length(MARKER_SYMBOL_COC, 2 + body.len())?;
        write_marker_header(writer, MARKER_SYMBOL_COC, length)?;
        writer.write_all(&body)?;
        Ok(())
    }
}
