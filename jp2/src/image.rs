use crate::*;
use jpc::{ByteReader, Diagnostics};
use log::debug;
use std::fmt;
use std::io;

const COMPRESSION_TYPE_WAVELET: u8 = 7;

// A bits per component value of 255 signals that components vary in bit depth
// and that a Bits Per Component box follows.
const BITS_PER_COMPONENT_VARY: u8 = 255;

/// Bit depth and signedness packed in one byte.
///
/// The low 7-bits of the value indicate the bit depth minus one. The high-bit
/// indicates whether the component is signed or unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepth(u8);

impl BitDepth {
    pub fn new(bit_depth: u8, signed: bool) -> Self {
        BitDepth(((signed as u8) << 7) | (bit_depth.saturating_sub(1) & 0x7F))
    }

    pub fn from_byte(value: u8) -> Self {
        BitDepth(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Bit depth from 1 to 38, counting the sign bit.
    pub fn bit_depth(&self) -> u8 {
        (self.0 & 0x7F) + 1
    }

    pub fn is_signed(&self) -> bool {
        self.0 & 0x80 == 0x80
    }

    /// Number of bytes of a palette entry with this depth.
    pub fn byte_width(&self) -> u8 {
        (self.bit_depth() + 7) / 8
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_signed() {
            write!(f, "{} (signed)", self.bit_depth())
        } else {
            write!(f, "{}", self.bit_depth())
        }
    }
}

// I.5.3.1
//
// Image Header box
//
// This box contains fixed length generic information about the image, such as
// the image size and number of components.
//
// The contents of the JP2 Header box shall start with an Image Header box.
// The length of the Image Header box shall be 22 bytes, including the box
// length and type fields.
//
// Files that contain contradictory information between the Image Header box
// and the first codestream are not conforming files. However, readers may
// choose to attempt to read these files by using the values found within the
// codestream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageHeaderBox {
    height: [u8; 4],
    width: [u8; 4],
    components_num: [u8; 2],
    components_bits: [u8; 1],
    compression_type: [u8; 1],
    colourspace_unknown: [u8; 1],
    intellectual_property: [u8; 1],
}

impl ImageHeaderBox {
    /// Image header for a wavelet compressed image with a known colourspace.
    ///
    /// `bit_depth` of `None` writes 255, meaning components vary in depth.
    pub fn new(height: u32, width: u32, components_num: u16, bit_depth: Option<BitDepth>) -> Self {
        ImageHeaderBox {
            height: height.to_be_bytes(),
            width: width.to_be_bytes(),
            components_num: components_num.to_be_bytes(),
            components_bits: [bit_depth.map_or(BITS_PER_COMPONENT_VARY, |b| b.value())],
            compression_type: [COMPRESSION_TYPE_WAVELET],
            colourspace_unknown: [0],
            intellectual_property: [0],
        }
    }

    // Image area height.
    //
    // The value of this field shall be Ysiz - YOsiz, where Ysiz and YOsiz are
    // the values of the respective fields in the SIZ marker in the codestream.
    pub fn height(&self) -> u32 {
        u32::from_be_bytes(self.height)
    }

    // Image area width.
    //
    // The value of this field shall be Xsiz - XOsiz.
    pub fn width(&self) -> u32 {
        u32::from_be_bytes(self.width)
    }

    // Number of components.
    //
    // The value of this field shall be equal to the value of the Csiz field in
    // the SIZ marker in the codestream.
    pub fn components_num(&self) -> u16 {
        u16::from_be_bytes(self.components_num)
    }

    pub fn components_bits(&self) -> u8 {
        self.components_bits[0]
    }

    /// Bit depth shared by every component, or `None` when the components
    /// vary in bit depth and a Bits Per Component box defines them.
    pub fn bit_depth(&self) -> Option<BitDepth> {
        match self.components_bits[0] {
            BITS_PER_COMPONENT_VARY => None,
            value => Some(BitDepth::from_byte(value)),
        }
    }

    // Compression type.
    //
    // The value of this field shall be 7. Other values are reserved for ISO
    // use.
    pub fn compression_type(&self) -> u8 {
        self.compression_type[0]
    }

    // Colourspace Unknown.
    //
    // 0 if the colourspace of the image is known and correctly specified in
    // the Colourspace Specification boxes, 1 if it is not known.
    pub fn colourspace_unknown(&self) -> u8 {
        self.colourspace_unknown[0]
    }

    // Intellectual Property.
    //
    // 1 when the file contains an IPR box, 0 otherwise.
    pub fn intellectual_property(&self) -> u8 {
        self.intellectual_property[0]
    }
}

impl JBox for ImageHeaderBox {
    // The type of the Image Header box shall be 'ihdr' (0x6968 6472)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_IMAGE_HEADER
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        reader.read_exact(&mut self.height)?;
        reader.read_exact(&mut self.width)?;
        reader.read_exact(&mut self.components_num)?;
        reader.read_exact(&mut self.components_bits)?;
        reader.read_exact(&mut self.compression_type)?;
        reader.read_exact(&mut self.colourspace_unknown)?;
        reader.read_exact(&mut self.intellectual_property)?;

        if self.compression_type() != COMPRESSION_TYPE_WAVELET {
            diagnostics.warn(
                11,
                format!("compression type {} unexpected", self.compression_type()),
            );
        }
        debug!(
            "Image {}x{} with {} components",
            self.width(),
            self.height(),
            self.components_num()
        );
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        14
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.height)?;
        writer.write_all(&self.width)?;
        writer.write_all(&self.components_num)?;
        writer.write_all(&self.components_bits)?;
        writer.write_all(&self.compression_type)?;
        writer.write_all(&self.colourspace_unknown)?;
        writer.write_all(&self.intellectual_property)?;
        Ok(())
    }
}

// I.5.3.2
//
// The Bits Per Component box specifies the bit depth of each component.
//
// If the bit depth of all components in the codestream is the same (in both
// sign and precision), then this box shall not be found. Otherwise, this box
// specifies the bit depth of each individual component, in the order in which
// the components are enumerated within the codestream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitsPerComponentBox {
    bits_per_component: Vec<BitDepth>,
}

impl BitsPerComponentBox {
    pub fn new(bits_per_component: Vec<BitDepth>) -> Self {
        BitsPerComponentBox { bits_per_component }
    }

    pub fn bits_per_component(&self) -> &[BitDepth] {
        &self.bits_per_component
    }
}

impl JBox for BitsPerComponentBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_BITS_PER_COMPONENT
    }

    // The number of BPC fields is determined by the length of the box.
    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let length = reader.remaining_bytes()?;
        self.bits_per_component = reader
            .read_bytes(length)?
            .into_iter()
            .map(BitDepth::from_byte)
            .collect();
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.bits_per_component.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        let bytes: Vec<u8> = self.bits_per_component.iter().map(|b| b.value()).collect();
        writer.write_all(&bytes)?;
        Ok(())
    }
}

/// Palette box.
///
/// The palette specified in this box is applied to a single component to
/// convert it into multiple components. The mapping of an actual component
/// from the codestream through the palette is specified in the Component
/// Mapping box.
///
/// If the JP2 Header box contains a Palette box, then it shall also contain a
/// Component Mapping box.
///
/// See Part 1 Section I.5.3.4 for more information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteBox {
    generated_components: Vec<GeneratedComponent>,
    num_entries: u16,
}

/// One column of a palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedComponent {
    // The number of B^i values shall be the same as the value of the NPC
    // field.
    bit_depth: BitDepth,

    // If the value of B^i is not a multiple of 8, then each C^ji value is
    // padded with zeros to a multiple of 8 bits and the actual value shall be
    // stored in the low-order bits of the padded value.
    values: Vec<u32>,
}

impl GeneratedComponent {
    pub fn new(bit_depth: BitDepth, values: Vec<u32>) -> Self {
        GeneratedComponent { bit_depth, values }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }
}

impl PaletteBox {
    /// Palette from its columns, which must all hold the same number of
    /// entries.
    pub fn new(generated_components: Vec<GeneratedComponent>) -> Self {
        let num_entries = generated_components
            .first()
            .map_or(0, |component| component.values.len() as u16);
        PaletteBox {
            generated_components,
            num_entries,
        }
    }

    /// Number of entries in the table, 1 to 1024.
    pub fn num_entries(&self) -> u16 {
        self.num_entries
    }

    /// Number of components created by the application of the palette.
    pub fn num_components(&self) -> u8 {
        self.generated_components.len() as u8
    }

    pub fn generated_components(&self) -> &[GeneratedComponent] {
        &self.generated_components
    }

    fn row_width(&self) -> u64 {
        self.generated_components
            .iter()
            .map(|component| component.bit_depth.byte_width() as u64)
            .sum()
    }
}

impl JBox for PaletteBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_PALETTE
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.num_entries = reader.read_u16()?;
        let num_components = reader.read_u8()?;

        if !(1..=1024).contains(&self.num_entries) {
            diagnostics.warn(
                0,
                format!("palette entry count {} out of range", self.num_entries),
            );
        }

        let bit_depths = reader.read_bytes(num_components as u64)?;
        self.generated_components = Vec::with_capacity(num_components as usize);
        for byte in bit_depths {
            let bit_depth = BitDepth::from_byte(byte);
            if bit_depth.bit_depth() > 32 {
                return Err(JP2Error::malformed(
                    BOX_TYPE_PALETTE,
                    format!("unsupported palette bit depth {}", bit_depth.bit_depth()),
                ));
            }
            self.generated_components.push(GeneratedComponent {
                bit_depth,
                values: Vec::with_capacity(self.num_entries as usize),
            });
        }

        // Entries are stored row by row: all of the generated component values
        // for entry j are grouped together.
        for _ in 0..self.num_entries {
            for component in &mut self.generated_components {
                let width = component.bit_depth.byte_width() as usize;
                let mut buffer = [0u8; 4];
                reader.read_exact(&mut buffer[4 - width..])?;
                component.values.push(u32::from_be_bytes(buffer));
            }
        }

        debug!(
            "Palette of {} entries and {} components",
            self.num_entries,
            self.num_components()
        );
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        3 + self.generated_components.len() as u64 + self.num_entries as u64 * self.row_width()
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        if !(1..=1024).contains(&self.num_entries) {
            return Err(JP2Error::malformed(
                BOX_TYPE_PALETTE,
                format!("palette entry count {} out of range", self.num_entries),
            ));
        }
        if self.generated_components.is_empty() || self.generated_components.len() > 255 {
            return Err(JP2Error::malformed(
                BOX_TYPE_PALETTE,
                format!(
                    "palette component count {} out of range",
                    self.generated_components.len()
                ),
            ));
        }
        for (i, component) in self.generated_components.iter().enumerate() {
            if component.values.len() != self.num_entries as usize {
                return Err(JP2Error::malformed(
                    BOX_TYPE_PALETTE,
                    format!(
                        "palette column {} has {} entries, expected {}",
                        i,
                        component.values.len(),
                        self.num_entries
                    ),
                ));
            }
        }

        writer.write_all(&self.num_entries.to_be_bytes())?;
        writer.write_all(&[self.num_components()])?;
        for component in &self.generated_components {
            writer.write_all(&[component.bit_depth.value()])?;
        }
        for j in 0..self.num_entries as usize {
            for component in &self.generated_components {
                let width = component.bit_depth.byte_width() as usize;
                writer.write_all(&component.values[j].to_be_bytes()[4 - width..])?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentMapType {
    // Direct use.
    //
    // This channel is created directly from an actual component in the
    // codestream.
    Direct,

    // Palette mapping.
    //
    // This channel is created by applying the palette to an actual component
    // in the codestream. The column from the palette to use is specified in
    // the PCOL^i field for this channel.
    Palette,

    // Reserved for ISO use
    Reserved { value: u8 },
}

impl ComponentMapType {
    pub fn new(value: u8) -> ComponentMapType {
        match value {
            0 => ComponentMapType::Direct,
            1 => ComponentMapType::Palette,
            value => ComponentMapType::Reserved { value },
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            ComponentMapType::Direct => 0,
            ComponentMapType::Palette => 1,
            ComponentMapType::Reserved { value } => *value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentMap {
    // This field specifies the index of component from the codestream that is
    // mapped to this channel (either directly or through a palette).
    component: u16,

    mapping_type: ComponentMapType,

    // If the value of the MTYP^i field for this channel is 0, then the value
    // of this field shall be 0.
    palette: u8,
}

impl ComponentMap {
    pub fn new(component: u16, mapping_type: ComponentMapType, palette: u8) -> Self {
        ComponentMap {
            component,
            mapping_type,
            palette,
        }
    }

    pub fn component(&self) -> u16 {
        self.component
    }

    pub fn mapping_type(&self) -> ComponentMapType {
        self.mapping_type
    }

    pub fn palette(&self) -> u8 {
        self.palette
    }
}

/// Component Mapping Box.
///
/// The Component Mapping box defines how image channels are identified from the
/// actual components decoded from the codestream.
///
/// The channels are numbered in order starting with zero, and the number of
/// channels specified in the Component Mapping box is determined by the length
/// of the box.
///
/// See ISO/IEC 15444-1:2024 Section I.5.3.5.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentMappingBox {
    mapping: Vec<ComponentMap>,
}

impl ComponentMappingBox {
    pub fn new(mapping: Vec<ComponentMap>) -> Self {
        ComponentMappingBox { mapping }
    }

    pub fn component_map(&self) -> &[ComponentMap] {
        &self.mapping
    }
}

impl JBox for ComponentMappingBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_COMPONENT_MAPPING
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        // Trailing bytes short of a full entry are left for the caller.
        let length = reader.remaining_bytes()?;
        for _ in 0..length / 4 {
            let component = reader.read_u16()?;
            let mapping_type = ComponentMapType::new(reader.read_u8()?);
            let palette = reader.read_u8()?;
            self.mapping
                .push(ComponentMap::new(component, mapping_type, palette));
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        4 * self.mapping.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        for map in &self.mapping {
            writer.write_all(&map.component.to_be_bytes())?;
            writer.write_all(&[map.mapping_type.value(), map.palette])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTypes {
    ColourImageData,
    Opacity,
    PremultipliedOpacity,
    Reserved { value: u16 },
    Unspecified,
}

impl ChannelTypes {
    pub fn new(value: u16) -> ChannelTypes {
        match value {
            0 => ChannelTypes::ColourImageData,
            1 => ChannelTypes::Opacity,
            2 => ChannelTypes::PremultipliedOpacity,
            u16::MAX => ChannelTypes::Unspecified,
            value => ChannelTypes::Reserved { value },
        }
    }

    pub fn value(&self) -> u16 {
        match self {
            ChannelTypes::ColourImageData => 0,
            ChannelTypes::Opacity => 1,
            ChannelTypes::PremultipliedOpacity => 2,
            ChannelTypes::Reserved { value } => *value,
            ChannelTypes::Unspecified => u16::MAX,
        }
    }
}

impl fmt::Display for ChannelTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelTypes::ColourImageData => f.write_str("color"),
            ChannelTypes::Opacity => f.write_str("opacity"),
            ChannelTypes::PremultipliedOpacity => f.write_str("pre-multiplied opacity"),
            ChannelTypes::Reserved { value } => write!(f, "{} (invalid)", value),
            ChannelTypes::Unspecified => f.write_str("unspecified"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    // Channel index
    //
    // The index of the channel as defined within the Component Mapping box
    // (or the actual component from the codestream if the file does not
    // contain a Component Mapping box).
    channel_index: u16,

    channel_type: ChannelTypes,

    // Channel association
    //
    // The index of the colour for which this channel is directly associated,
    // 0 for the whole image or 2^16 - 1 for no association.
    channel_association: u16,
}

impl Channel {
    pub fn new(channel_index: u16, channel_type: ChannelTypes, channel_association: u16) -> Self {
        Channel {
            channel_index,
            channel_type,
            channel_association,
        }
    }

    pub fn channel_index(&self) -> u16 {
        self.channel_index
    }

    pub fn channel_type(&self) -> ChannelTypes {
        self.channel_type
    }

    pub fn channel_association(&self) -> u16 {
        self.channel_association
    }
}

// I.5.3.6
//
// Channel Definition Box
//
// The Channel Definition box specifies the meaning of the samples in each
// channel in the image.
//
// This box may specify multiple descriptions for a single channel; however,
// the type value in each description for the same channel shall be the same in
// all descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDefinitionBox {
    channels: Vec<Channel>,
}

impl ChannelDefinitionBox {
    pub fn new(channels: Vec<Channel>) -> Self {
        ChannelDefinitionBox { channels }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl JBox for ChannelDefinitionBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_CHANNEL_DEFINITION
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        // Number of channel descriptions.
        let size = reader.read_u16()?;

        self.channels = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let channel_index = reader.read_u16()?;
            let channel_type = ChannelTypes::new(reader.read_u16()?);
            let channel_association = reader.read_u16()?;

            debug!(
                "Found channel at index {:?} of type {:?} and association {:?}",
                channel_index, channel_type, channel_association,
            );
            self.channels.push(Channel::new(
                channel_index,
                channel_type,
                channel_association,
            ));
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        2 + 6 * self.channels.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&(self.channels.len() as u16).to_be_bytes())?;
        for channel in &self.channels {
            writer.write_all(&channel.channel_index.to_be_bytes())?;
            writer.write_all(&channel.channel_type.value().to_be_bytes())?;
            writer.write_all(&channel.channel_association.to_be_bytes())?;
        }
        Ok(())
    }
}
