use crate::*;
use jpc::{ByteReader, Diagnostics};
use log::debug;
use std::fmt;
use std::io;

// Mask widths accepted by the ML field, in bytes.
const MASK_LENGTHS: [u8; 4] = [1, 2, 4, 8];

fn read_mask<R: io::Read + io::Seek>(reader: &mut R, mask_length: u8) -> io::Result<u64> {
    let mut buffer = [0u8; 8];
    reader.read_exact(&mut buffer[8 - mask_length as usize..])?;
    Ok(u64::from_be_bytes(buffer))
}

fn write_mask<W: io::Write>(writer: &mut W, mask: u64, mask_length: u8) -> io::Result<()> {
    writer.write_all(&mask.to_be_bytes()[8 - mask_length as usize..])
}

/// A standard feature flag with its compatibility mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFeature {
    flag: u16,
    mask: u64,
}

impl StandardFeature {
    pub fn new(flag: u16, mask: u64) -> Self {
        StandardFeature { flag, mask }
    }

    pub fn flag(&self) -> u16 {
        self.flag
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Description of the flag from Table M.14.
    pub fn description(&self) -> &'static str {
        match self.flag {
            0 => "File not completely understood",
            1 => "Deprecated - contains no extensions",
            2 => "Contains multiple composition layers",
            3 => "Deprecated - codestream is compressed using JPEG 2000 and requires at least a Profile 0 decoder",
            4 => "JPEG 2000 Part 1 Profile 1 codestream",
            5 => "Unrestricted JPEG 2000 Part 1 codestream, ITU-T Rec. T.800 | ISO/IEC 15444-1",
            6 => "Unrestricted JPEG 2000 Part 2 codestream",
            7 => "JPEG codestream as defined in ISO/IEC 10918-1",
            8 => "Deprecated - does not contain opacity",
            9 => "Non-premultiplied opacity channel",
            10 => "Premultiplied opacity channel",
            11 => "Chroma-key based opacity",
            12 => "Deprecated - codestream is contiguous",
            13 => "Fragmented codestream where all fragments are in file and in order",
            14 => "Fragmented codestream where all fragments are in file but are out of order",
            15 => "Fragmented codestream where not all fragments are within the file but are all in locally accessible files",
            16 => "Fragmented codestream where some fragments may be accessible only through a URL specified network connection",
            17 => "Compositing required to produce rendered result from multiple compositing layers",
            18 => "Deprecated - support for compositing is not required",
            19 => "Deprecated - contains multiple, discrete layers that should not be combined through either animation or compositing",
            20 => "Deprecated - compositing layers each contain only a single codestream",
            21 => "At least one compositing layer consists of multiple codestreams",
            22 => "Deprecated - all compositing layers are in the same colourspace",
            23 => "Colourspace transformations are required to combine compositing layers; not all compositing layers are in the same colourspace",
            24 => "Deprecated - rendered result created without using animation",
            25 => "Animated, but first layer covers entire area and is opaque",
            26 => "Animated, but first layer does not cover entire rendered result",
            27 => "Deprecated - animated, and no layer is reused",
            28 => "Animated, but layers are reused",
            44 => "Compositing layer uses Any ICC profile",
            _ => "Unrecognized feature",
        }
    }
}

/// A vendor feature UUID with its compatibility mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorFeature {
    uuid: [u8; 16],
    mask: u64,
}

impl VendorFeature {
    pub fn new(uuid: [u8; 16], mask: u64) -> Self {
        VendorFeature { uuid, mask }
    }

    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    pub fn uuid_str(&self) -> String {
        crate::uuid::uuid_str(&self.uuid)
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }
}

// M.11.1
//
// Reader Requirements box
//
// The Reader Requirements box specifies the features a reader needs in order
// to fully understand or completely decode the file. Masks are ML bytes wide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderRequirementsBox {
    mask_length: u8,

    // FUAM: Fully Understand Aspects mask.
    fully_understand_aspects_mask: u64,

    // DCM: Decode Completely mask.
    decode_completely_mask: u64,

    standard_features: Vec<StandardFeature>,
    vendor_features: Vec<VendorFeature>,
}

impl Default for ReaderRequirementsBox {
    fn default() -> Self {
        ReaderRequirementsBox {
            mask_length: 1,
            fully_understand_aspects_mask: 0,
            decode_completely_mask: 0,
            standard_features: Vec::new(),
            vendor_features: Vec::new(),
        }
    }
}

impl ReaderRequirementsBox {
    pub fn new(
        mask_length: u8,
        fully_understand_aspects_mask: u64,
        decode_completely_mask: u64,
        standard_features: Vec<StandardFeature>,
        vendor_features: Vec<VendorFeature>,
    ) -> Result<Self, JP2Error> {
        if !MASK_LENGTHS.contains(&mask_length) {
            return Err(JP2Error::malformed(
                BOX_TYPE_READER_REQUIREMENTS,
                format!("unsupported mask length {}", mask_length),
            ));
        }
        Ok(ReaderRequirementsBox {
            mask_length,
            fully_understand_aspects_mask,
            decode_completely_mask,
            standard_features,
            vendor_features,
        })
    }

    pub fn mask_length(&self) -> u8 {
        self.mask_length
    }

    pub fn fully_understand_aspects_mask(&self) -> u64 {
        self.fully_understand_aspects_mask
    }

    pub fn decode_completely_mask(&self) -> u64 {
        self.decode_completely_mask
    }

    pub fn standard_features(&self) -> &[StandardFeature] {
        &self.standard_features
    }

    pub fn vendor_features(&self) -> &[VendorFeature] {
        &self.vendor_features
    }
}

impl JBox for ReaderRequirementsBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_READER_REQUIREMENTS
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.mask_length = reader.read_u8()?;
        if !MASK_LENGTHS.contains(&self.mask_length) {
            return Err(JP2Error::malformed(
                BOX_TYPE_READER_REQUIREMENTS,
                format!("unsupported mask length {}", self.mask_length),
            ));
        }

        self.fully_understand_aspects_mask = read_mask(reader, self.mask_length)?;
        self.decode_completely_mask = read_mask(reader, self.mask_length)?;

        // NSF: Number of standard flags.
        let standard_count = reader.read_u16()?;
        self.standard_features = Vec::with_capacity(standard_count as usize);
        for _ in 0..standard_count {
            let flag = reader.read_u16()?;
            let mask = read_mask(reader, self.mask_length)?;
            self.standard_features.push(StandardFeature::new(flag, mask));
        }

        // NVF: Number of vendor features.
        let vendor_count = reader.read_u16()?;
        self.vendor_features = Vec::with_capacity(vendor_count as usize);
        for _ in 0..vendor_count {
            let uuid = reader.read_array()?;
            let mask = read_mask(reader, self.mask_length)?;
            self.vendor_features.push(VendorFeature::new(uuid, mask));
        }

        debug!(
            "Reader requirements with {} standard and {} vendor features",
            standard_count, vendor_count
        );
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        let ml = self.mask_length as u64;
        1 + 2 * ml
            + 2
            + self.standard_features.len() as u64 * (2 + ml)
            + 2
            + self.vendor_features.len() as u64 * (16 + ml)
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&[self.mask_length])?;
        write_mask(writer, self.fully_understand_aspects_mask, self.mask_length)?;
        write_mask(writer, self.decode_completely_mask, self.mask_length)?;
        writer.write_all(&(self.standard_features.len() as u16).to_be_bytes())?;
        for feature in &self.standard_features {
            writer.write_all(&feature.flag.to_be_bytes())?;
            write_mask(writer, feature.mask, self.mask_length)?;
        }
        writer.write_all(&(self.vendor_features.len() as u16).to_be_bytes())?;
        for feature in &self.vendor_features {
            writer.write_all(&feature.uuid)?;
            write_mask(writer, feature.mask, self.mask_length)?;
        }
        Ok(())
    }
}

// Number list entries select the entity an association applies to.
const NUMBER_LIST_CODESTREAM: u32 = 0x0100_0000;
const NUMBER_LIST_COMPOSITING_LAYER: u32 = 0x0200_0000;

/// Association target named by a Number List entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    RenderedResult,
    Codestream(u32),
    CompositingLayer(u32),
    Unrecognized(u32),
}

impl Association {
    pub fn new(value: u32) -> Association {
        match value & 0xFF00_0000 {
            _ if value == 0 => Association::RenderedResult,
            NUMBER_LIST_CODESTREAM => Association::Codestream(value & 0x00FF_FFFF),
            NUMBER_LIST_COMPOSITING_LAYER => Association::CompositingLayer(value & 0x00FF_FFFF),
            _ => Association::Unrecognized(value),
        }
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Association::RenderedResult => f.write_str("the rendered result"),
            Association::Codestream(index) => write!(f, "codestream {}", index),
            Association::CompositingLayer(index) => write!(f, "compositing layer {}", index),
            Association::Unrecognized(value) => write!(f, "0x{:08x} (unrecognized)", value),
        }
    }
}

// M.11.15
//
// Number List box
//
// This box specifies a list of the codestreams and compositing layers an
// Association box is associated with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberListBox {
    associations: Vec<u32>,
}

impl NumberListBox {
    pub fn new(associations: Vec<u32>) -> Self {
        NumberListBox { associations }
    }

    pub fn associations(&self) -> &[u32] {
        &self.associations
    }
}

impl JBox for NumberListBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_NUMBER_LIST
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let remaining = reader.remaining_bytes()?;
        self.associations = (0..remaining / 4)
            .map(|_| reader.read_u32())
            .collect::<io::Result<_>>()?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        4 * self.associations.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        for association in &self.associations {
            writer.write_all(&association.to_be_bytes())?;
        }
        Ok(())
    }
}

/// One fragment of a codestream stored elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    // OFF: Offset of the fragment within its file.
    offset: u64,

    // LEN: Length of the fragment.
    length: u32,

    // DR: Data reference. 0 means this file, otherwise an index into the Data
    // Reference box.
    data_reference: u16,
}

impl Fragment {
    pub fn new(offset: u64, length: u32, data_reference: u16) -> Self {
        Fragment {
            offset,
            length,
            data_reference,
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn data_reference(&self) -> u16 {
        self.data_reference
    }
}

// M.11.3.1
//
// Fragment List box
//
// This box specifies a list of fragments that make up one particular
// codestream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentListBox {
    fragments: Vec<Fragment>,
}

impl FragmentListBox {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        FragmentListBox { fragments }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
}

impl JBox for FragmentListBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_FRAGMENT_LIST
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        // NF: Number of fragments.
        let size = reader.read_u16()?;
        let remaining = reader.remaining_bytes()?;
        if remaining < size as u64 * 14 {
            return Err(JP2Error::malformed(
                BOX_TYPE_FRAGMENT_LIST,
                format!("{} fragments do not fit in {} bytes", size, remaining),
            ));
        }

        self.fragments = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let offset = reader.read_u64()?;
            let length = reader.read_u32()?;
            let data_reference = reader.read_u16()?;
            self.fragments
                .push(Fragment::new(offset, length, data_reference));
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        2 + 14 * self.fragments.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&(self.fragments.len() as u16).to_be_bytes())?;
        for fragment in &self.fragments {
            writer.write_all(&fragment.offset.to_be_bytes())?;
            writer.write_all(&fragment.length.to_be_bytes())?;
            writer.write_all(&fragment.data_reference.to_be_bytes())?;
        }
        Ok(())
    }
}

// M.11.4
//
// Data Reference box
//
// This box contains an array of Data Entry URL boxes, referenced by the data
// reference field of fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataReferenceBox {
    references: Vec<DataEntryURLBox>,
}

impl DataReferenceBox {
    pub fn new(references: Vec<DataEntryURLBox>) -> Self {
        DataReferenceBox { references }
    }

    pub fn references(&self) -> &[DataEntryURLBox] {
        &self.references
    }
}

impl JBox for DataReferenceBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_DATA_REFERENCE
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        // NDR: Number of data references.
        let size = reader.read_u16()?;

        self.references = Vec::with_capacity(size as usize);
        for _ in 0..size {
            let header = decode_box_header(reader)?;
            if header.box_type() != BOX_TYPE_DATA_ENTRY_URL {
                return Err(JP2Error::malformed(
                    BOX_TYPE_DATA_REFERENCE,
                    format!(
                        "expected a Data Entry URL box, found '{}'",
                        box_type_str(&header.box_type())
                    ),
                ));
            }

            let payload_length = if header.is_open_ended() {
                reader.remaining_bytes()?
            } else {
                header
                    .box_length()
                    .checked_sub(header.header_length() as u64)
                    .ok_or_else(|| {
                        JP2Error::malformed(
                            BOX_TYPE_DATA_REFERENCE,
                            "Data Entry URL box shorter than its header",
                        )
                    })?
            };
            let payload_start = reader.byte_offset()?;
            let payload = reader.read_bytes(payload_length)?;

            let mut url = DataEntryURLBox::default();
            diagnostics.relative_to(payload_start, |diagnostics| {
                url.decode(&mut io::Cursor::new(payload), diagnostics)
            })?;
            self.references.push(url);
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        2 + self
            .references
            .iter()
            .map(|url| 8 + url.payload_length())
            .sum::<u64>()
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&(self.references.len() as u16).to_be_bytes())?;
        for url in &self.references {
            encode_box_header(
                writer,
                BOX_TYPE_DATA_ENTRY_URL,
                8 + url.payload_length(),
                false,
            )?;
            url.encode(writer)?;
        }
        Ok(())
    }
}
