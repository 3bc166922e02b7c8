use crate::*;
use jpc::{ByteReader, Diagnostics};
use std::io;
use std::str;

fn read_payload<R: io::Read + io::Seek>(reader: &mut R) -> Result<Vec<u8>, JP2Error> {
    let remaining = reader.remaining_bytes()?;
    Ok(reader.read_bytes(remaining)?)
}

/// Intellectual Property box.
///
/// A box type for a box which is devoted to carrying intellectual property
/// rights information within a JP2 file.
///
/// In ISO/IEC 15444-1 / T.800, the definition of the format of the contents of
/// this box is reserved for ISO. In ISO/IEC 15444-2 / T.801, the definition of
/// the format of the contents of this box is given as XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntellectualPropertyBox {
    data: Vec<u8>,
}

impl IntellectualPropertyBox {
    pub fn new(data: Vec<u8>) -> Self {
        IntellectualPropertyBox { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the XML body as a UTF-8 string.
    pub fn format(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.data)
    }
}

impl JBox for IntellectualPropertyBox {
    // The type of the Intellectual Property Box shall be 'jp2i' (0x6A70 3269).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_INTELLECTUAL_PROPERTY
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.data = read_payload(reader)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.data.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

/// XML box
///
/// An XML box contains vendor specific information (in XML format) other than
/// the information contained within boxes defined.
///
/// There may be multiple XML boxes within the file, and those boxes may be found
/// anywhere in the file except before the File Type box.
///
/// See ISO/IEC 15444-1:2024 Section I.7.1 for more details on this box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XMLBox {
    xml: Vec<u8>,
}

impl XMLBox {
    pub fn new(xml: &str) -> Self {
        XMLBox {
            xml: xml.as_bytes().to_vec(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.xml
    }

    /// Get the XML body as a UTF-8 string.
    pub fn format(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.xml)
    }
}

impl JBox for XMLBox {
    // The type of an XML box is 'xml\040' (0x786D 6C20).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_XML
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.xml = read_payload(reader)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.xml.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.xml)?;
        Ok(())
    }
}

// M.11.13
//
// Label box
//
// This box contains a textual label for the content of its Association box,
// encoded as UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelBox {
    label: String,
}

impl LabelBox {
    pub fn new(label: &str) -> Self {
        LabelBox {
            label: label.to_owned(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl JBox for LabelBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_LABEL
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let data = read_payload(reader)?;
        self.label = String::from_utf8(data)
            .map_err(|e| JP2Error::malformed(BOX_TYPE_LABEL, e.to_string()))?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.label.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(self.label.as_bytes())?;
        Ok(())
    }
}

// M.11.12
//
// Free box
//
// This box contains data that is no longer used and may be overwritten when
// the file is edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeBox {
    data: Vec<u8>,
}

impl FreeBox {
    pub fn new(data: Vec<u8>) -> Self {
        FreeBox { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl JBox for FreeBox {
    fn identifier(&self) -> BoxType {
        BOX_TYPE_FREE
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.data = read_payload(reader)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.data.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}

/// Box kept as opaque bytes, either because its type is not recognized or
/// because its payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBox {
    box_type: BoxType,
    data: Vec<u8>,
}

impl UnknownBox {
    pub fn new(box_type: BoxType, data: Vec<u8>) -> Self {
        UnknownBox { box_type, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl JBox for UnknownBox {
    fn identifier(&self) -> BoxType {
        self.box_type
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.data = read_payload(reader)?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        self.data.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.data)?;
        Ok(())
    }
}
