use crate::*;
use jpc::{ByteReader, Diagnostics};
use log::debug;
use std::io;

/// JPEG 2000 Signature box.
///
/// The Signature box identifies that the format of this file was defined by the
/// JPEG 2000 Recommendation | International Standard, as well as provides a
/// small amount of information which can help determine the validity of the rest
/// of the file.
///
/// The Signature box shall be the first box in the file, and all files shall
/// contain one and only one Signature box.
///
/// - The CR-LF sequence in the contents catches bad file transfers that alter
///   newline sequences.
/// - The final linefeed checks for the inverse of the CR-LF translation problem.
/// - The third character of the box contents has its high-bit set to catch bad
///   file transfers that clear bit 7.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBox {
    signature: [u8; 4],
}

impl Default for SignatureBox {
    fn default() -> Self {
        SignatureBox {
            signature: SIGNATURE_MAGIC,
        }
    }
}

impl SignatureBox {
    pub fn signature(&self) -> [u8; 4] {
        self.signature
    }
}

impl JBox for SignatureBox {
    // The type of the JPEG 2000 Signature box shall be 'jP\040\040' (0x6A50 2020)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_SIGNATURE
    }

    // The contents of this box shall be the 4-byte character string
    // '<CR><LF><0x87><LF>' (0x0D0A 870A).
    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let offset = reader.byte_offset()?;
        self.signature = reader.read_array()?;
        if self.signature != SIGNATURE_MAGIC {
            return Err(JP2Error::InvalidSignature {
                signature: self.signature,
                offset,
            });
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        4
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.signature)?;
        Ok(())
    }
}

/// File Type box.
///
/// The File Type box completely defines all of the contents of this file, as
/// well as a separate list of readers with which this file is compatible, and
/// thus the file can be properly interpreted within the scope of that other
/// standard.
///
/// This box shall immediately follow the Signature box.
///
/// For more information, see ISO/IEC 15444-1 / ITU T-800 Appendix I.5.2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeBox {
    brand: [u8; 4],
    min_version: [u8; 4],
    compatibility_list: Vec<[u8; 4]>,
}

impl FileTypeBox {
    pub fn new(brand: [u8; 4], min_version: u32, compatibility_list: Vec<[u8; 4]>) -> Self {
        FileTypeBox {
            brand,
            min_version: min_version.to_be_bytes(),
            compatibility_list,
        }
    }

    /// Brand.
    ///
    /// This field specifies the Recommendation | International Standard which
    /// completely defines this file.
    //
    // If the value of the Brand field is not 'jp2\040', then a value of
    // 'jp2\040' in the Compatibility list indicates that a JP2 reader can
    // interpret the file in some manner as intended by the creator of the
    // file.
    pub fn brand(&self) -> [u8; 4] {
        self.brand
    }

    pub fn brand_str(&self) -> String {
        box_type_str(&self.brand)
    }

    /// Minor version.
    ///
    /// The value of this field shall be zero. However, readers shall continue
    /// to parse and interpret this file even if the value of this field is not
    /// zero.
    pub fn min_version(&self) -> u32 {
        u32::from_be_bytes(self.min_version)
    }

    pub fn compatibility_list(&self) -> &[[u8; 4]] {
        &self.compatibility_list
    }

    pub fn compatibility_list_str(&self) -> Vec<String> {
        self.compatibility_list.iter().map(box_type_str).collect()
    }

    /// True when `brand` appears in the compatibility list.
    pub fn is_compatible_with(&self, brand: [u8; 4]) -> bool {
        self.compatibility_list.contains(&brand)
    }
}

impl JBox for FileTypeBox {
    // The type of the File Type Box shall be 'ftyp' (0x6674 7970).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_FILE_TYPE
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.brand = reader.read_array()?;
        self.min_version = reader.read_array()?;

        // The number of CL fields is determined by the length of this box
        let remaining = reader.remaining_bytes()?;
        self.compatibility_list = (0..remaining / 4)
            .map(|_| reader.read_array())
            .collect::<io::Result<_>>()?;

        debug!("Brand {:?}", self.brand_str());
        debug!("Compatibility list {:?}", self.compatibility_list_str());
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        8 + 4 * self.compatibility_list.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.brand)?;
        writer.write_all(&self.min_version)?;
        for entry in &self.compatibility_list {
            writer.write_all(entry)?;
        }
        Ok(())
    }
}
