use crate::{BoxType, JP2Error};
use jpc::ByteReader;
use std::io;

/// Header of a box as it appears in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    // Box Length
    //
    // This field specifies the length of the box, stored as a 4-byte big
    // endian unsigned integer, or as an 8-byte XLBox when LBox is 1.
    //
    // This value includes all of the fields of the box, including the length
    // and type. A value of 0 means the box runs to the end of the enclosing
    // range.
    box_length: u64,

    // Box Type
    //
    // This field specifies the type of information found in the DBox field.
    // Boxes are generally referred to by an ISO 646 character string
    // translation of the integer value.
    box_type: BoxType,

    header_length: u8,
}

impl BoxHeader {
    pub fn box_length(&self) -> u64 {
        self.box_length
    }

    pub fn box_type(&self) -> BoxType {
        self.box_type
    }

    /// 8, or 16 when the length is stored in XLBox.
    pub fn header_length(&self) -> u8 {
        self.header_length
    }

    /// True when the box extends to the end of its enclosing range.
    pub fn is_open_ended(&self) -> bool {
        self.box_length == 0
    }
}

pub fn decode_box_header<R: io::Read + io::Seek>(reader: &mut R) -> Result<BoxHeader, JP2Error> {
    let box_length = reader.read_u32()?;
    let box_type: BoxType = reader.read_array()?;

    match box_length {
        // If the value of this field is 0, then the length of the box was not
        // known when the LBox field was written. In this case, this box
        // contains all bytes up to the end of the file.
        0 => Ok(BoxHeader {
            box_length: 0,
            box_type,
            header_length: 8,
        }),

        // If the value of this field is 1, then the XLBox field shall exist
        // and the value of that field shall be the actual length of the box.
        1 => {
            let xl_length = reader.read_u64()?;
            Ok(BoxHeader {
                box_length: xl_length,
                box_type,
                header_length: 16,
            })
        }

        // The values 2-7 are reserved for ISO use and are left to the caller,
        // which sees a length shorter than the header.
        value => Ok(BoxHeader {
            box_length: value as u64,
            box_type,
            header_length: 8,
        }),
    }
}

/// Writes a box header for a box of `box_length` bytes in total.
///
/// XLBox is used when the length does not fit in 32 bits or when
/// `extended` is set.
pub fn encode_box_header<W: io::Write>(
    writer: &mut W,
    box_type: BoxType,
    box_length: u64,
    extended: bool,
) -> Result<(), JP2Error> {
    if extended || box_length > u32::MAX as u64 {
        writer.write_all(&1u32.to_be_bytes())?;
        writer.write_all(&box_type)?;
        writer.write_all(&box_length.to_be_bytes())?;
    } else {
        writer.write_all(&(box_length as u32).to_be_bytes())?;
        writer.write_all(&box_type)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_extended_length() {
        let mut reader = io::Cursor::new(vec![
            0, 0, 0, 1, b'x', b'm', b'l', b' ', 0, 0, 0, 1, 0, 0, 0, 0,
        ]);
        let header = decode_box_header(&mut reader).unwrap();
        assert_eq!(header.box_type(), *b"xml ");
        assert_eq!(header.box_length(), 1 << 32);
        assert_eq!(header.header_length(), 16);
    }

    #[test]
    fn test_decode_open_ended() {
        let mut reader = io::Cursor::new(vec![0, 0, 0, 0, b'j', b'p', b'2', b'c']);
        let header = decode_box_header(&mut reader).unwrap();
        assert!(header.is_open_ended());
        assert_eq!(header.header_length(), 8);
    }

    #[test]
    fn test_encode_switches_to_extended_length() {
        let mut buffer = Vec::new();
        encode_box_header(&mut buffer, *b"jp2c", 20, false).unwrap();
        assert_eq!(buffer, vec![0, 0, 0, 20, b'j', b'p', b'2', b'c']);

        let mut buffer = Vec::new();
        encode_box_header(&mut buffer, *b"jp2c", 1 << 32, false).unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer[..4], &[0, 0, 0, 1]);
        assert_eq!(&buffer[8..], &[0, 0, 0, 1, 0, 0, 0, 0]);
    }
}
