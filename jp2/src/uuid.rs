use crate::*;
use jpc::{ByteReader, Diagnostics};
use log::debug;
use std::fmt::Write as _;
use std::io;

/// UUID of the XMP packet box, be7acfcb-97a9-42e8-9c71-999491e3afac.
pub const UUID_XMP: [u8; 16] = [
    0xbe, 0x7a, 0xcf, 0xcb, 0x97, 0xa9, 0x42, 0xe8, 0x9c, 0x71, 0x99, 0x94, 0x91, 0xe3, 0xaf,
    0xac,
];

/// Canonical 8-4-4-4-12 hexadecimal form of a UUID.
pub(crate) fn uuid_str(uuid: &[u8; 16]) -> String {
    let mut value = String::with_capacity(36);
    for (i, byte) in uuid.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            value.push('-');
        }
        let _ = write!(value, "{:02x}", byte);
    }
    value
}

/// UUID box.
///
/// A UUID box contains vendor specific information other than the information
/// contained within boxes defined.
///
/// There may be multiple UUID boxes within the file, and those boxes may be
/// found anywhere in the file except before the File Type box.
///
/// See ISO/IEC 15444-1:2024 Section I.7.2 for more details on this box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UUIDBox {
    uuid: [u8; 16],
    data: Vec<u8>,
}

impl UUIDBox {
    pub fn new(uuid: [u8; 16], data: Vec<u8>) -> Self {
        UUIDBox { uuid, data }
    }

    /// Get the UUID for the box.
    ///
    /// This field contains a 16-byte UUID as specified by ISO/IEC 11578. The
    /// value of this UUID specifies the format of the vendor-specific information
    /// stored in the DATA field and the interpretation of that information.
    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    pub fn uuid_str(&self) -> String {
        uuid_str(&self.uuid)
    }

    /// Get the vendor-specific information.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when the box carries an XMP packet.
    pub fn is_xmp(&self) -> bool {
        self.uuid == UUID_XMP
    }
}

impl JBox for UUIDBox {
    // The type of a UUID box shall be 'uuid' (0x7575 6964).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_UUID
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let remaining = reader.remaining_bytes()?;
        if remaining < 16 {
            return Err(JP2Error::malformed(
                BOX_TYPE_UUID,
                format!("UUID needs 16 bytes, found {}", remaining),
            ));
        }
        self.uuid = reader.read_array()?;
        self.data = reader.read_bytes(remaining - 16)?;
        debug!("UUID {} with {} bytes", self.uuid_str(), self.data.len());
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        16 + self.data.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&self.uuid)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

// I.7.3.1
//
// UUID List box
//
// This box contains a list of UUIDs, each associated with the URL contained in
// the Data Entry URL box within the same UUID Info box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UUIDListBox {
    ids: Vec<[u8; 16]>,
}

impl UUIDListBox {
    pub fn new(ids: Vec<[u8; 16]>) -> Self {
        UUIDListBox { ids }
    }

    pub fn ids(&self) -> &[[u8; 16]] {
        &self.ids
    }

    pub fn ids_str(&self) -> Vec<String> {
        self.ids.iter().map(uuid_str).collect()
    }
}

impl JBox for UUIDListBox {
    // The type of a UUID List box shall be 'ulst' (0x756C 7374)
    fn identifier(&self) -> BoxType {
        BOX_TYPE_UUID_LIST
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        // NU: Number of UUIDs.
        let size = reader.read_u16()?;
        let remaining = reader.remaining_bytes()?;
        if remaining < size as u64 * 16 {
            return Err(JP2Error::malformed(
                BOX_TYPE_UUID_LIST,
                format!("{} UUIDs do not fit in {} bytes", size, remaining),
            ));
        }
        self.ids = (0..size)
            .map(|_| reader.read_array())
            .collect::<io::Result<_>>()?;
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        2 + 16 * self.ids.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&(self.ids.len() as u16).to_be_bytes())?;
        for id in &self.ids {
            writer.write_all(id)?;
        }
        Ok(())
    }
}

// I.7.3.2
//
// Data Entry URL box
//
// This box contains a URL which can be used by an application to acquire more
// information about the associated vendor-specific extensions.
//
// Relative URLs are permissible and are relative to the file containing this
// Data Entry URL box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataEntryURLBox {
    // VERS: Version number. The value of this field shall be 0.
    version: u8,

    // FLAG: Flags. The value of this field shall be 0.
    flags: [u8; 3],

    // LOC: Location.
    //
    // The URL is encoded as a null terminated string of UTF-8 characters.
    location: Vec<u8>,
}

impl DataEntryURLBox {
    pub fn new(location: &str) -> Self {
        let mut bytes = location.as_bytes().to_vec();
        bytes.push(0);
        DataEntryURLBox {
            version: 0,
            flags: [0; 3],
            location: bytes,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> [u8; 3] {
        self.flags
    }

    /// URL up to the first null byte.
    pub fn location(&self) -> String {
        let end = self
            .location
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.location.len());
        String::from_utf8_lossy(&self.location[..end]).into_owned()
    }
}

impl JBox for DataEntryURLBox {
    // The type of a Data Entry URL box shall be 'url\040' (0x7572 6C20).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_DATA_ENTRY_URL
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        self.version = reader.read_u8()?;
        self.flags = reader.read_array()?;

        let remaining = reader.remaining_bytes()?;
        self.location = reader.read_bytes(remaining)?;
        if self.location.last() != Some(&0) {
            diagnostics.warn(4, "URL location is not null terminated");
        }
        Ok(())
    }

    fn payload_length(&self) -> u64 {
        4 + self.location.len() as u64
    }

    fn encode<W: io::Write>(&self, writer: &mut W) -> Result<(), JP2Error> {
        writer.write_all(&[self.version])?;
        writer.write_all(&self.flags)?;
        writer.write_all(&self.location)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xmp_uuid_str() {
        assert_eq!(uuid_str(&UUID_XMP), "be7acfcb-97a9-42e8-9c71-999491e3afac");
    }

    #[test]
    fn test_uuid_box_too_short() {
        let mut uuid = UUIDBox::default();
        let mut reader = io::Cursor::new(vec![0u8; 10]);
        assert!(matches!(
            uuid.decode(&mut reader, &mut Diagnostics::new()),
            Err(JP2Error::BoxMalformed { .. })
        ));
    }

    #[test]
    fn test_data_entry_url() {
        let mut payload = vec![0, 0, 0, 0];
        payload.extend_from_slice(b"http://example.com/ext\0");
        let mut url = DataEntryURLBox::default();
        let mut diagnostics = Diagnostics::new();
        url.decode(&mut io::Cursor::new(payload.clone()), &mut diagnostics)
            .unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(url.location(), "http://example.com/ext");
        assert_eq!(url, DataEntryURLBox::new("http://example.com/ext"));

        let mut buffer = Vec::new();
        url.encode(&mut buffer).unwrap();
        assert_eq!(buffer, payload);
    }

    #[test]
    fn test_uuid_list_count_exceeds_payload() {
        let mut list = UUIDListBox::default();
        let mut reader = io::Cursor::new(vec![0, 2, 1, 2, 3]);
        assert!(list.decode(&mut reader, &mut Diagnostics::new()).is_err());
    }
}
