use crate::*;
use jpc::{ByteReader, Codestream, Diagnostics};
use std::io;

// I.5.4
//
// Contiguous Codestream box
//
// The Contiguous Codestream box contains a valid and complete JPEG 2000
// codestream. When displaying the image, a conforming reader shall ignore all
// codestreams after the first codestream found in the file.
//
// Contiguous Codestream boxes may be found anywhere in the file
// except before the JP2 Header box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContiguousCodestreamBox {
    data: Vec<u8>,
    codestream: Option<Codestream>,
}

impl ContiguousCodestreamBox {
    /// Box around raw codestream bytes, parsed with offsets relative to the
    /// start of `data`.
    ///
    /// A codestream that fails to parse is recorded on `diagnostics` and the
    /// bytes are kept as they are.
    pub fn new(data: Vec<u8>, header_only: bool, diagnostics: &mut Diagnostics) -> Self {
        let length = data.len() as u64;
        let codestream = match jpc::decode_jpc(
            &mut io::Cursor::new(&data),
            length,
            header_only,
            diagnostics,
        ) {
            Ok(codestream) => Some(codestream),
            Err(e) => {
                diagnostics.warn(0, format!("codestream not parsed: {}", e));
                None
            }
        };
        ContiguousCodestreamBox { data, codestream }
    }

    /// Raw codestream bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn codestream(&self) -> Option<&Codestream> {
        self.codestream.as_ref()
    }

    pub(crate) fn set_codestream(&mut self, codestream: Option<Codestream>) {
        self.codestream = codestream;
    }
}

impl JBox for ContiguousCodestreamBox {
    // The type of a Contiguous Codestream box shall be 'jp2c' (0x6A70 3263).
    fn identifier(&self) -> BoxType {
        BOX_TYPE_CONTIGUOUS_CODESTREAM
    }

    fn decode<R: io::Read + io::Seek>(
        &mut self,
        reader: &mut R,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), JP2Error> {
        let remaining = reader.remaining_bytes()?;
        self.data = reader.read_bytes(remaining)?;
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
