use std::io;

/// Big-endian reads over any seekable byte source.
///
/// Every multi-byte value in a codestream or a box file is stored in network
/// byte order. Reading past the end of the source fails with
/// `io::ErrorKind::UnexpectedEof`.
pub trait ByteReader: io::Read + io::Seek {
    fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buffer = [0u8; N];
        self.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> io::Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads exactly `length` bytes. The buffer grows with the data actually
    /// read, so a corrupt length cannot force a huge allocation up front.
    fn read_bytes(&mut self, length: u64) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        io::Read::read_to_end(&mut io::Read::take(&mut *self, length), &mut buffer)?;
        if (buffer.len() as u64) < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes, found {}", length, buffer.len()),
            ));
        }
        Ok(buffer)
    }

    fn byte_offset(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        self.seek(io::SeekFrom::Start(offset))
    }

    /// Number of bytes between the current position and the end of the source.
    fn remaining_bytes(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let end = self.seek(io::SeekFrom::End(0))?;
        self.seek(io::SeekFrom::Start(position))?;
        Ok(end.saturating_sub(position))
    }
}

impl<R: io::Read + io::Seek + ?Sized> ByteReader for R {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let mut reader = io::Cursor::new(vec![
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00,
        ]);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0203);
        assert_eq!(reader.read_u32().unwrap(), 0x0405_0607);
        assert_eq!(reader.read_u64().unwrap(), 0x0100);
        assert_eq!(reader.byte_offset().unwrap(), 15);
        assert_eq!(reader.remaining_bytes().unwrap(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let mut reader = io::Cursor::new(vec![0xFF, 0x4F, 0x00]);
        reader.seek_to(1).unwrap();
        assert_eq!(reader.remaining_bytes().unwrap(), 2);
        let error = reader.read_bytes(3).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);

        reader.seek_to(2).unwrap();
        let error = reader.read_u16().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
