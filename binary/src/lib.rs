use std::io;

/// Fixed-width integer readers over any byte source.
///
/// Every method consumes exactly the bytes of the value on success. On
/// failure an unspecified number of those bytes may already have been
/// consumed, so a failed read must not be retried on the same reader.
///
/// End of input is reported as [`io::ErrorKind::UnexpectedEof`].
pub trait ReadBytesExt: io::Read {
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buffer: [u8; 1] = [0; 1];
        self.read_exact(&mut buffer)?;
        Ok(buffer[0])
    }

    fn read_u16_be(&mut self) -> io::Result<u16> {
        let mut buffer: [u8; 2] = [0; 2];
        self.read_exact(&mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    fn read_u32_be(&mut self) -> io::Result<u32> {
        let mut buffer: [u8; 4] = [0; 4];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }

    fn read_u64_be(&mut self) -> io::Result<u64> {
        let high = self.read_u32_be()?;
        let low = self.read_u32_be()?;
        Ok((high as u64) << 32 | low as u64)
    }

    fn read_u16_le(&mut self) -> io::Result<u16> {
        let mut buffer: [u8; 2] = [0; 2];
        self.read_exact(&mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    // RIFF/VP8X canvas fields are 24 bits wide
    fn read_u24_le(&mut self) -> io::Result<u32> {
        let mut buffer: [u8; 3] = [0; 3];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_le_bytes([buffer[0], buffer[1], buffer[2], 0]))
    }

    fn read_u32_le(&mut self) -> io::Result<u32> {
        let mut buffer: [u8; 4] = [0; 4];
        self.read_exact(&mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    fn read_u64_le(&mut self) -> io::Result<u64> {
        let low = self.read_u32_le()?;
        let high = self.read_u32_le()?;
        Ok((high as u64) << 32 | low as u64)
    }

    /// Reads a four byte code such as a chunk type, FourCC or ICC signature.
    fn read_signature(&mut self) -> io::Result<[u8; 4]> {
        let mut buffer: [u8; 4] = [0; 4];
        self.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Discards exactly `length` bytes.
    fn skip(&mut self, length: u64) -> io::Result<()> {
        let mut limited = io::Read::take(&mut *self, length);
        let skipped = io::copy(&mut limited, &mut io::sink())?;
        if skipped < length {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(())
    }
}

impl<R: io::Read + ?Sized> ReadBytesExt for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_endian() {
        let mut reader = Cursor::new(vec![
            0x12, 0x34, 0x12, 0x34, 0x56, 0x78, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ]);
        assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_be().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_u64_be().unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_little_endian() {
        let mut reader = Cursor::new(vec![
            0x34, 0x12, 0xaf, 0x04, 0x00, 0x78, 0x56, 0x34, 0x12, 0x08, 0x07, 0x06, 0x05, 0x04,
            0x03, 0x02, 0x01,
        ]);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u24_le().unwrap(), 1199);
        assert_eq!(reader.read_u32_le().unwrap(), 0x1234_5678);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_short_read_is_eof() {
        let mut reader = Cursor::new(vec![0x00, 0x01, 0x02]);
        let error = reader.read_u32_be().unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_skip() {
        let mut reader = Cursor::new(vec![1, 2, 3, 4]);
        assert!(reader.skip(3).is_ok());
        assert_eq!(reader.read_u8().unwrap(), 4);

        let error = reader.skip(1).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
