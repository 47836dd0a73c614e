use std::io::{self, Read, Seek, SeekFrom, Write};

pub struct LittleEndianReader<R> {
    inner: R,
}

impl<R: Read + Seek> LittleEndianReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        self.inner.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_bool(&mut self) -> io::Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid boolean byte {other}"),
            )),
        }
    }

    pub fn read_bytes(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a string stored as a `u16` byte length followed by UTF-8 bytes.
    pub fn read_string(&mut self) -> io::Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Read a `u32` element count, rejecting counts that cannot fit in the
    /// remaining input at `min_element_size` bytes each.
    pub fn read_count(&mut self, min_element_size: u64) -> io::Result<usize> {
        let count = self.read_u32()?;
        let remaining = self.remaining()?;
        if u64::from(count) * min_element_size.max(1) > remaining {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("count {count} exceeds remaining {remaining} bytes"),
            ));
        }
        Ok(count as usize)
    }

    pub fn position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    pub fn len(&mut self) -> io::Result<u64> {
        let cur = self.position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(cur))?;
        Ok(end)
    }

    pub fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn remaining(&mut self) -> io::Result<u64> {
        let cur = self.position()?;
        Ok(self.len()?.saturating_sub(cur))
    }
}

pub struct LittleEndianWriter<W> {
    inner: W,
}

impl<W: Write> LittleEndianWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_u8(&mut self, v: u8) -> io::Result<()> {
        self.inner.write_all(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> io::Result<()> {
        self.inner.write_all(&v.to_le_bytes())
    }

    pub fn write_bool(&mut self, v: bool) -> io::Result<()> {
        self.write_u8(u8::from(v))
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    pub fn write_string(&mut self, s: &str) -> io::Result<()> {
        let len = u16::try_from(s.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("string of {} bytes is too long for a record", s.len()),
            )
        })?;
        self.write_u16(len)?;
        self.write_bytes(s.as_bytes())
    }

    pub fn write_count(&mut self, n: usize) -> io::Result<()> {
        let n = u32::try_from(n).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "element count exceeds u32")
        })?;
        self.write_u32(n)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{LittleEndianReader, LittleEndianWriter};

    #[test]
    fn strings_are_length_prefixed() {
        let mut w = LittleEndianWriter::new(Vec::new());
        w.write_string("Gown").expect("write should succeed");
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![4, 0, b'G', b'o', b'w', b'n']);

        let mut r = LittleEndianReader::new(Cursor::new(bytes));
        assert_eq!(r.read_string().expect("read should succeed"), "Gown");
        assert_eq!(r.remaining().expect("position"), 0);
    }

    #[test]
    fn oversized_count_is_rejected() {
        let mut r = LittleEndianReader::new(Cursor::new(vec![0xFF, 0xFF, 0, 0, 1, 2, 3, 4]));
        assert!(r.read_count(4).is_err());
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let mut r = LittleEndianReader::new(Cursor::new(vec![2u8]));
        assert!(r.read_bool().is_err());
    }
}
