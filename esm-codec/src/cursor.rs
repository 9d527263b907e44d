//! Little-endian primitive reads and writes
//!
//! [`Cursor`] reads from an in-memory slice (record bodies, subrecord
//! payloads). [`StreamReader`] reads from a sequential byte source and
//! tracks the absolute offset so errors can point at the failing byte.
//! [`ByteWriter`] writes to any sink and counts bytes produced.

use std::io::{self, Read, Write};

use crate::error::{EsmError, Result};
use crate::tag::Tag;

// =============================================================================
// Slice cursor
// =============================================================================

/// Read cursor over a byte slice. All reads are little-endian.
#[derive(Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Cursor whose reported offsets start at `base` (the slice's position in the file).
    pub fn with_base(data: &'a [u8], base: u64) -> Self {
        Self { data, pos: 0, base }
    }

    /// Current byte position within the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        Ok(Tag(self.read_array()?))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a NUL-terminated string of at most `max` bytes (terminator excluded).
    ///
    /// Returns the bytes before the terminator; the terminator is consumed.
    pub fn read_zstring(&mut self, max: usize) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let limit = rest.len().min(max + 1);
        match rest[..limit].iter().position(|&b| b == 0) {
            Some(len) => {
                let bytes = &rest[..len];
                self.pos += len + 1;
                Ok(bytes)
            }
            None => Err(EsmError::TruncatedInput {
                offset: self.offset(),
                need: limit + 1,
                have: rest.len(),
            }),
        }
    }

    /// Absolute offset of the current position.
    pub fn offset(&self) -> u64 {
        self.base + self.pos as u64
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(EsmError::TruncatedInput {
                offset: self.offset(),
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Stream reader
// =============================================================================

/// Sequential reader over any byte source, tracking the absolute offset.
pub struct StreamReader<'r> {
    inner: &'r mut dyn Read,
    pos: u64,
}

impl<'r> StreamReader<'r> {
    pub fn new(inner: &'r mut dyn Read) -> Self {
        Self { inner, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Fill `buf` completely, or fail with `TruncatedInput`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let got = self.fill(buf)?;
        if got < buf.len() {
            return Err(EsmError::TruncatedInput {
                offset: self.pos,
                need: buf.len(),
                have: got,
            });
        }
        Ok(())
    }

    /// Read up to `buf.len()` bytes, stopping early only at end of stream.
    ///
    /// Returns the number of bytes read.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut got = 0;
        while got < buf.len() {
            match self.inner.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(n) => got += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += got as u64;
        Ok(got)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_tag(&mut self) -> Result<Tag> {
        Ok(Tag(self.read_array()?))
    }

    /// Read the next tag, or `None` at a clean end of stream.
    pub fn read_tag_or_eof(&mut self) -> Result<Option<Tag>> {
        let mut buf = [0u8; 4];
        match self.fill(&mut buf)? {
            0 => Ok(None),
            4 => Ok(Some(Tag(buf))),
            got => Err(EsmError::TruncatedInput {
                offset: self.pos,
                need: 4,
                have: got,
            }),
        }
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read `len` bytes into a new buffer.
    ///
    /// Returns the buffer and how many bytes the stream actually supplied,
    /// so the caller can report a short body with its own error.
    pub fn read_body(&mut self, len: usize) -> Result<(Vec<u8>, usize)> {
        let mut body = vec![0u8; len];
        let got = self.fill(&mut body)?;
        body.truncate(got);
        Ok((body, got))
    }

    /// Discard `len` bytes. Returns how many were actually skipped.
    pub fn skip(&mut self, len: u64) -> Result<u64> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.pos += skipped;
        Ok(skipped)
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Little-endian writer over any sink, counting bytes produced.
pub struct ByteWriter<'w> {
    inner: &'w mut dyn Write,
    written: u64,
}

impl<'w> ByteWriter<'w> {
    pub fn new(inner: &'w mut dyn Write) -> Self {
        Self { inner, written: 0 }
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_tag(&mut self, tag: Tag) -> Result<()> {
        self.write_bytes(&tag.0)
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_bytes(&[v])
    }

    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }

    pub fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_bytes(&v.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reads_le() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x00, 0x80, 0x3B, 0x44];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_u32().unwrap(), 0x1234_5678);
        assert_eq!(cursor.read_f32().unwrap(), 750.0);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_cursor_truncated() {
        let data = [1u8, 2, 3];
        let mut cursor = Cursor::with_base(&data, 100);
        cursor.read_u8().unwrap();
        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            EsmError::TruncatedInput {
                offset: 101,
                need: 4,
                have: 2
            }
        ));
    }

    #[test]
    fn test_cursor_zstring_bounded() {
        let mut cursor = Cursor::new(b"foo\0barbaz\0");
        assert_eq!(cursor.read_zstring(16).unwrap(), b"foo");
        // "barbaz" needs 6 bytes plus terminator; a cap of 3 must not scan past it
        assert!(cursor.read_zstring(3).is_err());
        assert_eq!(cursor.read_zstring(6).unwrap(), b"barbaz");
    }

    #[test]
    fn test_stream_reader_eof() {
        let data = b"GRUP\x01\x02";
        let mut source: &[u8] = data;
        let mut reader = StreamReader::new(&mut source);
        assert_eq!(reader.read_tag_or_eof().unwrap(), Some(Tag::new(b"GRUP")));
        assert!(matches!(
            reader.read_u32(),
            Err(EsmError::TruncatedInput { need: 4, have: 2, .. })
        ));
        assert_eq!(reader.read_tag_or_eof().unwrap(), None);
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn test_writer_counts() {
        let mut out = Vec::new();
        let mut writer = ByteWriter::new(&mut out);
        writer.write_tag(Tag::new(b"FLTV")).unwrap();
        writer.write_u16(4).unwrap();
        writer.write_f32(750.0).unwrap();
        assert_eq!(writer.written(), 10);
        assert_eq!(out, b"FLTV\x04\x00\x00\x80\x3B\x44");
    }
}
