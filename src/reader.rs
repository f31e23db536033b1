//! Sequential little-endian primitives over a non-seekable byte source.
use std::io::{self, Read};

use byteorder_lite::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Wraps a [`Read`] source and keeps track of how many bytes were consumed.
///
/// Every read either succeeds in full or fails with [`Error::Truncated`];
/// there is no backtracking.
pub(crate) struct ChunkReader<R> {
    inner: R,
    offset: u64,
}

// ----------------------------------------------------------------------------
impl<R: Read> ChunkReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Absolute number of bytes consumed so far.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    fn fail(&self, err: io::Error, wanted: u64) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated {
                offset: self.offset,
                wanted,
            }
        } else {
            Error::Io(err)
        }
    }

    pub(crate) fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        let mut fourcc = [0; 4];
        self.inner
            .read_exact(&mut fourcc)
            .map_err(|e| self.fail(e, 4))?;
        self.offset += 4;
        Ok(fourcc)
    }

    /// RIFF sizes are unsigned 32-bit; widen so arithmetic on them never wraps.
    pub(crate) fn read_uint32(&mut self) -> Result<u64> {
        let v = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| self.fail(e, 4))?;
        self.offset += 4;
        Ok(u64::from(v))
    }

    pub(crate) fn read_int32(&mut self) -> Result<i32> {
        let v = self
            .inner
            .read_i32::<LittleEndian>()
            .map_err(|e| self.fail(e, 4))?;
        self.offset += 4;
        Ok(v)
    }

    pub(crate) fn read_uint16(&mut self) -> Result<u16> {
        let v = self
            .inner
            .read_u16::<LittleEndian>()
            .map_err(|e| self.fail(e, 2))?;
        self.offset += 2;
        Ok(v)
    }

    pub(crate) fn read_uint24(&mut self) -> Result<u32> {
        let v = self
            .inner
            .read_u24::<LittleEndian>()
            .map_err(|e| self.fail(e, 3))?;
        self.offset += 3;
        Ok(v)
    }

    pub(crate) fn read_int8(&mut self) -> Result<i8> {
        let v = self.inner.read_i8().map_err(|e| self.fail(e, 1))?;
        self.offset += 1;
        Ok(v)
    }

    /// Reads a 24-bit dimension stored as `value - 1`.
    pub(crate) fn read_one_based(&mut self) -> Result<u32> {
        Ok(self.read_uint24()? + 1)
    }

    /// Reads exactly `n` bytes.
    ///
    /// The buffer grows with the data actually delivered, so a bogus length
    /// field on a short stream fails without allocating the declared size.
    pub(crate) fn read_n_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let got = (&mut self.inner).take(n).read_to_end(&mut data)?;
        self.offset += got as u64;
        if (got as u64) < n {
            return Err(Error::Truncated {
                offset: self.offset,
                wanted: n - got as u64,
            });
        }
        Ok(data)
    }

    /// Consumes the alignment byte that follows an odd-length payload.
    pub(crate) fn skip_pad_byte(&mut self) -> Result<()> {
        let mut pad = [0; 1];
        self.inner
            .read_exact(&mut pad)
            .map_err(|e| self.fail(e, 1))?;
        self.offset += 1;
        Ok(())
    }

    /// Returns `true` once the source has no more bytes.
    pub(crate) fn at_end(&mut self) -> Result<bool> {
        let mut probe = [0; 1];
        loop {
            match self.inner.read(&mut probe) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &[u8]) -> ChunkReader<&[u8]> {
        ChunkReader::new(bytes)
    }

    #[test]
    fn little_endian_widths() {
        let bytes = [
            0x52, 0x49, 0x46, 0x46, // fourcc
            0xfe, 0xff, 0xff, 0xff, // u32
            0xfe, 0xff, 0xff, 0xff, // i32
            0x34, 0x12, // u16
            0x56, 0x34, 0x12, // u24
            0x80, // i8
        ];
        let mut r = reader(&bytes);
        assert_eq!(&r.read_fourcc().unwrap(), b"RIFF");
        assert_eq!(r.read_uint32().unwrap(), 0xffff_fffe);
        assert_eq!(r.read_int32().unwrap(), -2);
        assert_eq!(r.read_uint16().unwrap(), 0x1234);
        assert_eq!(r.read_uint24().unwrap(), 0x12_3456);
        assert_eq!(r.read_int8().unwrap(), -128);
        assert_eq!(r.offset(), bytes.len() as u64);
        assert!(r.at_end().unwrap());
    }

    #[test]
    fn one_based_never_zero() {
        let mut r = reader(&[0x00, 0x00, 0x00, 0xff, 0xff, 0xff]);
        assert_eq!(r.read_one_based().unwrap(), 1);
        assert_eq!(r.read_one_based().unwrap(), 1 << 24);
    }

    #[test]
    fn short_reads_report_offset() {
        let mut r = reader(&[0x01, 0x02, 0x03, 0x04, 0x05]);
        r.read_uint16().unwrap();
        match r.read_uint32() {
            Err(Error::Truncated { offset, wanted }) => {
                assert_eq!(offset, 2);
                assert_eq!(wanted, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn n_bytes_exact_or_truncated() {
        let mut r = reader(&[1, 2, 3, 4, 5]);
        assert_eq!(r.read_n_bytes(3).unwrap(), vec![1, 2, 3]);
        match r.read_n_bytes(u64::from(u32::MAX)) {
            Err(Error::Truncated { offset, wanted }) => {
                assert_eq!(offset, 5);
                assert_eq!(wanted, u64::from(u32::MAX) - 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn pad_byte_is_consumed() {
        let mut r = reader(&[0x00]);
        r.skip_pad_byte().unwrap();
        assert!(r.at_end().unwrap());
        assert!(matches!(r.skip_pad_byte(), Err(Error::Truncated { .. })));
    }
}
