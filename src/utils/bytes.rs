//! Bounds-checked access to firmware bytes.
//!
//! [`ByteRegion`] wraps a borrowed `&[u8]` and hands out fields at fixed offsets.
//! Every read is checked up front and fails with [`ParseError::BufferTooShort`] instead of
//! panicking, including when `offset + len` would overflow.
//!
//! Offsets are `usize` and are interpreted relative to the slice the region wraps.
//!
//! ```
//! use usbhub_firmware::ByteRegion;
//!
//! let region = ByteRegion::new(&[0x01, 0x02, 0x03]);
//! assert_eq!(region.read_u16_le(1, "field").unwrap(), 0x0302);
//! assert!(region.read(2, 4, "field").is_err());
//! ```

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::err::{ParseError, ParseResult};

#[derive(Clone, Copy, Debug)]
pub struct ByteRegion<'a> {
    buf: &'a [u8],
}

#[inline]
fn truncated(what: &'static str, offset: usize, need: usize, len: usize) -> ParseError {
    ParseError::BufferTooShort {
        what,
        offset,
        need,
        have: len.saturating_sub(offset),
    }
}

impl<'a> ByteRegion<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteRegion { buf }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes available from `offset` to the end of the region (zero past the end).
    #[inline]
    pub fn remaining(&self, offset: usize) -> usize {
        self.buf.len().saturating_sub(offset)
    }

    /// Borrow `len` bytes at `offset`.
    pub fn read(&self, offset: usize, len: usize, what: &'static str) -> ParseResult<&'a [u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| truncated(what, offset, len, self.buf.len()))?;
        self.buf
            .get(offset..end)
            .ok_or_else(|| truncated(what, offset, len, self.buf.len()))
    }

    /// Copy `len` bytes at `offset` into a fresh buffer.
    ///
    /// The copy does not borrow from the region, so a truncated image never keeps a larger
    /// input (a whole flash dump, say) alive.
    pub fn slice(&self, offset: usize, len: usize, what: &'static str) -> ParseResult<Vec<u8>> {
        self.read(offset, len, what).map(<[u8]>::to_vec)
    }

    pub fn read_array<const N: usize>(
        &self,
        offset: usize,
        what: &'static str,
    ) -> ParseResult<[u8; N]> {
        let bytes = self.read(offset, N, what)?;
        let mut out = [0_u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize, what: &'static str) -> ParseResult<u8> {
        self.buf
            .get(offset)
            .copied()
            .ok_or_else(|| truncated(what, offset, 1, self.buf.len()))
    }

    pub fn read_u16_le(&self, offset: usize, what: &'static str) -> ParseResult<u16> {
        self.read(offset, 2, what).map(LittleEndian::read_u16)
    }

    pub fn read_u16_be(&self, offset: usize, what: &'static str) -> ParseResult<u16> {
        self.read(offset, 2, what).map(BigEndian::read_u16)
    }
}
