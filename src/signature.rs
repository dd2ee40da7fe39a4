use log::trace;

use crate::err::{ParseError, ParseResult};
use crate::utils::ByteRegion;

/// Offset of the region magic, relative to the start of a region.
pub const SIG_OFFSET: usize = 0xfc;
pub const SIG_LEN: usize = 4;

pub const SIG_TEXT_HUB: &[u8; SIG_LEN] = b"XROM";
pub const SIG_TEXT_DEV_BRIDGE: &[u8; SIG_LEN] = b"XBRG";
pub const SIG_TEXT_PD: &[u8; SIG_LEN] = b"PRDY";

/// A magic byte sequence expected at a fixed offset from the start of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub magic: &'static [u8],
    pub offset: usize,
}

impl Signature {
    pub const fn new(magic: &'static [u8], offset: usize) -> Self {
        Signature { magic, offset }
    }

    /// Compares the magic against the bytes at `base_offset + self.offset`.
    ///
    /// A buffer too small to hold the magic is reported as `BufferTooShort`, so callers can
    /// tell "too small to be this kind" apart from "some other kind".
    pub fn matches(&self, region: &ByteRegion, base_offset: usize) -> ParseResult<bool> {
        let found = self.read(region, base_offset)?;
        Ok(found == self.magic)
    }

    /// Like [`Signature::matches`], but a mismatch is an error carrying both byte strings.
    pub fn ensure(&self, region: &ByteRegion, base_offset: usize) -> ParseResult<()> {
        let found = self.read(region, base_offset)?;
        if found != self.magic {
            return Err(ParseError::SignatureMismatch {
                offset: self.absolute_offset(base_offset).unwrap_or(usize::MAX),
                expected: self.magic.to_vec(),
                found: found.to_vec(),
            });
        }

        Ok(())
    }

    fn absolute_offset(&self, base_offset: usize) -> Option<usize> {
        base_offset.checked_add(self.offset)
    }

    fn read<'a>(&self, region: &ByteRegion<'a>, base_offset: usize) -> ParseResult<&'a [u8]> {
        let offset = self
            .absolute_offset(base_offset)
            .ok_or(ParseError::BufferTooShort {
                what: "signature",
                offset: base_offset,
                need: self.offset.saturating_add(self.magic.len()),
                have: region.remaining(base_offset),
            })?;

        let found = region.read(offset, self.magic.len(), "signature")?;
        trace!("signature at 0x{:x}: {:02X?}", offset, found);
        Ok(found)
    }
}
