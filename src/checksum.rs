use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::err::{ParseError, ParseResult};

pub const CHECKSUM_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumRule {
    /// Wrapping 16-bit sum of every byte but the last two, which hold the sum big-endian.
    Sum16Be,
}

impl ChecksumRule {
    /// The checksum recorded in `content`, if it is long enough to hold one.
    pub fn stored(&self, content: &[u8]) -> Option<u16> {
        match self {
            ChecksumRule::Sum16Be => {
                let offset = content.len().checked_sub(CHECKSUM_LEN)?;
                Some(BigEndian::read_u16(&content[offset..]))
            }
        }
    }

    /// Computes the checksum over `content` minus the checksum field itself.
    pub fn compute(&self, content: &[u8]) -> u16 {
        match self {
            ChecksumRule::Sum16Be => {
                let end = content.len().saturating_sub(CHECKSUM_LEN);
                sum16(&content[..end])
            }
        }
    }

    pub fn verify(&self, content: &[u8]) -> ParseResult<()> {
        let offset = content.len().saturating_sub(CHECKSUM_LEN);
        let stored = self.stored(content).ok_or(ParseError::BufferTooShort {
            what: "checksum",
            offset,
            need: CHECKSUM_LEN,
            have: content.len(),
        })?;

        let computed = self.compute(content);
        debug!(
            "Expected checksum: 0x{:04x}, found: 0x{:04x}",
            stored, computed
        );

        if computed != stored {
            return Err(ParseError::ChecksumMismatch {
                offset,
                stored,
                computed,
            });
        }

        Ok(())
    }

    /// Rewrites the trailing checksum field of `content` so that it verifies.
    ///
    /// Used when building images; `content` must be at least [`CHECKSUM_LEN`] long.
    pub fn seal(&self, content: &mut [u8]) -> ParseResult<()> {
        let offset = content
            .len()
            .checked_sub(CHECKSUM_LEN)
            .ok_or(ParseError::BufferTooShort {
                what: "checksum",
                offset: 0,
                need: CHECKSUM_LEN,
                have: content.len(),
            })?;
        let computed = self.compute(content);
        BigEndian::write_u16(&mut content[offset..], computed);
        Ok(())
    }
}

pub fn sum16(data: &[u8]) -> u16 {
    data.iter().fold(0_u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}
