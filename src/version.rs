use std::fmt;

use log::trace;
use serde::{Serialize, Serializer};

use crate::err::{ParseError, ParseResult};
use crate::utils::ByteRegion;

/// Offset of the firmware version, relative to the start of a region.
pub const VERSION_OFFSET: usize = 0x10e;

/// A firmware version, stored as two BCD bytes and rendered as `MM.mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn from_raw(raw: u16) -> Self {
        Version {
            major: (raw >> 8) as u8,
            minor: (raw & 0xff) as u8,
        }
    }

    pub fn raw(&self) -> u16 {
        (u16::from(self.major) << 8) | u16::from(self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}.{:02x}", self.major, self.minor)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRule {
    /// A little-endian `u16` at `offset` within the truncated content.
    Bcd16Le { offset: usize },
}

impl VersionRule {
    pub fn extract(&self, content: &[u8]) -> ParseResult<Version> {
        match *self {
            VersionRule::Bcd16Le { offset } => {
                let raw = ByteRegion::new(content)
                    .read_u16_le(offset, "version")
                    .map_err(|_| ParseError::VersionFieldInvalid {
                        offset,
                        need: offset.saturating_add(2),
                        have: content.len(),
                    })?;
                trace!("version at 0x{:x}: 0x{:04x}", offset, raw);
                Ok(Version::from_raw(raw))
            }
        }
    }
}
