use log::trace;

use crate::err::{ParseError, ParseResult};
use crate::firmware_kind::CodesignScheme;
use crate::utils::ByteRegion;

/// Offset of the code size byte, relative to the start of a region.
pub const CODE_SIZE_OFFSET: usize = 0xfb;
pub const CODE_SIZE_UNIT: usize = 1024;

/// How the authoritative length of a region is derived.
///
/// The physical buffer is frequently larger than the firmware it holds (flash dumps are
/// padded to the bank size), so the length always comes from the data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    /// A single byte at `offset` holding the region length in KiB.
    CodeSizeKib { offset: usize },
    /// A fixed-length codesign record; the scheme it carries selects the length.
    CodesignTrailer,
}

impl SizeRule {
    pub fn calculate(&self, region: &ByteRegion, base_offset: usize) -> ParseResult<usize> {
        let available = region.remaining(base_offset);

        let (declared, field_offset, what) = match *self {
            SizeRule::CodeSizeKib { offset } => {
                let field_offset = base_offset
                    .checked_add(offset)
                    .ok_or(ParseError::BufferTooShort {
                        what: "code size",
                        offset: base_offset,
                        need: offset + 1,
                        have: available,
                    })?;
                let kib = region.read_u8(field_offset, "code size")?;
                trace!("code size at 0x{:x}: {} KiB", field_offset, kib);
                (usize::from(kib) * CODE_SIZE_UNIT, field_offset, "code size")
            }
            SizeRule::CodesignTrailer => {
                let trailer = region.read(base_offset, available, "codesign")?;
                match CodesignScheme::detect(trailer) {
                    Some(scheme) => (scheme.len(), base_offset, "codesign size"),
                    None => {
                        return Err(ParseError::SizeFieldInvalid {
                            what: "codesign size",
                            offset: base_offset,
                            declared: CodesignScheme::Ecdsa.len(),
                            available,
                        });
                    }
                }
            }
        };

        if declared == 0 || declared > available {
            return Err(ParseError::SizeFieldInvalid {
                what,
                offset: field_offset,
                declared,
                available,
            });
        }

        Ok(declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULE: SizeRule = SizeRule::CodeSizeKib {
        offset: CODE_SIZE_OFFSET,
    };

    fn buffer(len: usize, base: usize, kib: u8) -> Vec<u8> {
        let mut buf = vec![0_u8; len];
        buf[base + CODE_SIZE_OFFSET] = kib;
        buf
    }

    #[test]
    fn test_code_size_in_kib() {
        let buf = buffer(4096, 0, 2);
        assert_eq!(RULE.calculate(&ByteRegion::new(&buf), 0).unwrap(), 2048);
    }

    #[test]
    fn test_code_size_relative_to_base() {
        let buf = buffer(0x2000, 0x1000, 4);
        assert_eq!(RULE.calculate(&ByteRegion::new(&buf), 0x1000).unwrap(), 4096);
    }

    #[test]
    fn test_zero_code_size_is_invalid() {
        let buf = buffer(4096, 0, 0);
        assert_eq!(
            RULE.calculate(&ByteRegion::new(&buf), 0).unwrap_err(),
            ParseError::SizeFieldInvalid {
                what: "code size",
                offset: CODE_SIZE_OFFSET,
                declared: 0,
                available: 4096,
            }
        );
    }

    #[test]
    fn test_code_size_past_end_is_invalid() {
        let buf = buffer(4096, 0, 8);
        assert_eq!(
            RULE.calculate(&ByteRegion::new(&buf), 0).unwrap_err(),
            ParseError::SizeFieldInvalid {
                what: "code size",
                offset: CODE_SIZE_OFFSET,
                declared: 8192,
                available: 4096,
            }
        );
    }

    #[test]
    fn test_missing_code_size_byte() {
        let buf = vec![0_u8; CODE_SIZE_OFFSET];
        assert!(matches!(
            RULE.calculate(&ByteRegion::new(&buf), 0),
            Err(ParseError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_codesign_trailer_length() {
        let buf = vec![0_u8; CodesignScheme::Ecdsa.len()];
        assert_eq!(
            SizeRule::CodesignTrailer
                .calculate(&ByteRegion::new(&buf), 0)
                .unwrap(),
            CodesignScheme::Ecdsa.len()
        );

        let buf = vec![0_u8; 100];
        assert_eq!(
            SizeRule::CodesignTrailer
                .calculate(&ByteRegion::new(&buf), 0)
                .unwrap_err(),
            ParseError::SizeFieldInvalid {
                what: "codesign size",
                offset: 0,
                declared: CodesignScheme::Ecdsa.len(),
                available: 100,
            }
        );
    }

    #[test]
    fn test_codesign_trailer_followed_by_fill() {
        let mut buf = vec![0_u8; CodesignScheme::Ecdsa.len()];
        buf.resize(0x8000, 0xff);

        // the record length comes from the scheme, not from the remaining buffer
        assert_eq!(
            SizeRule::CodesignTrailer
                .calculate(&ByteRegion::new(&buf), 0)
                .unwrap(),
            CodesignScheme::Ecdsa.len()
        );
    }
}
