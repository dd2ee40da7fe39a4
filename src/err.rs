use crate::firmware_kind::FirmwareKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors raised by the individual steps of the region pipeline.
///
/// Offsets are absolute within the buffer the step was handed (the whole input buffer
/// for signature and size checks, the truncated content for checksum and version).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("failed to read {what} at offset 0x{offset:x}: need {need} bytes, have {have}")]
    BufferTooShort {
        what: &'static str,
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("signature mismatch at offset 0x{offset:x}: expected `{expected:02X?}`, found `{found:02X?}`")]
    SignatureMismatch {
        offset: usize,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("invalid {what} at offset 0x{offset:x}: declared {declared} bytes, {available} available")]
    SizeFieldInvalid {
        what: &'static str,
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("checksum mismatch at offset 0x{offset:x}: got 0x{computed:04x}, expected 0x{stored:04x}")]
    ChecksumMismatch {
        offset: usize,
        stored: u16,
        computed: u16,
    },

    #[error("failed to get version at offset 0x{offset:x}: need {need} bytes, content is {have} bytes")]
    VersionFieldInvalid {
        offset: usize,
        need: usize,
        have: usize,
    },
}

/// A [`ParseError`] attributed to the region kind that was being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not valid for {}: {}", .kind.label(), .source)]
pub struct FirmwareError {
    pub kind: FirmwareKind,
    #[source]
    pub source: ParseError,
}

impl FirmwareError {
    pub fn new(kind: FirmwareKind, source: ParseError) -> Self {
        FirmwareError { kind, source }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Firmware(#[from] FirmwareError),

    #[error("no known firmware region at offset 0x{offset:x}")]
    UnknownRegion { offset: usize },

    #[error("failed to serialize firmware summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firmware_error_is_prefixed_with_kind_label() {
        let err = FirmwareError::new(
            FirmwareKind::DevBridge,
            ParseError::SizeFieldInvalid {
                what: "code size",
                offset: 0xfb,
                declared: 8192,
                available: 4096,
            },
        );

        assert_eq!(
            err.to_string(),
            "not valid for dev: invalid code size at offset 0xfb: declared 8192 bytes, 4096 available"
        );
    }

    #[test]
    fn test_checksum_mismatch_display() {
        let err = ParseError::ChecksumMismatch {
            offset: 0x7fe,
            stored: 0x1234,
            computed: 0xabcd,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch at offset 0x7fe: got 0xabcd, expected 0x1234"
        );
    }
}
