use std::fmt::{Debug, Formatter};

use serde::Serialize;

use crate::firmware_kind::{Alignment, CodesignScheme, FirmwareKind};
use crate::version::Version;

/// One parsed firmware region.
///
/// Built only by [`crate::FirmwareParser::parse`]; `content` is an owned copy truncated to
/// the length derived from the region header, never the length of the input buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct FirmwareContainer {
    pub(crate) kind: FirmwareKind,
    pub(crate) offset: usize,
    pub(crate) alignment: Alignment,
    pub(crate) version: Option<Version>,
    pub(crate) has_checksum: bool,
    pub(crate) content: Vec<u8>,
}

impl FirmwareContainer {
    pub fn kind(&self) -> FirmwareKind {
        self.kind
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }

    pub fn idx(&self) -> u8 {
        self.kind.idx()
    }

    /// Offset of the region within the buffer it was parsed from.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Whether the region format carries a checksum.
    ///
    /// This stays `true` when verification was skipped with
    /// [`crate::ParseFlags::IGNORE_CHECKSUM`].
    pub fn has_checksum(&self) -> bool {
        self.has_checksum
    }

    /// The checksum stored in the region, if its format carries one.
    pub fn checksum(&self) -> Option<u16> {
        self.kind
            .descriptor()
            .checksum
            .and_then(|rule| rule.stored(&self.content))
    }

    pub fn codesign_scheme(&self) -> Option<CodesignScheme> {
        match self.kind {
            FirmwareKind::Codesign => CodesignScheme::detect(&self.content),
            _ => None,
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.kind,
            idx: self.idx(),
            offset: self.offset,
            size: self.size(),
            alignment: self.alignment,
            version: self.version,
            has_checksum: self.has_checksum,
            checksum: self.checksum(),
            codesign: self.codesign_scheme(),
        }
    }
}

// The content is usually tens of KiB, keep it out of debug output.
impl Debug for FirmwareContainer {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), std::fmt::Error> {
        fmt.debug_struct("FirmwareContainer")
            .field("kind", &self.kind)
            .field("offset", &self.offset)
            .field("size", &self.content.len())
            .field("alignment", &self.alignment)
            .field("version", &self.version)
            .field("has_checksum", &self.has_checksum)
            .finish()
    }
}

/// Metadata of a [`FirmwareContainer`], as exported by [`crate::FirmwareImage::to_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    pub id: FirmwareKind,
    pub idx: u8,
    pub offset: usize,
    pub size: usize,
    pub alignment: Alignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    pub has_checksum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codesign: Option<CodesignScheme>,
}
