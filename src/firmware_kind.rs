use std::fmt;

use serde::{Serialize, Serializer};

use crate::checksum::ChecksumRule;
use crate::signature::{SIG_OFFSET, SIG_TEXT_DEV_BRIDGE, SIG_TEXT_HUB, SIG_TEXT_PD, Signature};
use crate::size::{CODE_SIZE_OFFSET, SizeRule};
use crate::version::{VERSION_OFFSET, VersionRule};

/// The role a firmware region plays inside a hub image.
///
/// Discriminants follow the firmware type numbering used by the hub tool strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FirmwareKind {
    Hub = 0,
    DevBridge = 1,
    Pd = 2,
    Codesign = 3,
}

/// Kinds that may follow the hub code inside a composite image, in probing order.
pub const APPENDED_KINDS: [FirmwareKind; 3] = [
    FirmwareKind::DevBridge,
    FirmwareKind::Pd,
    FirmwareKind::Codesign,
];

impl FirmwareKind {
    pub fn idx(self) -> u8 {
        self as u8
    }

    pub fn id(self) -> &'static str {
        match self {
            FirmwareKind::Hub => "hub",
            FirmwareKind::DevBridge => "dev-bridge",
            FirmwareKind::Pd => "pd",
            FirmwareKind::Codesign => "codesign",
        }
    }

    /// Short name used to prefix errors, e.g. `not valid for dev: ...`.
    pub fn label(self) -> &'static str {
        match self {
            FirmwareKind::Hub => "hub",
            FirmwareKind::DevBridge => "dev",
            FirmwareKind::Pd => "pd",
            FirmwareKind::Codesign => "codesign",
        }
    }

    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            FirmwareKind::Hub => &HUB,
            FirmwareKind::DevBridge => &DEV_BRIDGE,
            FirmwareKind::Pd => &PD,
            FirmwareKind::Codesign => &CODESIGN,
        }
    }

    /// Returns the first of `candidates` that validates at `offset`.
    pub fn detect(buffer: &[u8], offset: usize, candidates: &[FirmwareKind]) -> Option<Self> {
        candidates
            .iter()
            .copied()
            .find(|kind| crate::validate(*kind, buffer, offset).is_ok())
    }
}

impl fmt::Display for FirmwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for FirmwareKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

/// Power-of-two byte alignment of a region within an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Alignment(usize);

impl Alignment {
    pub const NONE: Alignment = Alignment(1);
    pub const ALIGN_1K: Alignment = Alignment(1024);

    pub fn new(bytes: usize) -> Option<Self> {
        bytes.is_power_of_two().then_some(Alignment(bytes))
    }

    pub fn bytes(self) -> usize {
        self.0
    }

    /// Rounds `offset` up to the next multiple of the alignment, `None` on overflow.
    pub fn align_up(self, offset: usize) -> Option<usize> {
        let mask = self.0 - 1;
        offset.checked_add(mask).map(|v| v & !mask)
    }
}

/// How a region announces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Signature(Signature),
    /// No magic; recognised by the fixed-length record of a [`CodesignScheme`].
    CodesignTrailer,
}

/// Everything the parser needs to know about one [`FirmwareKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: FirmwareKind,
    pub probe: Probe,
    pub alignment: Alignment,
    pub size: SizeRule,
    pub checksum: Option<ChecksumRule>,
    pub version: Option<VersionRule>,
}

const CODE_SIZE: SizeRule = SizeRule::CodeSizeKib {
    offset: CODE_SIZE_OFFSET,
};

const CODE_VERSION: VersionRule = VersionRule::Bcd16Le {
    offset: VERSION_OFFSET,
};

static HUB: KindDescriptor = KindDescriptor {
    kind: FirmwareKind::Hub,
    probe: Probe::Signature(Signature::new(SIG_TEXT_HUB, SIG_OFFSET)),
    alignment: Alignment::ALIGN_1K,
    size: CODE_SIZE,
    checksum: Some(ChecksumRule::Sum16Be),
    version: Some(CODE_VERSION),
};

static DEV_BRIDGE: KindDescriptor = KindDescriptor {
    kind: FirmwareKind::DevBridge,
    probe: Probe::Signature(Signature::new(SIG_TEXT_DEV_BRIDGE, SIG_OFFSET)),
    alignment: Alignment::ALIGN_1K,
    size: CODE_SIZE,
    checksum: Some(ChecksumRule::Sum16Be),
    version: Some(CODE_VERSION),
};

static PD: KindDescriptor = KindDescriptor {
    kind: FirmwareKind::Pd,
    probe: Probe::Signature(Signature::new(SIG_TEXT_PD, SIG_OFFSET)),
    alignment: Alignment::ALIGN_1K,
    size: CODE_SIZE,
    checksum: Some(ChecksumRule::Sum16Be),
    version: Some(CODE_VERSION),
};

static CODESIGN: KindDescriptor = KindDescriptor {
    kind: FirmwareKind::Codesign,
    probe: Probe::CodesignTrailer,
    alignment: Alignment::NONE,
    size: SizeRule::CodesignTrailer,
    checksum: None,
    version: None,
};

const RSA_TAG_N: &[u8; 4] = b"N = ";
const RSA_TAG_E: &[u8; 4] = b"E = ";
const RSA_LINE_END: &[u8; 2] = b"\r\n";
const RSA_TEXT_N_LEN: usize = 512;
const RSA_TEXT_E_LEN: usize = 6;
const RSA_SIGNATURE_LEN: usize = 256;

const ECDSA_HASH_LEN: usize = 32;
const ECDSA_KEY_LEN: usize = 64;
const ECDSA_SIGNATURE_LEN: usize = 64;

/// Signature scheme of a codesign trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodesignScheme {
    /// Text public key (`N = ...\r\nE = ...\r\n`) followed by a 2048-bit signature.
    Rsa,
    /// Hash, raw public key and signature.
    Ecdsa,
}

impl CodesignScheme {
    pub const fn len(self) -> usize {
        match self {
            CodesignScheme::Rsa => {
                RSA_TAG_N.len()
                    + RSA_TEXT_N_LEN
                    + RSA_LINE_END.len()
                    + RSA_TAG_E.len()
                    + RSA_TEXT_E_LEN
                    + RSA_LINE_END.len()
                    + RSA_SIGNATURE_LEN
            }
            CodesignScheme::Ecdsa => ECDSA_HASH_LEN + ECDSA_KEY_LEN + ECDSA_SIGNATURE_LEN,
        }
    }

    /// Identifies the codesign record starting at `bytes[0]`.
    ///
    /// Records have a fixed length; anything after it (fill in a flash dump) is ignored.
    /// RSA is recognised by its key-text tags, otherwise any 160 bytes are taken as ECDSA.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= CodesignScheme::Rsa.len() && is_rsa_key_text(bytes) {
            Some(CodesignScheme::Rsa)
        } else if bytes.len() >= CodesignScheme::Ecdsa.len() {
            Some(CodesignScheme::Ecdsa)
        } else {
            None
        }
    }
}

fn is_rsa_key_text(bytes: &[u8]) -> bool {
    let end_n = RSA_TAG_N.len() + RSA_TEXT_N_LEN;
    let tag_e = end_n + RSA_LINE_END.len();
    let end_e = tag_e + RSA_TAG_E.len() + RSA_TEXT_E_LEN;

    bytes.starts_with(RSA_TAG_N)
        && bytes[end_n..].starts_with(RSA_LINE_END)
        && bytes[tag_e..].starts_with(RSA_TAG_E)
        && bytes[end_e..].starts_with(RSA_LINE_END)
}
