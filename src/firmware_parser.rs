use bitflags::bitflags;
use log::{Level, debug, log_enabled, trace, warn};

use crate::err::{FirmwareError, ParseError, ParseResult};
use crate::firmware_container::FirmwareContainer;
use crate::firmware_kind::{FirmwareKind, KindDescriptor, Probe};
use crate::size::SizeRule;
use crate::utils::{ByteRegion, format_hexdump};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ParseFlags: u32 {
        /// Skip checksum verification. Recovery and forensic use only.
        const IGNORE_CHECKSUM = 1 << 0;
        /// Accept trailing `0xff`/`0x00` fill after the last region of an image.
        const ALLOW_PADDING = 1 << 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserSettings {
    flags: ParseFlags,
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    pub fn ignore_checksum(mut self, ignore_checksum: bool) -> Self {
        self.flags.set(ParseFlags::IGNORE_CHECKSUM, ignore_checksum);
        self
    }

    pub fn allow_padding(mut self, allow_padding: bool) -> Self {
        self.flags.set(ParseFlags::ALLOW_PADDING, allow_padding);
        self
    }

    pub fn flags(mut self, flags: ParseFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn parse_flags(&self) -> ParseFlags {
        self.flags
    }

    pub fn should_verify_checksum(&self) -> bool {
        !self.flags.contains(ParseFlags::IGNORE_CHECKSUM)
    }

    pub fn should_allow_padding(&self) -> bool {
        self.flags.contains(ParseFlags::ALLOW_PADDING)
    }
}

/// Progress of a [`FirmwareParser`] through the region pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    Empty,
    Validated,
    Sized,
    ChecksumChecked,
    Versioned,
    /// Terminal; the parser keeps returning this error.
    Failed(ParseError),
}

/// Parses one region kind out of a borrowed buffer.
///
/// The pipeline is fixed: signature, size, truncation, checksum, version. The first
/// failing step aborts the rest and leaves the parser in [`ParseState::Failed`].
#[derive(Debug, Clone)]
pub struct FirmwareParser {
    kind: FirmwareKind,
    settings: ParserSettings,
    state: ParseState,
}

impl FirmwareParser {
    pub fn new(kind: FirmwareKind) -> Self {
        FirmwareParser {
            kind,
            settings: ParserSettings::default(),
            state: ParseState::Empty,
        }
    }

    pub fn with_configuration(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Checks that the region at `offset` announces this parser's kind.
    pub fn validate(&mut self, buffer: &[u8], offset: usize) -> Result<(), FirmwareError> {
        self.ensure_not_failed()?;

        let region = ByteRegion::new(buffer);
        let result = probe(self.kind.descriptor(), &region, offset);
        self.step(result, ParseState::Validated)
    }

    /// Parses the region at `offset` into a fresh [`FirmwareContainer`].
    ///
    /// Validation always runs first, even after an earlier successful `validate`.
    pub fn parse(
        &mut self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<FirmwareContainer, FirmwareError> {
        self.ensure_not_failed()?;
        self.state = ParseState::Empty;
        self.validate(buffer, offset)?;

        let descriptor = self.kind.descriptor();
        let region = ByteRegion::new(buffer);

        let size = descriptor.size.calculate(&region, offset);
        let size = self.step(size, ParseState::Sized)?;
        debug!("{} region at 0x{:x}: {} bytes", self.kind, offset, size);

        if log_enabled!(Level::Trace) {
            if let Ok(header) = region.read(offset, size.min(0x110), "header") {
                trace!("{} header:\n{}", self.kind, format_hexdump(header, offset));
            }
        }

        let content = region.slice(offset, size, "content");
        let content = self.step(content, ParseState::Sized)?;

        let has_checksum = descriptor.checksum.is_some();
        let checked = match descriptor.checksum {
            Some(rule) if self.settings.should_verify_checksum() => rule.verify(&content),
            Some(_) => {
                warn!(
                    "Skipping checksum verification of {} region at 0x{:x}",
                    self.kind, offset
                );
                Ok(())
            }
            None => Ok(()),
        };
        self.step(checked, ParseState::ChecksumChecked)?;

        let version = descriptor
            .version
            .map(|rule| rule.extract(&content))
            .transpose();
        let version = self.step(version, ParseState::Versioned)?;
        if let Some(version) = version {
            debug!("{} version: {}", self.kind, version);
        }

        Ok(FirmwareContainer {
            kind: self.kind,
            offset,
            alignment: descriptor.alignment,
            version,
            has_checksum,
            content,
        })
    }

    fn ensure_not_failed(&self) -> Result<(), FirmwareError> {
        match &self.state {
            ParseState::Failed(e) => Err(FirmwareError::new(self.kind, e.clone())),
            _ => Ok(()),
        }
    }

    fn step<T>(&mut self, result: ParseResult<T>, next: ParseState) -> Result<T, FirmwareError> {
        match result {
            Ok(value) => {
                self.state = next;
                Ok(value)
            }
            Err(e) => {
                debug!("{} parser failed: {}", self.kind, e);
                self.state = ParseState::Failed(e.clone());
                Err(FirmwareError::new(self.kind, e))
            }
        }
    }
}

fn probe(descriptor: &KindDescriptor, region: &ByteRegion, offset: usize) -> ParseResult<()> {
    match descriptor.probe {
        Probe::Signature(signature) => signature.ensure(region, offset),
        Probe::CodesignTrailer => SizeRule::CodesignTrailer
            .calculate(region, offset)
            .map(|_| ()),
    }
}
