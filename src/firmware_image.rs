use log::{debug, info};
use serde::Serialize;

use crate::err::{Error, Result};
use crate::firmware_container::{ContainerSummary, FirmwareContainer};
use crate::firmware_kind::{APPENDED_KINDS, FirmwareKind};
use crate::firmware_parser::{FirmwareParser, ParserSettings};
use crate::version::Version;

/// A complete hub firmware file: the hub code at offset zero, followed by any number of
/// appended device bridge, PD bridge or codesign regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareImage {
    regions: Vec<FirmwareContainer>,
}

#[derive(Debug, Serialize)]
struct ImageSummary {
    version: Option<Version>,
    regions: Vec<ContainerSummary>,
}

impl FirmwareImage {
    pub fn parse(buffer: &[u8], settings: &ParserSettings) -> Result<Self> {
        let hub = FirmwareParser::new(FirmwareKind::Hub)
            .with_configuration(settings.clone())
            .parse(buffer, 0)?;
        debug!("Hub code: {:?}", hub);

        let mut offset = next_offset(&hub)?;
        let mut regions = vec![hub];

        while offset < buffer.len() {
            let rest = &buffer[offset..];
            if settings.should_allow_padding() && is_padding(rest) {
                debug!("Ignoring {} bytes of padding at 0x{:x}", rest.len(), offset);
                break;
            }

            let kind = FirmwareKind::detect(buffer, offset, &APPENDED_KINDS)
                .ok_or(Error::UnknownRegion { offset })?;
            info!("Found {} region at 0x{:x}", kind, offset);

            let region = FirmwareParser::new(kind)
                .with_configuration(settings.clone())
                .parse(buffer, offset)?;
            debug!("{:?}", region);

            offset = next_offset(&region)?;
            regions.push(region);

            // nothing but padding may follow a codesign record
            if kind == FirmwareKind::Codesign && offset < buffer.len() {
                let rest = &buffer[offset..];
                if !(settings.should_allow_padding() && is_padding(rest)) {
                    return Err(Error::UnknownRegion { offset });
                }
                debug!("Ignoring {} bytes of padding at 0x{:x}", rest.len(), offset);
                break;
            }
        }

        Ok(FirmwareImage { regions })
    }

    /// The hub code region, always present.
    pub fn hub(&self) -> &FirmwareContainer {
        &self.regions[0]
    }

    pub fn version(&self) -> Option<Version> {
        self.hub().version()
    }

    /// The first region of `kind`, if the image carries one.
    pub fn region(&self, kind: FirmwareKind) -> Option<&FirmwareContainer> {
        self.regions.iter().find(|r| r.kind() == kind)
    }

    pub fn regions(&self) -> &[FirmwareContainer] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<FirmwareContainer> {
        self.regions
    }

    pub fn to_json(&self) -> Result<String> {
        let summary = ImageSummary {
            version: self.version(),
            regions: self.regions.iter().map(FirmwareContainer::summary).collect(),
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }
}

fn next_offset(region: &FirmwareContainer) -> Result<usize> {
    region
        .offset()
        .checked_add(region.size())
        .and_then(|end| region.alignment().align_up(end))
        .ok_or(Error::UnknownRegion {
            offset: region.offset(),
        })
}

fn is_padding(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| *b == 0xff) || bytes.iter().all(|b| *b == 0x00)
}
