pub use err::{Error, FirmwareError, ParseError, Result};
pub use firmware_container::{ContainerSummary, FirmwareContainer};
pub use firmware_image::FirmwareImage;
pub use firmware_kind::{Alignment, CodesignScheme, FirmwareKind, KindDescriptor, Probe};
pub use firmware_parser::{FirmwareParser, ParseFlags, ParseState, ParserSettings};
pub use utils::ByteRegion;
pub use version::Version;

pub mod checksum;
pub mod err;
pub mod firmware_container;
pub mod firmware_image;
pub mod firmware_kind;
pub mod firmware_parser;
pub mod signature;
pub mod size;
pub mod utils;
pub mod version;

/// Checks that the region at `offset` announces `kind`, without parsing it.
///
/// Cheap enough to probe several kinds in turn; see [`FirmwareKind::detect`].
pub fn validate(
    kind: FirmwareKind,
    buffer: &[u8],
    offset: usize,
) -> std::result::Result<(), FirmwareError> {
    FirmwareParser::new(kind).validate(buffer, offset)
}

/// Parses the region of `kind` at `offset` of `buffer`.
pub fn parse(
    kind: FirmwareKind,
    buffer: &[u8],
    offset: usize,
    settings: &ParserSettings,
) -> std::result::Result<FirmwareContainer, FirmwareError> {
    FirmwareParser::new(kind)
        .with_configuration(settings.clone())
        .parse(buffer, offset)
}

#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
