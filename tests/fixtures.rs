#![allow(dead_code)]
use std::sync::Once;

use usbhub_firmware::checksum::ChecksumRule;
use usbhub_firmware::signature::{SIG_OFFSET, SIG_TEXT_DEV_BRIDGE, SIG_TEXT_HUB, SIG_TEXT_PD};
use usbhub_firmware::size::{CODE_SIZE_OFFSET, CODE_SIZE_UNIT};
use usbhub_firmware::version::VERSION_OFFSET;

static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}

/// A code region (hub, device bridge or PD bridge) of `kib` KiB with a valid checksum.
pub fn code_region(magic: &[u8; 4], kib: u8, version: u16) -> Vec<u8> {
    let len = usize::from(kib) * CODE_SIZE_UNIT;
    let mut region: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
    region[CODE_SIZE_OFFSET] = kib;
    region[SIG_OFFSET..SIG_OFFSET + 4].copy_from_slice(magic);
    region[VERSION_OFFSET..VERSION_OFFSET + 2].copy_from_slice(&version.to_le_bytes());
    ChecksumRule::Sum16Be.seal(&mut region).unwrap();
    region
}

pub fn hub_region(kib: u8, version: u16) -> Vec<u8> {
    code_region(SIG_TEXT_HUB, kib, version)
}

pub fn dev_bridge_region(kib: u8, version: u16) -> Vec<u8> {
    code_region(SIG_TEXT_DEV_BRIDGE, kib, version)
}

pub fn pd_region(kib: u8, version: u16) -> Vec<u8> {
    code_region(SIG_TEXT_PD, kib, version)
}

/// Declared size wins over the physical size: pad a region out to `physical_len`.
pub fn padded(mut region: Vec<u8>, physical_len: usize, fill: u8) -> Vec<u8> {
    region.resize(physical_len, fill);
    region
}

pub fn rsa_codesign_trailer() -> Vec<u8> {
    let mut out = Vec::with_capacity(786);
    out.extend_from_slice(b"N = ");
    out.extend(std::iter::repeat_n(b'C', 512));
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(b"E = ");
    out.extend_from_slice(b"010001");
    out.extend_from_slice(b"\r\n");
    out.extend(std::iter::repeat_n(0xa5, 256));
    out
}

pub fn ecdsa_codesign_trailer() -> Vec<u8> {
    (0..160).map(|i| i as u8).collect()
}

/// Concatenates regions, each starting on a 1 KiB boundary.
pub fn image(regions: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for region in regions {
        let aligned = out.len().div_ceil(1024) * 1024;
        out.resize(aligned, 0xff);
        out.extend_from_slice(region);
    }
    out
}
