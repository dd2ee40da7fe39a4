pub(crate) mod bytes;
mod hexdump;

pub use self::bytes::ByteRegion;
pub use self::hexdump::{format_hexdump, write_hexdump};
