use std::cmp;
use std::fmt::{self, Write};

/// Renders `data` in canonical hex form (`hexdump -C`), one 16-byte line per row.
///
/// `address` is the offset of `data[0]` within the enclosing buffer and is what the
/// left-hand column shows.
pub fn format_hexdump(data: &[u8], address: usize) -> String {
    let mut out = String::with_capacity((data.len() / 16 + 1) * 78);
    write_hexdump(&mut out, data, address).expect("writing to a String cannot fail");
    out
}

/// Writes the [`format_hexdump`] rendering of `data` into any `fmt::Write` sink.
pub fn write_hexdump<W: Write>(out: &mut W, data: &[u8], address: usize) -> fmt::Result {
    let mut pos = 0;

    while pos < data.len() {
        let end = cmp::min(pos + 16, data.len());
        write_line(out, &data[pos..end], address + pos)?;
        pos += 16;
    }

    Ok(())
}

fn write_line<W: Write>(out: &mut W, line: &[u8], address: usize) -> fmt::Result {
    write!(out, "{:08x}:", address)?;

    for b in line {
        write!(out, " {:02x}", b)?;
    }

    // align the ASCII column on short lines
    for _ in line.len()..16 {
        out.write_str("   ")?;
    }

    out.write_str("  |")?;
    for c in line {
        match *c {
            0x20..=0x7e => out.write_char(*c as char)?,
            _ => out.write_char('.')?,
        }
    }
    out.write_str("|\n")
}
