//! # Object Record Writer (C8)
//!
//! The binary object stream is a concatenation of records (spec §4.8):
//!
//! | offset | width | field |
//! |---|---|---|
//! | 0 | 2 | `value`, little-endian |
//! | 2 | 1 | `is_origin` (0 or 1) |
//! | 3 | 4 | `line_length`, native-endian `u32` |
//! | 7 | `line_length` | `source_line`, UTF-8, no terminator |
//!
//! The original writer serialized its `Statement` struct with `memcpy`,
//! which is host-endian for every field (see spec §9's design notes). This
//! implementation fixes `value` to little-endian explicitly; `line_length`
//! keeps the original's native-endian choice since it is never meant to
//! cross machines (the simulator that reads it runs on the box that
//! produced it, same as the original tool).

use std::io::{self, Read, Write};

/// One word's worth of assembled output, tagged with the source line that
/// produced it so the simulator can show it in a trace (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    pub value: u16,
    pub is_origin: bool,
    pub source_line: String,
}

impl MemoryEntry {
    pub fn new(value: u16, is_origin: bool, source_line: impl Into<String>) -> Self {
        Self {
            value,
            is_origin,
            source_line: source_line.into(),
        }
    }
}

/// Serialize `entries` to `w` as a concatenation of fixed-layout records.
pub fn write_object<W: Write>(entries: &[MemoryEntry], w: &mut W) -> io::Result<()> {
    for entry in entries {
        w.write_all(&entry.value.to_le_bytes())?;
        w.write_all(&[entry.is_origin as u8])?;
        let line_bytes = entry.source_line.as_bytes();
        w.write_all(&(line_bytes.len() as u32).to_ne_bytes())?;
        w.write_all(line_bytes)?;
    }
    Ok(())
}

/// Parse records sequentially until EOF. Used by this crate's own
/// round-trip tests; the simulator that ultimately consumes this format is
/// out of scope, but keeping the decode side here mirrors how the original
/// colocates `operator<<`/`operator>>` for `Statement` in one file.
pub fn read_object<R: Read>(r: &mut R) -> io::Result<Vec<MemoryEntry>> {
    let mut entries = Vec::new();
    loop {
        let mut value_buf = [0u8; 2];
        match r.read(&mut value_buf)? {
            0 => break,
            2 => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "truncated object record (value)",
                ))
            }
        }
        let value = u16::from_le_bytes(value_buf);

        let mut origin_buf = [0u8; 1];
        r.read_exact(&mut origin_buf)?;
        let is_origin = origin_buf[0] != 0;

        let mut len_buf = [0u8; 4];
        r.read_exact(&mut len_buf)?;
        let len = u32::from_ne_bytes(len_buf) as usize;

        let mut line_buf = vec![0u8; len];
        r.read_exact(&mut line_buf)?;
        let source_line = String::from_utf8(line_buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        entries.push(MemoryEntry::new(value, is_origin, source_line));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_mixed_stream() {
        let entries = vec![
            MemoryEntry::new(0x3000, true, ".ORIG x3000"),
            MemoryEntry::new(0x1042, false, "ADD R0,R1,R2"),
            MemoryEntry::new('H' as u16, false, "H"),
            MemoryEntry::new(0, false, ".STRINGZ \"H\""),
        ];
        let mut buf = Vec::new();
        write_object(&entries, &mut buf).unwrap();
        let decoded = read_object(&mut &buf[..]).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn empty_stream_round_trips() {
        let mut buf = Vec::new();
        write_object(&[], &mut buf).unwrap();
        assert!(buf.is_empty());
        assert_eq!(read_object(&mut &buf[..]).unwrap(), vec![]);
    }

    #[test]
    fn value_is_little_endian_on_the_wire() {
        let entries = vec![MemoryEntry::new(0x3000, true, "")];
        let mut buf = Vec::new();
        write_object(&entries, &mut buf).unwrap();
        assert_eq!(&buf[0..2], &[0x00, 0x30]);
    }
}
