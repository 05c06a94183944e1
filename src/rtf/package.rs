//! OLE "Package" object decoder.
//!
//! An `\objdata` destination whose object class is `"Package"` carries a
//! hex-encoded binary blob listing one or more embedded or linked files.
//! The grammar is reverse-engineered and intentionally decoded strictly:
//! any mismatch aborts with an offset and the expected vs. actual value,
//! so unknown variants surface instead of being silently tolerated.

use super::decode_bytes;
use crate::error::{Error, Result};
use crate::model::{Package, PackageItem, OLE_TYPE_LINKED, OLE_TYPE_STATIC};

/// The fixed leading magic of a Package payload (read big-endian).
const PACKAGE_MAGIC: u32 = 0x0105_0000;
/// The format constant following the magic (read little-endian).
const FORMAT_CONSTANT: u32 = 2;
/// Bounds on the declared payload size.
const MIN_TOTAL_SIZE: u32 = 2;
const MAX_TOTAL_SIZE: u32 = 1_048_576;
/// Bounds on the string table entry count.
const MIN_STRING_COUNT: u16 = 2;
const MAX_STRING_COUNT: u16 = 10;

/// Cursor over an ASCII-hex range of the source.
///
/// Bytes are read two hex digits at a time; whitespace (including line
/// endings) may appear anywhere between digits. Reading past the end of
/// the range without completing a structure is an error.
struct HexReader<'a> {
    source: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> HexReader<'a> {
    fn new(source: &'a [u8], begin: usize, end: usize) -> Self {
        Self {
            source,
            pos: begin,
            end: end.min(source.len()),
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::PackageDecode {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn next_hex_digit(&mut self) -> Result<u8> {
        while self.pos < self.end {
            let byte = self.source[self.pos];
            self.pos += 1;
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => continue,
                b'0'..=b'9' => return Ok(byte - b'0'),
                b'a'..=b'f' => return Ok(byte - b'a' + 10),
                b'A'..=b'F' => return Ok(byte - b'A' + 10),
                _ => {
                    return Err(Error::PackageDecode {
                        offset: self.pos - 1,
                        message: format!("bad hex digit 0x{byte:02x}"),
                    })
                }
            }
        }
        Err(self.error("out of data"))
    }

    fn read_byte(&mut self) -> Result<u8> {
        let hi = self.next_hex_digit()?;
        let lo = self.next_hex_digit()?;
        Ok((hi << 4) | lo)
    }

    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(count);
        for _ in 0..count {
            bytes.push(self.read_byte()?);
        }
        Ok(bytes)
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let lo = self.read_byte()? as u16;
        let hi = self.read_byte()? as u16;
        Ok(lo | (hi << 8))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for shift in [0u32, 8, 16, 24] {
            value |= (self.read_byte()? as u32) << shift;
        }
        Ok(value)
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            value = (value << 8) | self.read_byte()? as u32;
        }
        Ok(value)
    }

    /// Reads bytes up to (and consuming) a zero terminator; the
    /// terminator is not returned.
    fn read_zstring(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            match self.read_byte()? {
                0 => return Ok(bytes),
                byte => bytes.push(byte),
            }
        }
    }

    /// Reads a 4-byte length, then that many bytes whose last must be a
    /// zero terminator; returns the body without it.
    fn read_len_zstring(&mut self) -> Result<Vec<u8>> {
        let length = self.read_u32_le()? as usize;
        if length == 0 {
            return Err(self.error("unterminated string (zero length)"));
        }
        let mut bytes = self.read_bytes(length)?;
        match bytes.pop() {
            Some(0) => Ok(bytes),
            _ => Err(self.error("unterminated string")),
        }
    }
}

/// Decodes the hex payload of a `"Package"` object in
/// `source[begin..end]` into its file list.
pub fn decode_package(source: &[u8], begin: usize, end: usize) -> Result<Package> {
    let mut reader = HexReader::new(source, begin, end);

    let magic = reader.read_u32_be()?;
    if magic != PACKAGE_MAGIC {
        return Err(reader.error(format!(
            "bad magic: expected 0x{PACKAGE_MAGIC:08x}, got 0x{magic:08x}"
        )));
    }

    let constant = reader.read_u32_le()?;
    if constant != FORMAT_CONSTANT {
        return Err(reader.error(format!(
            "unexpected constant: expected {FORMAT_CONSTANT}, got {constant}"
        )));
    }

    let progid = decode_bytes(&reader.read_len_zstring()?, None);

    for _ in 0..2 {
        let zero = reader.read_u32_le()?;
        if zero != 0 {
            return Err(reader.error(format!("unexpected constant: expected 0, got {zero}")));
        }
    }

    let total_size = reader.read_u32_le()?;
    if !(MIN_TOTAL_SIZE..=MAX_TOTAL_SIZE).contains(&total_size) {
        return Err(reader.error(format!("total size {total_size} out of range")));
    }

    // Everything after the size field counts toward the declared size;
    // the final 2-byte terminator is the trailing slack.
    let mut consumed: u32 = 0;

    let string_count = reader.read_u16_le()?;
    if !(MIN_STRING_COUNT..=MAX_STRING_COUNT).contains(&string_count) {
        return Err(reader.error(format!("string table count {string_count} out of range")));
    }
    let mut strings = Vec::with_capacity(string_count as usize);
    let mut string_bytes: u32 = 0;
    for _ in 0..string_count {
        let bytes = reader.read_zstring()?;
        string_bytes += bytes.len() as u32;
        strings.push(decode_bytes(&bytes, None));
    }
    let table_terminator = reader.read_u16_le()?;
    if table_terminator != 0 {
        return Err(reader.error(format!(
            "bad string table terminator: expected 0, got {table_terminator}"
        )));
    }
    consumed += 2 + (string_bytes + string_count as u32) + 2;
    let label = strings[0].clone();

    let ole_type = reader.read_u16_le()?;
    consumed += 2;

    let payload_end = total_size - 2;
    let mut items = Vec::new();
    match ole_type {
        OLE_TYPE_STATIC => {
            while consumed < payload_end {
                let path_bytes = reader.read_len_zstring()?;
                consumed += path_bytes.len() as u32 + 5;
                let data_length = reader.read_u32_le()?;
                let data = reader.read_bytes(data_length as usize)?;
                consumed += data_length + 4;
                items.push(PackageItem::new(decode_bytes(&path_bytes, None), Some(data)));
            }
            if consumed != payload_end {
                return Err(reader.error(format!(
                    "payload size mismatch: expected {payload_end} bytes, consumed {consumed}"
                )));
            }
        }
        OLE_TYPE_LINKED => {
            let link_count = reader.read_u16_le()?;
            consumed += 2;
            for _ in 0..link_count {
                let bytes = reader.read_zstring()?;
                consumed += bytes.len() as u32 + 1;
                let mut path = decode_bytes(&bytes, None);
                if path.contains('~') {
                    path = path.replace('~', &label);
                }
                items.push(PackageItem::new(path, None));
            }
            if consumed != payload_end {
                return Err(reader.error(format!(
                    "payload size mismatch: expected {payload_end} bytes, consumed {consumed}"
                )));
            }
        }
        other => {
            return Err(reader.error(format!("unsupported OLE type {other}")));
        }
    }

    let terminator = reader.read_u16_le()?;
    if terminator != 0 {
        return Err(reader.error(format!("bad terminator: expected 0, got {terminator}")));
    }

    Ok(Package {
        progid,
        total_size,
        strings,
        label,
        ole_type,
        items,
    })
}
