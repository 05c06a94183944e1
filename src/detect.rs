//! Format detection for RTF input.

use crate::error::{Error, Result};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// ASCII signature opening every RTF document.
const RTF_SIGNATURE: &[u8] = b"{\\rtf";

/// Supported input format types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    /// Rich Text Format
    Rtf,
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatType::Rtf => write!(f, "RTF"),
        }
    }
}

/// Detects the input format from a file path.
pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    let mut file = std::fs::File::open(path)?;
    detect_format(&mut file)
}

/// Detects the input format from a reader.
///
/// Reads the signature bytes and resets the reader to the start.
pub fn detect_format<R: Read + Seek>(reader: &mut R) -> Result<FormatType> {
    let mut buffer = [0u8; 8];

    reader.seek(SeekFrom::Start(0))?;
    let bytes_read = reader.read(&mut buffer)?;
    reader.seek(SeekFrom::Start(0))?;

    detect_format_from_bytes(&buffer[..bytes_read])
}

/// Detects the input format from bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if data.len() < RTF_SIGNATURE.len() {
        return Err(Error::InvalidData("Data too small".into()));
    }

    if data.starts_with(RTF_SIGNATURE) {
        return Ok(FormatType::Rtf);
    }

    Err(Error::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_detect_rtf_signature() {
        let data = b"{\\rtf1\\ansi\\deff0 Hello}";
        assert_eq!(detect_format_from_bytes(data).unwrap(), FormatType::Rtf);
    }

    #[test]
    fn test_detect_unversioned_signature() {
        let data = b"{\\rtf}";
        assert_eq!(detect_format_from_bytes(data).unwrap(), FormatType::Rtf);
    }

    #[test]
    fn test_detect_unknown() {
        let data = b"Plain text file";
        assert!(matches!(
            detect_format_from_bytes(data),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_detect_too_short() {
        let data = b"{\\rt";
        assert!(matches!(
            detect_format_from_bytes(data),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_detect_from_reader_resets_position() {
        let data = b"{\\rtf1 Hello}";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(detect_format(&mut cursor).unwrap(), FormatType::Rtf);

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, data);
    }
}
