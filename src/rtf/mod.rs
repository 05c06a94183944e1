//! RTF reader core.
//!
//! Three layers: a tokenizer producing fixed-shape tokens from the
//! source bytes, a generic destination-dispatch parser routing tokens to
//! handlers by stack path, and the OLE Package decoder for embedded
//! `\objdata` payloads.

mod builtin;
mod handler;
mod package;
mod parser;
mod token;

pub use builtin::{ColorTableHandler, FontTableHandler, MetaHandler, PcdataHandler};
pub use handler::{
    Destination, Handler, HandlerList, HandlerRef, HandlerRegistry, NullHandler, StateMap,
};
pub use package::decode_package;
pub use parser::{Context, Frame, Parser, Stack};
pub use token::{
    next_token, skip_block, Token, TokenIterator, TokenKind, MAX_TOKEN_LEN,
};

use encoding_rs::Encoding;

/// Returns the encoding for an RTF `\ansicpg` code page, defaulting to
/// Windows-1252.
pub fn encoding_for_codepage(codepage: Option<i32>) -> &'static Encoding {
    match codepage {
        Some(874) => encoding_rs::WINDOWS_874,
        Some(932) => encoding_rs::SHIFT_JIS,
        Some(936) => encoding_rs::GBK,
        Some(949) => encoding_rs::EUC_KR,
        Some(950) => encoding_rs::BIG5,
        Some(1250) => encoding_rs::WINDOWS_1250,
        Some(1251) => encoding_rs::WINDOWS_1251,
        Some(1253) => encoding_rs::WINDOWS_1253,
        Some(1254) => encoding_rs::WINDOWS_1254,
        Some(1255) => encoding_rs::WINDOWS_1255,
        Some(1256) => encoding_rs::WINDOWS_1256,
        Some(1257) => encoding_rs::WINDOWS_1257,
        Some(1258) => encoding_rs::WINDOWS_1258,
        _ => encoding_rs::WINDOWS_1252,
    }
}

/// Decodes 8-bit source bytes through the document code page.
pub fn decode_bytes(bytes: &[u8], codepage: Option<i32>) -> String {
    let (text, _) = encoding_for_codepage(codepage).decode_without_bom_handling(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_default_codepage() {
        assert_eq!(decode_bytes(b"Hello", None), "Hello");
        // 0xE9 is e-acute in Windows-1252.
        assert_eq!(decode_bytes(&[0xE9], None), "\u{e9}");
    }

    #[test]
    fn test_decode_cyrillic_codepage() {
        // 0xC0 is U+0410 in Windows-1251.
        assert_eq!(decode_bytes(&[0xC0], Some(1251)), "\u{410}");
    }

    #[test]
    fn test_unknown_codepage_falls_back() {
        assert_eq!(decode_bytes(&[0xE9], Some(99999)), "\u{e9}");
    }
}
