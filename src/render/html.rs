//! HTML-emitting destination handlers.
//!
//! These collaborate with the generic parser: a text handler renders the
//! narrative body into `document.html`, and an object handler set
//! captures `\objdata` payloads, decoding OLE Package blobs into the
//! document and emitting links or images for their files.

use super::options::HtmlOptions;
use crate::error::{Error, Result};
use crate::model::Document;
use crate::rtf::{
    decode_bytes, decode_package, Context, Destination, Handler, HandlerRef, NullHandler,
    Parser, PcdataHandler, Stack, Token, TokenKind,
};
use regex::Regex;
use std::rc::Rc;

/// Chains of character/paragraph formatting groups under the body.
const FORMATTING_DESTINATIONS: &str = r"^;rtf(;(b|i|ul|ulnone|strike|super|sub|nosupersub|plain|f|fs|cf|cb|qc|ql|qr|qj|ltrch|rtlch|lang|u|uc))+$";

/// Destinations consumed without output, including their subtrees.
const INERT_DESTINATIONS: &str = r";(stylesheet|info|pict|nonshppict|result|field|header[lrf]?|footer[lrf]?|footnote|generator|themedata|listtable|shp)(;|$)";

/// Registers the HTML handler set on a parser.
pub fn register_html_handlers(parser: &mut Parser, options: &HtmlOptions) -> Result<()> {
    let text: HandlerRef = Rc::new(TextHandler);
    parser.register(";rtf", Rc::clone(&text));
    let formatting = Regex::new(FORMATTING_DESTINATIONS)
        .map_err(|e| Error::InvalidData(e.to_string()))?;
    parser.register(Destination::Pattern(formatting), text);

    parser.register("objclass", Rc::new(PcdataHandler) as HandlerRef);
    parser.register(
        "objdata",
        Rc::new(ObjectDataHandler::new(options.clone())) as HandlerRef,
    );
    parser.register("object", Rc::new(NullHandler) as HandlerRef);

    let inert =
        Regex::new(INERT_DESTINATIONS).map_err(|e| Error::InvalidData(e.to_string()))?;
    parser.register(Destination::Pattern(inert), Rc::new(NullHandler) as HandlerRef);

    Ok(())
}

/// Escapes text for HTML output.
///
/// Quotes are escaped too, so the result is safe inside double-quoted
/// attribute values (`HREF`/`SRC` built from untrusted item names).
fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Closing tags this frame opened, emitted in reverse on close.
const TAGS_KEY: &str = "html.tags";
/// Bytes of fallback text to drop after a `\u` escape.
const SKIP_KEY: &str = "html.skip";
/// The `\uc` fallback byte count in effect for this frame.
const UC_KEY: &str = "html.uc";

/// Renders the narrative body into `document.html`.
///
/// Handles character formatting toggles, paragraph breaks, special
/// character words, unicode escapes, and plain text with escaping.
/// Formatting opened inside a group closes when the group does.
pub struct TextHandler;

impl TextHandler {
    fn open_tag(document: &mut Document, stack: &mut Stack, tag: &'static str) {
        document.html.push('<');
        document.html.push_str(tag);
        document.html.push('>');
        if let Some(frame) = stack.current_mut() {
            frame
                .state
                .get_or_insert_with(TAGS_KEY, Vec::<&'static str>::new)
                .push(tag);
        }
    }

    /// Emits a closing tag, dropping the matching entry from the frame's
    /// open list when present.
    fn close_tag(document: &mut Document, stack: &mut Stack, tag: &'static str) {
        if let Some(tags) = stack
            .current_mut()
            .and_then(|f| f.state.get_mut::<Vec<&'static str>>(TAGS_KEY))
        {
            if let Some(index) = tags.iter().rposition(|t| *t == tag) {
                tags.remove(index);
            }
        }
        document.html.push_str("</");
        document.html.push_str(tag);
        document.html.push('>');
    }

    /// Emits a closing tag only when this frame opened it.
    fn close_if_open(document: &mut Document, stack: &mut Stack, tag: &'static str) {
        let removed = stack
            .current_mut()
            .and_then(|f| f.state.get_mut::<Vec<&'static str>>(TAGS_KEY))
            .and_then(|tags| tags.iter().rposition(|t| *t == tag).map(|i| tags.remove(i)))
            .is_some();
        if removed {
            document.html.push_str("</");
            document.html.push_str(tag);
            document.html.push('>');
        }
    }

    /// Closes every tag the current frame still holds open.
    fn close_frame_tags(document: &mut Document, stack: &mut Stack) {
        let tags = stack
            .current_mut()
            .and_then(|f| f.state.remove::<Vec<&'static str>>(TAGS_KEY))
            .unwrap_or_default();
        for tag in tags.into_iter().rev() {
            document.html.push_str("</");
            document.html.push_str(tag);
            document.html.push('>');
        }
    }

    fn toggle(document: &mut Document, stack: &mut Stack, tag: &'static str, value: Option<i16>) {
        if value.is_none_or(|v| v != 0) {
            Self::open_tag(document, stack, tag);
        } else {
            Self::close_tag(document, stack, tag);
        }
    }

    fn apply_control(
        &self,
        name: &str,
        value: Option<i16>,
        document: &mut Document,
        stack: &mut Stack,
    ) {
        match name {
            "b" => Self::toggle(document, stack, "B", value),
            "i" => Self::toggle(document, stack, "I", value),
            "ul" => Self::toggle(document, stack, "U", value),
            "ulnone" => Self::close_tag(document, stack, "U"),
            "strike" => Self::toggle(document, stack, "STRIKE", value),
            "super" => Self::toggle(document, stack, "SUP", value),
            "sub" => Self::toggle(document, stack, "SUB", value),
            "nosupersub" => {
                Self::close_if_open(document, stack, "SUP");
                Self::close_if_open(document, stack, "SUB");
            }
            "plain" => Self::close_frame_tags(document, stack),
            "par" | "line" => document.html.push_str("<BR>\n"),
            "tab" => document.html.push_str("&nbsp;&nbsp;&nbsp;&nbsp;"),
            "bullet" => document.html.push_str("&bull;"),
            "endash" => document.html.push_str("&ndash;"),
            "emdash" => document.html.push_str("&mdash;"),
            "lquote" => document.html.push_str("&lsquo;"),
            "rquote" => document.html.push_str("&rsquo;"),
            "ldblquote" => document.html.push_str("&ldquo;"),
            "rdblquote" => document.html.push_str("&rdquo;"),
            "uc" => {
                if let Some(frame) = stack.current_mut() {
                    frame
                        .state
                        .insert(UC_KEY, value.unwrap_or(1).max(0) as usize);
                }
            }
            "u" => {
                if let Some(v) = value {
                    // Negative values wrap into the upper BMP range.
                    let code = if v < 0 { v as i32 + 65536 } else { v as i32 };
                    if let Some(ch) = char::from_u32(code as u32) {
                        document.html.push_str(&escape_html(&ch.to_string()));
                    }
                    let fallback = stack
                        .current()
                        .and_then(|f| f.state.get::<usize>(UC_KEY).copied())
                        .unwrap_or(1);
                    if let Some(frame) = stack.current_mut() {
                        frame.state.insert(SKIP_KEY, fallback);
                    }
                }
            }
            _ => {}
        }
    }

    /// Consumes up to `available` bytes of pending `\u` fallback text;
    /// returns how many were taken.
    fn take_fallback(stack: &mut Stack, available: usize) -> usize {
        match stack
            .current_mut()
            .and_then(|f| f.state.get_mut::<usize>(SKIP_KEY))
        {
            Some(skip) if *skip > 0 => {
                let taken = (*skip).min(available);
                *skip -= taken;
                taken
            }
            _ => 0,
        }
    }
}

impl Handler for TextHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        let document = &mut *ctx.document;
        let stack = &mut *ctx.stack;

        match token.kind() {
            TokenKind::GroupOpen => {
                // The frame's opening control word never reaches ordinary
                // dispatch; apply it here.
                let opening = stack.current().map(|frame| {
                    (
                        frame
                            .word_token
                            .control_name(source, frame.word_offset)
                            .to_string(),
                        frame.word_token.value(),
                    )
                });
                if let Some((name, value)) = opening {
                    if name != "rtf" {
                        self.apply_control(&name, value, document, stack);
                    }
                }
            }
            TokenKind::ControlWord => {
                let name = token.control_name(source, offset);
                if !name.is_empty() {
                    self.apply_control(name, token.value(), document, stack);
                }
            }
            TokenKind::Data => {
                let bytes = token.text(source, offset);
                let taken = Self::take_fallback(stack, bytes.len());
                let rest = &bytes[taken..];
                if !rest.is_empty() {
                    let text = decode_bytes(rest, document.codepage);
                    document.html.push_str(&escape_html(&text));
                }
            }
            TokenKind::Character => {
                if Self::take_fallback(stack, 1) == 0 {
                    if let Some(value) = token.value() {
                        let text = decode_bytes(&[value as u8], document.codepage);
                        document.html.push_str(&escape_html(&text));
                    }
                }
            }
            TokenKind::Symbol => {
                if let Some(value) = token.value() {
                    let text = (value as u8 as char).to_string();
                    document.html.push_str(&escape_html(&text));
                }
            }
            TokenKind::GroupClose => {
                Self::close_frame_tags(document, stack);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Captured source range of an `\objdata` payload.
const RANGE_KEY: &str = "objdata.range";

/// Captures `\objdata` payloads and decodes OLE Package blobs.
///
/// On close, when the enclosing object's class is `"Package"`, the
/// hex range decodes into a [`crate::model::Package`] appended to the
/// document, and each carried file becomes a link or an inline image in
/// the rendering.
pub struct ObjectDataHandler {
    options: HtmlOptions,
}

impl ObjectDataHandler {
    /// Creates a handler with the given options.
    pub fn new(options: HtmlOptions) -> Self {
        Self { options }
    }

    fn is_image_name(name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        [".png", ".jpg", ".jpeg", ".gif", ".bmp"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    }
}

impl Handler for ObjectDataHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        match token.kind() {
            TokenKind::Data => {
                if let Some(frame) = ctx.stack.current_mut() {
                    let end = offset + token.len();
                    match frame.state.get_mut::<(usize, usize)>(RANGE_KEY) {
                        Some(range) => range.1 = end,
                        None => frame.state.insert(RANGE_KEY, (offset, end)),
                    }
                }
            }
            TokenKind::GroupClose => {
                let range = ctx
                    .stack
                    .current_mut()
                    .and_then(|f| f.state.remove::<(usize, usize)>(RANGE_KEY));
                let class = ctx
                    .stack
                    .parent()
                    .and_then(|p| p.props.get("objclass").cloned());

                if class.as_deref() == Some("Package") {
                    if let Some((begin, end)) = range {
                        let package = decode_package(source, begin, end)?;
                        if self.options.emit_objects {
                            for item in &package.items {
                                let href =
                                    format!("{}{}", self.options.base_url, item.name);
                                if Self::is_image_name(&item.name) {
                                    ctx.document.html.push_str(&format!(
                                        "<IMG SRC=\"{}\">",
                                        escape_html(&href)
                                    ));
                                } else {
                                    ctx.document.html.push_str(&format!(
                                        "<A HREF=\"{}\">{}</A>",
                                        escape_html(&href),
                                        escape_html(&item.name)
                                    ));
                                }
                            }
                        }
                        ctx.document.packages.push(package);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> Document {
        let mut parser = Parser::new(source).unwrap();
        register_html_handlers(&mut parser, &HtmlOptions::default()).unwrap();
        parser.into_document().unwrap()
    }

    #[test]
    fn test_trivial_document() {
        let doc = render("{\\rtf1 Hello}");
        assert_eq!(doc.version, Some(1));
        assert!(doc.html.contains("Hello"));
    }

    #[test]
    fn test_bold_run() {
        let doc = render("{\\rtf1 \\b on\\b0 off}");
        assert!(doc.html.contains("<B>on</B>off"), "html: {}", doc.html);
    }

    #[test]
    fn test_group_scoped_formatting_closes() {
        let doc = render("{\\rtf1 a{\\b bold}plain}");
        assert!(doc.html.contains("a<B>bold</B>plain"), "html: {}", doc.html);
    }

    #[test]
    fn test_hex_character() {
        let doc = render("{\\rtf1 A\\'41B}");
        assert!(doc.html.contains("AAB"), "html: {}", doc.html);
    }

    #[test]
    fn test_hex_character_codepage() {
        let doc = render("{\\rtf1\\ansi\\ansicpg1251 \\'c0}");
        assert!(doc.html.contains('\u{410}'), "html: {}", doc.html);
    }

    #[test]
    fn test_ignorable_unknown_destination_skipped() {
        let doc = render("{\\rtf1{\\*\\unknown garbage}Kept}");
        assert!(doc.html.contains("Kept"));
        assert!(!doc.html.contains("garbage"));
    }

    #[test]
    fn test_unknown_destination_fails() {
        let mut parser = Parser::new("{\\rtf1{\\unknown garbage}}").unwrap();
        register_html_handlers(&mut parser, &HtmlOptions::default()).unwrap();
        assert!(matches!(
            parser.into_document(),
            Err(Error::UnhandledDestination { .. })
        ));
    }

    #[test]
    fn test_paragraph_break() {
        let doc = render("{\\rtf1 one\\par two}");
        assert!(doc.html.contains("one<BR>\ntwo"), "html: {}", doc.html);
    }

    #[test]
    fn test_escaped_symbols() {
        let doc = render("{\\rtf1 a\\{b\\}c\\\\d}");
        assert!(doc.html.contains("a{b}c\\d"), "html: {}", doc.html);
    }

    #[test]
    fn test_text_is_html_escaped() {
        let doc = render("{\\rtf1 1 < 2 & 3 > 2}");
        assert!(
            doc.html.contains("1 &lt; 2 &amp; 3 &gt; 2"),
            "html: {}",
            doc.html
        );
    }

    #[test]
    fn test_escape_html_covers_quotes() {
        assert_eq!(escape_html("a\"b'c<d>&"), "a&quot;b&#39;c&lt;d&gt;&amp;");
    }

    #[test]
    fn test_special_character_words() {
        let doc = render("{\\rtf1 a\\bullet b\\endash c}");
        assert!(doc.html.contains("a&bull;"), "html: {}", doc.html);
        assert!(doc.html.contains("b&ndash;"), "html: {}", doc.html);
    }

    #[test]
    fn test_unicode_escape_with_fallback() {
        let doc = render("{\\rtf1 \\u8226 ?after}");
        // The bullet is emitted and the single fallback byte dropped.
        assert!(doc.html.contains('\u{2022}'), "html: {}", doc.html);
        assert!(doc.html.contains("after"), "html: {}", doc.html);
        assert!(!doc.html.contains('?'), "html: {}", doc.html);
    }

    #[test]
    fn test_plain_closes_open_tags() {
        let doc = render("{\\rtf1 \\b\\i both\\plain none}");
        assert!(
            doc.html.contains("<B><I>both</I></B>none"),
            "html: {}",
            doc.html
        );
    }

    #[test]
    fn test_stylesheet_subtree_consumed() {
        let doc = render("{\\rtf1{\\stylesheet{\\s0 Normal;}}Body}");
        assert!(doc.html.contains("Body"));
        assert!(!doc.html.contains("Normal"), "html: {}", doc.html);
    }

    #[test]
    fn test_newlines_between_tokens_ignored() {
        let doc = render("{\\rtf1\r\nHello\r\nWorld}");
        assert!(doc.html.contains("HelloWorld"), "html: {}", doc.html);
    }

    // ==================== Object extraction ====================

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn build_static_package(path: &str, data: &[u8]) -> String {
        let label = crate::model::PackageItem::new(path.to_string(), None).name;
        let mut counted = Vec::new();
        counted.extend_from_slice(&2u16.to_le_bytes());
        for s in [label.as_str(), path] {
            counted.extend_from_slice(s.as_bytes());
            counted.push(0);
        }
        counted.extend_from_slice(&0u16.to_le_bytes());
        counted.extend_from_slice(&3u16.to_le_bytes());
        counted.extend_from_slice(&(path.len() as u32 + 1).to_le_bytes());
        counted.extend_from_slice(path.as_bytes());
        counted.push(0);
        counted.extend_from_slice(&(data.len() as u32).to_le_bytes());
        counted.extend_from_slice(data);

        let total_size = counted.len() as u32 + 2;
        let mut out = vec![0x01, 0x05, 0x00, 0x00];
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes());
        out.extend_from_slice(b"Package");
        out.push(0);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&total_size.to_le_bytes());
        out.extend_from_slice(&counted);
        out.extend_from_slice(&0u16.to_le_bytes());
        hex(&out)
    }

    #[test]
    fn test_objdata_package_extracted() {
        let payload = build_static_package("C:\\TMP\\readme.txt", b"hi there");
        let source = format!(
            "{{\\rtf1{{\\object\\objemb{{\\*\\objclass Package}}{{\\*\\objdata {payload}}}}}Tail}}"
        );

        let doc = render(&source);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.packages[0].items.len(), 1);
        let item = &doc.packages[0].items[0];
        assert_eq!(item.name, "readme.txt");
        assert_eq!(item.data.as_deref(), Some(&b"hi there"[..]));
        assert!(
            doc.html.contains("<A HREF=\"readme.txt\">readme.txt</A>"),
            "html: {}",
            doc.html
        );
        assert!(doc.html.contains("Tail"));
    }

    #[test]
    fn test_objdata_package_image_emits_img() {
        let payload = build_static_package("C:\\TMP\\chart.png", &[0x89, 0x50]);
        let source = format!(
            "{{\\rtf1{{\\object\\objemb{{\\*\\objclass Package}}{{\\*\\objdata {payload}}}}}}}"
        );

        let mut parser = Parser::new(source).unwrap();
        let options = HtmlOptions::default().with_base_url("files/");
        register_html_handlers(&mut parser, &options).unwrap();
        let doc = parser.into_document().unwrap();

        assert!(
            doc.html.contains("<IMG SRC=\"files/chart.png\">"),
            "html: {}",
            doc.html
        );
    }

    #[test]
    fn test_objdata_quoted_name_cannot_break_attribute() {
        let payload = build_static_package("C:\\TMP\\x\"y.txt", b"d");
        let source = format!(
            "{{\\rtf1{{\\object\\objemb{{\\*\\objclass Package}}{{\\*\\objdata {payload}}}}}}}"
        );

        let doc = render(&source);
        assert!(
            doc.html.contains("<A HREF=\"x&quot;y.txt\">x&quot;y.txt</A>"),
            "html: {}",
            doc.html
        );
        assert!(!doc.html.contains("\"x\"y"), "html: {}", doc.html);
    }

    #[test]
    fn test_objdata_non_package_ignored() {
        let source =
            "{\\rtf1{\\object\\objemb{\\*\\objclass Equation.3}{\\*\\objdata 00ff00ff}}Text}";
        let doc = render(source);
        assert!(doc.packages.is_empty());
        assert!(doc.html.contains("Text"));
    }

    #[test]
    fn test_objdata_payload_spanning_lines() {
        let raw = build_static_package("C:\\a.bin", &[7, 8, 9]);
        let mut payload = String::new();
        for (i, ch) in raw.chars().enumerate() {
            payload.push(ch);
            if i % 9 == 8 {
                payload.push_str("\r\n");
            }
        }
        let source = format!(
            "{{\\rtf1{{\\object\\objemb{{\\*\\objclass Package}}{{\\*\\objdata {payload}}}}}}}"
        );

        let doc = render(&source);
        assert_eq!(doc.packages.len(), 1);
        assert_eq!(doc.packages[0].items[0].data.as_deref(), Some(&[7u8, 8, 9][..]));
    }
}
