//! Built-in destination handlers.
//!
//! These populate the document model: `;rtf` meta fields, the font
//! table, and the color table. [`PcdataHandler`] is a prefabricated
//! handler for destinations whose body is plain text.

use super::decode_bytes;
use super::handler::{Handler, HandlerRef};
use super::parser::{Context, Parser};
use super::token::{Token, TokenKind};
use crate::error::{Error, Result};
use crate::model::{Color, Font};
use std::rc::Rc;

/// Registers the default handler set on a freshly built parser.
pub(crate) fn register_default_handlers(parser: &mut Parser) {
    parser.register(";rtf", Rc::new(MetaHandler) as HandlerRef);

    let fonts: HandlerRef = Rc::new(FontTableHandler);
    parser.register(";rtf;fonttbl", Rc::clone(&fonts));
    parser.register(";rtf;fonttbl;f", fonts);

    parser.register(";rtf;colortbl", Rc::new(ColorTableHandler) as HandlerRef);
}

/// Populates document meta fields from the `;rtf` destination.
///
/// The version comes from the opening `\rtfN` control word; charset,
/// code page, and default font come from child control words dispatched
/// inline.
pub struct MetaHandler;

impl Handler for MetaHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        match token.kind() {
            TokenKind::GroupOpen => {
                if let Some(frame) = ctx.stack.current() {
                    if let Some(version) = frame.word_token.value() {
                        ctx.document.version = Some(version as i32);
                    }
                }
            }
            TokenKind::ControlWord => {
                let name = token.control_name(source, offset);
                match name {
                    "ansi" | "mac" | "pc" | "pca" => {
                        ctx.document.charset = Some(name.to_string());
                    }
                    "ansicpg" => ctx.document.codepage = token.value().map(i32::from),
                    "deff" => {
                        ctx.document.default_font_index = token.value().map(i32::from);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// State key holding the RTF index of the font a frame is filling.
const FONT_KEY: &str = "fonttbl.font";

/// Populates the font table.
///
/// Registered for both `;rtf;fonttbl` (declarations inline in the table
/// group) and `;rtf;fonttbl;f` (one `{\fN ...}` subgroup per font).
pub struct FontTableHandler;

impl FontTableHandler {
    /// Binds a fresh record at `index` and remembers it on the frame.
    fn bind(ctx: &mut Context<'_>, index: usize) {
        *ctx.document.font_mut(index) = Font::default();
        if let Some(frame) = ctx.stack.current_mut() {
            frame.state.insert(FONT_KEY, index);
        }
    }

    /// The record bound to the current frame, if any.
    fn bound<'a>(ctx: &'a mut Context<'_>) -> Option<&'a mut Font> {
        let index = *ctx.stack.current()?.state.get::<usize>(FONT_KEY)?;
        Some(ctx.document.font_mut(index))
    }
}

impl Handler for FontTableHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        match token.kind() {
            TokenKind::GroupOpen => {
                // A {\fN ...} subgroup binds its font on open.
                let binding = ctx.stack.current().and_then(|frame| {
                    (frame.name == "f").then_some(()).and(frame.word_token.value())
                });
                if let Some(index) = binding {
                    Self::bind(ctx, index.max(0) as usize);
                }
            }
            TokenKind::ControlWord => {
                let name = token.control_name(source, offset);
                match name {
                    "" => {} // line-break pseudo control
                    "f" => {
                        if let Some(index) = token.value() {
                            Self::bind(ctx, index.max(0) as usize);
                        }
                    }
                    "fnil" | "froman" | "fswiss" | "fmodern" | "fscript" | "fdecor"
                    | "ftech" | "fbidi" => {
                        if let Some(font) = Self::bound(ctx) {
                            font.family = Some(name[1..].to_string());
                        }
                    }
                    "ftnil" | "fttruetype" => {
                        if let Some(font) = Self::bound(ctx) {
                            font.font_type = Some(name[2..].to_string());
                        }
                    }
                    "fcharset" => {
                        if let Some(font) = Self::bound(ctx) {
                            font.charset = token.value().map(i32::from);
                        }
                    }
                    "fprq" => {
                        if let Some(font) = Self::bound(ctx) {
                            font.pitch = token.value().map(i32::from);
                        }
                    }
                    "cpg" => {
                        if let Some(font) = Self::bound(ctx) {
                            font.codepage = token.value().map(i32::from);
                        }
                    }
                    _ => {}
                }
            }
            TokenKind::Data => {
                let codepage = ctx.document.codepage;
                let text = decode_bytes(token.text(source, offset), codepage);
                let name = text.strip_suffix(';').unwrap_or(&text);
                if !name.is_empty() {
                    if let Some(font) = Self::bound(ctx) {
                        font.name = Some(name.to_string());
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// State key: a `;` was seen and the next component write starts a
/// fresh color.
const PENDING_KEY: &str = "colortbl.pending";

/// Populates the color table.
///
/// The table gets an implicit default entry on open; each `;` data
/// token finalizes the current color, and the next `\red`/`\green`/
/// `\blue` starts a fresh one. Unknown control words are an error.
pub struct ColorTableHandler;

impl Handler for ColorTableHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        match token.kind() {
            TokenKind::GroupOpen => {
                if ctx.document.colors.is_empty() {
                    ctx.document.colors.push(Color::default());
                }
                if let Some(frame) = ctx.stack.current_mut() {
                    frame.state.insert(PENDING_KEY, false);
                }
            }
            TokenKind::ControlWord => {
                let name = token.control_name(source, offset);
                match name {
                    "" => {} // line-break pseudo control
                    "red" | "green" | "blue" => {
                        let component = token.value().unwrap_or(0).clamp(0, 255) as u8;
                        if let Some(pending) = ctx
                            .stack
                            .current_mut()
                            .and_then(|f| f.state.get_mut::<bool>(PENDING_KEY))
                        {
                            if *pending {
                                *pending = false;
                                ctx.document.colors.push(Color::default());
                            }
                        }
                        if let Some(color) = ctx.document.colors.last_mut() {
                            match name {
                                "red" => color.r = component,
                                "green" => color.g = component,
                                _ => color.b = component,
                            }
                        }
                    }
                    other => {
                        return Err(Error::UnrecognizedInColorTable {
                            name: other.to_string(),
                            offset,
                        });
                    }
                }
            }
            TokenKind::Data => {
                if token.text(source, offset).contains(&b';') {
                    if let Some(frame) = ctx.stack.current_mut() {
                        frame.state.insert(PENDING_KEY, true);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// State key accumulating a PCDATA destination's text parts.
const PARTS_KEY: &str = "pcdata.parts";

/// Prefabricated handler for destinations whose body is plain text
/// (e.g. `objclass`).
///
/// Accumulates data tokens and, on close, writes the joined string onto
/// the parent frame's properties under the destination name. Any other
/// token inside the destination is an error.
pub struct PcdataHandler;

impl Handler for PcdataHandler {
    fn on_token(
        &self,
        token: Token,
        source: &[u8],
        offset: usize,
        ctx: &mut Context<'_>,
    ) -> Result<()> {
        match token.kind() {
            TokenKind::GroupOpen => {
                if let Some(frame) = ctx.stack.current_mut() {
                    frame.state.insert(PARTS_KEY, Vec::<String>::new());
                }
            }
            TokenKind::Data => {
                let codepage = ctx.document.codepage;
                let text = decode_bytes(token.text(source, offset), codepage);
                if let Some(parts) = ctx
                    .stack
                    .current_mut()
                    .and_then(|f| f.state.get_mut::<Vec<String>>(PARTS_KEY))
                {
                    parts.push(text);
                }
            }
            TokenKind::GroupClose => {
                let (name, joined) = match ctx.stack.current_mut() {
                    Some(frame) => {
                        let parts = frame
                            .state
                            .remove::<Vec<String>>(PARTS_KEY)
                            .unwrap_or_default();
                        (frame.name.clone(), parts.concat())
                    }
                    None => return Ok(()),
                };
                if let Some(parent) = ctx.stack.parent_mut() {
                    parent.props.insert(name, joined);
                }
            }
            _ => {
                let path = ctx
                    .stack
                    .current()
                    .map(|f| f.path.clone())
                    .unwrap_or_default();
                return Err(Error::UnexpectedInPcData { path, offset });
            }
        }
        Ok(())
    }
}
