//! Generic destination-dispatch parser.
//!
//! The parser walks the token stream maintaining a stack of destination
//! frames, one per open brace it descends into. Each frame is addressed
//! by its path (the `;`-joined ancestor control names); opening a
//! destination resolves the path against the handler registry and routes
//! every token of the frame to the resolved handlers. Ignorable
//! destinations (`\*`) with no handler are skipped wholesale; anything
//! else unhandled is an error.

use super::handler::{Destination, HandlerList, HandlerRef, HandlerRegistry, StateMap};
use super::token::{next_token, skip_block, Token, TokenKind};
use crate::error::{Error, Result};
use crate::model::Document;
use crate::parse_options::ParseOptions;
use std::collections::HashMap;
use std::rc::Rc;

/// One destination frame: an open brace the parser has descended into.
pub struct Frame {
    /// The open brace token
    pub open_token: Token,
    /// Offset of the open brace
    pub open_offset: usize,
    /// The destination's opening control word token
    pub word_token: Token,
    /// Offset of the opening control word
    pub word_offset: usize,
    /// The destination's control name (e.g. `fonttbl`)
    pub name: String,
    /// Canonical address: `;`-joined ancestor names plus this one, with
    /// a leading `;` (e.g. `;rtf;fonttbl;f`)
    pub path: String,
    /// True when the group began with `\*`
    pub ignorable: bool,
    /// String properties; handlers write computed values here (PCDATA
    /// results land on the parent frame under the destination name)
    pub props: HashMap<String, String>,
    /// Typed per-handler scratch storage
    pub state: StateMap,
    handlers: HandlerList,
}

impl Frame {
    /// The resolved handler list for this frame.
    pub fn handlers(&self) -> HandlerList {
        Rc::clone(&self.handlers)
    }
}

/// The stack of open destination frames; the top is the active one.
#[derive(Default)]
pub struct Stack {
    frames: Vec<Frame>,
}

impl Stack {
    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns true with no open frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The active frame.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Mutable access to the active frame.
    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The frame enclosing the active one.
    pub fn parent(&self) -> Option<&Frame> {
        self.frames.len().checked_sub(2).and_then(|i| self.frames.get(i))
    }

    /// Mutable access to the frame enclosing the active one.
    pub fn parent_mut(&mut self) -> Option<&mut Frame> {
        let index = self.frames.len().checked_sub(2)?;
        self.frames.get_mut(index)
    }

    fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }
}

/// Mutable state handed to handlers with each token.
pub struct Context<'a> {
    /// The document under construction
    pub document: &'a mut Document,
    /// The frame stack; the current frame belongs to the dispatching
    /// destination
    pub stack: &'a mut Stack,
}

/// The RTF parser.
///
/// Owns the source, the cursor, the document under construction, the
/// frame stack, and the handler registry. Parsing runs to completion on
/// the caller's thread; nothing is shared across parser instances.
pub struct Parser {
    source: Rc<[u8]>,
    pos: usize,
    document: Document,
    stack: Stack,
    registry: HandlerRegistry,
    options: ParseOptions,
    finished: bool,
}

impl Parser {
    /// Creates a parser over the given source with default options.
    ///
    /// The built-in meta, font table, and color table handlers are
    /// registered unless suppressed through
    /// [`Parser::with_options`].
    pub fn new(source: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_options(source, ParseOptions::default())
    }

    /// Creates a parser with explicit options.
    pub fn with_options(source: impl AsRef<[u8]>, options: ParseOptions) -> Result<Self> {
        let bytes = source.as_ref();
        if bytes.is_empty() {
            return Err(Error::MissingSource);
        }

        let mut parser = Self {
            source: Rc::from(bytes),
            pos: 0,
            document: Document::new(),
            stack: Stack::default(),
            registry: HandlerRegistry::new(),
            options,
            finished: false,
        };
        if !parser.options.suppress_defaults {
            super::builtin::register_default_handlers(&mut parser);
        }
        Ok(parser)
    }

    /// Registers a handler for a destination.
    ///
    /// A plain string is a name unless it contains `;`, in which case it
    /// is an exact path; a [`regex::Regex`] matches against paths.
    /// Duplicate (destination, handler) pairs are ignored. Registration
    /// clears the resolver cache.
    pub fn register(&mut self, destination: impl Into<Destination>, handler: HandlerRef) {
        self.registry.register(destination.into(), handler);
    }

    /// The source bytes.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// The parser options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Runs the parse to completion and returns the document.
    pub fn document(&mut self) -> Result<&Document> {
        self.run()?;
        Ok(&self.document)
    }

    /// Returns the document under construction without advancing the
    /// parse.
    pub fn partial_document(&self) -> &Document {
        &self.document
    }

    /// Runs the parse to completion and takes the document.
    pub fn into_document(mut self) -> Result<Document> {
        self.run()?;
        Ok(self.document)
    }

    fn run(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        while self.pos < self.source.len() {
            let token = next_token(&self.source, self.pos);
            match token.kind() {
                TokenKind::GroupOpen => self.open_group(token)?,
                TokenKind::GroupClose => {
                    if self.stack.is_empty() {
                        return Err(Error::TooManyCloses { offset: self.pos });
                    }
                    if let Some(frame) = self.stack.current() {
                        let handlers = frame.handlers();
                        self.dispatch(&handlers, token, self.pos)?;
                    }
                    self.stack.pop();
                    self.pos += token.len();
                }
                _ => {
                    // Tokens outside the outermost group are dropped.
                    if let Some(frame) = self.stack.current() {
                        let handlers = frame.handlers();
                        self.dispatch(&handlers, token, self.pos)?;
                    }
                    self.pos += token.len().max(1);
                }
            }
        }

        self.finished = true;
        Ok(())
    }

    /// Handles a group open: consume the optional `\*` marker, require a
    /// control word, resolve handlers for the new path, and either push
    /// a frame (invoking the open call) or skip the subtree.
    fn open_group(&mut self, brace: Token) -> Result<()> {
        let open_offset = self.pos;

        let mut word_offset = open_offset + brace.len();
        let mut word = next_token(&self.source, word_offset);
        let mut ignorable = false;
        if word.kind() == TokenKind::Ignorable {
            ignorable = true;
            word_offset += word.len();
            word = next_token(&self.source, word_offset);
        }
        if word.kind() != TokenKind::ControlWord {
            return Err(Error::UnexpectedAfterOpen { offset: word_offset });
        }

        let name = word.control_name(&self.source, word_offset).to_string();
        let path = match self.stack.current() {
            Some(parent) => format!("{};{}", parent.path, name),
            None => format!(";{name}"),
        };

        let handlers = self.registry.resolve(&name, &path);
        if handlers.is_empty() {
            if ignorable {
                self.pos = skip_block(&self.source, open_offset + brace.len(), 1);
                return Ok(());
            }
            return Err(Error::UnhandledDestination {
                path,
                offset: open_offset,
            });
        }

        self.stack.push(Frame {
            open_token: brace,
            open_offset,
            word_token: word,
            word_offset,
            name,
            path,
            ignorable,
            props: HashMap::new(),
            state: StateMap::default(),
            handlers: Rc::clone(&handlers),
        });
        self.dispatch(&handlers, brace, open_offset)?;

        // Handlers see subsequent tokens via ordinary dispatch; the
        // opening control word stays reachable through the frame.
        self.pos = word_offset + word.len();
        Ok(())
    }

    fn dispatch(&mut self, handlers: &HandlerList, token: Token, offset: usize) -> Result<()> {
        let source = Rc::clone(&self.source);
        let mut ctx = Context {
            document: &mut self.document,
            stack: &mut self.stack,
        };
        for handler in handlers.iter() {
            handler.on_token(token, &source, offset, &mut ctx)?;
        }
        Ok(())
    }
}
