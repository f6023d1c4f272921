//! # Parser - Event-Based Tree Construction
//!
//! This module transforms the token stream into a syntax tree using the
//! **event-based** architecture from rust-analyzer.
//!
//! Grammar functions never touch Rowan directly. They emit a flat list of
//! [`Event`]s describing the tree, and the [`Sink`] builds the actual green
//! tree from them afterwards. This keeps the grammar ([`grammar`]) a handful
//! of small functions and lets the same grammar produce either a whole
//! document or one detached `BLOCK` node for incremental reparsing.
//!
//! ## The Marker System
//!
//! `parser.start()` returns a [`Marker`] that **must** be completed with
//! `marker.complete(parser, KIND)` or dropped via `marker.abandon(parser)`.
//! Dropping it any other way panics, which catches grammar bugs before they
//! produce a corrupt tree.
//!
//! ```ignore
//! let m = p.start();
//! p.eat(SyntaxKind::CONTENT);
//! m.complete(p, SyntaxKind::BLOCK);
//! ```
//!
//! ## Public API
//!
//! ```
//! use blockpad_syntax::{parse, SyntaxKind};
//!
//! let tree = parse("∞∞∞json\n{}");
//! assert_eq!(tree.kind(), SyntaxKind::DOCUMENT);
//! assert_eq!(tree.children().count(), 1);
//! ```

pub mod event;
pub mod sink;

mod grammar;

use rowan::GreenNode;

use crate::lexer::{ScannedBlock, Token, block_tokens, lex};
use crate::syntax_kind::{SyntaxKind, SyntaxNode};
use event::Event;
use sink::Sink;

/// The parser state machine.
///
/// Holds the token stream, current position, and accumulated events.
pub struct Parser<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Parser<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>]) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
        }
    }

    /// Parse the tokens as a whole document.
    pub fn parse(self) -> SyntaxNode {
        SyntaxNode::new_root(self.parse_green(grammar::document))
    }

    /// Run a grammar entry point and return the green node it built.
    fn parse_green(mut self, entry: fn(&mut Parser<'_, '_>)) -> GreenNode {
        entry(&mut self);
        Sink::new(self.tokens, self.events).finish_green()
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            let kind = self.current();
            self.events.push(Event::token(kind));
            self.pos += 1;
        }
    }
}

/// A marker for a node being constructed.
///
/// `parser.start()` pushes a `Placeholder` event and hands back a `Marker`
/// pointing at it. The marker must be completed or abandoned; the `Drop`
/// impl panics otherwise.
#[must_use = "Markers must be completed or abandoned, dropping them is a bug"]
pub struct Marker {
    pos: usize,
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete(mut self, p: &mut Parser<'_, '_>, kind: SyntaxKind) {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::start(kind);
        p.events.push(Event::Finish);
    }

    /// Abandon this marker without creating a node.
    ///
    /// The placeholder is removed if nothing was pushed after it, otherwise it
    /// stays inert and the Sink skips it.
    pub fn abandon(mut self, p: &mut Parser<'_, '_>) {
        self.completed = true;
        if self.pos == p.events.len() - 1 {
            match p.events.pop() {
                Some(Event::Placeholder) => {}
                _ => unreachable!(),
            }
        }
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be either completed or abandoned");
        }
    }
}

/// Parse a block document into a syntax tree.
pub fn parse(source: &str) -> SyntaxNode {
    let tokens = lex(source);
    Parser::new(&tokens).parse()
}

/// Parse one scanned block of `text` into a detached `BLOCK` green node.
pub fn parse_block(text: &str, block: &ScannedBlock) -> GreenNode {
    let tokens: Vec<Token<'_>> = block_tokens(text, block)
        .into_iter()
        .map(|(token, _)| token)
        .collect();
    Parser::new(&tokens).parse_green(grammar::block)
}
