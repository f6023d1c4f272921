//! # Parser Events
//!
//! Events are the intermediate representation between parsing and tree building.
//! Instead of building the tree directly, the parser emits a **flat sequence**
//! of events that describe the tree structure.
//!
//! ## Event Types
//!
//! ```text
//! Start(BLOCK)
//!   Start(DELIMITER)
//!     Token(NEWLINE)
//!     Token(SENTINEL)
//!     Token(LANG_TOKEN)
//!     Token(NEWLINE)
//!   Finish
//!   Token(CONTENT)
//! Finish
//! ```
//!
//! The Sink processes these in order, maintaining a stack of open nodes.
//! Start pushes, Finish pops. A `Start` directly followed by `Finish` is a
//! zero-width node, which is how the implicit leading block gets its empty
//! delimiter.

use crate::syntax_kind::SyntaxKind;

/// An event emitted by the parser during tree construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    Start { kind: SyntaxKind },

    /// Add the next lexer token to the current node.
    Token { kind: SyntaxKind },

    /// Finish the current node.
    Finish,

    /// A placeholder that will be replaced.
    ///
    /// `parser.start()` pushes one; `marker.complete()` turns it into a
    /// `Start`, an abandoned one is ignored by the Sink.
    Placeholder,
}

impl Event {
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start { kind }
    }

    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token { kind }
    }
}
