//! Sink for converting parser events into a Rowan green tree.

use rowan::{GreenNode, GreenNodeBuilder};

use crate::lexer::Token;
use crate::parser::event::Event;
use crate::syntax_kind::SyntaxNode;

/// Converts parser events and tokens into a Rowan syntax tree.
pub struct Sink<'t, 'input> {
    builder: GreenNodeBuilder<'static>,
    tokens: &'t [Token<'input>],
    cursor: usize,
    events: Vec<Event>,
}

impl<'t, 'input> Sink<'t, 'input> {
    pub fn new(tokens: &'t [Token<'input>], events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            tokens,
            cursor: 0,
            events,
        }
    }

    /// Consume the sink and build the green tree.
    ///
    /// The green node is what incremental reparsing splices into an
    /// existing document.
    pub fn finish_green(mut self) -> GreenNode {
        for event in std::mem::take(&mut self.events) {
            match event {
                Event::Start { kind } => self.builder.start_node(kind.into()),
                Event::Token { kind } => {
                    let token = &self.tokens[self.cursor];
                    self.cursor += 1;
                    self.builder.token(kind.into(), token.text);
                }
                Event::Finish => self.builder.finish_node(),
                Event::Placeholder => {}
            }
        }
        debug_assert_eq!(self.cursor, self.tokens.len(), "unconsumed tokens");
        self.builder.finish()
    }

    /// Consume the sink and build the syntax tree.
    pub fn finish(self) -> SyntaxNode {
        SyntaxNode::new_root(self.finish_green())
    }
}
