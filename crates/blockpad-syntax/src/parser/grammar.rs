//! # Grammar Rules
//!
//! ```text
//! Document  := Block+
//! Block     := Delimiter BlockContent?
//! Delimiter := "\n"? "∞∞∞" LanguageToken "-a"? "\n"
//! ```
//!
//! The lexer has already done the hard part, deciding which `"\n∞∞∞..."`
//! lines are delimiters. What is left here is grouping tokens into nodes.
//! A document that does not start with a delimiter gets an implicit first
//! block whose `DELIMITER` node is empty.
//!
//! Grammar functions are lenient: they always produce a tree holding every
//! input token, and never panic on odd token sequences.

use crate::parser::Parser;
use crate::syntax_kind::SyntaxKind;

/// Parse the whole document: one or more blocks under a DOCUMENT node.
pub fn document(p: &mut Parser<'_, '_>) {
    let m = p.start();

    block(p);
    while !p.at_end() {
        if at_delimiter(p) {
            block(p);
        } else {
            // Token the grammar has no place for; keep it so no bytes are lost.
            p.bump();
        }
    }

    m.complete(p, SyntaxKind::DOCUMENT);
}

/// Parse a single block: its delimiter (possibly empty) and its content.
pub fn block(p: &mut Parser<'_, '_>) {
    let m = p.start();
    delimiter(p);
    p.eat(SyntaxKind::CONTENT);
    m.complete(p, SyntaxKind::BLOCK);
}

fn delimiter(p: &mut Parser<'_, '_>) {
    let m = p.start();

    if at_delimiter(p) {
        p.eat(SyntaxKind::NEWLINE);
        p.bump(); // SENTINEL
        p.eat(SyntaxKind::LANG_TOKEN);
        p.eat(SyntaxKind::AUTO_SUFFIX);
        p.eat(SyntaxKind::NEWLINE);
    }

    m.complete(p, SyntaxKind::DELIMITER);
}

fn at_delimiter(p: &Parser<'_, '_>) -> bool {
    p.at(SyntaxKind::SENTINEL) || (p.at(SyntaxKind::NEWLINE) && p.nth(1) == SyntaxKind::SENTINEL)
}
