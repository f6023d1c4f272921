//! # blockpad-syntax
//!
//! A lossless syntax tree for block-delimited documents using [Rowan] +
//! [Logos], following the [rust-analyzer] architecture model.
//!
//! [Rowan]: https://docs.rs/rowan
//! [Logos]: https://docs.rs/logos
//! [rust-analyzer]: https://rust-analyzer.github.io/book/contributing/syntax.html
//!
//! ## The Document Format
//!
//! A document is one flat text buffer split into blocks by delimiter lines:
//!
//! ```text
//! ∞∞∞text-a
//! Some notes
//! ∞∞∞json
//! {"a": 1}
//! ```
//!
//! Each delimiter names the block's language (`text`, `json`, ...) and may
//! carry `-a` to mark the block for automatic language detection. Text before
//! the first delimiter forms an implicit `text` block. Block contents are
//! opaque here; parsing *inside* a block is the job of a nested grammar.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Parser → Events → Sink → Rowan Tree
//!               (Logos)          (Grammar)        (GreenNodeBuilder)
//! ```
//!
//! - [`lexer`] finds delimiter lines and turns everything else into `CONTENT`
//! - [`parser`] groups tokens into `DOCUMENT → BLOCK → DELIMITER` nodes
//! - [`ast`] gives typed access to blocks, ranges and language tags
//! - [`reparse`] rebuilds only the blocks an edit touched
//!
//! Every byte of the source ends up in exactly one token, so the tree text
//! always equals the input.
//!
//! ## Quick Start
//!
//! ```
//! use blockpad_syntax::{parse, ast::Document, Language};
//!
//! let tree = parse("∞∞∞text-a\nnotes\n∞∞∞json\n{}");
//! assert_eq!(tree.text().to_string(), "∞∞∞text-a\nnotes\n∞∞∞json\n{}");
//!
//! let doc = Document::cast(tree).unwrap();
//! let langs: Vec<_> = doc.blocks().map(|b| b.language_tag().language).collect();
//! assert_eq!(langs, vec![Some(Language::Text), Some(Language::Json)]);
//! ```

pub mod ast;
pub mod language;
pub mod lexer;
pub mod parser;
pub mod reparse;
pub mod syntax_kind;

pub use language::Language;
pub use parser::parse;
pub use reparse::{Reparse, TextEdit, reparse};
pub use syntax_kind::{BlockLang, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
