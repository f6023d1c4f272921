//! Per-block sub-grammar parsing.
//!
//! Each block with a grammar gets its own tree-sitter tree over exactly its
//! content, in block-local coordinates. Moving a block therefore never
//! invalidates its tree; only a content or language change does. Content
//! edits are replayed onto the old tree as an `InputEdit` so tree-sitter can
//! reparse incrementally.

use std::collections::HashMap;

use blockpad_syntax::Language;
use tree_sitter::{InputEdit, Parser, Point, Tree};

use crate::dispatch::registry::LanguageRegistry;
use crate::editing::history::minimal_replace;
use crate::editing::index::{Block, BlockId, BlockIndex, IndexChange};

/// A block's sub-tree and the content it was parsed from.
#[derive(Debug, Clone)]
pub struct NestedTree {
    pub language: Language,
    pub tree: Tree,
    content: String,
}

impl NestedTree {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

pub struct Dispatcher {
    parser: Parser,
    trees: HashMap<BlockId, NestedTree>,
    registry: &'static LanguageRegistry,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_registry(LanguageRegistry::global())
    }

    pub fn with_registry(registry: &'static LanguageRegistry) -> Self {
        Self {
            parser: Parser::new(),
            trees: HashMap::new(),
            registry,
        }
    }

    /// Parse every block from scratch.
    pub fn rebuild(&mut self, text: &str, index: &BlockIndex) {
        self.trees.clear();
        for block in index.blocks() {
            self.refresh(block, &text[block.content_range.clone()]);
        }
    }

    /// Re-dispatch the blocks a splice replaced. Blocks outside the splice
    /// kept both id and content, so their trees stay as they are.
    pub fn update(&mut self, text: &str, index: &BlockIndex, change: &IndexChange) {
        for block in &index.blocks()[change.inserted.clone()] {
            self.refresh(block, &text[block.content_range.clone()]);
        }
        for old in &change.removed {
            if index.block_by_id(old.id).is_none() {
                self.trees.remove(&old.id);
            }
        }
    }

    pub fn tree(&self, id: BlockId) -> Option<&NestedTree> {
        self.trees.get(&id)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    fn refresh(&mut self, block: &Block, content: &str) {
        let language = block.language.language;
        let grammar = language.and_then(|l| self.registry.grammar_for(l));
        let (Some(language), Some(grammar)) = (language, grammar) else {
            self.trees.remove(&block.id);
            return;
        };
        if content.is_empty() {
            self.trees.remove(&block.id);
            return;
        }

        let previous = self
            .trees
            .remove(&block.id)
            .filter(|prev| prev.language == language);
        let previous = match previous {
            Some(prev) if prev.content == content => {
                self.trees.insert(block.id, prev);
                return;
            }
            other => other,
        };

        let old_tree = previous.map(|mut prev| {
            prev.tree.edit(&content_edit(&prev.content, content));
            prev.tree
        });

        if let Err(err) = self.parser.set_language(grammar.language()) {
            log::warn!("grammar {} unavailable for block {}: {err}", grammar.name(), block.id);
            return;
        }
        match self.parser.parse(content, old_tree.as_ref()) {
            Some(tree) => {
                log::debug!(
                    "nested parse: block {} as {} ({} bytes, incremental: {})",
                    block.id,
                    grammar.name(),
                    content.len(),
                    old_tree.is_some()
                );
                self.trees.insert(
                    block.id,
                    NestedTree {
                        language,
                        tree,
                        content: content.to_string(),
                    },
                );
            }
            None => log::warn!("nested parse of block {} as {} failed", block.id, grammar.name()),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        // Parser doesn't implement Clone; trees do.
        Self {
            parser: Parser::new(),
            trees: self.trees.clone(),
            registry: self.registry,
        }
    }
}

/// The single `InputEdit` turning `old` into `new`.
fn content_edit(old: &str, new: &str) -> InputEdit {
    let (old_range, new_range) = minimal_replace(old, new);
    let point = |(row, column): (usize, usize)| Point { row, column };
    InputEdit {
        start_byte: old_range.start,
        old_end_byte: old_range.end,
        new_end_byte: new_range.end,
        start_position: point(byte_to_point_in_text(old, old_range.start)),
        old_end_position: point(byte_to_point_in_text(old, old_range.end)),
        new_end_position: point(byte_to_point_in_text(new, new_range.end)),
    }
}

/// Convert byte offset to (row, column) position in given text
fn byte_to_point_in_text(text: &str, byte_offset: usize) -> (usize, usize) {
    let text_bytes = text.as_bytes();
    let offset = byte_offset.min(text_bytes.len());

    let mut row = 0;
    let mut last_newline = 0;

    for (i, &byte) in text_bytes.iter().enumerate().take(offset) {
        if byte == b'\n' {
            row += 1;
            last_newline = i + 1;
        }
    }

    (row, offset - last_newline)
}
