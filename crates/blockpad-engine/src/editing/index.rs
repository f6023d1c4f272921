//! The block index: sorted block boundaries with stable ids.
//!
//! Rebuilt from the syntax tree on load, then spliced after every edit using
//! the range of blocks the incremental reparse replaced. Everything outside
//! that range is copied (and shifted) from the previous index, so block ids
//! survive edits. Lookups are binary searches over the sorted vector.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use blockpad_syntax::ast::{self, LanguageTag};
use blockpad_syntax::lexer::SENTINEL_RUN;
use blockpad_syntax::{Reparse, SyntaxNode};
use uuid::Uuid;
use xi_rope::delta::{DeltaElement, Transformer};
use xi_rope::{Delta, RopeInfo};

/// Stable opaque block identifier, independent of ordinal position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One block as seen by the rest of the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub ordinal: usize,
    /// Delimiter start to content end
    pub range: Range<usize>,
    /// Empty for the implicit leading block
    pub delimiter_range: Range<usize>,
    pub content_range: Range<usize>,
    pub language: LanguageTag,
    pub(crate) leading_newline: bool,
    pub(crate) content_lines: usize,
}

impl Block {
    fn from_ast(node: &ast::Block, id: BlockId, ordinal: usize) -> Self {
        let content = node.content();
        let content_lines = content
            .as_ref()
            .map_or(0, |t| t.text().matches('\n').count() + 1);
        Self {
            id,
            ordinal,
            range: node.range(),
            delimiter_range: node.delimiter_range(),
            content_range: node.content_range(),
            language: node.language_tag(),
            leading_newline: node.delimiter().is_some_and(|d| d.has_leading_newline()),
            content_lines,
        }
    }

    pub fn is_implicit(&self) -> bool {
        self.language.implicit
    }

    /// Token plus optional `-a` suffix inside the delimiter.
    pub fn language_span(&self) -> Option<Range<usize>> {
        if self.is_implicit() {
            return None;
        }
        let start = self.delimiter_range.start + usize::from(self.leading_newline) + SENTINEL_RUN.len();
        Some(start..self.delimiter_range.end - 1)
    }

    /// The content range, when it spans more than one line.
    pub fn fold_range(&self) -> Option<Range<usize>> {
        (self.content_lines > 1).then(|| self.content_range.clone())
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.range.contains(&pos)
    }

    fn shifted(&self, by: isize, ordinal: usize) -> Self {
        let shift = |r: &Range<usize>| {
            r.start.saturating_add_signed(by)..r.end.saturating_add_signed(by)
        };
        Self {
            ordinal,
            range: shift(&self.range),
            delimiter_range: shift(&self.delimiter_range),
            content_range: shift(&self.content_range),
            ..self.clone()
        }
    }
}

/// What a splice replaced, for consumers that track per-block state.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexChange {
    /// The old blocks that were replaced, in order
    pub removed: Vec<Block>,
    /// Ordinals of the new blocks standing in their place
    pub inserted: Range<usize>,
}

/// Sorted, gap-free list of blocks covering the whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockIndex {
    blocks: Vec<Block>,
    ordinals: HashMap<BlockId, usize>,
    doc_len: usize,
}

impl BlockIndex {
    /// Build a fresh index with new ids for every block.
    pub fn build(root: &SyntaxNode) -> Self {
        let blocks: Vec<Block> = root
            .children()
            .filter_map(ast::Block::cast)
            .enumerate()
            .map(|(ordinal, node)| Block::from_ast(&node, BlockId::new(), ordinal))
            .collect();
        Self::from_blocks(blocks, usize::from(root.text_range().end()))
    }

    fn from_blocks(blocks: Vec<Block>, doc_len: usize) -> Self {
        let ordinals = blocks.iter().map(|b| (b.id, b.ordinal)).collect();
        Self {
            blocks,
            ordinals,
            doc_len,
        }
    }

    /// Produce the index for the reparsed tree.
    ///
    /// Replaced blocks keep their id when their delimiter start survives the
    /// delta unchanged or merely shifted. `carry` pins ids to new block starts
    /// for commands that relocate a delimiter (moves, materializing the
    /// implicit block).
    pub(crate) fn splice(
        &self,
        reparse: &Reparse,
        delta: &Delta<RopeInfo>,
        carry: &[(BlockId, usize)],
    ) -> (Self, IndexChange) {
        let replaced = reparse.replaced.clone();
        let inserted = reparse.inserted_range();
        let removed = self.blocks[replaced.clone()].to_vec();
        let new_len = usize::from(reparse.root.text_range().end());
        let shift = new_len as isize - self.doc_len as isize;

        let mut by_start: HashMap<usize, BlockId> = HashMap::new();
        for (id, start) in carry {
            by_start.insert(*start, *id);
        }
        let carried: HashSet<BlockId> = carry.iter().map(|(id, _)| *id).collect();

        let deleted = deleted_ranges(delta);
        let mut transformer = Transformer::new(delta);
        for block in &removed {
            if carried.contains(&block.id) || deleted.iter().any(|r| r.contains(&block.range.start)) {
                continue;
            }
            // Text typed at offset 0 lands inside the first block, so its
            // start stays put.
            let new_start = transformer.transform(block.range.start, block.range.start > 0);
            by_start.entry(new_start).or_insert(block.id);
        }

        let mut used: HashSet<BlockId> = HashSet::new();
        let mut blocks = Vec::with_capacity(self.blocks.len() + inserted.len());
        blocks.extend_from_slice(&self.blocks[..replaced.start]);

        let fresh = reparse
            .root
            .children()
            .skip(inserted.start)
            .take(inserted.len())
            .filter_map(ast::Block::cast);
        for (offset, node) in fresh.enumerate() {
            let ordinal = inserted.start + offset;
            let start = node.range().start;
            let id = match by_start.get(&start) {
                Some(id) if !used.contains(id) => *id,
                // The first block always starts at 0, whatever was typed there.
                _ if ordinal == 0
                    && replaced.start == 0
                    && self.blocks.first().is_some_and(|b| !by_start.values().any(|v| *v == b.id) && !carried.contains(&b.id)) =>
                {
                    self.blocks[0].id
                }
                _ => BlockId::new(),
            };
            used.insert(id);
            blocks.push(Block::from_ast(&node, id, ordinal));
        }

        for (offset, block) in self.blocks[replaced.end..].iter().enumerate() {
            blocks.push(block.shifted(shift, inserted.end + offset));
        }

        log::debug!(
            "block index: replaced ordinals {:?} with {:?}, {} blocks",
            replaced,
            inserted,
            blocks.len()
        );

        let index = Self::from_blocks(blocks, new_len);
        (index, IndexChange { removed, inserted })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All blocks in document order.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Number of blocks, always at least one.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn doc_len(&self) -> usize {
        self.doc_len
    }

    /// The block whose `[start, end)` holds `pos`; the end of the document
    /// belongs to the last block. Positions past the end are clamped.
    pub fn block_at(&self, pos: usize) -> &Block {
        let pos = pos.min(self.doc_len);
        let i = self
            .blocks
            .partition_point(|b| b.range.start <= pos)
            .saturating_sub(1);
        &self.blocks[i]
    }

    /// The block the caret is in.
    ///
    /// A caret on the newline that opens a delimiter sits at the end of the
    /// previous block's content, so it belongs to that block.
    pub fn active_block(&self, selection: &Range<usize>) -> Option<&Block> {
        let head = selection.end;
        if head > self.doc_len {
            return None;
        }
        let block = self.block_at(head);
        if head == block.range.start && block.leading_newline && block.ordinal > 0 {
            return self.blocks.get(block.ordinal - 1);
        }
        Some(block)
    }

    pub fn first_block(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&Block> {
        self.ordinals.get(&id).and_then(|&i| self.blocks.get(i))
    }

    pub fn ordinal_of(&self, id: BlockId) -> Option<usize> {
        self.ordinals.get(&id).copied()
    }

    /// `(token, auto_detect)` per block, the shape structural commands promise.
    pub(crate) fn tag_keys(&self) -> Vec<(String, bool)> {
        self.blocks
            .iter()
            .map(|b| (b.language.token.clone(), b.language.auto_detect))
            .collect()
    }
}

/// Byte ranges of the old text that a delta removes.
pub(crate) fn deleted_ranges(delta: &Delta<RopeInfo>) -> Vec<Range<usize>> {
    let mut deleted = Vec::new();
    let mut old_pos = 0;
    for op in &delta.els {
        if let DeltaElement::Copy(from, to) = op {
            if old_pos < *from {
                deleted.push(old_pos..*from);
            }
            old_pos = *to;
        }
    }
    if old_pos < delta.base_len {
        deleted.push(old_pos..delta.base_len);
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpad_syntax::{Language, TextEdit, parse, reparse};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use xi_rope::Rope;
    use xi_rope::delta::Builder;

    const DOC: &str = "∞∞∞text-a\nhello\n∞∞∞json\n{\"a\": 1}\n∞∞∞py\nx = 1\ny = 2";

    fn edit(text: &str, index: &BlockIndex, range: Range<usize>, insert: &str) -> (String, BlockIndex) {
        let mut builder = Builder::new(text.len());
        builder.replace(range.clone(), Rope::from(insert));
        let delta = builder.build();
        let mut new_text = text.to_string();
        new_text.replace_range(range.clone(), insert);
        let reparsed = reparse(&parse(text), &TextEdit::replace(range, insert.len()), &new_text);
        let (index, _) = index.splice(&reparsed, &delta, &[]);
        (new_text, index)
    }

    #[test]
    fn build_covers_document() {
        let index = BlockIndex::build(&parse(DOC));
        assert_eq!(index.len(), 3);
        assert_eq!(index.first_block().range.start, 0);
        assert_eq!(index.last_block().range.end, DOC.len());
        for pair in index.blocks().windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
        }
    }

    #[test]
    fn snapshot_block_layout() {
        let index = BlockIndex::build(&parse("intro\n∞∞∞json-a\n{}\n∞∞∞nosuch\nx"));
        let layout: String = index
            .blocks()
            .iter()
            .map(|b| {
                let mut line = format!(
                    "{} {:?} delim={:?} content={:?} {}",
                    b.ordinal, b.range, b.delimiter_range, b.content_range, b.language.token
                );
                if b.language.auto_detect {
                    line.push_str("-a");
                }
                if b.is_implicit() {
                    line.push_str(" implicit");
                }
                if b.language.is_unknown() {
                    line.push_str(" unknown");
                }
                line.push('\n');
                line
            })
            .collect();
        insta::assert_snapshot!(layout, @r"
        0 0..5 delim=0..0 content=0..5 text-a implicit
        1 5..24 delim=5..22 content=22..24 json-a
        2 24..42 delim=24..41 content=41..42 nosuch unknown
        ");
    }

    #[test]
    fn empty_document_has_one_default_block() {
        let index = BlockIndex::build(&parse(""));
        assert_eq!(index.len(), 1);
        let block = index.first_block();
        assert!(block.is_implicit());
        assert_eq!(block.language.language, Some(Language::Text));
        assert_eq!(block.content_range, 0..0);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(16, 0)]
    #[case(21, 1)]
    #[case(22, 1)]
    fn block_at_positions(#[case] pos: usize, #[case] ordinal: usize) {
        let index = BlockIndex::build(&parse(DOC));
        assert_eq!(index.block_at(pos).ordinal, ordinal);
    }

    #[test]
    fn block_at_end_and_past_end_is_last() {
        let index = BlockIndex::build(&parse(DOC));
        assert_eq!(index.block_at(DOC.len()).ordinal, 2);
        assert_eq!(index.block_at(DOC.len() + 10).ordinal, 2);
    }

    #[test]
    fn caret_before_delimiter_belongs_to_previous_block() {
        let index = BlockIndex::build(&parse(DOC));
        let json = &index.blocks()[1];
        let at = json.range.start;
        assert_eq!(index.block_at(at).ordinal, 1);
        assert_eq!(index.active_block(&(at..at)).unwrap().ordinal, 0);
        assert_eq!(index.active_block(&(DOC.len() + 1..DOC.len() + 1)), None);
    }

    #[test]
    fn language_span_and_fold_range() {
        let index = BlockIndex::build(&parse(DOC));
        let json = &index.blocks()[1];
        assert_eq!(&DOC[json.language_span().unwrap()], "json");
        assert_eq!(json.fold_range(), None);

        let text_block = &index.blocks()[0];
        assert_eq!(&DOC[text_block.language_span().unwrap()], "text-a");

        let py = &index.blocks()[2];
        assert_eq!(py.fold_range(), Some(py.content_range.clone()));
    }

    #[test]
    fn typing_keeps_ids() {
        let index = BlockIndex::build(&parse(DOC));
        let ids: Vec<_> = index.blocks().iter().map(|b| b.id).collect();

        let at = DOC.find("hello").unwrap() + 5;
        let (text, index) = edit(DOC, &index, at..at, " world");
        assert_eq!(index.blocks().iter().map(|b| b.id).collect::<Vec<_>>(), ids);
        assert_eq!(&text[index.blocks()[0].content_range.clone()], "hello world");
        assert_eq!(index.last_block().range.end, text.len());

        let (_, index) = edit(&text, &index, 0..0, "");
        assert_eq!(index.blocks()[2].id, ids[2]);
    }

    #[test]
    fn typing_at_start_of_implicit_block_keeps_id() {
        let text = "hello";
        let index = BlockIndex::build(&parse(text));
        let id = index.first_block().id;
        let (_, index) = edit(text, &index, 0..0, "x");
        assert_eq!(index.first_block().id, id);
    }

    #[test]
    fn breaking_a_delimiter_merges_blocks() {
        let index = BlockIndex::build(&parse(DOC));
        let first = index.blocks()[0].id;
        let py = index.blocks()[2].id;

        let at = DOC.find("∞∞∞json").unwrap();
        let (text, index) = edit(DOC, &index, at..at + 3, "");
        assert_eq!(index.len(), 2);
        assert_eq!(index.blocks()[0].id, first);
        assert_eq!(index.blocks()[1].id, py);
        assert!(text[index.blocks()[0].content_range.clone()].contains("json"));
    }

    #[test]
    fn lookup_by_id() {
        let index = BlockIndex::build(&parse(DOC));
        let py = index.blocks()[2].clone();
        assert_eq!(index.block_by_id(py.id), Some(&py));
        assert_eq!(index.ordinal_of(py.id), Some(2));
        assert_eq!(index.block_by_id(BlockId::new()), None);
    }

    #[test]
    fn deleted_ranges_from_delta() {
        let mut builder = Builder::new(10);
        builder.delete(2..4);
        builder.replace(6..8, Rope::from("xyz"));
        let delta = builder.build();
        assert_eq!(deleted_ranges(&delta), vec![2..4, 6..8]);
    }
}
