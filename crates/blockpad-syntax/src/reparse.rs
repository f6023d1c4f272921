//! Incremental reparsing of the block layer.
//!
//! After a text edit only the blocks around the edit are rescanned. Scanning
//! starts one block before the block touching the edit (an edit can break
//! the delimiter that separated two blocks, merging them) and stops at the
//! first block boundary past the edit that lines up with an untouched old
//! block. Everything from there on is reused as-is: Rowan green nodes are
//! position independent, so the old `BLOCK` nodes after the edit stay valid
//! and are shared with the new tree.
//!
//! The result is always the tree [`crate::parse`] would build for the new
//! text; the property tests in `tests/reparse_proptest.rs` hold us to that.

use std::ops::Range;

use rowan::NodeOrToken;

use crate::lexer::scan_block;
use crate::parser::parse_block;
use crate::syntax_kind::SyntaxNode;

/// A single replacement, in byte offsets.
///
/// `start..old_end` in the old text became `start..new_end` in the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextEdit {
    pub start: usize,
    pub old_end: usize,
    pub new_end: usize,
}

impl TextEdit {
    pub fn new(start: usize, old_end: usize, new_end: usize) -> Self {
        debug_assert!(start <= old_end && start <= new_end);
        Self {
            start,
            old_end,
            new_end,
        }
    }

    /// Replacing `range` of the old text with `inserted_len` bytes.
    pub fn replace(range: Range<usize>, inserted_len: usize) -> Self {
        Self::new(range.start, range.end, range.start + inserted_len)
    }

    pub fn old_range(&self) -> Range<usize> {
        self.start..self.old_end
    }

    pub fn new_range(&self) -> Range<usize> {
        self.start..self.new_end
    }

    /// Map an old offset at or after `old_end` into the new text.
    pub fn shift(&self, old_offset: usize) -> usize {
        old_offset - self.old_end + self.new_end
    }

    /// Map a new offset at or after `new_end` back into the old text.
    pub fn unshift(&self, new_offset: usize) -> usize {
        new_offset - self.new_end + self.old_end
    }

    /// The edit that takes the new text back to the old one.
    pub fn inverse(&self) -> Self {
        Self::new(self.start, self.new_end, self.old_end)
    }
}

/// Outcome of an incremental reparse.
#[derive(Debug, Clone)]
pub struct Reparse {
    pub root: SyntaxNode,
    /// Indices of the old blocks that were replaced.
    pub replaced: Range<usize>,
    /// Number of new blocks standing in their place, starting at
    /// `replaced.start`.
    pub inserted: usize,
}

impl Reparse {
    /// Indices of the freshly parsed blocks in the new tree.
    pub fn inserted_range(&self) -> Range<usize> {
        self.replaced.start..self.replaced.start + self.inserted
    }
}

/// Reparse `new_text`, reusing the blocks of `old_root` outside the edit.
///
/// `old_root` must be the DOCUMENT node of the text before `edit`.
pub fn reparse(old_root: &SyntaxNode, edit: &TextEdit, new_text: &str) -> Reparse {
    let old_starts: Vec<usize> = old_root
        .children()
        .map(|block| usize::from(block.text_range().start()))
        .collect();
    debug_assert_eq!(
        old_root.children_with_tokens().count(),
        old_starts.len(),
        "document children must all be blocks"
    );

    // Block holding the byte just before the edit, then one more back.
    let touching = old_starts
        .partition_point(|&start| start <= edit.start.saturating_sub(1))
        .saturating_sub(1);
    let first = touching.saturating_sub(1);

    let mut pos = old_starts.get(first).copied().unwrap_or(0);
    let mut blocks = Vec::new();
    let resume = loop {
        let scanned = scan_block(new_text, pos);
        blocks.push(NodeOrToken::Node(parse_block(new_text, &scanned)));
        pos = scanned.end();

        if pos >= new_text.len() {
            break old_starts.len();
        }
        if pos >= edit.new_end {
            let old_pos = edit.unshift(pos);
            match old_starts.binary_search(&old_pos) {
                Ok(idx) if idx > first => break idx,
                _ => {}
            }
        }
    };

    let inserted = blocks.len();
    log::trace!(
        "reparse: blocks {first}..{resume} replaced by {inserted} for edit {:?}",
        edit
    );

    let green = old_root.green().splice_children(first..resume, blocks);
    Reparse {
        root: SyntaxNode::new_root(green),
        replaced: first..resume,
        inserted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn apply(text: &str, range: Range<usize>, insert: &str) -> (String, TextEdit) {
        let mut new_text = text.to_string();
        new_text.replace_range(range.clone(), insert);
        (new_text, TextEdit::replace(range, insert.len()))
    }

    fn check(text: &str, range: Range<usize>, insert: &str) -> Reparse {
        let old = parse(text);
        let (new_text, edit) = apply(text, range, insert);
        let result = reparse(&old, &edit, &new_text);
        assert_eq!(result.root.text().to_string(), new_text);
        assert_eq!(
            format!("{:#?}", result.root),
            format!("{:#?}", parse(&new_text))
        );
        result
    }

    const DOC: &str = "∞∞∞text-a\nhello\n∞∞∞json\n{}\n∞∞∞py\nx = 1\n∞∞∞md\n# hi";

    #[test]
    fn typing_in_content_touches_few_blocks() {
        let at = DOC.find("{}").unwrap() + 1;
        let result = check(DOC, at..at, "\"a\": 1");
        assert_eq!(result.replaced, 0..2);
        assert_eq!(result.inserted, 2);
    }

    #[test]
    fn inverse_edit_swaps_ends() {
        let edit = TextEdit::replace(3..5, 4);
        assert_eq!(edit.inverse(), TextEdit::new(3, 7, 5));
        assert_eq!(edit.inverse().inverse(), edit);
    }

    #[test]
    fn typing_in_last_block_keeps_earlier_blocks() {
        let result = check(DOC, DOC.len()..DOC.len(), "!");
        assert_eq!(result.replaced, 2..4);
    }

    #[rstest]
    #[case::break_delimiter("∞∞∞json", "∞∞json")]
    #[case::create_delimiter("x = 1", "x = 1\n∞∞∞rs\nfn f() {}")]
    #[case::retype("∞∞∞py\n", "∞∞∞go-a\n")]
    #[case::remove_newline_before_delimiter("hello\n", "hello")]
    fn structural_edits_match_full_parse(#[case] find: &str, #[case] replace: &str) {
        let at = DOC.find(find).unwrap();
        check(DOC, at..at + find.len(), replace);
    }

    #[test]
    fn deleting_everything() {
        let result = check(DOC, 0..DOC.len(), "");
        assert_eq!(result.root.children().count(), 1);
    }

    #[test]
    fn editing_the_empty_document() {
        check("", 0..0, "∞∞∞json\n{}");
        check("", 0..0, "plain");
    }

    #[test]
    fn deleting_doc_start_delimiter_creates_implicit_block() {
        check(DOC, 0.."∞∞∞text-a\n".len(), "");
    }

    #[test]
    fn completing_sentinel_run_inside_content() {
        let text = "∞∞∞text\nab\n∞∞X∞json\n{}";
        let at = text.find('X').unwrap();
        let result = check(text, at..at + 1, "");
        assert_eq!(result.root.children().count(), 2);
    }

    #[test]
    fn edit_mapping() {
        let edit = TextEdit::replace(4..6, 5);
        assert_eq!(edit.new_range(), 4..9);
        assert_eq!(edit.shift(10), 13);
        assert_eq!(edit.unshift(13), 10);
    }
}
