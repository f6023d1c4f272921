use std::ops::Range;

use blockpad_syntax::{Language, SyntaxNode, TextEdit, parse, reparse};
use xi_rope::delta::{Builder, DeltaElement, Transformer};
use xi_rope::{Delta, Rope, RopeInfo};

use crate::dispatch::Dispatcher;
use crate::editing::commands::{CommandError, Compiled, compile_command};
use crate::editing::history::{History, Revision};
use crate::editing::index::{Block, BlockIndex};
use crate::editing::{Cmd, Origin, Patch};

/// Text of a freshly created document.
pub const NEW_DOCUMENT: &str = "∞∞∞text-a\n";

/// The editing model: one rope buffer and everything derived from it.
///
/// Every transaction runs the whole pipeline before returning:
///
/// 1. **Compile** the command to a `Delta` over the current buffer
/// 2. **Reparse** only the blocks around the edit
/// 3. **Splice** the block index, keeping ids of surviving blocks
/// 4. **Validate** the block structure a structural command promised;
///    on mismatch nothing is committed
/// 5. **Commit** buffer, tree and index, record history
/// 6. **Re-dispatch** nested grammars for the blocks that changed
/// 7. **Transform** the selection and bump the version
///
/// So the index is always consistent with the buffer by the time a caller
/// sees the returned [`Patch`].
///
/// ```rust
/// # use blockpad_engine::editing::{Cmd, Document, Placement};
/// # use blockpad_syntax::Language;
/// let mut doc = Document::from_text("\n∞∞∞text\nhello");
/// doc.set_selection(doc.len()..doc.len());
/// doc.apply(Cmd::InsertBlock {
///     placement: Placement::AfterCurrent,
///     language: Some(Language::Json),
///     auto_detect: false,
/// });
/// doc.apply(Cmd::InsertText { at: doc.len(), text: "{}".to_string() });
/// assert_eq!(doc.text(), "\n∞∞∞text\nhello\n∞∞∞json\n{}");
/// assert_eq!(doc.index().len(), 2);
/// ```
pub struct Document {
    /// Source of truth
    pub(crate) buffer: Rope,
    /// Flat copy of `buffer` for the block parser, patched per edit
    source: String,
    pub(crate) selection: Range<usize>,
    pub(crate) version: u64,
    syntax: SyntaxNode,
    index: BlockIndex,
    nested: Dispatcher,
    history: History,
    default_language: Language,
}

impl Document {
    /// An empty auto-detecting text block.
    pub fn new() -> Self {
        Self::from_text(NEW_DOCUMENT)
    }

    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        let syntax = parse(text);
        let index = BlockIndex::build(&syntax);
        let mut nested = Dispatcher::new();
        nested.rebuild(text, &index);
        log::debug!("document loaded: {} bytes, {} blocks", text.len(), index.len());

        Self {
            buffer: Rope::from(text),
            source: text.to_string(),
            selection: text.len()..text.len(),
            version: 0,
            syntax,
            index,
            nested,
            history: History::default(),
            default_language: Language::DEFAULT,
        }
    }

    /// Language used by new blocks and by emptied auto blocks.
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.source.clone().into_bytes()
    }

    pub fn apply(&mut self, cmd: Cmd) -> Option<Patch> {
        self.apply_with_origin(cmd, Origin::User)
    }

    /// Apply a command; `None` if it was rejected and nothing changed.
    pub fn apply_with_origin(&mut self, cmd: Cmd, origin: Origin) -> Option<Patch> {
        match self.try_apply_with_origin(cmd, origin) {
            Ok(patch) => Some(patch),
            Err(err) => {
                log::debug!("command not applied: {err}");
                None
            }
        }
    }

    pub fn try_apply(&mut self, cmd: Cmd) -> Result<Patch, CommandError> {
        self.try_apply_with_origin(cmd, Origin::User)
    }

    pub fn try_apply_with_origin(&mut self, cmd: Cmd, origin: Origin) -> Result<Patch, CommandError> {
        let compiled = compile_command(self, &cmd)?;
        self.commit(compiled, origin)
    }

    pub fn undo(&mut self) -> Option<Patch> {
        let previous = self
            .history
            .undo(self.buffer.clone(), self.selection.clone())?;
        self.restore(previous, Origin::Undo)
    }

    pub fn redo(&mut self) -> Option<Patch> {
        let next = self
            .history
            .redo(self.buffer.clone(), self.selection.clone())?;
        self.restore(next, Origin::Redo)
    }

    /// Return to `revision` by replacing just the interval its edit touched.
    fn restore(&mut self, revision: Revision, origin: Origin) -> Option<Patch> {
        let edit = revision.edit;
        let mut builder = Builder::new(self.buffer.len());
        builder.replace(
            edit.new_range(),
            Rope::from(revision.text.slice_to_cow(edit.old_range())),
        );
        let compiled = Compiled {
            delta: builder.build(),
            selection: Some(revision.selection),
            carry: Vec::new(),
            expect: None,
        };
        self.commit(compiled, origin).ok()
    }

    fn commit(&mut self, compiled: Compiled, origin: Origin) -> Result<Patch, CommandError> {
        let Compiled {
            delta,
            selection,
            carry,
            expect,
        } = compiled;

        if delta.is_identity() {
            if let Some(selection) = selection {
                self.set_selection(selection);
            }
            return Ok(Patch {
                changed: Vec::new(),
                edit: None,
                new_selection: self.selection.clone(),
                version: self.version,
                origin,
            });
        }

        let (interval, new_len) = delta.summary();
        let edit = TextEdit::new(interval.start(), interval.end(), interval.start() + new_len);

        let buffer = delta.apply(&self.buffer);
        self.source
            .replace_range(edit.old_range(), &buffer.slice_to_cow(edit.new_range()));
        let reparsed = reparse(&self.syntax, &edit, &self.source);
        let (index, change) = self.index.splice(&reparsed, &delta, &carry);

        if let Some(expect) = expect
            && index.tag_keys() != expect
        {
            log::warn!("structural edit {:?} produced unexpected blocks, discarded", edit);
            self.source
                .replace_range(edit.new_range(), &self.buffer.slice_to_cow(edit.old_range()));
            return Err(CommandError::StructureMismatch);
        }

        if matches!(origin, Origin::User | Origin::LanguageChange) {
            self.history.record(Revision {
                text: self.buffer.clone(),
                selection: self.selection.clone(),
                edit,
            });
        }

        let new_selection = match selection {
            Some(selection) => selection,
            None => transform_selection(&delta, &self.selection),
        };

        self.nested.update(&self.source, &index, &change);
        self.buffer = buffer;
        self.syntax = reparsed.root;
        self.index = index;
        self.set_selection(new_selection);
        self.version += 1;

        log::debug!(
            "v{} {:?}: edit {:?}, {} blocks",
            self.version,
            origin,
            edit,
            self.index.len()
        );

        Ok(Patch {
            changed: changed_ranges(&delta),
            edit: Some(edit),
            new_selection: self.selection.clone(),
            version: self.version,
            origin,
        })
    }

    /// Get the current selection range
    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Set the selection, clamped to the document and to char boundaries.
    pub fn set_selection(&mut self, selection: Range<usize>) {
        let clamp = |mut at: usize| {
            at = at.min(self.source.len());
            while !self.source.is_char_boundary(at) {
                at -= 1;
            }
            at
        };
        self.selection = clamp(selection.start)..clamp(selection.end);
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the current text content
    pub fn text(&self) -> String {
        self.source.clone()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    pub fn rope(&self) -> &Rope {
        &self.buffer
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.syntax
    }

    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    pub fn nested(&self) -> &Dispatcher {
        &self.nested
    }

    pub fn active_block(&self) -> Option<&Block> {
        self.index.active_block(&self.selection)
    }

    pub fn block_content(&self, block: &Block) -> &str {
        &self.source[block.content_range.clone()]
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    pub fn history_generation(&self) -> u64 {
        self.history.generation()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// True while an undone edit can still be redone.
    pub fn redo_pending(&self) -> bool {
        self.history.can_redo()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            source: self.source.clone(),
            selection: self.selection.clone(),
            version: self.version,
            syntax: self.syntax.clone(),
            index: self.index.clone(),
            nested: self.nested.clone(),
            history: self.history.clone(),
            default_language: self.default_language,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // Parser state and trees are derived from the buffer
        self.source == other.source
            && self.selection == other.selection
            && self.version == other.version
            && self.index == other.index
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.source.len())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("blocks", &self.index.len())
            .finish()
    }
}

/// Carry the selection through an edit. Text inserted at either end of a
/// range selection stays outside it.
fn transform_selection(delta: &Delta<RopeInfo>, selection: &Range<usize>) -> Range<usize> {
    let mut transformer = Transformer::new(delta);
    if selection.is_empty() {
        let at = transformer.transform(selection.start, true);
        return at..at;
    }
    let start = transformer.transform(selection.start, true);
    let end = transformer.transform(selection.end, false);
    start..end.max(start)
}

/// Ranges of the new text an edit touched; deletions show up as empty
/// ranges where the text collapsed.
fn changed_ranges(delta: &Delta<RopeInfo>) -> Vec<Range<usize>> {
    let mut changed: Vec<Range<usize>> = Vec::new();
    let mut old_pos = 0;
    let mut new_pos = 0;
    let collapsed = |changed: &mut Vec<Range<usize>>, at: usize| {
        if changed.last().is_none_or(|last| last.end != at) {
            changed.push(at..at);
        }
    };

    for op in &delta.els {
        match op {
            DeltaElement::Copy(from, to) => {
                if old_pos < *from {
                    collapsed(&mut changed, new_pos);
                }
                new_pos += to - from;
                old_pos = *to;
            }
            DeltaElement::Insert(text) => {
                changed.push(new_pos..new_pos + text.len());
                new_pos += text.len();
            }
        }
    }
    if old_pos < delta.base_len {
        collapsed(&mut changed, new_pos);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{BlockRef, Placement};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_document_is_auto_text_block() {
        let doc = Document::new();
        assert_eq!(doc.text(), "∞∞∞text-a\n");
        let block = doc.index().first_block();
        assert_eq!(block.language.language, Some(Language::Text));
        assert!(block.language.auto_detect);
        assert_eq!(doc.selection(), 16..16);
    }

    #[test]
    fn test_document_from_bytes_invalid_utf8() {
        assert!(Document::from_bytes(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_document_to_bytes_preserves_content() {
        let original = "notes\r\n∞∞∞json\n{}\n∞∞∞unknown\n¯\\_(ツ)_/¯";
        let doc = Document::from_bytes(original.as_bytes()).unwrap();
        assert_eq!(doc.to_bytes(), original.as_bytes());
    }

    #[test]
    fn test_typing_bumps_version_and_moves_caret() {
        let mut doc = Document::from_text("∞∞∞text\nab");
        doc.set_selection(15..15);
        let patch = doc
            .apply(Cmd::InsertText {
                at: 15,
                text: "c".to_string(),
            })
            .unwrap();
        assert_eq!(doc.text(), "∞∞∞text\nacb");
        assert_eq!(patch.version, 1);
        assert_eq!(patch.new_selection, 16..16);
        assert_eq!(patch.changed, vec![15..16]);
        assert_eq!(patch.edit, Some(TextEdit::new(15, 15, 16)));
        assert_eq!(patch.origin, Origin::User);
    }

    #[test]
    fn test_selection_transform_keeps_inserted_text_outside() {
        let mut doc = Document::from_text("abcdef");
        doc.set_selection(2..4);
        doc.apply(Cmd::InsertText {
            at: 2,
            text: "X".to_string(),
        });
        assert_eq!(doc.selection(), 3..5);
        doc.apply(Cmd::InsertText {
            at: 5,
            text: "Y".to_string(),
        });
        assert_eq!(doc.selection(), 3..5);
    }

    #[test]
    fn test_set_selection_clamps() {
        let mut doc = Document::from_text("a∞");
        doc.set_selection(2..100);
        assert_eq!(doc.selection(), 1..4);
    }

    #[test]
    fn test_changed_ranges_for_deletion() {
        let mut doc = Document::from_text("hello world");
        let patch = doc.apply(Cmd::DeleteRange { range: 5..11 }).unwrap();
        assert_eq!(patch.changed, vec![5..5]);
        let patch = doc
            .apply(Cmd::ReplaceRange {
                range: 0..1,
                text: "J".to_string(),
            })
            .unwrap();
        assert_eq!(patch.changed, vec![0..1]);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut doc = Document::from_text("∞∞∞text-a\nhello");
        let original = doc.text();
        doc.apply(Cmd::InsertBlock {
            placement: Placement::AfterLast,
            language: Some(Language::Json),
            auto_detect: false,
        })
        .unwrap();
        let edited = doc.text();

        let patch = doc.undo().unwrap();
        assert_eq!(patch.origin, Origin::Undo);
        assert_eq!(doc.text(), original);
        assert_eq!(doc.index().len(), 1);
        assert!(doc.redo_pending());
        assert_eq!(doc.history_generation(), 1);

        doc.redo().unwrap();
        assert_eq!(doc.text(), edited);
        assert_eq!(doc.index().len(), 2);
        assert_eq!(doc.history_generation(), 2);
        assert!(doc.redo().is_none());
    }

    #[test]
    fn test_undo_keeps_block_ids() {
        let mut doc = Document::from_text("∞∞∞text\nab\n∞∞∞json\n{}");
        let ids: Vec<_> = doc.index().blocks().iter().map(|b| b.id).collect();
        doc.apply(Cmd::InsertText {
            at: 16,
            text: "cd".to_string(),
        })
        .unwrap();
        doc.undo().unwrap();
        let after: Vec<_> = doc.index().blocks().iter().map(|b| b.id).collect();
        assert_eq!(after, ids);
    }

    #[test]
    fn test_typing_at_offset_zero_keeps_first_block_id() {
        let mut doc = Document::from_text("");
        let id = doc.index().first_block().id;
        for text in ["h", "o"] {
            doc.apply(Cmd::InsertText {
                at: 0,
                text: text.to_string(),
            })
            .unwrap();
        }
        assert_eq!(doc.text(), "oh");
        assert_eq!(doc.index().first_block().id, id);
    }

    #[test]
    fn test_undo_and_redo_of_a_move_restore_exact_text() {
        let mut doc = Document::from_text("∞∞∞py\na\n∞∞∞json\nb\n∞∞∞md\nc");
        let original = doc.text();
        doc.apply(Cmd::MoveBlock {
            target: BlockRef::Ordinal(0),
            to: 2,
        })
        .unwrap();
        let moved = doc.text();
        assert_eq!(doc.rope().to_string(), moved);

        doc.undo().unwrap();
        assert_eq!(doc.text(), original);
        assert_eq!(doc.rope().to_string(), original);

        doc.redo().unwrap();
        assert_eq!(doc.text(), moved);
        assert_eq!(doc.rope().to_string(), moved);
    }

    #[test]
    fn test_rejected_structural_edit_leaves_text_alone() {
        let mut doc = Document::from_text("∞∞∞text\nab");
        let at = doc.len();
        let mut builder = Builder::new(doc.len());
        builder.replace(at..at, Rope::from("\n∞∞∞json\n"));
        let compiled = Compiled {
            delta: builder.build(),
            selection: None,
            carry: Vec::new(),
            expect: Some(vec![("text".to_string(), false)]),
        };
        assert_eq!(
            doc.commit(compiled, Origin::User).unwrap_err(),
            CommandError::StructureMismatch
        );
        assert_eq!(doc.source(), "∞∞∞text\nab");
        assert_eq!(doc.rope().to_string(), doc.source());
        assert_eq!(doc.index().len(), 1);
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_caret_only_commands_leave_history_alone() {
        let mut doc = Document::from_text("∞∞∞text\nab\n∞∞∞json\n{}");
        doc.apply(Cmd::GotoNextBlock).unwrap();
        assert!(!doc.can_undo());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_index_matches_full_rebuild_after_edits() {
        let mut doc = Document::from_text("∞∞∞text-a\nhello\n∞∞∞json\n{}");
        doc.apply(Cmd::InsertText {
            at: 21,
            text: "\n∞∞∞py\nx = 1".to_string(),
        });
        doc.apply(Cmd::DeleteBlock {
            target: BlockRef::Ordinal(0),
        });
        let fresh = Document::from_text(doc.source());
        let ranges = |d: &Document| {
            d.index()
                .blocks()
                .iter()
                .map(|b| (b.range.clone(), b.language.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(ranges(&doc), ranges(&fresh));
        assert_eq!(doc.syntax().to_string(), fresh.syntax().to_string());
    }
}
