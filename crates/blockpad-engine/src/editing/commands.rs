//! Edit commands and their compilation to deltas.
//!
//! Every command, structural or not, compiles to one xi-rope [`Delta`] over
//! the current buffer. Structural commands also say which block structure
//! they promise (the `(token, auto)` sequence after the edit) and which ids
//! should follow relocated delimiters. The document checks the promise
//! against the reparsed tree before committing anything.

use std::ops::Range;

use blockpad_syntax::Language;
use blockpad_syntax::lexer::format_delimiter;
use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::document::Document;
use crate::editing::index::{Block, BlockId};

/// Which block a structural command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Id(BlockId),
    Ordinal(usize),
    /// The block holding the caret
    Active,
}

/// Where a new block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    BeforeCurrent,
    AfterCurrent,
    BeforeFirst,
    AfterLast,
    /// Split the active block at the caret
    AtCursor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    /// `language: None` uses the document's default language
    InsertBlock {
        placement: Placement,
        language: Option<Language>,
        auto_detect: bool,
    },
    DeleteBlock {
        target: BlockRef,
    },
    RetypeBlock {
        target: BlockRef,
        language: Language,
        auto_detect: bool,
    },
    MoveBlock {
        target: BlockRef,
        to: usize,
    },
    MoveBlockUp {
        target: BlockRef,
    },
    MoveBlockDown {
        target: BlockRef,
    },
    GotoNextBlock,
    GotoPreviousBlock,
    SelectBlockContent,
}

/// Why a command was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("block {0:?} cannot be resolved")]
    UnresolvedBlock(BlockRef),

    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("ordinal {ordinal} is out of bounds for {len} blocks")]
    OutOfBounds { ordinal: usize, len: usize },

    #[error("command changes nothing")]
    NoChange,

    #[error("edit would not produce the expected block structure")]
    StructureMismatch,
}

/// A command ready to commit.
#[derive(Debug, Clone)]
pub(crate) struct Compiled {
    pub delta: Delta<RopeInfo>,
    /// Selection in new-text offsets; `None` transforms the current one
    pub selection: Option<Range<usize>>,
    /// Ids pinned to new block start offsets
    pub carry: Vec<(BlockId, usize)>,
    /// Block `(token, auto)` sequence the edit must produce
    pub expect: Option<Vec<(String, bool)>>,
}

impl Compiled {
    fn text(delta: Delta<RopeInfo>) -> Self {
        Self {
            delta,
            selection: None,
            carry: Vec::new(),
            expect: None,
        }
    }

    fn caret(len: usize, selection: Range<usize>) -> Self {
        Self {
            delta: Builder::new(len).build(),
            selection: Some(selection),
            carry: Vec::new(),
            expect: None,
        }
    }

    fn structural(
        delta: Delta<RopeInfo>,
        caret: usize,
        carry: Vec<(BlockId, usize)>,
        expect: Vec<(String, bool)>,
    ) -> Self {
        Self {
            delta,
            selection: Some(caret..caret),
            carry,
            expect: Some(expect),
        }
    }
}

pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Result<Compiled, CommandError> {
    match cmd {
        Cmd::InsertText { at, text } => {
            let at = checked_offset(doc, *at)?;
            if text.is_empty() {
                return Err(CommandError::NoChange);
            }
            Ok(Compiled::text(replace(doc.len(), at..at, text)))
        }
        Cmd::DeleteRange { range } => {
            let range = checked_range(doc, range)?;
            if range.is_empty() {
                return Err(CommandError::NoChange);
            }
            Ok(Compiled::text(replace(doc.len(), range, "")))
        }
        Cmd::ReplaceRange { range, text } => {
            let range = checked_range(doc, range)?;
            if range.is_empty() && text.is_empty() {
                return Err(CommandError::NoChange);
            }
            Ok(Compiled::text(replace(doc.len(), range, text)))
        }
        Cmd::InsertBlock {
            placement,
            language,
            auto_detect,
        } => {
            let language = language.unwrap_or(doc.default_language());
            insert_block(doc, *placement, language.token(), *auto_detect)
        }
        Cmd::DeleteBlock { target } => {
            let block = resolve(doc, *target)?;
            delete_block(doc, block)
        }
        Cmd::RetypeBlock {
            target,
            language,
            auto_detect,
        } => {
            let block = resolve(doc, *target)?;
            retype_block(doc, block, language.token(), *auto_detect)
        }
        Cmd::MoveBlock { target, to } => {
            let block = resolve(doc, *target)?;
            let len = doc.index().len();
            if *to >= len {
                return Err(CommandError::OutOfBounds { ordinal: *to, len });
            }
            move_block(doc, block, *to)
        }
        Cmd::MoveBlockUp { target } => {
            let block = resolve(doc, *target)?;
            let to = block.ordinal.checked_sub(1).ok_or(CommandError::NoChange)?;
            move_block(doc, block, to)
        }
        Cmd::MoveBlockDown { target } => {
            let block = resolve(doc, *target)?;
            let to = block.ordinal + 1;
            if to >= doc.index().len() {
                return Err(CommandError::NoChange);
            }
            move_block(doc, block, to)
        }
        Cmd::GotoNextBlock => {
            let block = resolve(doc, BlockRef::Active)?;
            let caret = match doc.index().blocks().get(block.ordinal + 1) {
                Some(next) => next.content_range.start,
                None => block.content_range.end,
            };
            Ok(Compiled::caret(doc.len(), caret..caret))
        }
        Cmd::GotoPreviousBlock => {
            let block = resolve(doc, BlockRef::Active)?;
            let caret = match block.ordinal.checked_sub(1) {
                Some(prev) => doc.index().blocks()[prev].content_range.start,
                None => block.content_range.start,
            };
            Ok(Compiled::caret(doc.len(), caret..caret))
        }
        Cmd::SelectBlockContent => {
            let block = resolve(doc, BlockRef::Active)?;
            let selection = if doc.selection() == block.content_range {
                0..doc.len()
            } else {
                block.content_range.clone()
            };
            Ok(Compiled::caret(doc.len(), selection))
        }
    }
}

fn resolve(doc: &Document, target: BlockRef) -> Result<&Block, CommandError> {
    let index = doc.index();
    let block = match target {
        BlockRef::Id(id) => index.block_by_id(id),
        BlockRef::Ordinal(ordinal) => index.blocks().get(ordinal),
        BlockRef::Active => index.active_block(&doc.selection()),
    };
    block.ok_or(CommandError::UnresolvedBlock(target))
}

/// Clamp to the document and insist on a char boundary.
fn checked_offset(doc: &Document, offset: usize) -> Result<usize, CommandError> {
    let offset = offset.min(doc.len());
    if doc.source().is_char_boundary(offset) {
        Ok(offset)
    } else {
        Err(CommandError::NotCharBoundary { offset })
    }
}

fn checked_range(doc: &Document, range: &Range<usize>) -> Result<Range<usize>, CommandError> {
    let start = checked_offset(doc, range.start)?;
    let end = checked_offset(doc, range.end)?;
    Ok(start.min(end)..end.max(start))
}

fn replace(base_len: usize, range: Range<usize>, text: &str) -> Delta<RopeInfo> {
    let mut builder = Builder::new(base_len);
    builder.replace(range, Rope::from(text));
    builder.build()
}

fn tag_key(token: &str, auto_detect: bool) -> (String, bool) {
    (token.to_string(), auto_detect)
}

/// Delimiter of a block in leading-newline form, materializing the implicit
/// block as `text-a`.
fn normalized_delimiter(block: &Block) -> String {
    format_delimiter(&block.language.token, block.language.auto_detect, true)
}

/// The block rewritten so it can stand anywhere after the first position.
fn normalized_block(doc: &Document, block: &Block) -> String {
    let mut text = normalized_delimiter(block);
    text.push_str(&doc.source()[block.content_range.clone()]);
    text
}

fn insert_block(
    doc: &Document,
    placement: Placement,
    token: &str,
    auto_detect: bool,
) -> Result<Compiled, CommandError> {
    let index = doc.index();
    let mut expect = index.tag_keys();
    let delimiter = format_delimiter(token, auto_detect, true);

    let after = |block: &Block, mut expect: Vec<(String, bool)>| {
        let at = block.range.end;
        expect.insert(block.ordinal + 1, tag_key(token, auto_detect));
        if block.is_implicit() && block.range.is_empty() {
            // An empty document: a delimiter at offset 0 would take over the
            // implicit block, so write that block out first.
            let inserted = format!("{}{delimiter}", format_delimiter(&block.language.token, true, false));
            return Compiled::structural(
                replace(doc.len(), 0..0, &inserted),
                inserted.len(),
                vec![(block.id, 0)],
                expect,
            );
        }
        Compiled::structural(
            replace(doc.len(), at..at, &delimiter),
            at + delimiter.len(),
            Vec::new(),
            expect,
        )
    };

    match placement {
        Placement::AfterCurrent => {
            let block = resolve(doc, BlockRef::Active)?;
            Ok(after(block, expect))
        }
        Placement::AfterLast => Ok(after(index.last_block(), expect)),
        Placement::BeforeCurrent | Placement::BeforeFirst => {
            let block = match placement {
                Placement::BeforeFirst => index.first_block(),
                _ => resolve(doc, BlockRef::Active)?,
            };
            expect.insert(block.ordinal, tag_key(token, auto_detect));
            let at = block.range.start;

            if block.leading_newline {
                return Ok(Compiled::structural(
                    replace(doc.len(), at..at, &delimiter),
                    at + delimiter.len(),
                    Vec::new(),
                    expect,
                ));
            }

            // The first block loses its start-of-document position, so it
            // moves to the leading-newline form.
            let head = format_delimiter(token, auto_detect, false);
            let tail = if block.is_implicit() {
                normalized_delimiter(block)
            } else {
                "\n".to_string()
            };
            let inserted = format!("{head}{tail}");
            let moved_to = if block.is_implicit() {
                head.len()
            } else {
                inserted.len() - 1
            };
            Ok(Compiled::structural(
                replace(doc.len(), 0..0, &inserted),
                head.len(),
                vec![(block.id, moved_to)],
                expect,
            ))
        }
        Placement::AtCursor => {
            let block = resolve(doc, BlockRef::Active)?;
            let at = doc
                .selection()
                .end
                .clamp(block.content_range.start, block.content_range.end);
            expect.insert(block.ordinal + 1, tag_key(token, auto_detect));

            if block.is_implicit() && at == 0 {
                // Keep the (now empty) implicit block ahead of the new one.
                let inserted = format!("{}{delimiter}", format_delimiter(&block.language.token, true, false));
                return Ok(Compiled::structural(
                    replace(doc.len(), 0..0, &inserted),
                    inserted.len(),
                    vec![(block.id, 0)],
                    expect,
                ));
            }

            Ok(Compiled::structural(
                replace(doc.len(), at..at, &delimiter),
                at + delimiter.len(),
                Vec::new(),
                expect,
            ))
        }
    }
}

fn delete_block(doc: &Document, block: &Block) -> Result<Compiled, CommandError> {
    let index = doc.index();
    let mut expect = index.tag_keys();

    if index.len() == 1 {
        let default = doc.default_language();
        let replacement = if default == Language::DEFAULT {
            String::new()
        } else {
            format_delimiter(default.token(), true, false)
        };
        if doc.source() == replacement {
            return Err(CommandError::NoChange);
        }
        let caret = replacement.len();
        return Ok(Compiled::structural(
            replace(doc.len(), 0..doc.len(), &replacement),
            caret,
            Vec::new(),
            vec![tag_key(default.token(), true)],
        ));
    }

    expect.remove(block.ordinal);

    if block.ordinal > 0 {
        return Ok(Compiled::structural(
            replace(doc.len(), block.range.clone(), ""),
            block.range.start,
            Vec::new(),
            expect,
        ));
    }

    // Removing the first block: the next one takes over the start of the
    // document and drops its leading newline.
    let next = &index.blocks()[1];
    let removed = 0..next.range.start + 1;
    Ok(Compiled::structural(
        replace(doc.len(), removed.clone(), ""),
        next.content_range.start - removed.end,
        vec![(next.id, 0)],
        expect,
    ))
}

fn retype_block(
    doc: &Document,
    block: &Block,
    token: &str,
    auto_detect: bool,
) -> Result<Compiled, CommandError> {
    if block.language.token == token && block.language.auto_detect == auto_detect {
        return Err(CommandError::NoChange);
    }
    let mut expect = doc.index().tag_keys();
    expect[block.ordinal] = tag_key(token, auto_detect);

    // Selection is transformed through the edit, not replaced.
    let compiled = match block.language_span() {
        Some(span) => {
            let mut written = token.to_string();
            if auto_detect {
                written.push_str(blockpad_syntax::lexer::AUTO_SUFFIX);
            }
            Compiled::structural(replace(doc.len(), span, &written), 0, Vec::new(), expect)
        }
        None => {
            let delimiter = format_delimiter(token, auto_detect, false);
            Compiled::structural(
                replace(doc.len(), 0..0, &delimiter),
                0,
                vec![(block.id, 0)],
                expect,
            )
        }
    };
    Ok(Compiled {
        selection: None,
        ..compiled
    })
}

/// Move `block` so it ends up at ordinal `to`.
///
/// Compiled as one delete plus one insert of the block's text in
/// leading-newline form. Whichever block ends up first is rewritten into
/// the start-of-document form.
fn move_block(doc: &Document, block: &Block, to: usize) -> Result<Compiled, CommandError> {
    let from = block.ordinal;
    if from == to {
        return Err(CommandError::NoChange);
    }
    let index = doc.index();
    let blocks = index.blocks();
    let moved = normalized_block(doc, block);
    let moved_delimiter_len = normalized_delimiter(block).len();

    let mut expect = index.tag_keys();
    let key = expect.remove(from);
    expect.insert(to, key);

    let mut builder = Builder::new(doc.len());
    let mut carry = Vec::new();

    let caret = if to > from {
        let removed = if from == 0 {
            let next = &blocks[1];
            carry.push((next.id, 0));
            0..next.range.start + 1
        } else {
            block.range.clone()
        };
        let at = blocks[to].range.end;
        builder.delete(removed.clone());
        builder.replace(at..at, Rope::from(moved.as_str()));

        let new_start = at - removed.len();
        carry.push((block.id, new_start));
        new_start + moved_delimiter_len
    } else {
        let first = &blocks[to];
        let at = first.range.start;
        if to == 0 && !first.leading_newline {
            // `block` becomes the start-of-document delimiter and the old
            // first block gets a leading newline.
            let tail = if first.is_implicit() {
                normalized_delimiter(first)
            } else {
                "\n".to_string()
            };
            let inserted = format!("{}{tail}", &moved[1..]);
            builder.replace(0..0, Rope::from(inserted.as_str()));
            carry.push((block.id, 0));
            carry.push((first.id, moved.len() - 1));
        } else {
            builder.replace(at..at, Rope::from(moved.as_str()));
            carry.push((block.id, at));
        }
        builder.delete(block.range.clone());

        if to == 0 && !first.leading_newline {
            moved_delimiter_len - 1
        } else {
            at + moved_delimiter_len
        }
    };

    Ok(Compiled::structural(builder.build(), caret, carry, expect))
}
