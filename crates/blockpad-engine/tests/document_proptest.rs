//! Property-based tests for the editing pipeline.
//!
//! Random command sequences run against a `Document`; after every step the
//! incrementally maintained index must agree with one rebuilt from scratch.

use std::collections::HashSet;

use blockpad_engine::editing::{BlockRef, Cmd, CommandError, Document, Placement};
use blockpad_syntax::Language;
use blockpad_syntax::lexer::format_delimiter;
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "\n", "∞", "∞∞∞", "json", "py", "-a", "x", "{}", "\n∞∞∞md\n", "\n∞∞∞text-a\n", "∞∞∞rs\n",
];

const LANGUAGES: &[Language] = &[Language::Text, Language::Json, Language::Python, Language::Markdown];

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, String),
    Delete(usize, usize),
    Caret(usize),
    InsertBlock(u8, usize, bool),
    DeleteBlock(usize),
    Retype(usize, usize, bool),
    Move(usize, usize),
    Undo,
    Redo,
}

fn fragment_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..6).prop_map(|parts| parts.concat())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), fragment_text()).prop_map(|(at, text)| Op::Insert(at, text)),
        2 => (any::<usize>(), 0usize..12).prop_map(|(at, len)| Op::Delete(at, len)),
        1 => any::<usize>().prop_map(Op::Caret),
        2 => (0u8..5, any::<usize>(), any::<bool>()).prop_map(|(p, l, a)| Op::InsertBlock(p, l, a)),
        1 => any::<usize>().prop_map(Op::DeleteBlock),
        1 => (any::<usize>(), any::<usize>(), any::<bool>()).prop_map(|(b, l, a)| Op::Retype(b, l, a)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(b, to)| Op::Move(b, to)),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

fn floor_boundary(text: &str, mut at: usize) -> usize {
    at = at.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}

fn placement(n: u8) -> Placement {
    match n % 5 {
        0 => Placement::BeforeCurrent,
        1 => Placement::AfterCurrent,
        2 => Placement::BeforeFirst,
        3 => Placement::AfterLast,
        _ => Placement::AtCursor,
    }
}

fn run(doc: &mut Document, op: Op) -> Result<(), TestCaseError> {
    let len = doc.len();
    let blocks = doc.index().len();
    match op {
        Op::Insert(at, text) => {
            let at = floor_boundary(doc.source(), at % (len + 1));
            doc.apply(Cmd::InsertText { at, text });
        }
        Op::Delete(at, n) => {
            let start = floor_boundary(doc.source(), at % (len + 1));
            let end = floor_boundary(doc.source(), start + n);
            doc.apply(Cmd::DeleteRange { range: start..end });
        }
        Op::Caret(at) => {
            let at = at % (len + 1);
            doc.set_selection(at..at);
        }
        Op::InsertBlock(n, language, auto_detect) => {
            let before = doc.text();
            let result = doc.try_apply(Cmd::InsertBlock {
                placement: placement(n),
                language: Some(LANGUAGES[language % LANGUAGES.len()]),
                auto_detect,
            });
            match result {
                Ok(_) => prop_assert_eq!(doc.index().len(), blocks + 1),
                // Only a half-typed delimiter right before the insertion
                // point can turn into a real one; nothing is written then.
                Err(err) => {
                    prop_assert_eq!(err, CommandError::StructureMismatch);
                    prop_assert_eq!(doc.text(), before);
                }
            }
        }
        Op::DeleteBlock(ordinal) => {
            doc.apply(Cmd::DeleteBlock {
                target: BlockRef::Ordinal(ordinal % blocks),
            });
        }
        Op::Retype(ordinal, language, auto_detect) => {
            doc.apply(Cmd::RetypeBlock {
                target: BlockRef::Ordinal(ordinal % blocks),
                language: LANGUAGES[language % LANGUAGES.len()],
                auto_detect,
            });
        }
        Op::Move(ordinal, to) => {
            doc.apply(Cmd::MoveBlock {
                target: BlockRef::Ordinal(ordinal % blocks),
                to: to % blocks,
            });
        }
        Op::Undo => {
            doc.undo();
        }
        Op::Redo => {
            doc.redo();
        }
    }
    Ok(())
}

/// Documents made only of written blocks with plain content, possibly
/// behind an implicit leading block or empty.
fn clean_document() -> impl Strategy<Value = String> {
    let block = (prop::sample::select(LANGUAGES), any::<bool>(), "[a-z {}\\n]{0,12}");
    ("[a-z ]{0,6}", prop::collection::vec(block, 0..4)).prop_map(|(lead, blocks)| {
        let mut text = lead;
        for (language, auto, content) in blocks {
            let leading = !text.is_empty();
            text.push_str(&format_delimiter(language.token(), auto, leading));
            text.push_str(content.trim_end_matches('\n'));
        }
        text
    })
}

fn layout(doc: &Document) -> Vec<(std::ops::Range<usize>, std::ops::Range<usize>, String, bool)> {
    doc.index()
        .blocks()
        .iter()
        .map(|b| {
            (
                b.range.clone(),
                b.content_range.clone(),
                b.language.token.clone(),
                b.language.auto_detect,
            )
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn index_matches_fresh_parse(start in fragment_text(), ops in prop::collection::vec(op_strategy(), 1..16)) {
        let mut doc = Document::from_text(&start);
        for op in ops {
            run(&mut doc, op)?;

            let fresh = Document::from_text(doc.source());
            prop_assert_eq!(layout(&doc), layout(&fresh));
            prop_assert_eq!(doc.syntax().to_string(), doc.text());
            prop_assert_eq!(doc.rope().to_string(), doc.text());

            let blocks = doc.index().blocks();
            prop_assert!(!blocks.is_empty());
            prop_assert_eq!(blocks[0].range.start, 0);
            prop_assert_eq!(blocks[blocks.len() - 1].range.end, doc.len());
            for pair in blocks.windows(2) {
                prop_assert_eq!(pair[0].range.end, pair[1].range.start);
            }
            for (ordinal, block) in blocks.iter().enumerate() {
                prop_assert_eq!(block.ordinal, ordinal);
                prop_assert_eq!(doc.index().ordinal_of(block.id), Some(ordinal));
            }
            let ids: HashSet<_> = blocks.iter().map(|b| b.id).collect();
            prop_assert_eq!(ids.len(), blocks.len());

            let selection = doc.selection();
            prop_assert!(selection.start <= selection.end && selection.end <= doc.len());
        }
    }

    #[test]
    fn bytes_round_trip(text in fragment_text()) {
        let doc = Document::from_bytes(text.as_bytes()).unwrap();
        prop_assert_eq!(doc.to_bytes(), text.into_bytes());
    }

    #[test]
    fn typing_inside_content_keeps_every_id(start in fragment_text(), insert in "[a-z ]{1,8}") {
        let mut doc = Document::from_text(&start);
        let before: Vec<_> = doc.index().blocks().iter().map(|b| b.id).collect();
        let at = doc.index().last_block().range.end;
        doc.apply(Cmd::InsertText { at, text: insert });
        let after: Vec<_> = doc.index().blocks().iter().map(|b| b.id).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn insert_block_into_clean_document_always_applies(
        start in clean_document(),
        inserts in prop::collection::vec((any::<u8>(), any::<usize>(), any::<usize>(), any::<bool>()), 1..6),
    ) {
        let mut doc = Document::from_text(&start);
        for (n, caret, language, auto_detect) in inserts {
            let at = caret % (doc.len() + 1);
            let at = floor_boundary(doc.source(), at);
            doc.set_selection(at..at);
            let blocks = doc.index().len();
            let result = doc.try_apply(Cmd::InsertBlock {
                placement: placement(n),
                language: Some(LANGUAGES[language % LANGUAGES.len()]),
                auto_detect,
            });
            prop_assert!(result.is_ok(), "{:?} into {:?}: {:?}", placement(n), doc.text(), result);
            prop_assert_eq!(doc.index().len(), blocks + 1);
        }
    }

    #[test]
    fn typing_at_start_keeps_first_id(start in fragment_text(), insert in "[a-z ]{1,8}") {
        let mut doc = Document::from_text(&start);
        let first = doc.index().first_block().id;
        doc.apply(Cmd::InsertText { at: 0, text: insert });
        prop_assert_eq!(doc.index().first_block().id, first);
    }
}
