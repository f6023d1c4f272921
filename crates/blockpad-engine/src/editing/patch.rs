use blockpad_syntax::TextEdit;

/// Where a transaction came from.
///
/// The auto-detection pipeline ignores its own `LanguageChange` writes, and
/// undo/redo bump the history generation so in-flight detections go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Origin {
    #[default]
    User,
    LanguageChange,
    Undo,
    Redo,
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Byte ranges in the new text that were inserted or collapsed by a deletion
    pub changed: Vec<std::ops::Range<usize>>,
    /// The single replace covering the whole change, `None` for caret-only commands
    pub edit: Option<TextEdit>,
    pub new_selection: std::ops::Range<usize>,
    pub version: u64,
    pub origin: Origin,
}

impl Patch {
    pub fn is_text_change(&self) -> bool {
        self.edit.is_some()
    }
}
