//! Typed views over the untyped CST.
//!
//! Each wrapper holds a [`SyntaxNode`] of a known kind and exposes the few
//! things callers need: byte ranges and the language tag. Construction goes
//! through `cast`, which checks the kind.

use std::ops::Range;

use rowan::TextRange;

use crate::language::Language;
use crate::syntax_kind::{SyntaxKind, SyntaxNode, SyntaxToken};

fn byte_range(range: TextRange) -> Range<usize> {
    usize::from(range.start())..usize::from(range.end())
}

/// The root of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document(SyntaxNode);

impl Document {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::DOCUMENT).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    /// Blocks in document order. Never empty for a parsed document.
    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.0.children().filter_map(Block::cast)
    }
}

/// One block: delimiter plus content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block(SyntaxNode);

impl Block {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::BLOCK).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    pub fn delimiter(&self) -> Option<Delimiter> {
        self.0.children().find_map(Delimiter::cast)
    }

    pub fn content(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == SyntaxKind::CONTENT)
    }

    /// Delimiter start to content end.
    pub fn range(&self) -> Range<usize> {
        byte_range(self.0.text_range())
    }

    /// Empty for the implicit leading block.
    pub fn delimiter_range(&self) -> Range<usize> {
        match self.delimiter() {
            Some(d) => byte_range(d.syntax().text_range()),
            None => self.range().start..self.range().start,
        }
    }

    pub fn content_range(&self) -> Range<usize> {
        let start = self.delimiter_range().end;
        start..self.range().end
    }

    pub fn content_text(&self) -> String {
        self.content().map(|t| t.text().to_string()).unwrap_or_default()
    }

    pub fn is_implicit(&self) -> bool {
        self.delimiter().is_none_or(|d| d.is_implicit())
    }

    pub fn language_tag(&self) -> LanguageTag {
        match self.delimiter().and_then(|d| d.language_token()) {
            Some(token) => {
                let auto_detect = self
                    .delimiter()
                    .is_some_and(|d| d.auto_detect());
                LanguageTag::explicit(token.text(), auto_detect)
            }
            None => LanguageTag::implicit(),
        }
    }
}

/// A delimiter line, or the empty stand-in of the implicit block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(SyntaxNode);

impl Delimiter {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        (node.kind() == SyntaxKind::DELIMITER).then_some(Self(node))
    }

    pub fn syntax(&self) -> &SyntaxNode {
        &self.0
    }

    fn token(&self, kind: SyntaxKind) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == kind)
    }

    pub fn is_implicit(&self) -> bool {
        self.0.text_range().is_empty()
    }

    /// False only for a delimiter at the very start of the document.
    pub fn has_leading_newline(&self) -> bool {
        self.0
            .first_token()
            .is_some_and(|t| t.kind() == SyntaxKind::NEWLINE)
    }

    pub fn language_token(&self) -> Option<SyntaxToken> {
        self.token(SyntaxKind::LANG_TOKEN)
    }

    pub fn auto_detect(&self) -> bool {
        self.token(SyntaxKind::AUTO_SUFFIX).is_some()
    }
}

/// A block's language as written in its delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag {
    /// The raw token, e.g. `json` or an unknown `brainfuck`.
    pub token: String,
    /// `None` for well-formed tokens that name no known language.
    pub language: Option<Language>,
    pub auto_detect: bool,
    /// Tag of the implicit leading block rather than a written delimiter.
    pub implicit: bool,
}

impl LanguageTag {
    pub fn explicit(token: &str, auto_detect: bool) -> Self {
        Self {
            token: token.to_string(),
            language: Language::from_token(token),
            auto_detect,
            implicit: false,
        }
    }

    /// The implicit leading block is plain text with auto-detect on.
    pub fn implicit() -> Self {
        Self {
            token: Language::DEFAULT.token().to_string(),
            language: Some(Language::DEFAULT),
            auto_detect: true,
            implicit: true,
        }
    }

    pub fn of(language: Language, auto_detect: bool) -> Self {
        Self::explicit(language.token(), auto_detect)
    }

    pub fn is_unknown(&self) -> bool {
        self.language.is_none()
    }
}
