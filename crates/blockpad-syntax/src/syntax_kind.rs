//! SyntaxKind enum for all tokens and nodes in the block document CST.
//!
//! Following the rust-analyzer model, all tokens and nodes share a single enum.
//! Every byte in the source must appear as a token in the tree.

/// All syntax kinds for the block document CST.
///
/// This enum represents both tokens (lexer output) and composite nodes (parser output).
/// The `repr(u16)` ensures efficient storage in rowan's green tree.
///
/// We use SCREAMING_CASE following the rust-analyzer convention for SyntaxKind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // === Tokens (lexer output) ===
    /// Line break that opens or closes a delimiter line
    NEWLINE,
    /// The tripled sentinel `∞∞∞`
    SENTINEL,
    /// Language identifier inside a delimiter (`json`, `py`, ...)
    LANG_TOKEN,
    /// The `-a` auto-detect suffix
    AUTO_SUFFIX,
    /// Everything between two delimiters, kept as one token
    CONTENT,
    /// End of file marker
    EOF,

    // === Composite Nodes (parser output) ===
    /// Root document node
    DOCUMENT,
    /// A delimiter followed by its content
    BLOCK,
    /// Delimiter line; zero-width for the implicit leading block
    DELIMITER,
}

impl SyntaxKind {
    /// Returns true if this kind represents a token (lexer output).
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::EOF as u16)
    }

    /// Returns true if this kind represents a composite node.
    pub fn is_node(self) -> bool {
        !self.is_token()
    }

    /// Returns true if this kind only ever appears inside a delimiter.
    pub fn is_delimiter_part(self) -> bool {
        matches!(
            self,
            Self::NEWLINE | Self::SENTINEL | Self::LANG_TOKEN | Self::AUTO_SUFFIX
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

/// Language definition for rowan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockLang {}

impl rowan::Language for BlockLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= SyntaxKind::DELIMITER as u16);
        // SAFETY: We check bounds above and SyntaxKind is repr(u16)
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type alias for our syntax nodes.
pub type SyntaxNode = rowan::SyntaxNode<BlockLang>;
/// Type alias for our syntax tokens.
pub type SyntaxToken = rowan::SyntaxToken<BlockLang>;
/// Type alias for syntax elements (node or token).
pub type SyntaxElement = rowan::SyntaxElement<BlockLang>;
