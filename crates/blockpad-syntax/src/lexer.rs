//! # Lexer - Finding Block Delimiters
//!
//! This module provides the first stage of parsing: splitting source text into
//! delimiter lines and the opaque content between them.
//!
//! ## The Delimiter Line
//!
//! A block starts with a line of the exact shape
//!
//! ```text
//! "\n" "∞∞∞" <language-token> ["-a"] "\n"
//! ```
//!
//! The first delimiter in a document may drop its leading `"\n"`, the start of
//! the document stands in for it. A delimiter is only ever recognized where a
//! `"\n∞"` pair starts (or at offset 0), and is then verified with a bounded
//! lookahead over the rest of the line using a small [Logos] lexer. Anything
//! that fails verification is plain content: a stray `∞∞∞` in the middle of a
//! paragraph never opens a block.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! As in the rest of this crate, **every byte in the input appears in exactly
//! one token**:
//!
//! ```
//! use blockpad_syntax::lexer::lex;
//!
//! let input = "∞∞∞text-a\nhello\n∞∞∞json\n{}";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Public API
//!
//! - [`match_delimiter`] - Verify a delimiter at a given offset
//! - [`next_delimiter`] - Find the next delimiter at or after an offset
//! - [`block_content`] - The `BlockContent` span starting at an offset
//! - [`scan_block`] - One delimiter plus its content
//! - [`lex`] / [`lex_with_spans`] - Tokenize a whole document

use std::ops::Range;

use logos::Logos;

use crate::syntax_kind::SyntaxKind;

/// The sentinel character. Three of them open a delimiter.
pub const SENTINEL: char = '∞';

/// The tripled sentinel as it appears in a delimiter.
pub const SENTINEL_RUN: &str = "∞∞∞";

/// Suffix marking a block as auto-detect enabled.
pub const AUTO_SUFFIX: &str = "-a";

/// Longest language token the lookahead will accept.
pub const MAX_TOKEN_LEN: usize = 32;

/// Bytes examined after the sentinel prefix before giving up on a line.
const MAX_LINE_LEN: usize = SENTINEL_RUN.len() + MAX_TOKEN_LEN + AUTO_SUFFIX.len();

/// Token kinds inside a single delimiter line.
///
/// Only used to verify a candidate line; the grammar sees [`SyntaxKind`]s.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterPart {
    #[token("∞∞∞")]
    Sentinel,

    #[regex(r"[A-Za-z0-9_]+")]
    LanguageToken,

    #[token("-a")]
    AutoSuffix,

    #[token("\n")]
    Newline,
}

/// A verified delimiter line with the byte span of each of its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterMatch {
    /// Whole delimiter including both newlines.
    pub range: Range<usize>,
    /// The leading `"\n"`, absent for a start-of-document delimiter.
    pub leading_newline: Option<Range<usize>>,
    pub sentinel: Range<usize>,
    pub token: Range<usize>,
    pub auto_suffix: Option<Range<usize>>,
    pub trailing_newline: Range<usize>,
}

impl DelimiterMatch {
    /// The language token text.
    pub fn token_text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.token.clone()]
    }

    pub fn auto_detect(&self) -> bool {
        self.auto_suffix.is_some()
    }

    /// Span of the token plus optional suffix, the part a retype rewrites.
    pub fn language_span(&self) -> Range<usize> {
        self.token.start..self.trailing_newline.start
    }
}

/// Verify a delimiter starting at byte `at`.
///
/// A delimiter normally begins with `"\n∞"`. When `at_document_start` is set
/// and `at == 0`, the bare `"∞∞∞"` form is accepted too. The rest of the line
/// is checked with a bounded lookahead; a line that runs out of input before
/// its closing `"\n"` is not a delimiter.
pub fn match_delimiter(text: &str, at: usize, at_document_start: bool) -> Option<DelimiterMatch> {
    let rest = text.get(at..)?;

    let leading_newline = if rest.starts_with('\n') && rest[1..].starts_with(SENTINEL) {
        Some(at..at + 1)
    } else if at == 0 && at_document_start && rest.starts_with(SENTINEL) {
        None
    } else {
        return None;
    };

    let line_start = leading_newline.as_ref().map_or(at, |nl| nl.end);
    let line = &text[line_start..];
    let newline_at = line
        .as_bytes()
        .iter()
        .take(MAX_LINE_LEN + 1)
        .position(|&b| b == b'\n')?;
    let candidate = &line[..=newline_at];

    let mut lexer = DelimiterPart::lexer(candidate);
    let mut next_part = move || {
        let part = lexer.next()?.ok()?;
        let span = lexer.span();
        Some((part, line_start + span.start..line_start + span.end))
    };

    let (DelimiterPart::Sentinel, sentinel) = next_part()? else {
        return None;
    };
    let (DelimiterPart::LanguageToken, token) = next_part()? else {
        return None;
    };
    if token.len() > MAX_TOKEN_LEN {
        return None;
    }
    let (auto_suffix, trailing_newline) = match next_part()? {
        (DelimiterPart::AutoSuffix, suffix) => match next_part()? {
            (DelimiterPart::Newline, newline) => (Some(suffix), newline),
            _ => return None,
        },
        (DelimiterPart::Newline, newline) => (None, newline),
        _ => return None,
    };
    if next_part().is_some() {
        return None;
    }

    Some(DelimiterMatch {
        range: at..trailing_newline.end,
        leading_newline,
        sentinel,
        token,
        auto_suffix,
        trailing_newline,
    })
}

/// Find the first delimiter that starts at or after `from`.
///
/// Only `"\n∞∞∞"` positions are candidates, the start-of-document form is the
/// caller's concern.
pub fn next_delimiter(text: &str, from: usize) -> Option<DelimiterMatch> {
    let tail = text.get(from..)?;
    tail.match_indices("\n∞∞∞")
        .find_map(|(offset, _)| match_delimiter(text, from + offset, false))
}

/// The `BlockContent` token starting at `from`: everything up to the next
/// delimiter, or to the end of input.
pub fn block_content(text: &str, from: usize) -> Range<usize> {
    let end = next_delimiter(text, from).map_or(text.len(), |d| d.range.start);
    from..end
}

/// One block as found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedBlock {
    /// `None` for the implicit leading block of a document that does not
    /// start with a delimiter.
    pub delimiter: Option<DelimiterMatch>,
    pub content: Range<usize>,
}

impl ScannedBlock {
    pub fn start(&self) -> usize {
        self.delimiter
            .as_ref()
            .map_or(self.content.start, |d| d.range.start)
    }

    pub fn end(&self) -> usize {
        self.content.end
    }
}

/// Scan the block starting at `pos`.
///
/// `pos` is expected to be a block boundary: offset 0 or the start of a
/// delimiter. At offset 0 a missing delimiter yields the implicit block.
pub fn scan_block(text: &str, pos: usize) -> ScannedBlock {
    let delimiter = match_delimiter(text, pos, pos == 0);
    let content_start = delimiter.as_ref().map_or(pos, |d| d.range.end);
    ScannedBlock {
        delimiter,
        content: block_content(text, content_start),
    }
}

/// Scan every block of `text` in order. Never returns an empty list.
pub fn scan_blocks(text: &str) -> Vec<ScannedBlock> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    loop {
        let block = scan_block(text, pos);
        let end = block.end();
        blocks.push(block);
        if end >= text.len() || end == pos {
            break;
        }
        pos = end;
    }
    blocks
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
}

/// Tokens for a single scanned block, with spans.
pub fn block_tokens<'a>(
    text: &'a str,
    block: &ScannedBlock,
) -> Vec<(Token<'a>, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut push = |kind, span: Range<usize>| {
        tokens.push((
            Token {
                kind,
                text: &text[span.clone()],
            },
            span,
        ));
    };

    if let Some(d) = &block.delimiter {
        if let Some(nl) = &d.leading_newline {
            push(SyntaxKind::NEWLINE, nl.clone());
        }
        push(SyntaxKind::SENTINEL, d.sentinel.clone());
        push(SyntaxKind::LANG_TOKEN, d.token.clone());
        if let Some(suffix) = &d.auto_suffix {
            push(SyntaxKind::AUTO_SUFFIX, suffix.clone());
        }
        push(SyntaxKind::NEWLINE, d.trailing_newline.clone());
    }
    if !block.content.is_empty() {
        push(SyntaxKind::CONTENT, block.content.clone());
    }

    tokens
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, Range<usize>)> {
    scan_blocks(input)
        .iter()
        .flat_map(|block| block_tokens(input, block))
        .collect()
}

/// Render a delimiter line.
pub fn format_delimiter(token: &str, auto_detect: bool, leading_newline: bool) -> String {
    let mut out = String::with_capacity(SENTINEL_RUN.len() + token.len() + 4);
    if leading_newline {
        out.push('\n');
    }
    out.push_str(SENTINEL_RUN);
    out.push_str(token);
    if auto_detect {
        out.push_str(AUTO_SUFFIX);
    }
    out.push('\n');
    out
}
