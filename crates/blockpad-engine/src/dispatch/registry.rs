//! Language registry: which languages have a nested grammar and which the
//! classifier may propose.

use std::collections::HashMap;
use std::fmt;

use blockpad_syntax::Language;
use blockpad_syntax::ast::LanguageTag;
use once_cell::sync::Lazy;

static BUILTIN: Lazy<LanguageRegistry> = Lazy::new(LanguageRegistry::builtin);

/// A tree-sitter grammar usable for a block's content.
#[derive(Clone)]
pub struct GrammarHandle {
    name: &'static str,
    language: tree_sitter::Language,
}

impl GrammarHandle {
    pub fn new(name: &'static str, language: tree_sitter::Language) -> Self {
        Self { name, language }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn language(&self) -> &tree_sitter::Language {
        &self.language
    }
}

impl fmt::Debug for GrammarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GrammarHandle").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct LanguageEntry {
    pub language: Language,
    pub token: &'static str,
    pub display_name: &'static str,
    /// `None`: content is opaque text, still foldable
    pub grammar: Option<GrammarHandle>,
    pub detectable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    entries: HashMap<Language, LanguageEntry>,
}

impl LanguageRegistry {
    /// Every known language, with grammars for the ones we ship.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for language in Language::ALL {
            let grammar = match language {
                Language::Json => Some(GrammarHandle::new("json", tree_sitter_json::LANGUAGE.into())),
                Language::Python => Some(GrammarHandle::new("python", tree_sitter_python::LANGUAGE.into())),
                Language::JavaScript => Some(GrammarHandle::new(
                    "javascript",
                    tree_sitter_javascript::LANGUAGE.into(),
                )),
                Language::Rust => Some(GrammarHandle::new("rust", tree_sitter_rust::LANGUAGE.into())),
                Language::Markdown => Some(GrammarHandle::new("markdown", tree_sitter_md::LANGUAGE.into())),
                _ => None,
            };
            let detectable = !matches!(language, Language::Text | Language::Math | Language::Http);
            registry.register(LanguageEntry {
                language,
                token: language.token(),
                display_name: language.display_name(),
                grammar,
                detectable,
            });
        }
        registry
    }

    /// The shared built-in registry.
    pub fn global() -> &'static LanguageRegistry {
        &BUILTIN
    }

    /// Add or replace the entry for `entry.language`.
    pub fn register(&mut self, entry: LanguageEntry) {
        self.entries.insert(entry.language, entry);
    }

    pub fn get(&self, language: Language) -> Option<&LanguageEntry> {
        self.entries.get(&language)
    }

    /// Entry for a block's tag; unknown tokens have none.
    pub fn lookup(&self, tag: &LanguageTag) -> Option<&LanguageEntry> {
        tag.language.and_then(|language| self.get(language))
    }

    pub fn grammar_for(&self, language: Language) -> Option<&GrammarHandle> {
        self.get(language).and_then(|entry| entry.grammar.as_ref())
    }

    pub fn is_detectable(&self, language: Language) -> bool {
        self.get(language).is_some_and(|entry| entry.detectable)
    }
}
