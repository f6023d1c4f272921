//! The enumerated set of block languages.
//!
//! A delimiter names its language with a short token (`json`, `py`, ...).
//! [`Language`] is the tagged variant behind each known token; adding a
//! language means adding a variant here and a row to [`Language::ALL`].
//! Tokens that are well-formed but not listed still parse, they just have no
//! `Language` (see [`crate::ast::LanguageTag`]).

use std::fmt;

/// A known block language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Text,
    Math,
    Json,
    Python,
    Html,
    Sql,
    Markdown,
    Java,
    Php,
    Css,
    Xml,
    Cpp,
    Rust,
    CSharp,
    Ruby,
    Shell,
    Yaml,
    Toml,
    Go,
    Clojure,
    Elixir,
    Erlang,
    JavaScript,
    TypeScript,
    Swift,
    Kotlin,
    Groovy,
    PowerShell,
    Dart,
    Scala,
    Dockerfile,
    Lua,
    Vue,
    Svelte,
    Diff,
    Http,
}

impl Language {
    /// The language of implicit blocks and of blocks reset by emptying.
    pub const DEFAULT: Language = Language::Text;

    /// Every known language, in menu order.
    pub const ALL: [Language; 36] = [
        Language::Text,
        Language::Math,
        Language::Json,
        Language::Python,
        Language::Html,
        Language::Sql,
        Language::Markdown,
        Language::Java,
        Language::Php,
        Language::Css,
        Language::Xml,
        Language::Cpp,
        Language::Rust,
        Language::CSharp,
        Language::Ruby,
        Language::Shell,
        Language::Yaml,
        Language::Toml,
        Language::Go,
        Language::Clojure,
        Language::Elixir,
        Language::Erlang,
        Language::JavaScript,
        Language::TypeScript,
        Language::Swift,
        Language::Kotlin,
        Language::Groovy,
        Language::PowerShell,
        Language::Dart,
        Language::Scala,
        Language::Dockerfile,
        Language::Lua,
        Language::Vue,
        Language::Svelte,
        Language::Diff,
        Language::Http,
    ];

    /// The token written in delimiters.
    pub fn token(self) -> &'static str {
        match self {
            Language::Text => "text",
            Language::Math => "math",
            Language::Json => "json",
            Language::Python => "py",
            Language::Html => "html",
            Language::Sql => "sql",
            Language::Markdown => "md",
            Language::Java => "java",
            Language::Php => "php",
            Language::Css => "css",
            Language::Xml => "xml",
            Language::Cpp => "cpp",
            Language::Rust => "rs",
            Language::CSharp => "cs",
            Language::Ruby => "rb",
            Language::Shell => "sh",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Go => "go",
            Language::Clojure => "clj",
            Language::Elixir => "ex",
            Language::Erlang => "erl",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Swift => "swift",
            Language::Kotlin => "kt",
            Language::Groovy => "groovy",
            Language::PowerShell => "ps1",
            Language::Dart => "dart",
            Language::Scala => "scala",
            Language::Dockerfile => "dockerfile",
            Language::Lua => "lua",
            Language::Vue => "vue",
            Language::Svelte => "svelte",
            Language::Diff => "diff",
            Language::Http => "http",
        }
    }

    /// Human readable name for menus and status bars.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Text => "Plain Text",
            Language::Math => "Math",
            Language::Json => "JSON",
            Language::Python => "Python",
            Language::Html => "HTML",
            Language::Sql => "SQL",
            Language::Markdown => "Markdown",
            Language::Java => "Java",
            Language::Php => "PHP",
            Language::Css => "CSS",
            Language::Xml => "XML",
            Language::Cpp => "C++",
            Language::Rust => "Rust",
            Language::CSharp => "C#",
            Language::Ruby => "Ruby",
            Language::Shell => "Shell",
            Language::Yaml => "YAML",
            Language::Toml => "TOML",
            Language::Go => "Go",
            Language::Clojure => "Clojure",
            Language::Elixir => "Elixir",
            Language::Erlang => "Erlang",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Swift => "Swift",
            Language::Kotlin => "Kotlin",
            Language::Groovy => "Groovy",
            Language::PowerShell => "PowerShell",
            Language::Dart => "Dart",
            Language::Scala => "Scala",
            Language::Dockerfile => "Dockerfile",
            Language::Lua => "Lua",
            Language::Vue => "Vue",
            Language::Svelte => "Svelte",
            Language::Diff => "Diff",
            Language::Http => "HTTP",
        }
    }

    /// Look up a delimiter token. Matching is exact and case-sensitive.
    pub fn from_token(token: &str) -> Option<Language> {
        Self::ALL.iter().copied().find(|lang| lang.token() == token)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
