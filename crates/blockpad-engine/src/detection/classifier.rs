//! Heuristic language classifier.
//!
//! Each detectable language has a handful of weighted regex features. A
//! feature scores its weight per match, up to [`MATCH_CAP`] matches, so one
//! repetitive construct cannot dominate. The best language's share of the
//! total score, damped for weak evidence, is the confidence.

use blockpad_syntax::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches counted per feature.
const MATCH_CAP: usize = 3;

/// Below this the best score is noise.
const MIN_SCORE: f32 = 2.0;

/// Score at which the damping factor reaches one half.
const DAMPING: f32 = 2.0;

/// Only this much of the content is examined.
const MAX_SAMPLE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// `None` when nothing scored well enough
    pub language: Option<Language>,
    /// In `0.0..=1.0`; zero exactly when `language` is `None`
    pub confidence: f32,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            language: None,
            confidence: 0.0,
        }
    }
}

/// Something that can guess a language from content.
pub trait Classifier: Send {
    fn classify(&self, content: &str) -> Classification;
}

struct Feature {
    pattern: Regex,
    weight: f32,
}

struct Profile {
    language: Language,
    features: Vec<Feature>,
}

static PROFILES: Lazy<Vec<Profile>> = Lazy::new(|| {
    FEATURES
        .iter()
        .map(|(language, features)| Profile {
            language: *language,
            features: features
                .iter()
                .filter_map(|(pattern, weight)| match Regex::new(pattern) {
                    Ok(pattern) => Some(Feature {
                        pattern,
                        weight: *weight,
                    }),
                    Err(err) => {
                        log::warn!("classifier feature for {language} dropped: {err}");
                        None
                    }
                })
                .collect(),
        })
        .collect()
});

type FeatureTable = &'static [(Language, &'static [(&'static str, f32)])];

const FEATURES: FeatureTable = &[
    (
        Language::Json,
        &[
            (r"\A\s*[\{\[]", 1.5),
            (r#""[^"\n]*"\s*:"#, 2.0),
            (r#":\s*(true|false|null|-?\d|")"#, 1.0),
            (r"(?m)^\s*[\}\]],?\s*$", 0.5),
        ],
    ),
    (
        Language::Python,
        &[
            (r"(?m)^\s*def \w+\(.*\)\s*(->\s*[\w\[\], ]+)?:\s*$", 3.0),
            (r"(?m)^\s*(import \w+|from [\w.]+ import)", 2.0),
            (r"(?m)^\s*(if|elif|for|while|try|except|with)\b.*:\s*$", 1.5),
            (r"(?m)^\s*class \w+(\(.*\))?:\s*$", 2.0),
            (r"\bself\.", 1.0),
            (r"\b(None|True|False)\b", 0.5),
            (r"\bprint\(", 0.5),
        ],
    ),
    (
        Language::JavaScript,
        &[
            (r"\b(const|let|var)\s+\w+\s*=", 2.0),
            (r"=>", 1.0),
            (r"\bfunction\s*\w*\s*\(", 2.0),
            (r"console\.log\(", 2.0),
            (r#"\brequire\(['"]|^import .* from ['"]"#, 1.5),
            (r"===|!==", 1.5),
        ],
    ),
    (
        Language::TypeScript,
        &[
            (r":\s*(string|number|boolean|any|void)\b", 2.5),
            (r"\binterface\s+\w+\s*\{", 2.5),
            (r"(?m)^\s*(export\s+)?type\s+\w+\s*=", 1.5),
            (r"\b(const|let)\s+\w+\s*:\s*\w+", 1.5),
        ],
    ),
    (
        Language::Rust,
        &[
            (r"\bfn\s+\w+\s*(<[^>]*>)?\(", 2.5),
            (r"\blet\s+mut\b", 2.5),
            (r"(?m)^\s*(pub\s+)?(struct|enum|impl|trait|mod|use)\b", 1.5),
            (r"\b(println|vec|format|macro_rules)!", 2.0),
            (r"&(mut\s+)?self\b", 1.5),
            (r"\w::\w", 0.5),
        ],
    ),
    (
        Language::Go,
        &[
            (r"(?m)^package \w+", 3.0),
            (r"\bfunc\s+(\(\w+ \*?\w+\)\s*)?\w+\(", 2.5),
            (r":=", 1.5),
            (r"\bfmt\.\w+\(", 2.0),
        ],
    ),
    (
        Language::Java,
        &[
            (r"\bpublic\s+(static\s+)?(final\s+)?(class|void|interface)\b", 2.5),
            (r"System\.out\.print", 3.0),
            (r"(?m)^\s*(private|protected)\s+\w+(<.*>)?\s+\w+\s*[;=]", 1.5),
            (r"(?m)^import java\.", 3.0),
        ],
    ),
    (
        Language::CSharp,
        &[
            (r"(?m)^using System", 3.0),
            (r"Console\.Write", 3.0),
            (r"\bnamespace\s+[\w.]+", 1.5),
            (r"\{\s*get;\s*set;\s*\}", 3.0),
        ],
    ),
    (
        Language::Cpp,
        &[
            (r"(?m)^#include\s*[<\x22]", 3.0),
            (r"\bstd::", 2.0),
            (r"\b(cout|cin)\s*(<<|>>)", 2.0),
            (r"\btemplate\s*<", 2.0),
        ],
    ),
    (
        Language::Ruby,
        &[
            (r"(?m)^\s*def \w+[?!]?(\(.*\))?\s*$", 1.5),
            (r"(?m)^\s*end\s*$", 1.5),
            (r"\bputs\b", 1.5),
            (r"\.each\s+do\b|\bdo\s*\|\w+\|", 2.0),
            (r#"(?m)^\s*require ['"]"#, 1.0),
            (r"@\w+\s*=", 1.0),
        ],
    ),
    (
        Language::Php,
        &[
            (r"<\?php", 4.0),
            (r"\$\w+\s*=", 1.5),
            (r"\becho\b", 1.0),
            (r"->\w+\(", 0.5),
        ],
    ),
    (
        Language::Shell,
        &[
            (r"\A#!/(usr/)?bin/(env\s+)?(ba|z)?sh", 4.0),
            (r"(?m)^\s*(echo|export|cd|sudo|apt(-get)?|ls|grep|mkdir|rm)\s", 1.5),
            (r"(?m)^\s*(fi|done|esac)\s*$", 1.5),
            (r"\$\{\w+\}|\$\(\w", 1.0),
        ],
    ),
    (
        Language::Sql,
        &[
            (r"(?is)\bselect\b.+\bfrom\b", 3.0),
            (r"(?i)\b(insert\s+into|create\s+table|update\s+\w+\s+set|delete\s+from)\b", 3.0),
            (r"(?i)\b(where|join|group\s+by|order\s+by)\b", 1.0),
        ],
    ),
    (
        Language::Html,
        &[
            (r"(?i)<!DOCTYPE html>", 4.0),
            (r"(?i)</?(html|head|body|div|span|p|ul|li|table|script|style)\b[^>]*>", 2.0),
            (r#"\b(class|href|src)="[^"]*""#, 1.0),
        ],
    ),
    (
        Language::Xml,
        &[
            (r"\A\s*<\?xml", 4.0),
            (r"</\w+:\w+>", 1.5),
            (r"<\w+[^>]*/>", 0.5),
        ],
    ),
    (
        Language::Css,
        &[
            (r"(?m)^\s*[.#]?[\w-]+(\s*[,>+~ ]\s*[.#]?[\w-]+)*\s*\{\s*$", 1.5),
            (r"(?m)^\s*[\w-]+\s*:\s*[^;{}]+;\s*$", 1.5),
            (r"@media\b|@import\b", 2.0),
        ],
    ),
    (
        Language::Yaml,
        &[
            (r"(?m)^---\s*$", 2.0),
            (r"(?m)^\s*[\w-]+:\s+[^\s{\[]", 1.0),
            (r"(?m)^\s*-\s+[\w-]+:\s", 1.5),
        ],
    ),
    (
        Language::Toml,
        &[
            (r"(?m)^\[\[?[\w.-]+\]\]?\s*$", 2.5),
            (r#"(?m)^[\w-]+\s*=\s*("|\d|true|false|\[)"#, 1.5),
        ],
    ),
    (
        Language::Markdown,
        &[
            (r"(?m)^#{1,6}\s+\S", 2.0),
            (r"\[[^\]]+\]\([^)]+\)", 2.0),
            (r"(?m)^```", 1.5),
            (r"\*\*[^*\n]+\*\*", 1.0),
            (r"(?m)^\s*[-*]\s+\S", 0.5),
        ],
    ),
    (
        Language::Dockerfile,
        &[
            (r"(?m)^FROM\s+\S+", 3.0),
            (r"(?m)^(RUN|COPY|ADD|CMD|ENTRYPOINT|WORKDIR|ENV|EXPOSE)\s", 2.0),
        ],
    ),
    (
        Language::Lua,
        &[
            (r"\blocal\s+\w+\s*=", 1.5),
            (r"\bthen\b", 1.0),
            (r"(?m)^\s*end\s*$", 0.5),
            (r"\.\.\s*\w", 0.5),
            (r"\bfunction\s+\w+[.:]\w+\(", 2.0),
        ],
    ),
    (
        Language::Diff,
        &[
            (r"(?m)^@@ -\d+(,\d+)? \+\d+(,\d+)? @@", 4.0),
            (r"(?m)^(\+\+\+|---) \S", 2.0),
        ],
    ),
    (
        Language::Kotlin,
        &[(r"\bfun\s+\w+\(", 2.5), (r"\bval\s+\w+", 1.5), (r"\bwhen\s*\(", 1.0)],
    ),
    (
        Language::Swift,
        &[
            (r"\bguard\s+let\b", 3.0),
            (r"\bfunc\s+\w+\(.*\)\s*->\s*\w+", 1.5),
            (r"\bvar\s+\w+\s*:\s*\w+", 1.0),
        ],
    ),
    (
        Language::Scala,
        &[
            (r"\bobject\s+\w+(\s+extends\b)?", 2.0),
            (r"\bdef\s+\w+(\[.*\])?\(.*\)\s*:\s*\w+\s*=", 2.5),
            (r"\bcase\s+class\b", 3.0),
        ],
    ),
    (
        Language::Dart,
        &[(r"\bvoid\s+main\(\)", 2.0), (r"\bfinal\s+\w+\s+\w+\s*=", 1.5), (r"\bWidget\b", 2.0)],
    ),
    (
        Language::Clojure,
        &[(r"(?m)^\s*\((defn|ns|def|let)\s", 3.0), (r"\[\w+( \w+)*\]", 0.5)],
    ),
    (
        Language::Elixir,
        &[(r"\bdefmodule\b", 3.0), (r"\|>", 1.0), (r"(?m)^\s*defp?\s+\w+.*\bdo\s*$", 2.0)],
    ),
    (
        Language::Erlang,
        &[(r"(?m)^-module\(", 3.0), (r"(?m)^-export\(", 2.0), (r"->.*\.\s*$", 0.5)],
    ),
    (
        Language::Groovy,
        &[(r"\bdef\s+\w+\s*=", 1.5), (r"\bprintln\s+['\x22]", 2.0)],
    ),
    (
        Language::PowerShell,
        &[(r"\bWrite-(Host|Output)\b", 3.0), (r"\b(Get|Set|New)-[A-Z]\w+", 2.0), (r"\$\w+\s*=", 0.5)],
    ),
    (
        Language::Vue,
        &[(r"(?m)^<template>", 3.0), (r"\bv-(if|for|bind|model)\b", 2.0)],
    ),
    (
        Language::Svelte,
        &[(r"\{#(if|each|await)\b", 3.0), (r"\{/(if|each|await)\}", 2.0)],
    ),
];

/// The built-in regex scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    /// Per-language scores, best first.
    pub fn scores(&self, content: &str) -> Vec<(Language, f32)> {
        let mut end = content.len().min(MAX_SAMPLE);
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        let sample = &content[..end];

        let mut scores: Vec<(Language, f32)> = PROFILES
            .iter()
            .map(|profile| {
                let score = profile
                    .features
                    .iter()
                    .map(|f| f.weight * f.pattern.find_iter(sample).take(MATCH_CAP).count() as f32)
                    .sum();
                (profile.language, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));
        scores
    }
}

impl Classifier for HeuristicClassifier {
    fn classify(&self, content: &str) -> Classification {
        let scores = self.scores(content);
        let Some(&(language, best)) = scores.first() else {
            return Classification::none();
        };
        if best < MIN_SCORE {
            return Classification::none();
        }
        let total: f32 = scores.iter().map(|(_, s)| s).sum();
        let confidence = (best / total) * (best / (best + DAMPING));
        Classification {
            language: Some(language),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}
