//! Nested-parse dispatch: from a block's language tag to a sub-grammar tree.

pub mod nested;
pub mod registry;

pub use nested::{Dispatcher, NestedTree};
pub use registry::{GrammarHandle, LanguageEntry, LanguageRegistry};
