#![warn(missing_docs)]
//! `editor-syntax-lexers` - built-in lexers and fold extractors for `editor-syntax`.
//!
//! Covers Java, JavaScript, JSON and Markdown. Every lexer is a pure per-line state machine, so the
//! incremental relexer in `editor-syntax` can reuse unchanged lines; every fold extractor makes one
//! forward pass over the document.
//!
//! Most hosts only need [`builtin_registry`]:
//!
//! ```rust
//! use editor_syntax::LanguageId;
//!
//! let registry = editor_syntax_lexers::builtin_registry();
//! assert!(registry.has_lexer(LanguageId::Java.as_str()));
//! assert!(registry.has_lexer("JS"));
//! ```

mod cstyle;
mod folds;
mod json;
mod markdown;
mod scanner;

pub use cstyle::{CStyleConfig, CStyleLexer, JAVA_KEYWORDS, JAVASCRIPT_KEYWORDS};
pub use folds::{CStyleFoldExtractor, JsonFoldExtractor, MarkdownFoldExtractor};
pub use json::JsonLexer;
pub use markdown::MarkdownLexer;

use editor_syntax::{LanguageId, LanguageRegistry};
use std::sync::Arc;

/// Register every built-in language into `registry`.
///
/// Existing entries for the same ids are replaced; plain text keeps the registry's fallback pair.
pub fn register_builtins(registry: &mut LanguageRegistry) {
    registry
        .register(
            LanguageId::Java.as_str(),
            Arc::new(CStyleLexer::java()),
            Arc::new(CStyleFoldExtractor::java()),
        )
        .register(
            LanguageId::JavaScript.as_str(),
            Arc::new(CStyleLexer::javascript()),
            Arc::new(CStyleFoldExtractor::javascript()),
        )
        .register(
            LanguageId::Json.as_str(),
            Arc::new(JsonLexer),
            Arc::new(JsonFoldExtractor),
        )
        .register(
            LanguageId::Markdown.as_str(),
            Arc::new(MarkdownLexer),
            Arc::new(MarkdownFoldExtractor),
        );
    log::debug!("registered built-in languages: {:?}", registry.languages());
}

/// A registry holding every built-in language.
pub fn builtin_registry() -> LanguageRegistry {
    let mut registry = LanguageRegistry::new();
    register_builtins(&mut registry);
    registry
}
