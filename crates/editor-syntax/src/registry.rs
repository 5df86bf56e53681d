//! Language registry.
//!
//! Maps normalized language ids to a [`Lexer`] and a [`FoldExtractor`]. Lookups never fail: an
//! unknown id resolves to the fallback pair, which is plain text unless overridden.

use crate::fold::{FoldExtractor, NoFolds};
use crate::lexer::{Lexer, PlainTextLexer};
use editor_syntax_lang::{PLAIN_TEXT_ID, normalize_language_id};
use std::collections::HashMap;
use std::sync::Arc;

/// Language id → lexer / fold extractor table.
#[derive(Clone)]
pub struct LanguageRegistry {
    lexers: HashMap<String, Arc<dyn Lexer>>,
    extractors: HashMap<String, Arc<dyn FoldExtractor>>,
    fallback_lexer: Arc<dyn Lexer>,
    fallback_extractor: Arc<dyn FoldExtractor>,
}

impl LanguageRegistry {
    /// A registry that only knows plain text.
    pub fn new() -> Self {
        Self {
            lexers: HashMap::new(),
            extractors: HashMap::new(),
            fallback_lexer: Arc::new(PlainTextLexer),
            fallback_extractor: Arc::new(NoFolds),
        }
    }

    /// Normalize a language id the way lookups do.
    pub fn normalize(id: &str) -> String {
        normalize_language_id(id)
    }

    /// Id used for the fallback pair.
    pub fn fallback_id() -> &'static str {
        PLAIN_TEXT_ID
    }

    /// Register both halves of a language.
    pub fn register(
        &mut self,
        id: &str,
        lexer: Arc<dyn Lexer>,
        extractor: Arc<dyn FoldExtractor>,
    ) -> &mut Self {
        self.register_lexer(id, lexer).register_fold_extractor(id, extractor)
    }

    /// Register (or replace) the lexer for `id`.
    pub fn register_lexer(&mut self, id: &str, lexer: Arc<dyn Lexer>) -> &mut Self {
        self.lexers.insert(Self::normalize(id), lexer);
        self
    }

    /// Register (or replace) the fold extractor for `id`.
    pub fn register_fold_extractor(
        &mut self,
        id: &str,
        extractor: Arc<dyn FoldExtractor>,
    ) -> &mut Self {
        self.extractors.insert(Self::normalize(id), extractor);
        self
    }

    /// Replace the lexer used for unknown ids.
    pub fn with_fallback_lexer(mut self, lexer: Arc<dyn Lexer>) -> Self {
        self.fallback_lexer = lexer;
        self
    }

    /// Replace the fold extractor used for unknown ids.
    pub fn with_fallback_fold_extractor(mut self, extractor: Arc<dyn FoldExtractor>) -> Self {
        self.fallback_extractor = extractor;
        self
    }

    /// Lexer for `id`, or the fallback.
    pub fn lexer(&self, id: &str) -> Arc<dyn Lexer> {
        self.lexers
            .get(&Self::normalize(id))
            .cloned()
            .unwrap_or_else(|| self.fallback_lexer.clone())
    }

    /// Fold extractor for `id`, or the fallback.
    pub fn fold_extractor(&self, id: &str) -> Arc<dyn FoldExtractor> {
        self.extractors
            .get(&Self::normalize(id))
            .cloned()
            .unwrap_or_else(|| self.fallback_extractor.clone())
    }

    /// The lexer used when a language fails or is unknown.
    pub fn fallback_lexer(&self) -> Arc<dyn Lexer> {
        self.fallback_lexer.clone()
    }

    /// The fold extractor used when a language fails or is unknown.
    pub fn fallback_fold_extractor(&self) -> Arc<dyn FoldExtractor> {
        self.fallback_extractor.clone()
    }

    /// Returns `true` if a lexer is registered for `id`.
    pub fn has_lexer(&self, id: &str) -> bool {
        self.lexers.contains_key(&Self::normalize(id))
    }

    /// Registered language ids (lexer or extractor), sorted.
    pub fn languages(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lexers
            .keys()
            .chain(self.extractors.keys())
            .cloned()
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::error::LexError;
    use crate::lexer::LineLex;
    use crate::token::{LexState, Token, TokenCategory};

    struct WordLexer;

    impl Lexer for WordLexer {
        fn lex_line(&self, line: &str, _entry: LexState) -> Result<LineLex, LexError> {
            let len = line.chars().count();
            let tokens = if len == 0 {
                Vec::new()
            } else {
                vec![Token::new(0, len, TokenCategory::Text)]
            };
            Ok(LineLex::new(tokens, LexState::DEFAULT))
        }
    }

    #[test]
    fn test_lookup_is_normalized() {
        let mut registry = LanguageRegistry::new();
        registry.register_lexer("JavaScript", Arc::new(WordLexer));

        assert!(registry.has_lexer("js"));
        assert!(registry.has_lexer("  javascript "));
        let out = registry.lexer("jsx").lex_line("abc", LexState::DEFAULT).unwrap();
        assert_eq!(out.tokens.len(), 1);
        assert_eq!(registry.languages(), vec!["javascript".to_string()]);
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let registry = LanguageRegistry::default();
        assert!(!registry.has_lexer("cobol"));
        let out = registry.lexer("cobol").lex_line("MOVE A", LexState::DEFAULT).unwrap();
        assert!(out.tokens.is_empty());
        let folds = registry
            .fold_extractor("cobol")
            .extract(&["{".to_string(), "}".to_string()], &CancelToken::new())
            .unwrap();
        assert!(folds.is_empty());
        assert_eq!(LanguageRegistry::fallback_id(), "plaintext");
    }

    #[test]
    fn test_fallback_can_be_replaced() {
        let registry = LanguageRegistry::new().with_fallback_lexer(Arc::new(WordLexer));
        let out = registry.lexer("anything").lex_line("x", LexState::DEFAULT).unwrap();
        assert_eq!(out.tokens.len(), 1);
    }
}
