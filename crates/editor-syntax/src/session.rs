//! One document, both pipelines.

use crate::config::PipelineConfig;
use crate::dispatch::Dispatcher;
use crate::document::Document;
use crate::error::PipelineError;
use crate::pipeline::{FoldLayout, FoldingPipeline, LexingPipeline, Snapshot};
use crate::registry::LanguageRegistry;
use crate::token::TokenMap;
use std::sync::Arc;

/// Lexing and folding pipelines bound to the same document and language.
///
/// # Example
///
/// ```rust
/// use editor_syntax::{InlineDispatcher, LanguageRegistry, PipelineConfig, SyntaxSession, TextDocument};
/// use std::sync::Arc;
///
/// let document = Arc::new(TextDocument::new("hello\nworld"));
/// let session = SyntaxSession::new(
///     document.clone(),
///     Arc::new(LanguageRegistry::new()),
///     Arc::new(InlineDispatcher),
///     "plaintext",
///     PipelineConfig::immediate(),
/// )
/// .unwrap();
///
/// document.insert(0, "> ");
/// assert_eq!(session.language().as_ref(), "plaintext");
/// session.dispose();
/// ```
pub struct SyntaxSession {
    document: Arc<dyn Document>,
    lexing: LexingPipeline,
    folding: FoldingPipeline,
}

impl SyntaxSession {
    /// Start both pipelines for `document`.
    pub fn new(
        document: Arc<dyn Document>,
        registry: Arc<LanguageRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        language: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let lexing = LexingPipeline::lexing(
            document.clone(),
            registry.clone(),
            dispatcher.clone(),
            language,
            config.clone(),
        )?;
        let folding =
            FoldingPipeline::folding(document.clone(), registry, dispatcher, language, config)?;
        Ok(Self {
            document,
            lexing,
            folding,
        })
    }

    /// The observed document.
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    /// The lexing pipeline.
    pub fn lexing(&self) -> &LexingPipeline {
        &self.lexing
    }

    /// The folding pipeline.
    pub fn folding(&self) -> &FoldingPipeline {
        &self.folding
    }

    /// Active language id.
    pub fn language(&self) -> Arc<str> {
        self.lexing.language()
    }

    /// Switch both pipelines to `language`.
    pub fn set_language(&self, language: &str) {
        self.lexing.set_language(language);
        self.folding.set_language(language);
    }

    /// Installed token map.
    pub fn token_map(&self) -> Option<Arc<Snapshot<TokenMap>>> {
        self.lexing.token_map()
    }

    /// Installed fold layout.
    pub fn fold_layout(&self) -> Option<Arc<Snapshot<FoldLayout>>> {
        self.folding.fold_layout()
    }

    /// Returns `true` when neither pipeline has work pending or running.
    pub fn is_idle(&self) -> bool {
        use crate::pipeline::Phase;
        self.lexing.phase() == Phase::Idle && self.folding.phase() == Phase::Idle
    }

    /// Dispose both pipelines.
    pub fn dispose(&self) {
        self.lexing.dispose();
        self.folding.dispose();
    }
}

impl std::fmt::Debug for SyntaxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxSession")
            .field("lexing", &self.lexing)
            .field("folding", &self.folding)
            .finish()
    }
}
