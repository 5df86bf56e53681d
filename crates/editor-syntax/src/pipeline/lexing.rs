//! Token map pipeline.

use super::{ComputeContext, Computation, Pipeline};
use crate::config::PipelineConfig;
use crate::dispatch::Dispatcher;
use crate::document::Document;
use crate::error::PipelineError;
use crate::registry::LanguageRegistry;
use crate::relex::{relex, relex_with_stats};
use crate::token::{Token, TokenMap};
use log::trace;
use std::sync::Arc;

/// Incremental relexing of the whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexComputation;

impl Computation for LexComputation {
    type Output = TokenMap;

    fn name(&self) -> &'static str {
        "lexing"
    }

    fn compute(&self, ctx: &ComputeContext<'_, TokenMap>) -> Result<TokenMap, PipelineError> {
        let lexer = ctx.registry.lexer(&ctx.request.language);
        let (map, stats) = relex_with_stats(
            ctx.baseline,
            ctx.lines,
            ctx.request.dirty_start_line,
            lexer.as_ref(),
            ctx.cancel,
        )?;
        trace!(
            "lexing revision {}: reused {} + {} lines, relexed {}",
            ctx.request.revision, stats.reused_prefix, stats.reused_suffix, stats.relexed
        );
        Ok(map)
    }

    fn fallback(&self, ctx: &ComputeContext<'_, TokenMap>) -> Result<TokenMap, PipelineError> {
        let lexer = ctx.registry.fallback_lexer();
        Ok(relex(None, ctx.lines, 0, lexer.as_ref(), ctx.cancel)?)
    }
}

/// Pipeline keeping a [`TokenMap`] current.
pub type LexingPipeline = Pipeline<LexComputation>;

impl Pipeline<LexComputation> {
    /// Start a lexing pipeline for `document`.
    pub fn lexing(
        document: Arc<dyn Document>,
        registry: Arc<LanguageRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        language: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        Self::new(
            LexComputation,
            document,
            registry,
            dispatcher,
            language,
            config,
        )
    }

    /// Installed token map, if any computation has completed.
    pub fn token_map(&self) -> Option<Arc<super::Snapshot<TokenMap>>> {
        self.current()
    }

    /// Tokens of `line` in the installed map (empty when unknown).
    pub fn tokens_for_line(&self, line: usize) -> Vec<Token> {
        self.current()
            .map(|snapshot| snapshot.value.tokens_for_line(line).to_vec())
            .unwrap_or_default()
    }
}
