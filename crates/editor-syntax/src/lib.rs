#![warn(missing_docs)]
//! Editor Syntax - incremental tokenization and code folding for headless editors
//!
//! # Overview
//!
//! `editor-syntax` keeps per-line token annotations and foldable-region indices in step with a
//! rapidly mutating text buffer without blocking the interactive thread. Computation happens on
//! one worker thread per pipeline; only the newest document revision is ever surfaced.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SyntaxSession (lexing + folding)           │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Pipeline (debounce, revisions, dispatch)   │  ← Scheduling
//! ├─────────────────────────────────────────────┤
//! │  relex / FoldExtractor / VisibleLineMap     │  ← Pure computation
//! ├─────────────────────────────────────────────┤
//! │  Lexer / TokenMap / FoldMap                 │  ← Data model
//! ├─────────────────────────────────────────────┤
//! │  Document (Rope-based TextDocument)         │  ← Text access
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_syntax::relex::relex;
//! use editor_syntax::{CancelToken, PlainTextLexer};
//!
//! let lines = ["first", "second"];
//! let map = relex(None, &lines, 0, &PlainTextLexer, &CancelToken::new()).unwrap();
//! assert_eq!(map.line_count(), 2);
//! assert!(map.tokens_for_line(0).is_empty());
//! ```
//!
//! Built-in lexers and fold extractors for Java, JavaScript, JSON and Markdown live in the
//! `editor-syntax-lexers` crate.
//!
//! # Module Description
//!
//! - [`token`] - Tokens, lexer states and token maps
//! - [`lexer`] - The stateful line lexer trait
//! - [`relex`] - Incremental relexing with prefix/suffix reuse
//! - [`fold`] - Fold regions, extractors and the fold map
//! - [`visible`] - Logical ↔ visible line translation
//! - [`document`] - Document trait and the rope-backed `TextDocument`
//! - [`pipeline`] - Debounced, revision-tracked recomputation
//! - [`session`] - Lexing and folding for one document

pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod fold;
pub mod lexer;
pub mod line_index;
pub mod pipeline;
pub mod registry;
pub mod relex;
pub mod session;
pub mod token;
pub mod visible;

pub use cancel::CancelToken;
pub use config::PipelineConfig;
pub use dispatch::{Dispatcher, InlineDispatcher, QueueDispatcher, Task};
pub use document::{
    ChangeKind, ChangeListener, Document, DocumentChange, HistoryStep, ListenerId, TextDocument,
};
pub use error::{FoldError, LexError, PipelineError, RelexError};
pub use fold::{FoldExtractor, FoldKind, FoldMap, FoldRegion, NoFolds, OpenStack};
pub use lexer::{Lexer, LineLex, PlainTextLexer};
pub use line_index::LineIndex;
pub use pipeline::{
    Computation, ComputeContext, ConsumerId, FoldComputation, FoldLayout, FoldingPipeline,
    LexComputation, LexingPipeline, Phase, Pipeline, Request, Snapshot,
};
pub use registry::LanguageRegistry;
pub use relex::RelexStats;
pub use session::SyntaxSession;
pub use token::{LexState, LineTokens, Token, TokenCategory, TokenMap};
pub use visible::VisibleLineMap;

pub use editor_syntax_lang::{CommentConfig, LanguageId};
