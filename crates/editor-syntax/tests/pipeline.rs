use editor_syntax::{
    Document, InlineDispatcher, LanguageRegistry, LexError, LexState, Lexer, LexingPipeline,
    LineLex, Phase, PipelineConfig, QueueDispatcher, TextDocument, Token, TokenCategory,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Every line becomes a single `Text` token.
struct LineLexer;

impl Lexer for LineLexer {
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

struct FailingLexer;

impl Lexer for FailingLexer {
    fn lex_line(&self, _line: &str, _entry: LexState) -> Result<LineLex, LexError> {
        Err(LexError::Failed("broken on purpose".to_string()))
    }
}

struct PanickingLexer;

impl Lexer for PanickingLexer {
    fn lex_line(&self, _line: &str, _entry: LexState) -> Result<LineLex, LexError> {
        panic!("lexer panicked on purpose")
    }
}

/// Like [`LineLexer`], but slow, counting every line it lexes.
struct SlowLexer {
    lexed: Arc<AtomicUsize>,
}

impl Lexer for SlowLexer {
    fn lex_line(&self, line: &str, entry: LexState) -> Result<LineLex, LexError> {
        sleep(Duration::from_millis(1));
        self.lexed.fetch_add(1, Ordering::SeqCst);
        LineLexer.lex_line(line, entry)
    }
}

/// Fails every line, but only once `open` is set.
struct GatedFailingLexer {
    entered: Arc<AtomicBool>,
    open: Arc<AtomicBool>,
}

impl Lexer for GatedFailingLexer {
    fn lex_line(&self, _line: &str, _entry: LexState) -> Result<LineLex, LexError> {
        self.entered.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + Duration::from_secs(5);
        while !self.open.load(Ordering::SeqCst) && Instant::now() < deadline {
            sleep(Duration::from_millis(1));
        }
        Err(LexError::Failed("gate closed".to_string()))
    }
}

fn registry() -> Arc<LanguageRegistry> {
    let mut registry = LanguageRegistry::new();
    registry
        .register_lexer("lines", Arc::new(LineLexer))
        .register_lexer("broken", Arc::new(FailingLexer))
        .register_lexer("panics", Arc::new(PanickingLexer));
    Arc::new(registry)
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(2));
    }
    condition()
}

fn settled(pipeline: &LexingPipeline) -> bool {
    pipeline.phase() == Phase::Idle && pipeline.applied_revision() == pipeline.revision()
}

fn start(
    document: &Arc<TextDocument>,
    registry: Arc<LanguageRegistry>,
    language: &str,
    config: PipelineConfig,
) -> LexingPipeline {
    LexingPipeline::lexing(
        document.clone(),
        registry,
        Arc::new(InlineDispatcher),
        language,
        config,
    )
    .unwrap()
}

#[test]
fn test_initial_computation_installs_snapshot() {
    let document = Arc::new(TextDocument::new("alpha\n\nbeta"));
    let pipeline = start(&document, registry(), "lines", PipelineConfig::immediate());

    assert!(wait_for(|| settled(&pipeline)));
    let snapshot = pipeline.token_map().unwrap();
    assert_eq!(snapshot.revision, 1);
    assert_eq!(snapshot.language.as_ref(), "lines");
    assert!(!snapshot.fallback);
    assert_eq!(snapshot.value.line_count(), 3);
    assert_eq!(pipeline.tokens_for_line(0), vec![Token::new(0, 5, TokenCategory::Text)]);
    assert!(pipeline.tokens_for_line(1).is_empty());
}

#[test]
fn test_rapid_edits_coalesce_into_one_computation() {
    let document = Arc::new(TextDocument::new("x"));
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(150));
    let pipeline = start(&document, registry(), "lines", config);
    assert!(wait_for(|| settled(&pipeline)));

    let installs = Arc::new(AtomicUsize::new(0));
    let counter = installs.clone();
    pipeline.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for i in 0..10 {
        document.insert(i, "y");
    }
    assert_eq!(pipeline.revision(), 11);
    assert!(wait_for(|| settled(&pipeline)));

    assert_eq!(installs.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.applied_revision(), 11);
    assert_eq!(
        pipeline.tokens_for_line(0),
        vec![Token::new(0, 11, TokenCategory::Text)]
    );
}

#[test]
fn test_installed_revisions_increase() {
    let document = Arc::new(TextDocument::new("start"));
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(1));
    let pipeline = start(&document, registry(), "lines", config);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    pipeline.subscribe(move |snapshot| sink.lock().push(snapshot.revision));

    for i in 0..40 {
        document.insert(0, if i % 2 == 0 { "a\n" } else { "b" });
        if i % 5 == 0 {
            sleep(Duration::from_millis(3));
        }
    }
    assert!(wait_for(|| settled(&pipeline)));

    let seen = seen.lock().clone();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "{seen:?}");
    assert_eq!(seen.last().copied(), Some(pipeline.revision()));
    assert_eq!(
        pipeline.token_map().unwrap().value.line_count(),
        document.line_count()
    );
}

#[test]
fn test_dispose_mid_debounce_suppresses_callbacks() {
    let document = Arc::new(TextDocument::new("x"));
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(100));
    let pipeline = start(&document, registry(), "lines", config);
    assert!(wait_for(|| settled(&pipeline)));

    let installs = Arc::new(AtomicUsize::new(0));
    let counter = installs.clone();
    pipeline.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    document.insert(0, "more ");
    assert_eq!(pipeline.phase(), Phase::Pending);
    pipeline.dispose();
    assert!(pipeline.is_disposed());

    sleep(Duration::from_millis(250));
    document.insert(0, "after ");
    sleep(Duration::from_millis(50));

    assert_eq!(installs.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.applied_revision(), 1);
    assert_eq!(pipeline.phase(), Phase::Idle);
}

#[test]
fn test_failing_lexer_falls_back_to_plain_text() {
    let document = Arc::new(TextDocument::new("one\ntwo"));
    let pipeline = start(&document, registry(), "broken", PipelineConfig::immediate());

    assert!(wait_for(|| settled(&pipeline)));
    let snapshot = pipeline.token_map().unwrap();
    assert!(snapshot.fallback);
    assert_eq!(snapshot.value.line_count(), 2);
    assert_eq!(snapshot.value.token_count(), 0);
    assert!(!pipeline.is_halted());
}

#[test]
fn test_panicking_lexer_falls_back_to_plain_text() {
    let document = Arc::new(TextDocument::new("one"));
    let pipeline = start(&document, registry(), "panics", PipelineConfig::immediate());

    assert!(wait_for(|| settled(&pipeline)));
    assert!(pipeline.token_map().unwrap().fallback);
}

#[test]
fn test_double_failure_halts_until_next_change() {
    let mut registry = LanguageRegistry::new().with_fallback_lexer(Arc::new(FailingLexer));
    registry.register_lexer("lines", Arc::new(LineLexer));
    let document = Arc::new(TextDocument::new("one"));
    let pipeline = start(&document, Arc::new(registry), "broken", PipelineConfig::immediate());

    assert!(wait_for(|| pipeline.is_halted() && pipeline.phase() == Phase::Idle));
    assert!(pipeline.token_map().is_none());

    pipeline.set_language("lines");
    assert!(wait_for(|| settled(&pipeline)));
    assert!(!pipeline.is_halted());
    let snapshot = pipeline.token_map().unwrap();
    assert_eq!(snapshot.language.as_ref(), "lines");
    assert_eq!(snapshot.value.token_count(), 1);
}

#[test]
fn test_language_change_forces_full_recompute() {
    let document = Arc::new(TextDocument::new("a\nb"));
    let pipeline = start(&document, registry(), "plaintext", PipelineConfig::immediate());
    assert!(wait_for(|| settled(&pipeline)));
    assert_eq!(pipeline.token_map().unwrap().value.token_count(), 0);

    pipeline.set_language("lines");
    assert_eq!(pipeline.language().as_ref(), "lines");
    assert!(wait_for(|| settled(&pipeline)));
    let snapshot = pipeline.token_map().unwrap();
    assert_eq!(snapshot.language.as_ref(), "lines");
    assert_eq!(snapshot.value.token_count(), 2);
}

#[test]
fn test_queue_dispatcher_defers_install_to_host_thread() {
    let document = Arc::new(TextDocument::new("queued"));
    let queue = Arc::new(QueueDispatcher::new());
    let pipeline = LexingPipeline::lexing(
        document.clone(),
        registry(),
        queue.clone(),
        "lines",
        PipelineConfig::immediate(),
    )
    .unwrap();

    assert!(queue.run_next_timeout(Duration::from_secs(5)));
    assert_eq!(pipeline.applied_revision(), 1);
    assert_eq!(pipeline.tokens_for_line(0).len(), 1);
}

#[test]
fn test_result_superseded_before_install_is_dropped() {
    let document = Arc::new(TextDocument::new("v1"));
    let queue = Arc::new(QueueDispatcher::new());
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(50));
    let pipeline = LexingPipeline::lexing(
        document.clone(),
        registry(),
        queue.clone(),
        "lines",
        config,
    )
    .unwrap();

    // Let revision 1 finish and queue its install, then mutate before draining.
    assert!(wait_for(|| pipeline.phase() == Phase::Idle));
    sleep(Duration::from_millis(20));
    document.insert(0, "x");
    queue.run_pending();
    assert!(pipeline.token_map().is_none());

    assert!(wait_for(|| {
        queue.run_pending();
        pipeline.applied_revision() == 2
    }));
    assert_eq!(pipeline.tokens_for_line(0), vec![Token::new(0, 3, TokenCategory::Text)]);
}

#[test]
fn test_edit_during_run_cancels_stale_revision() {
    const LINES: usize = 300;
    let lexed = Arc::new(AtomicUsize::new(0));
    let mut registry = LanguageRegistry::new();
    registry.register_lexer(
        "slow",
        Arc::new(SlowLexer {
            lexed: lexed.clone(),
        }),
    );
    let text = vec!["line"; LINES].join("\n");
    let document = Arc::new(TextDocument::new(&text));
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(20));
    let pipeline = start(&document, Arc::new(registry), "slow", config);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    pipeline.subscribe(move |snapshot| sink.lock().push(snapshot.revision));

    assert!(wait_for(|| lexed.load(Ordering::SeqCst) >= 10));
    assert_eq!(pipeline.phase(), Phase::Running);
    document.insert(0, "x");
    assert!(wait_for(|| settled(&pipeline)));

    assert_eq!(*seen.lock(), vec![2]);
    // The first run stopped early; the second one lexed every line.
    assert!(lexed.load(Ordering::SeqCst) < 2 * LINES);
    assert_eq!(
        pipeline.tokens_for_line(0),
        vec![Token::new(0, 5, TokenCategory::Text)]
    );
}

#[test]
fn test_consumer_disposing_pipeline_stops_remaining_consumers() {
    let document = Arc::new(TextDocument::new("x"));
    let config = PipelineConfig::new().with_initial_delay(Duration::from_millis(50));
    let pipeline = Arc::new(start(&document, registry(), "lines", config));

    let weak = Arc::downgrade(&pipeline);
    pipeline.subscribe(move |_| {
        if let Some(pipeline) = weak.upgrade() {
            pipeline.dispose();
        }
    });
    let later_calls = Arc::new(AtomicUsize::new(0));
    let counter = later_calls.clone();
    pipeline.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(wait_for(|| pipeline.is_disposed()));
    sleep(Duration::from_millis(20));
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.applied_revision(), 1);
}

#[test]
fn test_failure_with_newer_request_pending_does_not_halt() {
    let entered = Arc::new(AtomicBool::new(false));
    let open = Arc::new(AtomicBool::new(false));
    let mut registry = LanguageRegistry::new().with_fallback_lexer(Arc::new(GatedFailingLexer {
        entered: entered.clone(),
        open: open.clone(),
    }));
    registry.register_lexer("broken", Arc::new(FailingLexer));
    let document = Arc::new(TextDocument::new("one"));
    let config = PipelineConfig::new()
        .with_initial_delay(Duration::ZERO)
        .with_debounce(Duration::from_millis(300));
    let pipeline = start(&document, Arc::new(registry), "broken", config);

    // The fallback is running; a newer edit arrives before it fails.
    assert!(wait_for(|| entered.load(Ordering::SeqCst)));
    document.insert(0, "x");
    open.store(true, Ordering::SeqCst);

    assert!(wait_for(|| pipeline.phase() == Phase::Pending));
    assert!(!pipeline.is_halted());

    // The retry fails too and nothing newer is waiting.
    assert!(wait_for(|| pipeline.is_halted() && pipeline.phase() == Phase::Idle));
    assert!(pipeline.token_map().is_none());
}
