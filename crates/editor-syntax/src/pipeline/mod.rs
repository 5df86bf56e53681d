//! Debounced, revision-tracked recomputation.
//!
//! A [`Pipeline`] keeps one derived value (a token map, a fold layout) in step with a
//! [`Document`]. Every mutation bumps a revision counter and merges into a single pending
//! [`Request`]; a dedicated worker thread runs the [`Computation`] once the debounce delay has
//! passed without further mutations. Results are only installed if they still match the newest
//! revision, so consumers never observe a snapshot older than one they have already seen.
//!
//! ```text
//!  mutation ──► schedule() ──► pending slot ──► worker (after debounce) ──► compute
//!                                                                              │
//!  consumers ◄── Dispatcher (interactive thread) ◄── revision still current? ◄─┘
//! ```
//!
//! A failing computation (an `Err` or a panic) falls back to the plain-text result for that
//! revision. If the fallback fails too, the previous snapshot stays and the pipeline halts until
//! the next mutation or language change.

mod folding;
mod lexing;

pub use folding::{FoldComputation, FoldLayout, FoldingPipeline};
pub use lexing::{LexComputation, LexingPipeline};

use crate::cancel::CancelToken;
use crate::config::PipelineConfig;
use crate::dispatch::Dispatcher;
use crate::document::{Document, DocumentChange, ListenerId};
use crate::error::PipelineError;
use crate::registry::LanguageRegistry;
use arc_swap::ArcSwapOption;
use log::{debug, error, warn};
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A recomputation request; at most one is pending per pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Revision this request brings the result up to.
    pub revision: u64,
    /// First line that may have changed.
    pub dirty_start_line: usize,
    /// Ignore any previous result.
    pub force_full: bool,
    /// Normalized language id to compute for.
    pub language: Arc<str>,
}

impl Request {
    /// Fold a newer request into this one.
    pub fn merge(&mut self, newer: Request) {
        self.revision = self.revision.max(newer.revision);
        self.dirty_start_line = self.dirty_start_line.min(newer.dirty_start_line);
        self.force_full |= newer.force_full;
        self.language = newer.language;
    }
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending.
    Idle,
    /// A request waits for its debounce delay.
    Pending,
    /// The worker is computing.
    Running,
}

/// An installed result.
#[derive(Debug)]
pub struct Snapshot<T> {
    /// Revision the value was computed for.
    pub revision: u64,
    /// Language whose lexer / extractor produced the value.
    pub language: Arc<str>,
    /// Produced by the plain-text fallback after a failure.
    pub fallback: bool,
    /// The value itself.
    pub value: T,
}

/// Everything a [`Computation`] may look at for one run.
pub struct ComputeContext<'a, T> {
    /// The request being served.
    pub request: &'a Request,
    /// Previous result to reuse, if it is compatible with the request.
    pub baseline: Option<&'a T>,
    /// Document lines, read when the run started.
    pub lines: &'a [String],
    /// Language lookup.
    pub registry: &'a LanguageRegistry,
    /// Fires when a newer mutation arrives or the pipeline is disposed.
    pub cancel: &'a CancelToken,
}

/// The work a [`Pipeline`] schedules.
pub trait Computation: Send + Sync + 'static {
    /// Value kept in the snapshot.
    type Output: Send + Sync + 'static;

    /// Short name used for logging and the worker thread name.
    fn name(&self) -> &'static str;

    /// Compute the value for the request's language.
    fn compute(&self, ctx: &ComputeContext<'_, Self::Output>) -> Result<Self::Output, PipelineError>;

    /// Compute the plain-text value after [`Computation::compute`] failed.
    fn fallback(&self, ctx: &ComputeContext<'_, Self::Output>) -> Result<Self::Output, PipelineError>;

    /// Combine a fresh result with the installed one right before it is installed.
    fn reconcile(&self, _current: Option<&Self::Output>, fresh: Self::Output) -> Self::Output {
        fresh
    }
}

/// Callback receiving every installed snapshot.
pub type Consumer<T> = Arc<dyn Fn(&Arc<Snapshot<T>>) + Send + Sync>;

/// Handle returned by [`Pipeline::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

enum WorkerMsg {
    Schedule(Duration),
    Shutdown,
}

/// What the worker does after a run.
enum AfterRun {
    Wait,
    RunAgain,
}

struct Slot {
    revision: u64,
    pending: Option<Request>,
    phase: Phase,
    running: Option<CancelToken>,
    language: Arc<str>,
}

struct Shared<C: Computation> {
    computation: C,
    document: Arc<dyn Document>,
    registry: Arc<LanguageRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
    config: PipelineConfig,
    current: ArcSwapOption<Snapshot<C::Output>>,
    slot: Mutex<Slot>,
    /// Serializes installs, fold mutations and disposal. Reentrant so consumers may call back in.
    apply_lock: ReentrantMutex<()>,
    consumers: Mutex<Vec<(ConsumerId, Consumer<C::Output>)>>,
    next_consumer: AtomicU64,
    tx: Mutex<Option<mpsc::Sender<WorkerMsg>>>,
    disposed: AtomicBool,
    halted: AtomicBool,
}

/// A debounced recomputation pipeline bound to one document.
pub struct Pipeline<C: Computation> {
    shared: Arc<Shared<C>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<ListenerId>>,
}

impl<C: Computation> Pipeline<C> {
    /// Start a pipeline and schedule its first computation after `config.initial_delay`.
    pub fn new(
        computation: C,
        document: Arc<dyn Document>,
        registry: Arc<LanguageRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
        language: &str,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let (tx, rx) = mpsc::channel();
        let thread_name = config
            .thread_name
            .clone()
            .unwrap_or_else(|| format!("editor-syntax-{}", computation.name()));

        let shared = Arc::new(Shared {
            computation,
            document: document.clone(),
            registry,
            dispatcher,
            current: ArcSwapOption::empty(),
            slot: Mutex::new(Slot {
                revision: 0,
                pending: None,
                phase: Phase::Idle,
                running: None,
                language: LanguageRegistry::normalize(language).into(),
            }),
            apply_lock: ReentrantMutex::new(()),
            consumers: Mutex::new(Vec::new()),
            next_consumer: AtomicU64::new(0),
            tx: Mutex::new(Some(tx)),
            disposed: AtomicBool::new(false),
            halted: AtomicBool::new(false),
            config,
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker_loop(worker_shared, rx))?;

        let weak: Weak<Shared<C>> = Arc::downgrade(&shared);
        let listener = document.add_listener(Arc::new(move |change: &DocumentChange| {
            if let Some(shared) = weak.upgrade() {
                shared.on_document_change(change);
            }
        }));

        let initial_delay = shared.config.initial_delay;
        shared.schedule(0, true, None, initial_delay);

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
            listener: Mutex::new(Some(listener)),
        })
    }

    /// The computation this pipeline runs.
    pub fn computation(&self) -> &C {
        &self.shared.computation
    }

    /// The document this pipeline observes.
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.shared.document
    }

    /// Last installed snapshot.
    pub fn current(&self) -> Option<Arc<Snapshot<C::Output>>> {
        self.shared.current.load_full()
    }

    /// Newest revision requested so far.
    pub fn revision(&self) -> u64 {
        self.shared.slot.lock().revision
    }

    /// Revision of the installed snapshot (0 before the first install).
    pub fn applied_revision(&self) -> u64 {
        self.shared
            .current
            .load_full()
            .map_or(0, |snapshot| snapshot.revision)
    }

    /// Current scheduler phase.
    pub fn phase(&self) -> Phase {
        self.shared.slot.lock().phase
    }

    /// Returns `true` after both the computation and its fallback failed.
    pub fn is_halted(&self) -> bool {
        self.shared.halted.load(Ordering::Acquire)
    }

    /// Returns `true` once [`Pipeline::dispose`] ran.
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    /// Active (normalized) language id.
    pub fn language(&self) -> Arc<str> {
        self.shared.slot.lock().language.clone()
    }

    /// Switch language; forces a full recomputation.
    pub fn set_language(&self, language: &str) {
        let language: Arc<str> = LanguageRegistry::normalize(language).into();
        debug!(
            "{}: language changed to {}",
            self.shared.computation.name(),
            language
        );
        let debounce = self.shared.config.debounce;
        self.shared.schedule(0, true, Some(language), debounce);
    }

    /// Request a recomputation from `dirty_start_line` as if the document had changed there.
    pub fn invalidate(&self, dirty_start_line: usize, force_full: bool) {
        let debounce = self.shared.config.debounce;
        self.shared
            .schedule(dirty_start_line, force_full, None, debounce);
    }

    /// Register a consumer for installed snapshots.
    pub fn subscribe<F>(&self, consumer: F) -> ConsumerId
    where
        F: Fn(&Arc<Snapshot<C::Output>>) + Send + Sync + 'static,
    {
        let id = ConsumerId(self.shared.next_consumer.fetch_add(1, Ordering::Relaxed));
        self.shared.consumers.lock().push((id, Arc::new(consumer)));
        id
    }

    /// Remove a consumer; returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ConsumerId) -> bool {
        let mut consumers = self.shared.consumers.lock();
        let before = consumers.len();
        consumers.retain(|(existing, _)| *existing != id);
        consumers.len() != before
    }

    /// Replace the installed value without recomputing.
    ///
    /// `update` returns `None` to leave the snapshot unchanged. Returns `true` if a new snapshot
    /// was installed (and consumers notified).
    pub(crate) fn modify<F>(&self, update: F) -> bool
    where
        F: FnOnce(&C::Output) -> Option<C::Output>,
    {
        let _guard = self.shared.apply_lock.lock();
        if self.is_disposed() {
            return false;
        }
        let Some(current) = self.shared.current.load_full() else {
            return false;
        };
        let Some(value) = update(&current.value) else {
            return false;
        };
        let snapshot = Arc::new(Snapshot {
            revision: current.revision,
            language: current.language.clone(),
            fallback: current.fallback,
            value,
        });
        self.shared.current.store(Some(snapshot.clone()));
        self.shared.notify(&snapshot);
        true
    }

    /// Detach from the document, cancel in-flight work and stop the worker.
    ///
    /// No consumer is called once this returns. Calling it again is a no-op.
    pub fn dispose(&self) {
        {
            let _guard = self.shared.apply_lock.lock();
            if self.shared.disposed.swap(true, Ordering::AcqRel) {
                return;
            }
            self.shared.consumers.lock().clear();
        }

        if let Some(id) = self.listener.lock().take() {
            self.shared.document.remove_listener(id);
        }

        {
            let mut slot = self.shared.slot.lock();
            slot.pending = None;
            slot.phase = Phase::Idle;
            if let Some(cancel) = slot.running.take() {
                cancel.cancel();
            }
        }

        if let Some(tx) = self.shared.tx.lock().take() {
            let _ = tx.send(WorkerMsg::Shutdown);
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.thread().id() == thread::current().id() {
                // Disposed from a consumer running on the worker; it exits on its own.
                return;
            }
            if handle.join().is_err() {
                error!("{}: worker thread panicked", self.shared.computation.name());
            }
        }
        debug!("{}: disposed", self.shared.computation.name());
    }
}

impl<C: Computation> Drop for Pipeline<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<C: Computation> std::fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("Pipeline")
            .field("computation", &self.shared.computation.name())
            .field("language", &slot.language)
            .field("revision", &slot.revision)
            .field("phase", &slot.phase)
            .field("applied_revision", &self.applied_revision())
            .finish()
    }
}

impl<C: Computation> Shared<C> {
    fn on_document_change(&self, change: &DocumentChange) {
        let dirty_start_line = if change.is_wholesale() {
            0
        } else {
            self.document.line_of_offset(change.offset)
        };
        self.schedule(
            dirty_start_line,
            change.is_wholesale(),
            None,
            self.config.debounce,
        );
    }

    fn schedule(
        &self,
        dirty_start_line: usize,
        force_full: bool,
        language: Option<Arc<str>>,
        delay: Duration,
    ) {
        {
            let mut slot = self.slot.lock();
            if self.disposed.load(Ordering::Acquire) {
                return;
            }
            if let Some(language) = language {
                slot.language = language;
            }
            slot.revision += 1;
            let request = Request {
                revision: slot.revision,
                dirty_start_line,
                force_full,
                language: slot.language.clone(),
            };
            match slot.pending.as_mut() {
                Some(pending) => pending.merge(request),
                None => slot.pending = Some(request),
            }
            if let Some(cancel) = &slot.running {
                cancel.cancel();
            }
            if slot.phase == Phase::Idle {
                slot.phase = Phase::Pending;
            }
            self.halted.store(false, Ordering::Release);
            debug!(
                "{}: revision {} scheduled (dirty from line {}, force_full {})",
                self.computation.name(),
                slot.revision,
                dirty_start_line,
                force_full
            );
        }

        if let Some(tx) = self.tx.lock().as_ref() {
            let _ = tx.send(WorkerMsg::Schedule(delay));
        }
    }

    /// Serve the pending request on the worker thread.
    fn run_pending(self: &Arc<Self>) -> AfterRun {
        let (request, cancel) = {
            let mut slot = self.slot.lock();
            if self.disposed.load(Ordering::Acquire) {
                return AfterRun::Wait;
            }
            let Some(request) = slot.pending.take() else {
                slot.phase = Phase::Idle;
                return AfterRun::Wait;
            };
            let cancel = CancelToken::new();
            slot.running = Some(cancel.clone());
            slot.phase = Phase::Running;
            (request, cancel)
        };

        let lines = self.document.lines();
        let baseline = self.current.load_full().filter(|snapshot| {
            !request.force_full && !snapshot.fallback && snapshot.language == request.language
        });
        let ctx = ComputeContext {
            request: &request,
            baseline: baseline.as_deref().map(|snapshot| &snapshot.value),
            lines: &lines,
            registry: self.registry.as_ref(),
            cancel: &cancel,
        };
        let result = self.attempt(&ctx);
        drop(baseline);
        let failed = matches!(&result, Err(err) if !err.is_cancelled());

        let stale = {
            let mut slot = self.slot.lock();
            slot.running = None;
            slot.phase = if slot.pending.is_some() {
                Phase::Pending
            } else {
                Phase::Idle
            };
            let stale = request.revision != slot.revision;
            // A newer request already cleared the flag and will retry.
            if failed && !stale {
                self.halted.store(true, Ordering::Release);
            }
            stale
        };

        match result {
            Err(err) if err.is_cancelled() => {
                debug!(
                    "{}: revision {} cancelled",
                    self.computation.name(),
                    request.revision
                );
                AfterRun::Wait
            }
            Err(_) => AfterRun::Wait,
            Ok(_) if stale => {
                debug!(
                    "{}: discarding stale result for revision {}",
                    self.computation.name(),
                    request.revision
                );
                AfterRun::RunAgain
            }
            Ok((value, fallback)) => {
                self.deliver(request, value, fallback);
                AfterRun::Wait
            }
        }
    }

    /// Run the computation, falling back to plain text on failure.
    ///
    /// `Ok((value, true))` marks a fallback result. An `Err` other than cancellation means both
    /// attempts failed.
    fn attempt(
        &self,
        ctx: &ComputeContext<'_, C::Output>,
    ) -> Result<(C::Output, bool), PipelineError> {
        let err = match guarded(|| self.computation.compute(ctx)) {
            Ok(value) => return Ok((value, false)),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(err) => err,
        };
        warn!(
            "{}: {} failed at revision {} (dirty from line {}): {}; falling back to plain text",
            self.computation.name(),
            ctx.request.language,
            ctx.request.revision,
            ctx.request.dirty_start_line,
            err
        );

        let fallback_ctx = ComputeContext {
            baseline: None,
            ..*ctx
        };
        match guarded(|| self.computation.fallback(&fallback_ctx)) {
            Ok(value) => Ok((value, true)),
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                error!(
                    "{}: plain-text fallback failed for {} at revision {}: {}; keeping revision {}",
                    self.computation.name(),
                    ctx.request.language,
                    ctx.request.revision,
                    err,
                    self.current.load_full().map_or(0, |s| s.revision)
                );
                Err(err)
            }
        }
    }

    /// Hand a finished result to the dispatcher for installation.
    fn deliver(self: &Arc<Self>, request: Request, value: C::Output, fallback: bool) {
        let shared = self.clone();
        self.dispatcher.dispatch(Box::new(move || {
            shared.install(request, value, fallback);
        }));
    }

    /// Runs on the interactive thread.
    fn install(&self, request: Request, value: C::Output, fallback: bool) {
        let _guard = self.apply_lock.lock();
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if self.slot.lock().revision != request.revision {
            debug!(
                "{}: revision {} superseded before install",
                self.computation.name(),
                request.revision
            );
            return;
        }
        let current = self.current.load_full();
        if current
            .as_ref()
            .is_some_and(|snapshot| snapshot.revision >= request.revision)
        {
            return;
        }

        let value = self
            .computation
            .reconcile(current.as_deref().map(|snapshot| &snapshot.value), value);
        let snapshot = Arc::new(Snapshot {
            revision: request.revision,
            language: request.language,
            fallback,
            value,
        });
        self.current.store(Some(snapshot.clone()));
        debug!(
            "{}: installed revision {}",
            self.computation.name(),
            snapshot.revision
        );
        self.notify(&snapshot);
    }

    fn notify(&self, snapshot: &Arc<Snapshot<C::Output>>) {
        let consumers: Vec<Consumer<C::Output>> = self
            .consumers
            .lock()
            .iter()
            .map(|(_, consumer)| consumer.clone())
            .collect();
        for consumer in consumers {
            // A consumer may have disposed the pipeline.
            if self.disposed.load(Ordering::Acquire) {
                break;
            }
            consumer(snapshot);
        }
    }
}

fn worker_loop<C: Computation>(shared: Arc<Shared<C>>, rx: mpsc::Receiver<WorkerMsg>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let msg = match deadline {
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            Some(at) => rx.recv_timeout(at.saturating_duration_since(Instant::now())),
        };
        match msg {
            Ok(WorkerMsg::Schedule(delay)) => deadline = Some(Instant::now() + delay),
            Ok(WorkerMsg::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                deadline = None;
                while let AfterRun::RunAgain = shared.run_pending() {}
            }
        }
    }
}

/// Run `f`, turning a panic into [`PipelineError::Panicked`].
fn guarded<T>(f: impl FnOnce() -> Result<T, PipelineError>) -> Result<T, PipelineError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(PipelineError::Panicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
