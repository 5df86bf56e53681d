//! Document collaborator.
//!
//! Pipelines observe a [`Document`] through change listeners and re-read its lines when they run.
//! [`TextDocument`] is a rope-backed in-memory implementation for hosts without their own buffer.

use crate::line_index::LineIndex;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What kind of mutation produced a [`DocumentChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Local edit at `offset`.
    Edit,
    /// Whole text replaced.
    SetText,
    /// Undo step applied.
    Undo,
    /// Redo step applied.
    Redo,
}

/// Direction of a history step, see [`TextDocument::apply_history`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    /// Undo.
    Undo,
    /// Redo.
    Redo,
}

/// A single document mutation. Offsets and lengths are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChange {
    /// Start of the changed range.
    pub offset: usize,
    /// Characters removed.
    pub old_length: usize,
    /// Characters inserted.
    pub new_length: usize,
    /// Mutation kind.
    pub kind: ChangeKind,
}

impl DocumentChange {
    /// Returns `true` if anything in the document may have changed.
    pub fn is_wholesale(&self) -> bool {
        !matches!(self.kind, ChangeKind::Edit)
    }
}

/// Callback invoked after every mutation.
pub type ChangeListener = Arc<dyn Fn(&DocumentChange) + Send + Sync>;

/// Handle returned by [`Document::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Read access plus change notification for a text buffer.
pub trait Document: Send + Sync {
    /// Number of logical lines (at least 1).
    fn line_count(&self) -> usize;

    /// Text of `line` without its terminator.
    fn line_text(&self, line: usize) -> Option<String>;

    /// Full text.
    fn text(&self) -> String;

    /// All lines, taken from one consistent state of the buffer.
    fn lines(&self) -> Vec<String>;

    /// Line containing the character `offset` (clamped).
    fn line_of_offset(&self, offset: usize) -> usize;

    /// Register a change listener.
    fn add_listener(&self, listener: ChangeListener) -> ListenerId;

    /// Remove a listener; returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// In-memory [`Document`] backed by a [`LineIndex`].
///
/// Listeners run on the mutating thread after the write lock is released, so they may read the
/// document.
#[derive(Default)]
pub struct TextDocument {
    index: RwLock<LineIndex>,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
    next_listener: AtomicU64,
}

impl TextDocument {
    /// Create a document holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            index: RwLock::new(LineIndex::from_text(text)),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.index.read().char_count()
    }

    /// Character offset of `(line, column)` (clamped).
    pub fn position_to_offset(&self, line: usize, column: usize) -> usize {
        self.index.read().position_to_char_offset(line, column)
    }

    /// Insert `text` at `offset`.
    pub fn insert(&self, offset: usize, text: &str) -> DocumentChange {
        self.replace(offset, 0, text)
    }

    /// Delete `length` characters at `offset`.
    pub fn delete(&self, offset: usize, length: usize) -> DocumentChange {
        self.replace(offset, length, "")
    }

    /// Replace `length` characters at `offset` with `text`.
    pub fn replace(&self, offset: usize, length: usize, text: &str) -> DocumentChange {
        let change = {
            let mut index = self.index.write();
            let offset = offset.min(index.char_count());
            let removed = index.delete(offset, length);
            index.insert(offset, text);
            DocumentChange {
                offset,
                old_length: removed,
                new_length: text.chars().count(),
                kind: ChangeKind::Edit,
            }
        };
        self.notify(&change);
        change
    }

    /// Replace the whole text.
    pub fn set_text(&self, text: &str) -> DocumentChange {
        self.replace_all(text, ChangeKind::SetText)
    }

    /// Install `text` as the result of an undo or redo step recorded by the host.
    pub fn apply_history(&self, step: HistoryStep, text: &str) -> DocumentChange {
        let kind = match step {
            HistoryStep::Undo => ChangeKind::Undo,
            HistoryStep::Redo => ChangeKind::Redo,
        };
        self.replace_all(text, kind)
    }

    fn replace_all(&self, text: &str, kind: ChangeKind) -> DocumentChange {
        let change = {
            let mut index = self.index.write();
            let old_length = index.char_count();
            *index = LineIndex::from_text(text);
            DocumentChange {
                offset: 0,
                old_length,
                new_length: index.char_count(),
                kind,
            }
        };
        self.notify(&change);
        change
    }

    fn notify(&self, change: &DocumentChange) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(change);
        }
    }
}

impl Document for TextDocument {
    fn line_count(&self) -> usize {
        self.index.read().line_count()
    }

    fn line_text(&self, line: usize) -> Option<String> {
        self.index.read().get_line_text(line)
    }

    fn text(&self) -> String {
        self.index.read().get_text()
    }

    fn lines(&self) -> Vec<String> {
        self.index.read().lines()
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        self.index.read().char_offset_to_position(offset).0
    }

    fn add_listener(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl std::fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDocument")
            .field("line_count", &self.line_count())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
