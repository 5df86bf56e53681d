//! Marshalling of results onto the interactive thread.
//!
//! Pipelines compute on their worker thread and hand the final "install snapshot and notify
//! consumers" step to a [`Dispatcher`]. Hosts with an event loop use a [`QueueDispatcher`] and drain
//! it on their UI thread; headless hosts use [`InlineDispatcher`].

use parking_lot::Mutex;
use std::sync::mpsc;
use std::time::Duration;

/// A unit of work to run on the interactive thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on the interactive thread.
pub trait Dispatcher: Send + Sync {
    /// Schedule `task`. Tasks must run in submission order.
    fn dispatch(&self, task: Task);
}

/// Runs every task immediately on the calling (worker) thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// Queues tasks until the host drains them.
pub struct QueueDispatcher {
    tx: Mutex<mpsc::Sender<Task>>,
    rx: Mutex<mpsc::Receiver<Task>>,
}

impl QueueDispatcher {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        }
    }

    /// Run every queued task without blocking; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        // Pop one at a time so a task may dispatch further tasks.
        loop {
            let next = self.rx.lock().try_recv();
            match next {
                Ok(task) => {
                    task();
                    ran += 1;
                }
                Err(_) => return ran,
            }
        }
    }

    /// Wait up to `timeout` for one task and run it; returns `false` on timeout.
    pub fn run_next_timeout(&self, timeout: Duration) -> bool {
        let next = self.rx.lock().recv_timeout(timeout);
        match next {
            Ok(task) => {
                task();
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for QueueDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, task: Task) {
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.lock().send(task);
    }
}

impl std::fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_inline_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        InlineDispatcher.dispatch(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_queue_runs_in_order_when_drained() {
        let queue = QueueDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let log = log.clone();
            queue.dispatch(Box::new(move || log.lock().push(i)));
        }
        assert!(log.lock().is_empty());
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert_eq!(queue.run_pending(), 0);
    }

    #[test]
    fn test_queue_waits_for_cross_thread_dispatch() {
        let queue = Arc::new(QueueDispatcher::new());
        assert!(!queue.run_next_timeout(Duration::from_millis(1)));

        let remote = queue.clone();
        let worker = std::thread::spawn(move || remote.dispatch(Box::new(|| {})));
        assert!(queue.run_next_timeout(Duration::from_secs(5)));
        worker.join().unwrap();
    }
}
