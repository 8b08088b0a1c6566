//! Statement queues and their flush workers.
//!
//! Each queue is a FIFO of complete statements with a single-flight flag.
//! Pushing a statement never blocks on the store: the first push into an idle
//! queue starts a worker thread that executes the statements in order. A
//! statement the store rejects is retried after a fixed backoff until it goes
//! through, so the order of the deltas is kept. The worker clears the flag
//! under the queue lock when it finds the queue empty, which makes the next
//! push start a new worker.
use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::Database;

#[derive(Debug, Default)]
struct State {
    statements: VecDeque<(u64, String)>,
    next_sequence: u64,
    active: bool,
}

/// A FIFO of statements waiting to be executed.
#[derive(Debug)]
pub struct FlushQueue {
    name: &'static str,
    /// Depth at which the oldest statement is dropped.
    limit: Option<usize>,
    state: Mutex<State>,
}

impl FlushQueue {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            limit: None,
            state: Mutex::default(),
        }
    }

    /// A queue that drops its oldest statement when a push finds it with
    /// `limit` statements.
    #[must_use]
    pub fn bounded(name: &'static str, limit: usize) -> Self {
        Self {
            name,
            limit: Some(limit),
            state: Mutex::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a statement.
    ///
    /// It returns `true` when no worker is running. The flag is set before
    /// returning, so the caller is in charge of starting one.
    pub fn push(&self, statement: String) -> bool {
        let mut state = self.state.lock();

        if let Some(limit) = self.limit {
            if limit > 0 && state.statements.len() >= limit {
                state.statements.pop_front();
                warn!(queue = self.name, "queue is full, dropping the oldest statement");
            }
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.statements.push_back((sequence, statement));

        let start_worker = !state.active;
        state.active = true;

        start_worker
    }

    /// The statement at the front, or `None` after clearing the active flag
    /// when the queue is empty.
    fn next(&self) -> Option<(u64, String)> {
        let mut state = self.state.lock();

        if let Some(front) = state.statements.front() {
            Some(front.clone())
        } else {
            state.active = false;
            None
        }
    }

    /// Removes the executed statement. It may have been dropped by a push to
    /// a full queue meanwhile.
    fn complete(&self, sequence: u64) {
        let mut state = self.state.lock();

        if state.statements.front().is_some_and(|(front, _)| *front == sequence) {
            state.statements.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().statements.is_empty()
    }

    /// Whether a worker is draining the queue.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }
}

/// Starts a worker thread that drains the queue into the database.
///
/// Call it only when [`FlushQueue::push`] returned `true`.
pub fn start_worker(queue: &Arc<FlushQueue>, database: &Arc<Box<dyn Database>>, retry_backoff: Duration) {
    let database = database.clone();

    start_drain(queue, retry_backoff, move |statement| database.execute(statement));
}

/// Starts a worker thread that hands the queued items to `execute`, in order,
/// retrying each one after `retry_backoff` until it succeeds.
///
/// # Panics
///
/// Will panic if the OS fails to spawn the thread.
pub fn start_drain<F, E>(queue: &Arc<FlushQueue>, retry_backoff: Duration, execute: F)
where
    F: Fn(&str) -> Result<(), E> + Send + 'static,
    E: Display,
{
    let queue = queue.clone();

    thread::Builder::new()
        .name(format!("flush-{}", queue.name()))
        .spawn(move || drain(&queue, retry_backoff, &execute))
        .expect("it should spawn a flush worker");
}

fn drain<F, E>(queue: &FlushQueue, retry_backoff: Duration, execute: &F)
where
    F: Fn(&str) -> Result<(), E>,
    E: Display,
{
    while let Some((sequence, statement)) = queue.next() {
        debug!(queue = queue.name(), pending = queue.len(), "executing statement");

        while let Err(err) = execute(&statement) {
            error!(queue = queue.name(), %err, "statement failed, retrying in {retry_backoff:?}");
            thread::sleep(retry_backoff);
        }

        queue.complete(sequence);
    }
}
