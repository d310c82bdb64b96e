// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Home thread task queue
//!
//! The listener has one "home" thread that owns UI-affine work: running
//! frame-completed handlers, installing/removing input hooks and firing the
//! inactivity timer. Any thread may post work to it through a
//! [`HomeHandle`]; the [`HomeLoop`] drains the queue on the thread that
//! created it.
//!
//! # Ordering
//!
//! Tasks posted from one thread run in the order they were posted.
//! Delayed tasks run no earlier than their deadline, ties broken by post
//! order.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    io,
    panic::{catch_unwind, AssertUnwindSafe},
    thread::{self, JoinHandle, ThreadId},
    time::{Duration, Instant},
};
use thiserror::Error;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Errors raised when posting to the home thread
#[derive(Debug, Error, PartialEq)]
pub enum HomeError {
    /// The home loop has been dropped
    #[error("Home thread is no longer running")]
    Unavailable,
}

enum Envelope {
    Run(Task),
    RunAt(Instant, Task),
    Quit,
}

/// A delayed task waiting in the timer heap
struct Scheduled {
    at: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap, we want the earliest deadline on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Cloneable sender side of the home loop
#[derive(Clone)]
pub struct HomeHandle {
    tx: Sender<Envelope>,
    thread: ThreadId,
}

impl HomeHandle {
    /// Queues `task` to run on the home thread
    pub fn post<F>(&self, task: F) -> Result<(), HomeError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Envelope::Run(Box::new(task)))
            .map_err(|_| HomeError::Unavailable)
    }

    /// Queues `task` to run on the home thread after `delay`
    pub fn post_after<F>(&self, delay: Duration, task: F) -> Result<(), HomeError>
    where
        F: FnOnce() + Send + 'static,
    {
        let at = Instant::now() + delay;
        self.tx
            .send(Envelope::RunAt(at, Box::new(task)))
            .map_err(|_| HomeError::Unavailable)
    }

    /// Asks the loop to return from `run()` once queued work ahead of this
    /// request has executed
    pub fn quit(&self) {
        let _ = self.tx.send(Envelope::Quit);
    }

    /// True when called on the thread that owns the loop
    pub fn is_home_thread(&self) -> bool {
        thread::current().id() == self.thread
    }
}

impl std::fmt::Debug for HomeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeHandle")
            .field("thread", &self.thread)
            .finish()
    }
}

/// Task loop bound to the thread that created it
///
/// # Example
///
/// ```
/// use openqr::core::HomeLoop;
///
/// let mut home = HomeLoop::new();
/// let handle = home.handle();
///
/// handle.post(|| println!("on the home thread")).unwrap();
/// assert_eq!(home.run_pending(), 1);
/// ```
pub struct HomeLoop {
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
    timers: BinaryHeap<Scheduled>,
    seq: u64,
    thread: ThreadId,
    quit_pending: bool,
}

impl HomeLoop {
    /// Creates a loop owned by the calling thread
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            timers: BinaryHeap::new(),
            seq: 0,
            thread: thread::current().id(),
            quit_pending: false,
        }
    }

    /// Starts a dedicated home thread running [`HomeLoop::run`]
    ///
    /// The thread exits when [`HomeHandle::quit`] is called.
    pub fn spawn(name: &str) -> io::Result<(HomeHandle, JoinHandle<()>)> {
        let (handle_tx, handle_rx) = crossbeam_channel::bounded(1);

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut home = HomeLoop::new();
                if handle_tx.send(home.handle()).is_ok() {
                    home.run();
                }
            })?;

        let handle = handle_rx
            .recv()
            .map_err(|_| io::Error::other("home thread exited before starting"))?;

        Ok((handle, join))
    }

    pub fn handle(&self) -> HomeHandle {
        HomeHandle {
            tx: self.tx.clone(),
            thread: self.thread,
        }
    }

    /// Runs tasks until [`HomeHandle::quit`] is received
    pub fn run(&mut self) -> usize {
        self.run_until(None)
    }

    /// Runs tasks for at most `duration`, returning how many executed
    pub fn run_for(&mut self, duration: Duration) -> usize {
        self.run_until(Some(Instant::now() + duration))
    }

    /// Runs everything already queued or due without blocking
    ///
    /// Stops at a quit request, which makes the next `run()` return at once.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = self.fire_due_timers();

        loop {
            match self.rx.try_recv() {
                Ok(Envelope::Run(task)) => {
                    execute(task);
                    ran += 1;
                }
                Ok(Envelope::RunAt(at, task)) => {
                    self.schedule(at, task);
                    ran += self.fire_due_timers();
                }
                Ok(Envelope::Quit) => {
                    self.quit_pending = true;
                    break;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        ran
    }

    fn run_until(&mut self, stop_at: Option<Instant>) -> usize {
        let mut ran = 0;
        if std::mem::take(&mut self.quit_pending) {
            return ran;
        }

        loop {
            ran += self.fire_due_timers();

            if stop_at.is_some_and(|end| Instant::now() >= end) {
                break;
            }

            // Sleep until the next timer or the end of the run window
            let next_timer = self.timers.peek().map(|s| s.at);
            let wake = match (next_timer, stop_at) {
                (Some(t), Some(end)) => Some(t.min(end)),
                (t, end) => t.or(end),
            };

            let received = match wake {
                Some(at) => self.rx.recv_deadline(at),
                None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Envelope::Run(task)) => {
                    execute(task);
                    ran += 1;
                }
                Ok(Envelope::RunAt(at, task)) => self.schedule(at, task),
                Ok(Envelope::Quit) => break,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        ran
    }

    fn schedule(&mut self, at: Instant, task: Task) {
        self.seq += 1;
        self.timers.push(Scheduled {
            at,
            seq: self.seq,
            task,
        });
    }

    fn fire_due_timers(&mut self) -> usize {
        let now = Instant::now();
        let mut ran = 0;

        while self.timers.peek().is_some_and(|s| s.at <= now) {
            if let Some(scheduled) = self.timers.pop() {
                execute(scheduled.task);
                ran += 1;
            }
        }

        ran
    }
}

impl Default for HomeLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a task, logging instead of unwinding through the loop
fn execute(task: Task) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        tracing::error!("Home thread task panicked (continuing)");
    }
}
