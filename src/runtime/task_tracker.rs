// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waiting for asynchronous tasks to finish.
//!
//! Mutating calls return a [`Task`] that is still `QUEUED` or `STARTED`.
//! [`TaskTracker`] polls the task through a [`TaskStore`] until it reaches a
//! terminal state, bounded by two independent limits:
//!
//! - a wall-clock deadline ([`WaitOptions::timeout`], 30 minutes by default),
//!   enforced even while a fetch is in flight;
//! - a budget of consecutive transient fetch failures
//!   ([`WaitOptions::max_retries`], 3 by default). A successful fetch resets it.
//!
//! Polls are separated by a fixed [`WaitOptions::poll_delay`] (100 ms by
//! default). Tasks that end in [`TaskState::Error`] are returned as data;
//! use [`Task::into_completed`] to turn them into an error.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use photon_cpi_rs::{PhotonClient, PhotonClientConfig, TaskTracker, WaitOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PhotonClient::new(PhotonClientConfig::builder("http://10.0.0.5:9000").build())?;
//! let tasks = client.tasks();
//!
//! let task = TaskTracker::new(&tasks)
//!     .with_options(WaitOptions::default().with_timeout(Duration::from_secs(600)))
//!     .wait("6c2a1a5e-task")
//!     .await?;
//! println!("{} finished as {}", task.operation, task.state);
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PhotonError, Result};
use crate::resources::{Task, TaskState};

/// Default delay between two polls.
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(100);
/// Default number of consecutive transient failures tolerated.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default overall deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Source of task snapshots.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch the current snapshot of a task.
    async fn get_task(&self, task_id: &str) -> Result<Task>;
}

/// Time source and sleep primitive used between polls.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()>;
}

/// [`Clock`] backed by the tokio timer, so it follows `tokio::time::pause`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Polling limits for a single wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between two polls.
    pub poll_delay: Duration,
    /// Consecutive transient failures tolerated before giving up.
    pub max_retries: u32,
    /// Overall deadline, measured from the start of the wait.
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_delay: DEFAULT_POLL_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitOptions {
    #[must_use]
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Bookkeeping carried while the wait is still polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PollProgress {
    attempts: u32,
    consecutive_failures: u32,
    last_state: Option<TaskState>,
}

#[derive(Debug)]
enum WaitState {
    Polling(PollProgress),
    Done(Outcome),
}

/// Result of one fetch raced against the deadline and the token.
enum Fetched {
    Task(Result<Task>),
    DeadlinePassed,
    Cancelled,
}

#[derive(Debug)]
enum Outcome {
    Succeeded(Task),
    Failed(Task),
    Errored(PhotonError),
    TimedOut { last_state: Option<TaskState> },
    Cancelled { last_state: Option<TaskState> },
}

impl PollProgress {
    /// Transition on the outcome of one fetch.
    fn observe(self, fetched: Result<Task>, max_retries: u32) -> WaitState {
        let attempts = self.attempts + 1;
        match fetched {
            Ok(task) => match task.state {
                TaskState::Completed => WaitState::Done(Outcome::Succeeded(task)),
                TaskState::Error => WaitState::Done(Outcome::Failed(task)),
                state @ (TaskState::Queued | TaskState::Started) => {
                    WaitState::Polling(PollProgress {
                        attempts,
                        consecutive_failures: 0,
                        last_state: Some(state),
                    })
                }
            },
            Err(err) if err.is_transient() => {
                let consecutive_failures = self.consecutive_failures + 1;
                if consecutive_failures > max_retries {
                    WaitState::Done(Outcome::Errored(err))
                } else {
                    warn!(
                        error = %err,
                        consecutive_failures,
                        max_retries,
                        "Transient failure while polling task"
                    );
                    WaitState::Polling(PollProgress {
                        attempts,
                        consecutive_failures,
                        last_state: self.last_state,
                    })
                }
            }
            Err(err) => WaitState::Done(Outcome::Errored(err)),
        }
    }

    fn timed_out(self, task_id: &str) -> WaitState {
        warn!(task_id, last_state = ?self.last_state, "Timed out waiting for task");
        WaitState::Done(Outcome::TimedOut {
            last_state: self.last_state,
        })
    }

    fn cancelled(self, task_id: &str) -> WaitState {
        debug!(task_id, last_state = ?self.last_state, "Wait cancelled");
        WaitState::Done(Outcome::Cancelled {
            last_state: self.last_state,
        })
    }
}

impl Outcome {
    fn finish(self, task_id: &str) -> Result<Task> {
        match self {
            Outcome::Succeeded(task) | Outcome::Failed(task) => {
                info!(task_id, operation = %task.operation, state = %task.state, "Task finished");
                Ok(task)
            }
            Outcome::Errored(err) => Err(err),
            Outcome::TimedOut { last_state } => Err(PhotonError::TaskTimeout {
                task_id: task_id.to_string(),
                last_state,
            }),
            Outcome::Cancelled { last_state } => Err(PhotonError::TaskCancelled {
                task_id: task_id.to_string(),
                last_state,
            }),
        }
    }
}

/// Polls a task until it reaches a terminal state.
pub struct TaskTracker<'a, S: ?Sized, K = TokioClock> {
    store: &'a S,
    clock: K,
    options: WaitOptions,
    cancel: Option<CancellationToken>,
}

impl<'a, S: TaskStore + ?Sized> TaskTracker<'a, S, TokioClock> {
    /// Create a tracker with default options and the tokio clock.
    #[must_use]
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            clock: TokioClock,
            options: WaitOptions::default(),
            cancel: None,
        }
    }
}

impl<'a, S: TaskStore + ?Sized, K: Clock> TaskTracker<'a, S, K> {
    /// Replace the clock.
    #[must_use]
    pub fn with_clock<K2: Clock>(self, clock: K2) -> TaskTracker<'a, S, K2> {
        TaskTracker {
            store: self.store,
            clock,
            options: self.options,
            cancel: self.cancel,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Abort the wait when `token` is cancelled. Cancellation is observed
    /// before every poll, during a fetch and while sleeping between polls.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn options(&self) -> &WaitOptions {
        &self.options
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    async fn pause(&self) {
        let delay = self.options.poll_delay;
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    () = self.clock.sleep(delay) => {}
                    () = token.cancelled() => {}
                }
            }
            None => self.clock.sleep(delay).await,
        }
    }

    /// Run one fetch, giving up when `remaining` runs out or the token fires.
    async fn fetch(&self, task_id: &str, remaining: Duration) -> Fetched {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => futures::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            fetched = self.store.get_task(task_id) => Fetched::Task(fetched),
            () = cancelled => Fetched::Cancelled,
            () = self.clock.sleep(remaining) => Fetched::DeadlinePassed,
        }
    }

    /// Wait for the task to reach `COMPLETED` or `ERROR`.
    ///
    /// # Errors
    ///
    /// - [`PhotonError::TaskTimeout`] when the deadline passes first;
    /// - [`PhotonError::TaskCancelled`] when the cancellation token fires;
    /// - the last transport error once the consecutive-failure budget is
    ///   exhausted;
    /// - any non-transient fetch error (e.g. unknown task id) immediately.
    #[allow(clippy::result_large_err)]
    pub async fn wait(&self, task_id: &str) -> Result<Task> {
        let start = self.clock.now();
        let mut state = WaitState::Polling(PollProgress::default());

        loop {
            let progress = match state {
                WaitState::Polling(progress) => progress,
                WaitState::Done(outcome) => return outcome.finish(task_id),
            };

            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= self.options.timeout {
                state = progress.timed_out(task_id);
                continue;
            }
            if self.is_cancelled() {
                state = progress.cancelled(task_id);
                continue;
            }

            state = match self.fetch(task_id, self.options.timeout - elapsed).await {
                Fetched::Task(fetched) => progress.observe(fetched, self.options.max_retries),
                Fetched::DeadlinePassed => progress.timed_out(task_id),
                Fetched::Cancelled => progress.cancelled(task_id),
            };

            if let WaitState::Polling(next) = &state {
                debug!(
                    task_id,
                    attempt = next.attempts,
                    state = ?next.last_state,
                    "Task not finished yet"
                );
                self.pause().await;
            }
        }
    }
}
