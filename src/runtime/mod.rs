// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime utilities: task completion tracking and request logging.

mod logging;
mod task_tracker;

pub use logging::{LoggingConfig, RequestLogger, RequestMetrics, RequestSpan};
pub use task_tracker::{
    Clock, TaskStore, TaskTracker, TokioClock, WaitOptions, DEFAULT_MAX_RETRIES,
    DEFAULT_POLL_DELAY, DEFAULT_TIMEOUT,
};
