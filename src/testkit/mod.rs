// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test support: a scripted HTTP control plane, a scripted task store and a
//! manual clock, plus an opt-in handle on a live controller.

use std::collections::{HashMap, VecDeque};
use std::env;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures::future::BoxFuture;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{PhotonError, Result};
use crate::resources::{ApiError, Task, TaskState};
use crate::runtime::{Clock, TaskStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Hold the request open until the server is dropped.
    pub stall: bool,
}

/// A request received by [`MockServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Header names are lowercased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON; `Null` when empty or malformed.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(String, String), VecDeque<MockResponse>>,
    requests: Vec<RecordedRequest>,
}

impl MockState {
    /// Responses are consumed in order; the last one stays.
    fn next_response(&mut self, method: &str, path: &str) -> MockResponse {
        let key = (method.to_string(), path.to_string());
        let queued = match self.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        queued.unwrap_or_else(|| MockResponse {
            status: 404,
            body: serde_json::json!({
                "code": "NotFound",
                "message": format!("No route for {method} {path}"),
            })
            .to_string(),
            stall: false,
        })
    }
}

#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<MockState>>,
    shutdown: CancellationToken,
}

/// Scripted HTTP server standing in for the control plane API.
///
/// Routes match on method and path (query ignored). Unknown routes answer
/// 404 with a `NotFound` error document.
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind to an ephemeral localhost port and start serving.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(MockState::default()));
        let shutdown = CancellationToken::new();

        let app = Router::new().fallback(answer).with_state(Shared {
            state: Arc::clone(&state),
            shutdown: shutdown.clone(),
        });
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::debug!(error = %e, "Mock server stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            shutdown,
            handle,
        })
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn push(&self, method: &str, path: &str, response: MockResponse) {
        lock(&self.state)
            .routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queue a response for `method path`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.push(
            method,
            path,
            MockResponse {
                status,
                body: body.into(),
                stall: false,
            },
        );
    }

    pub fn respond_json(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.respond(method, path, status, body.to_string());
    }

    /// Queue a 200 answer carrying `task`.
    pub fn respond_task(&self, method: &str, path: &str, task: &Task) {
        let body = serde_json::to_string(task).unwrap_or_default();
        self.respond(method, path, 200, body);
    }

    /// Accept requests for `method path` but never answer them.
    pub fn stall(&self, method: &str, path: &str) {
        self.push(
            method,
            path,
            MockResponse {
                status: 504,
                body: String::new(),
                stall: true,
            },
        );
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    #[must_use]
    pub fn request_count(&self, method: &str, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.handle.abort();
    }
}

async fn answer(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let response = {
        let mut state = lock(&shared.state);
        let response = state.next_response(method.as_str(), &path);
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            path,
            query: uri.query().map(str::to_string),
            headers: headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
            body: body.to_vec(),
        });
        response
    };

    if response.stall {
        shared.shutdown.cancelled().await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(CONTENT_TYPE, "application/json")], response.body).into_response()
}

/// One scripted answer of a [`ScriptedTaskStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFetch {
    State(TaskState),
    /// Fails with [`PhotonError::Connection`].
    ConnectionError,
    /// Fails with a 404 [`PhotonError::Api`].
    NotFound,
    /// Never resolves.
    Hang,
}

/// [`TaskStore`] replaying a fixed script. The last entry repeats forever.
#[derive(Debug)]
pub struct ScriptedTaskStore {
    task_id: String,
    script: Mutex<VecDeque<ScriptedFetch>>,
    fetches: AtomicUsize,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedTaskStore {
    #[must_use]
    pub fn new(task_id: impl Into<String>, script: Vec<ScriptedFetch>) -> Self {
        Self {
            task_id: task_id.into(),
            script: Mutex::new(script.into()),
            fetches: AtomicUsize::new(0),
            cancel_after: None,
        }
    }

    /// Cancel `token` while serving the `n`th fetch.
    #[must_use]
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next(&self) -> Option<ScriptedFetch> {
        let mut script = lock(&self.script);
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().copied()
        }
    }
}

#[async_trait]
impl TaskStore for ScriptedTaskStore {
    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, token)) = &self.cancel_after {
            if n >= *after {
                token.cancel();
            }
        }

        match self.next() {
            Some(ScriptedFetch::State(state)) => Ok(Task::new(&self.task_id, "SCRIPTED", state)),
            Some(ScriptedFetch::ConnectionError) => {
                Err(PhotonError::Connection("connection refused".to_string()))
            }
            Some(ScriptedFetch::Hang) => futures::future::pending().await,
            Some(ScriptedFetch::NotFound) | None => Err(PhotonError::Api(ApiError::new(
                404,
                "TaskNotFound",
                format!("Task {task_id} not found"),
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct ClockState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

/// [`Clock`] whose time only moves when slept on. Sleeping completes on the
/// first poll.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    state: Arc<Mutex<ClockState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            state: Arc::new(Mutex::new(ClockState::default())),
        }
    }

    /// Durations of every sleep so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.state).sleeps.clone()
    }

    /// Time advanced since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        lock(&self.state).offset
    }

    pub fn advance(&self, duration: Duration) {
        lock(&self.state).offset += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + lock(&self.state).offset
    }

    /// Time advances when the sleep is first polled, not when it is created.
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            state.offset += duration;
            state.sleeps.push(duration);
        })
    }
}

/// A real controller to run tests against.
///
/// Only available when `PHOTON_DEV_TESTS` is set; `PHOTON_TARGET` names the
/// endpoint and `PHOTON_PROJECT` the project to create resources in.
#[derive(Debug, Clone)]
pub struct LiveTarget {
    pub endpoint: String,
    pub project: String,
    pub token: Option<String>,
}

impl LiveTarget {
    /// Returns `None` (and the caller should skip) unless live tests are enabled.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        if env::var("PHOTON_DEV_TESTS").is_err() {
            println!("Skipping live test: PHOTON_DEV_TESTS not set");
            return None;
        }
        let endpoint = env::var("PHOTON_TARGET").ok()?;
        let project = env::var("PHOTON_PROJECT").ok()?;
        Some(Self {
            endpoint,
            project,
            token: env::var("PHOTON_TOKEN").ok(),
        })
    }
}
