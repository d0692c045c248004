// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request logging for HTTP calls to the control plane.
//!
//! Every REST call made by [`PhotonClient`](crate::PhotonClient) goes through a
//! [`RequestLogger`]. Answers below 400 are logged at debug level, failures at
//! warn level. Request headers are logged when the subscriber enables trace
//! level for `photon_cpi::http`, with credentials redacted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use tracing::{debug, trace, warn, Level};

const LOG_TARGET: &str = "photon_cpi::http";

/// What the request logger writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log requests that got an answer below 400.
    pub log_success: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_success: true }
    }
}

impl LoggingConfig {
    /// Nothing but failures, for the CPI binary whose stderr ends up in
    /// director task logs.
    #[must_use]
    pub fn quiet() -> Self {
        Self { log_success: false }
    }
}

/// Render headers as `name=value` pairs with the bearer token and cookies
/// replaced.
fn render_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if *name == AUTHORIZATION || *name == COOKIE {
                format!("{name}=[REDACTED]")
            } else {
                format!("{name}={value:?}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Counters kept by a [`RequestLogger`].
#[derive(Debug, Default)]
pub struct RequestMetrics {
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl RequestMetrics {
    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.successful_requests() + self.failed_requests()
    }

    #[must_use]
    pub fn successful_requests(&self) -> u64 {
        self.successful_requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed_requests(&self) -> u64 {
        self.failed_requests.load(Ordering::Relaxed)
    }
}

/// Times HTTP requests and logs their outcome.
#[derive(Debug, Default)]
pub struct RequestLogger {
    config: LoggingConfig,
    metrics: RequestMetrics,
}

impl RequestLogger {
    #[must_use]
    pub fn with_config(config: LoggingConfig) -> Self {
        Self {
            config,
            metrics: RequestMetrics::default(),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn start(&self, method: &str, path: &str, headers: &HeaderMap) -> RequestSpan {
        if tracing::enabled!(target: LOG_TARGET, Level::TRACE) {
            trace!(
                target: LOG_TARGET,
                method,
                path,
                headers = %render_headers(headers),
                "HTTP request"
            );
        }
        RequestSpan {
            method: method.to_string(),
            path: path.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish a request that got an answer below 400.
    pub fn finish_success(&self, span: RequestSpan, status: u16) {
        self.metrics.successful_requests.fetch_add(1, Ordering::Relaxed);
        if self.config.log_success {
            debug!(
                target: LOG_TARGET,
                method = %span.method,
                path = %span.path,
                status,
                elapsed = ?span.start.elapsed(),
                "HTTP request finished"
            );
        }
    }

    /// Finish a request that failed or got an error status.
    pub fn finish_error(&self, span: RequestSpan, error: &str) {
        self.metrics.failed_requests.fetch_add(1, Ordering::Relaxed);
        warn!(
            target: LOG_TARGET,
            method = %span.method,
            path = %span.path,
            elapsed = ?span.start.elapsed(),
            error,
            "HTTP request failed"
        );
    }
}

/// A request in flight.
#[derive(Debug)]
pub struct RequestSpan {
    method: String,
    path: String,
    start: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[test]
    fn test_quiet_only_drops_success_logs() {
        let quiet = LoggingConfig::quiet();
        assert!(!quiet.log_success);
        assert!(LoggingConfig::default().log_success);
    }

    #[test]
    fn test_render_headers_redacts_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret-token"));
        headers.insert(COOKIE, HeaderValue::from_static("session=abc"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let rendered = render_headers(&headers);
        assert!(rendered.contains("authorization=[REDACTED]"));
        assert!(rendered.contains("cookie=[REDACTED]"));
        assert!(rendered.contains("application/json"));
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("session=abc"));
    }

    #[test]
    fn test_request_logger_counts() {
        let logger = RequestLogger::with_config(LoggingConfig::quiet());

        let span = logger.start("GET", "/tasks/t1", &HeaderMap::new());
        logger.finish_success(span, 200);

        let span = logger.start("DELETE", "/vms/vm-1", &HeaderMap::new());
        logger.finish_error(span, "HTTP 404 VmNotFound: missing");

        assert_eq!(logger.metrics().total_requests(), 2);
        assert_eq!(logger.metrics().successful_requests(), 1);
        assert_eq!(logger.metrics().failed_requests(), 1);
    }
}
