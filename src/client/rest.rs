// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP plumbing shared by all API groups.
//!
//! Requests carry the bearer token when one is configured. Responses with a
//! status of 400 or above are turned into [`PhotonError::Api`], decoding the
//! control plane's error document when the body holds one.

use std::fmt;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::PhotonClientConfig;
use crate::error::{PhotonError, Result};
use crate::resources::{ApiError, Task};
use crate::runtime::RequestLogger;

pub(crate) struct RestClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    logger: RequestLogger,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl RestClient {
    #[allow(clippy::result_large_err)]
    pub(crate) fn new(config: &PhotonClientConfig) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.ignore_certificate);
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PhotonError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            logger: RequestLogger::with_config(config.logging),
        })
    }

    pub(crate) fn logger(&self) -> &RequestLogger {
        &self.logger
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Bytes> {
        let mut builder = self
            .http
            .request(method.clone(), format!("{}{}", self.endpoint, path));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }
        let request = builder.build()?;

        let span = self.logger.start(method.as_str(), path, request.headers());
        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.logger.finish_error(span, &e.to_string());
                return Err(e.into());
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                self.logger.finish_error(span, &e.to_string());
                return Err(e.into());
            }
        };

        if status.is_client_error() || status.is_server_error() {
            let err = api_error(status, &body);
            self.logger.finish_error(span, &err.to_string());
            return Err(PhotonError::Api(err));
        }

        self.logger.finish_success(span, status.as_u16());
        Ok(body)
    }

    #[allow(clippy::result_large_err)]
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json_with_query(path, &[]).await
    }

    #[allow(clippy::result_large_err)]
    pub(crate) async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.send(Method::GET, path, query, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST a JSON body to an endpoint that answers with a task.
    #[allow(clippy::result_large_err)]
    pub(crate) async fn post_task<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Task> {
        let payload = serde_json::to_vec(body)?;
        let body = self.send(Method::POST, path, &[], Some(payload)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// DELETE an entity; the control plane answers with a task.
    #[allow(clippy::result_large_err)]
    pub(crate) async fn delete_task(&self, path: &str) -> Result<Task> {
        let body = self.send(Method::DELETE, path, &[], None).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Build an [`ApiError`] from an error response.
fn api_error(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(mut err) if !err.code.is_empty() => {
            err.http_status_code = status.as_u16();
            err
        }
        _ => ApiError::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("HttpError"),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_document() {
        let body = br#"{"code": "VmNotFound", "message": "VM vm-1 not found", "data": {"id": "vm-1"}}"#;
        let err = api_error(StatusCode::NOT_FOUND, body);

        assert_eq!(err.code, "VmNotFound");
        assert_eq!(err.http_status_code, 404);
        assert_eq!(err.data.get("id").map(String::as_str), Some("vm-1"));
    }

    #[test]
    fn test_api_error_from_plain_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, b"upstream unavailable\n");

        assert_eq!(err.code, "Bad Gateway");
        assert_eq!(err.message, "upstream unavailable");
        assert_eq!(err.http_status_code, 502);
    }
}
