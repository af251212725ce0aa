// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Minimal Azure Resource Manager client.
//!
//! Resources are addressed by their ARM id path
//! (`/subscriptions/{id}/resourceGroups/{rg}/providers/...`) plus an
//! `api-version`. Long-running operations answered with `201`/`202` are
//! polled through the `Azure-AsyncOperation` or `Location` header until they
//! reach a terminal state. Throttling (429) and server errors (5xx) are
//! retried with backoff before they surface.

use super::credential::TokenCredential;
use crate::reconcilers::retry::{
    default_backoff, is_retryable_http_status, poll_backoff, ExponentialBackoff,
};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Failures talking to Resource Manager or Azure AD.
#[derive(Error, Debug)]
pub enum ArmError {
    /// The request could not be sent or its body could not be read.
    #[error("Azure request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Azure returned HTTP {status} ({code}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Service error code, e.g. `ResourceNotFound`
        code: String,
        /// Service error message
        message: String,
    },

    /// A success response carried a body that is not JSON.
    #[error("Azure returned an undecodable body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A long-running operation finished in a non-success state.
    #[error("Azure operation finished with status {status}: {message}")]
    OperationFailed {
        /// Terminal status (`Failed`, `Canceled`)
        status: String,
        /// Error message reported by the operation, if any
        message: String,
    },

    /// A long-running operation did not finish within the polling budget.
    #[error("timed out waiting for Azure operation {0}")]
    PollTimeout(String),

    /// A URL could not be built.
    #[error("invalid Azure URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The projected service account token could not be read.
    #[error("failed to read federated token file {path}: {source}")]
    TokenFile {
        /// Token file path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ArmError {
    /// Whether the addressed resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Build a [`ArmError::Status`] from an error response.
    ///
    /// Understands both the Resource Manager envelope
    /// (`{"error": {"code", "message"}}`) and the Azure AD one
    /// (`{"error": "...", "error_description": "..."}`).
    pub async fn from_response(response: Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let (code, message) = parse_error_body(&text);
        Self::Status {
            status,
            code,
            message,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Arm { error: ArmErrorDetail },
    Aad {
        error: String,
        #[serde(default)]
        error_description: String,
    },
}

#[derive(Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub(crate) fn parse_error_body(text: &str) -> (String, String) {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody::Arm { error }) => (error.code, error.message),
        Ok(ErrorBody::Aad {
            error,
            error_description,
        }) => (error, error_description),
        Err(_) => ("Unknown".to_string(), text.to_string()),
    }
}

#[derive(Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ArmErrorDetail>,
}

/// Authenticated Resource Manager client.
///
/// The bearer token is acquired on first use and kept for the lifetime of
/// the client, which is one reconciliation.
pub struct ArmClient {
    http: reqwest::Client,
    base_url: Url,
    credential: Arc<dyn TokenCredential>,
    token: OnceCell<String>,
    backoff: fn() -> ExponentialBackoff,
    retry_backoff: fn() -> ExponentialBackoff,
}

impl ArmClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            http,
            base_url,
            credential,
            token: OnceCell::new(),
            backoff: poll_backoff,
            retry_backoff: default_backoff,
        }
    }

    /// Replace the backoff used between operation status polls.
    #[must_use]
    pub fn with_poll_backoff(mut self, backoff: fn() -> ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace the backoff used when retrying throttled or failed requests.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: fn() -> ExponentialBackoff) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn bearer(&self) -> Result<&str, ArmError> {
        self.token
            .get_or_try_init(|| self.credential.token())
            .await
            .map(String::as_str)
    }

    /// URL of a resource path with its `api-version`.
    pub fn resource_url(&self, path: &str, api_version: &str) -> Result<Url, ArmError> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Send with the bearer token; non-success statuses become [`ArmError::Status`].
    ///
    /// 429 and 5xx answers are retried until the retry backoff is spent.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ArmError> {
        let request = request.bearer_auth(self.bearer().await?);
        let mut backoff = (self.retry_backoff)();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            // Only buffered bodies can be replayed
            let Some(this_attempt) = request.try_clone() else {
                return checked(request.send().await?).await;
            };
            let response = this_attempt.send().await?;
            let status = response.status();
            if !is_retryable_http_status(status) {
                return checked(response).await;
            }
            match backoff.next_backoff() {
                Some(delay) => {
                    warn!(
                        status = status.as_u16(),
                        attempt,
                        retry_after = ?delay,
                        "Retryable Azure response, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(ArmError::from_response(response).await),
            }
        }
    }

    /// GET a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::Status`] with status 404 when it does not exist.
    pub async fn get(&self, path: &str, api_version: &str) -> Result<Value, ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(self.http.get(url)).await?;
        json_body(response).await
    }

    /// Create or replace a resource, waiting for provisioning to finish.
    ///
    /// Returns the resource as stored once the operation completed.
    pub async fn put(&self, path: &str, api_version: &str, body: &Value) -> Result<Value, ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(self.http.put(url).json(body)).await?;
        let status = response.status();
        if status == StatusCode::CREATED || status == StatusCode::ACCEPTED {
            if let Some(operation) = operation_url(response.headers(), status)? {
                debug!(path, "Waiting for Azure operation to complete");
                self.wait(operation).await?;
                return self.get(path, api_version).await;
            }
        }
        json_body(response).await
    }

    /// Invoke a resource action (e.g. `listKeys`).
    pub async fn post(&self, path: &str, api_version: &str) -> Result<Value, ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(self.http.post(url).json(&Value::Object(Default::default()))).await?;
        json_body(response).await
    }

    /// Delete a resource, waiting for the deletion to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ArmError::Status`] with status 404 when it does not exist.
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<(), ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(self.http.delete(url)).await?;
        let status = response.status();
        if status == StatusCode::ACCEPTED {
            if let Some(operation) = operation_url(response.headers(), status)? {
                debug!(path, "Waiting for Azure deletion to complete");
                self.wait(operation).await?;
            }
        }
        Ok(())
    }

    async fn wait(&self, operation: Operation) -> Result<(), ArmError> {
        match operation {
            Operation::AsyncOperation(url) => self.poll_async_operation(url).await,
            Operation::Location(url) => self.poll_location(url).await,
        }
    }

    async fn next_poll(backoff: &mut ExponentialBackoff, url: &Url) -> Result<(), ArmError> {
        let delay = backoff
            .next_backoff()
            .ok_or_else(|| ArmError::PollTimeout(url.to_string()))?;
        tokio::time::sleep(delay).await;
        Ok(())
    }

    async fn poll_async_operation(&self, url: Url) -> Result<(), ArmError> {
        let mut backoff = (self.backoff)();
        loop {
            let response = self.send(self.http.get(url.clone())).await?;
            let operation: OperationStatus = response.json().await?;
            match operation.status.as_str() {
                "Succeeded" => return Ok(()),
                "Failed" | "Canceled" => {
                    return Err(ArmError::OperationFailed {
                        status: operation.status,
                        message: operation.error.map(|e| e.message).unwrap_or_default(),
                    })
                }
                _ => Self::next_poll(&mut backoff, &url).await?,
            }
        }
    }

    async fn poll_location(&self, url: Url) -> Result<(), ArmError> {
        let mut backoff = (self.backoff)();
        loop {
            let response = self.send(self.http.get(url.clone())).await?;
            if response.status() != StatusCode::ACCEPTED {
                return Ok(());
            }
            Self::next_poll(&mut backoff, &url).await?;
        }
    }
}

/// How to follow a long-running operation.
#[derive(Debug, PartialEq, Eq)]
enum Operation {
    AsyncOperation(Url),
    Location(Url),
}

/// Operation to poll, if the response started one.
///
/// `Location` only signals an operation on `202 Accepted`.
fn operation_url(headers: &HeaderMap, status: StatusCode) -> Result<Option<Operation>, ArmError> {
    if let Some(url) = header_value(headers, ASYNC_OPERATION_HEADER) {
        return Ok(Some(Operation::AsyncOperation(Url::parse(url)?)));
    }
    if status == StatusCode::ACCEPTED {
        if let Some(url) = header_value(headers, LOCATION.as_str()) {
            return Ok(Some(Operation::Location(Url::parse(url)?)));
        }
    }
    Ok(None)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

async fn checked(response: Response) -> Result<Response, ArmError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ArmError::from_response(response).await)
    }
}

/// Decode a success body; an empty body is `null`.
async fn json_body(response: Response) -> Result<Value, ArmError> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "arm_tests.rs"]
mod arm_tests;
