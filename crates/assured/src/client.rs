//! HTTP client for the stub API.
//!
//! Builds the `given`, `verify` and `clear` requests for a running server and
//! exposes the base URL a system-under-test should call.

use crate::api::types::ASSURED_STATUS_HEADER;
use crate::stub::Call;
use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Errors that can occur when talking to a stub server
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("cannot stub call without method")]
    MissingMethod,
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("{action} failed with status {status}")]
    Status { action: &'static str, status: StatusCode },
    #[error("failed to decode recorded calls: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Client for a stub server
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL the system-under-test should call; stubbed paths are appended to it
    pub fn url(&self) -> String {
        format!("{}/when", self.base_url)
    }

    /// Stub a call
    pub async fn given(&self, call: &Call) -> Result<(), ClientError> {
        if call.method.trim().is_empty() {
            return Err(ClientError::MissingMethod);
        }
        let method = parse_method(&call.method)?;

        let mut req = self
            .client
            .request(method, self.endpoint("given", &call.path));
        if !call.response.is_empty() {
            req = req.body(call.response.clone());
        }
        if let Some(status) = call.status_code {
            req = req.header(ASSURED_STATUS_HEADER, status.to_string());
        }

        let resp = req.send().await?;
        ensure_success("given", resp.status())
    }

    /// Calls recorded against a stubbed method and path, oldest first
    pub async fn verify(&self, method: &str, path: &str) -> Result<Vec<Call>, ClientError> {
        let resp = self
            .client
            .request(parse_method(method)?, self.endpoint("verify", path))
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(ClientError::Status {
                action: "verify",
                status: resp.status(),
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Clear the stub and recorded calls for a method and path
    pub async fn clear(&self, method: &str, path: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .request(parse_method(method)?, self.endpoint("clear", path))
            .send()
            .await?;
        ensure_success("clear", resp.status())
    }

    /// Clear every stub and recorded call
    pub async fn clear_all(&self) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(format!("{}/clear", self.base_url))
            .send()
            .await?;
        ensure_success("clear all", resp.status())
    }

    fn endpoint(&self, verb: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            verb,
            path.trim_start_matches('/')
        )
    }
}

fn parse_method(method: &str) -> Result<Method, ClientError> {
    Method::from_bytes(method.trim().to_uppercase().as_bytes())
        .map_err(|_| ClientError::InvalidMethod(method.to_string()))
}

fn ensure_success(action: &'static str, status: StatusCode) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status { action, status })
    }
}
