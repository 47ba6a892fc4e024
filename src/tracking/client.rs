//! Device-side client for the walk tracking endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::CLIENT_TIMEOUT_SECS;
use crate::models::WalkTrackingView;

use super::request::TrackingRequest;

/// Successful body of `POST /api/walks/tracking`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub walk: WalkTrackingView,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Cannot reach tracking server: {0}")]
    Connection(String),
    #[error("Tracking server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response from tracking server: {0}")]
    Decode(String),
}

/// Sends tracking actions to the server.
pub trait TrackingClient {
    fn send(&self, request: &TrackingRequest) -> Result<WalkTrackingView, ClientError>;
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Blocking HTTP implementation of `TrackingClient`.
pub struct HttpTrackingClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpTrackingClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn with_default_timeout(base_url: &str) -> Result<Self, ClientError> {
        Self::new(base_url, CLIENT_TIMEOUT_SECS)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/walks/tracking", self.base_url)
    }
}

impl TrackingClient for HttpTrackingClient {
    fn send(&self, request: &TrackingRequest) -> Result<WalkTrackingView, ClientError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Connection(format!(
                        "request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ClientError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TrackingResponse = response
            .json()
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(parsed.walk)
    }
}
