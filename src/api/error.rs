//! Error taxonomy for the messaging API. Every gateway call resolves to a
//! typed value or exactly one of these variants; callers branch on the
//! variant instead of inspecting status codes or exception types.

use serde_json::Value;
use thiserror::Error;

/// Fallback shown when the server gives no usable `detail` string.
const FALLBACK_MESSAGE: &str = "Request failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Session absent or expired. Recoverable by re-authenticating; session
    /// lookup swallows this into the normal guest state.
    #[error("unauthorized")]
    Unauthorized,
    /// Caller-correctable input problem with a human-readable detail.
    #[error("{detail}")]
    Validation { detail: String },
    /// Everything else: network failure, unexpected server error, malformed
    /// response. NotFound lands here so foreign ids are indistinguishable
    /// from missing ones.
    #[error("{0}")]
    Generic(String),
}

impl ApiError {
    /// Classify a non-2xx response. HTTP 401 is always `Unauthorized`
    /// regardless of body; 400/422 carry a validation detail; any other
    /// status degrades to `Generic` with whatever detail the body offers.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Self::Unauthorized;
        }

        let detail = response
            .text()
            .await
            .ok()
            .map_or_else(|| FALLBACK_MESSAGE.to_string(), |body| extract_detail(&body));

        match status.as_u16() {
            400 | 422 => Self::Validation { detail },
            _ => Self::Generic(detail),
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Pull the `detail` string out of a JSON error body. Bodies that are not
/// JSON, or JSON without a string `detail`, degrade to the fallback message
/// rather than failing the caller.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|json| json.get("detail"))
        .and_then(Value::as_str)
        .map_or_else(|| FALLBACK_MESSAGE.to_string(), ToString::to_string)
}

impl From<reqwest::Error> for ApiError {
    /// Transport failures are never `Unauthorized`; a timeout classifies as
    /// `Generic` like any other network problem.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Generic("Request timed out".to_string())
        } else if err.is_decode() {
            Self::Generic(format!("Failed to decode response: {err}"))
        } else {
            Self::Generic(format!("Unable to reach the server: {err}"))
        }
    }
}
