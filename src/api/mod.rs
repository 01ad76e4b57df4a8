//! Typed gateway for every server operation. One cookie-aware `reqwest`
//! client carries the ambient session credential; no call holds an explicit
//! bearer token. Each operation resolves to a typed value or an [`ApiError`].

pub mod error;
pub mod types;

use error::ApiError;
use reqwest::{multipart::Form, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info_span, Instrument};
use types::{
    AttachmentDownload, InboxEntry, LoginResponse, MessageDetail, OkResponse, SendMessageResponse,
    SentEntry, TwoFactorSetupResponse, TwoFactorStatus, UserEnvelope,
};
use url::Url;

pub struct Gateway {
    client: Client,
    base_url: Url,
}

impl Gateway {
    /// Build a gateway against the given API base URL.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed, has no host, or uses a
    /// scheme other than http/https.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::build(base_url, None)
    }

    /// Build a gateway with a per-request timeout. Timeouts classify as
    /// [`ApiError::Generic`], never as `Unauthorized`.
    ///
    /// # Errors
    /// Same conditions as [`Gateway::new`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Self::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(base_url)?;

        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Generic(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { client, base_url })
    }

    /// Join path segments onto the base URL, percent-encoding each segment so
    /// server-issued ids are safe to embed.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::Generic("API base URL cannot hold paths".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        debug!("endpoint URL: {}", url);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let span = info_span!("api.get", http.method = "GET", url = %url);
        let response = self.client.get(url).send().instrument(span).await?;
        decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &Value,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let span = info_span!("api.post", http.method = "POST", url = %url);
        let response = self.client.post(url).json(body).send().instrument(span).await?;
        decode(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        let span = info_span!("api.delete", http.method = "DELETE", url = %url);
        let response = self.client.delete(url).send().instrument(span).await?;
        decode(response).await
    }

    /// Create an account. The password is exposed only while the request body
    /// is encoded and never logged.
    ///
    /// # Errors
    /// `Validation` when the server rejects the fields, `Generic` otherwise.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<UserEnvelope, ApiError> {
        let payload = json!({
            "email": email,
            "username": username,
            "password": password.expose_secret(),
        });
        self.post_json(&["api", "users", "register"], &payload).await
    }

    /// Submit credentials. With `totp_code` absent this is login phase 1 and
    /// the answer's `requires_2fa` flag signals the step-up challenge; with
    /// the code present it is the step-up resubmission of the full triple.
    ///
    /// # Errors
    /// `Unauthorized` on bad credentials or code, `Validation` on malformed
    /// input, `Generic` otherwise.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
        totp_code: Option<&str>,
    ) -> Result<LoginResponse, ApiError> {
        let mut payload = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        if let Some(code) = totp_code {
            payload["totp_code"] = json!(code);
        }
        self.post_json(&["api", "auth", "login"], &payload).await
    }

    /// Clear the server-side session. Callers treat this as best-effort.
    ///
    /// # Errors
    /// Propagates the classified failure; the session manager ignores it.
    pub async fn logout(&self) -> Result<OkResponse, ApiError> {
        self.post_json(&["api", "auth", "logout"], &json!({})).await
    }

    /// Look up the current session. `Unauthorized` is the expected answer for
    /// guests and is swallowed by the session manager, not surfaced.
    ///
    /// # Errors
    /// `Unauthorized` without a session, `Generic` otherwise.
    pub async fn me(&self) -> Result<UserEnvelope, ApiError> {
        self.get_json(&["api", "users", "me"]).await
    }

    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn two_fa_status(&self) -> Result<TwoFactorStatus, ApiError> {
        self.get_json(&["api", "2fa", "status"]).await
    }

    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn two_fa_setup(&self) -> Result<TwoFactorSetupResponse, ApiError> {
        self.post_json(&["api", "2fa", "setup"], &json!({})).await
    }

    /// # Errors
    /// `Unauthorized` or `Validation` when the server rejects the code.
    pub async fn two_fa_enable(&self, code: &str) -> Result<OkResponse, ApiError> {
        self.post_json(&["api", "2fa", "enable"], &json!({ "code": code })).await
    }

    /// # Errors
    /// `Unauthorized` or `Validation` when the server rejects the code.
    pub async fn two_fa_disable(&self, code: &str) -> Result<OkResponse, ApiError> {
        self.post_json(&["api", "2fa", "disable"], &json!({ "code": code })).await
    }

    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn inbox(&self) -> Result<Vec<InboxEntry>, ApiError> {
        self.get_json(&["api", "messages", "inbox"]).await
    }

    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn sent(&self) -> Result<Vec<SentEntry>, ApiError> {
        self.get_json(&["api", "messages", "sent"]).await
    }

    /// # Errors
    /// `Generic` when the message is missing or belongs to another account;
    /// the two cases present identically.
    pub async fn message_detail(&self, id: &str) -> Result<MessageDetail, ApiError> {
        self.get_json(&["api", "messages", id]).await
    }

    /// # Errors
    /// `Generic` when the message is missing or belongs to another account.
    pub async fn delete_message(&self, id: &str) -> Result<OkResponse, ApiError> {
        self.delete_json(&["api", "messages", id]).await
    }

    /// Post the multipart send form assembled by the message exchange.
    ///
    /// # Errors
    /// `Validation` when the server rejects field constraints, `Unauthorized`
    /// when the session expired mid-composition.
    pub async fn send_message(&self, form: Form) -> Result<SendMessageResponse, ApiError> {
        let url = self.endpoint(&["api", "messages", "send"])?;
        let span = info_span!("api.send_message", http.method = "POST", url = %url);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .instrument(span)
            .await?;
        decode(response).await
    }

    /// Fetch raw attachment bytes with their display metadata.
    ///
    /// # Errors
    /// `Generic` when the attachment is missing or foreign.
    pub async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentDownload, ApiError> {
        let url = self.endpoint(&["api", "messages", message_id, "attachments", attachment_id])?;
        let span = info_span!("api.download_attachment", http.method = "GET", url = %url);
        let response = self.client.get(url).send().instrument(span).await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let filename = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(AttachmentDownload {
            filename,
            content_type,
            bytes,
        })
    }
}

/// Decode a 2xx JSON body or classify the failure.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        Ok(response.json::<T>().await?)
    } else {
        Err(ApiError::from_response(response).await)
    }
}

/// Validate the API base URL the way the server expects it: http/https with a
/// host, trailing slash tolerated.
fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base_url.trim())
        .map_err(|err| ApiError::Generic(format!("Invalid API base URL: {err}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Generic(format!(
            "Invalid API base URL: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.host().is_none() {
        return Err(ApiError::Generic("Invalid API base URL: no host specified".to_string()));
    }

    Ok(url)
}

/// Recover a filename from a `Content-Disposition: attachment; filename="…"`
/// header. Unquoted and missing filenames yield `None`.
fn disposition_filename(header: &str) -> Option<String> {
    let (_, tail) = header.split_once("filename=\"")?;
    let (filename, _) = tail.split_once('"')?;
    if filename.is_empty() {
        None
    } else {
        Some(filename.to_string())
    }
}
