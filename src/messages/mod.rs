//! Message exchange: recipient parsing, multipart send with attachments, and
//! the inbox/sent/detail/delete operations. Attachment bytes are opaque to
//! the client, and `authenticity_verified` is surfaced exactly as the server
//! asserted it, never recomputed.

use crate::api::{
    error::ApiError,
    types::{AttachmentDownload, InboxEntry, MessageDetail, SentEntry},
    Gateway,
};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use tracing::debug;

/// Field bounds enforced by the server and mirrored client-side so a bad
/// draft fails before the network round trip.
const SUBJECT_MAX_CHARS: usize = 200;
const BODY_MAX_CHARS: usize = 20_000;

/// An attachment as composed by the caller; filename and content type are
/// display metadata the server stores verbatim.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Derive the recipient set from free-text input: split on comma or newline,
/// trim, drop empty tokens, and deduplicate by exact string equality while
/// preserving first-occurrence order. All-separator input yields an empty
/// set, which `send` rejects.
#[must_use]
pub fn parse_recipients(raw: &str) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    for token in raw.split(['\n', ',']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if !recipients.iter().any(|seen| seen == token) {
            recipients.push(token.to_string());
        }
    }
    recipients
}

pub struct MessageExchange {
    gateway: Arc<Gateway>,
}

impl MessageExchange {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Send a message. The draft is borrowed, not consumed: a failure,
    /// including `Unauthorized` when the session expired mid-composition,
    /// leaves the composed content with the caller for re-submission after
    /// re-authentication. Returns the new message id.
    ///
    /// # Errors
    /// `Validation` on empty recipients or out-of-bounds subject/body (checked
    /// client-side) and on server-side field rejection; `Unauthorized` on an
    /// expired session.
    pub async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
        attachments: &[AttachmentUpload],
    ) -> Result<String, ApiError> {
        if recipients.is_empty() {
            return Err(ApiError::Validation {
                detail: "At least one recipient is required".to_string(),
            });
        }
        if subject.is_empty() || subject.chars().count() > SUBJECT_MAX_CHARS {
            return Err(ApiError::Validation {
                detail: format!("Subject must be 1-{SUBJECT_MAX_CHARS} characters"),
            });
        }
        if body.is_empty() || body.chars().count() > BODY_MAX_CHARS {
            return Err(ApiError::Validation {
                detail: format!("Body must be 1-{BODY_MAX_CHARS} characters"),
            });
        }

        let recipients_json = serde_json::to_string(recipients)
            .map_err(|err| ApiError::Generic(format!("Failed to encode recipients: {err}")))?;

        let mut form = Form::new()
            .text("recipients", recipients_json)
            .text("subject", subject.to_string())
            .text("body", body.to_string());

        // Parts keep the caller's composition order.
        for attachment in attachments {
            let part = Part::bytes(attachment.data.clone())
                .file_name(attachment.filename.clone())
                .mime_str(&attachment.content_type)
                .map_err(|err| ApiError::Validation {
                    detail: format!("Invalid attachment content type: {err}"),
                })?;
            form = form.part("files", part);
        }

        debug!(
            recipients = recipients.len(),
            attachments = attachments.len(),
            "sending message"
        );
        let response = self.gateway.send_message(form).await?;
        Ok(response.id)
    }

    /// Inbox entries in server-provided order; no client-side filtering,
    /// sorting, or pagination.
    ///
    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn list_inbox(&self) -> Result<Vec<InboxEntry>, ApiError> {
        self.gateway.inbox().await
    }

    /// The caller's own sent messages, server order.
    ///
    /// # Errors
    /// `Unauthorized` without a session.
    pub async fn list_sent(&self) -> Result<Vec<SentEntry>, ApiError> {
        self.gateway.sent().await
    }

    /// Full message content. A missing id and a foreign id present
    /// identically; the API does not distinguish the two.
    ///
    /// # Errors
    /// `Generic` for missing/foreign ids, `Unauthorized` without a session.
    pub async fn detail(&self, id: &str) -> Result<MessageDetail, ApiError> {
        self.gateway.message_detail(id).await
    }

    /// Irreversible delete. Confirmation is a UI concern, not enforced here.
    ///
    /// # Errors
    /// `Generic` for missing/foreign ids, `Unauthorized` without a session.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.gateway.delete_message(id).await?;
        Ok(())
    }

    /// Raw attachment bytes with display metadata; no size or type
    /// re-validation beyond what the server enforces.
    ///
    /// # Errors
    /// `Generic` for missing/foreign ids, `Unauthorized` without a session.
    pub async fn download_attachment(
        &self,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<AttachmentDownload, ApiError> {
        self.gateway.download_attachment(message_id, attachment_id).await
    }
}
