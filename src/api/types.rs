//! Wire types for the messaging API. Field names follow the server schemas;
//! `created_at` stays the opaque server string and is never parsed or
//! re-sorted client-side.

use serde::{Deserialize, Serialize};

/// Immutable snapshot of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

/// Phase-1 login answer: `requires_2fa` signals the TOTP step-up challenge.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub requires_2fa: bool,
}

#[derive(Debug, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwoFactorStatus {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorSetupResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

/// Read-only inbox projection; list order is the server's.
#[derive(Debug, Clone, Deserialize)]
pub struct InboxEntry {
    pub id: String,
    pub sender_username: String,
    pub created_at: String,
    pub read: bool,
    pub has_attachments: bool,
    /// Server-computed integrity assertion, surfaced as-is.
    pub authenticity_verified: bool,
}

/// Outbox projection of the caller's own sent messages.
#[derive(Debug, Clone, Deserialize)]
pub struct SentEntry {
    pub id: String,
    pub created_at: String,
    pub recipients_count: u32,
    pub has_attachments: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentMeta {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDetail {
    pub id: String,
    pub sender_username: String,
    pub created_at: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<AttachmentMeta>,
    pub authenticity_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    pub id: String,
}

/// Downloaded attachment bytes plus the display metadata that came with them.
#[derive(Debug, Clone)]
pub struct AttachmentDownload {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
