//! # Kurier (Secure Messaging Client)
//!
//! `kurier` is the client-side controller for a secure web-messaging service.
//! It owns the session/authentication state machine, including the two-phase
//! login protocol (password, then a conditional TOTP step-up), the 2FA
//! lifecycle, and the message-exchange contract: recipient resolution,
//! multipart send with attachments, and the inbox/detail/delete operations.
//!
//! ## Session model
//!
//! The server issues an `HttpOnly` session cookie; every request carries it
//! as the ambient credential, and no call holds an explicit bearer token.
//! HTTP 401 on any endpoint is the universal session-invalid signal. The
//! [`session::SessionManager`] is the only writer of the session value and
//! publishes it through a watch channel; session lookup treats 401 as the
//! normal guest state, never as a displayed error.
//!
//! ## Authenticity
//!
//! Message integrity (HMAC) is computed and verified server-side. The client
//! consumes `authenticity_verified` as an opaque boolean and never re-derives
//! it; no cryptography happens in this crate.

pub mod api;
pub mod cli;
pub mod messages;
pub mod session;
pub mod twofa;
