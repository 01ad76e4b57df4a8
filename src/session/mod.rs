//! Authenticated-session state machine. The manager is the only writer of the
//! session value; consumers observe it through a watch channel instead of an
//! ambient shared context. Mutating operations take `&mut self`, so at most
//! one session-changing call is ever in flight.

pub mod guard;

use crate::api::{error::ApiError, types::User, Gateway};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Exactly one state holds at any time; `Authenticated` always carries the
/// user snapshot the server returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Loading,
    Authenticated(User),
    Anonymous,
}

/// The client's local belief about the ambient credential, plus the last
/// displayable failure. Never persisted beyond the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub last_error: Option<String>,
}

impl Session {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }
}

/// Outcome of login phase 1. `TotpRequired` is the explicit step-up state:
/// the session stays anonymous until [`SessionManager::complete_step_up`]
/// resubmits the full credential triple, because the server is stateless
/// between the two phases and issues no intermediate token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(User),
    TotpRequired,
}

pub struct SessionManager {
    gateway: Arc<Gateway>,
    tx: watch::Sender<Session>,
}

impl SessionManager {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let (tx, _) = watch::channel(Session {
            state: SessionState::Unknown,
            last_error: None,
        });
        Self { gateway, tx }
    }

    /// Snapshot of the current session.
    #[must_use]
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes. Guards and views watch this instead of
    /// holding a reference into the manager.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    fn set(&self, state: SessionState, last_error: Option<String>) {
        self.tx.send_replace(Session { state, last_error });
    }

    /// Resolve the initial `Unknown` state on process start. Guests land in
    /// `Anonymous` without an error; anything other than 401 also lands in
    /// `Anonymous` but records the failure for display.
    pub async fn bootstrap(&mut self) {
        self.set(SessionState::Loading, None);
        self.refresh().await;
    }

    /// Idempotent re-fetch of the current session. 401 is the valid terminal
    /// signal for "not logged in", never a surfaced error.
    pub async fn refresh(&mut self) {
        match self.gateway.me().await {
            Ok(envelope) => self.set(SessionState::Authenticated(envelope.user), None),
            Err(ApiError::Unauthorized) => self.set(SessionState::Anonymous, None),
            Err(err) => {
                warn!("session lookup failed: {err}");
                self.set(SessionState::Anonymous, Some(err.to_string()));
            }
        }
    }

    /// Login phase 1. When the server signals a step-up requirement the
    /// session stays `Anonymous` and the caller must follow up with
    /// [`Self::complete_step_up`]; otherwise the session is refreshed and
    /// becomes `Authenticated`.
    ///
    /// # Errors
    /// `Unauthorized` on bad credentials, `Validation` on malformed input,
    /// `Generic` otherwise. The state stays `Anonymous` on failure.
    pub async fn login(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<LoginOutcome, ApiError> {
        match self.gateway.login(email, password, None).await {
            Ok(response) if response.requires_2fa => {
                debug!("step-up challenge required");
                self.set(SessionState::Anonymous, None);
                Ok(LoginOutcome::TotpRequired)
            }
            Ok(_) => Ok(LoginOutcome::Authenticated(self.finish_login().await?)),
            Err(err) => {
                self.set(SessionState::Anonymous, None);
                Err(err)
            }
        }
    }

    /// Step-up phase: resubmit the full credential triple. On `Unauthorized`
    /// the state remains `Anonymous` and the caller retries with corrected
    /// credentials or code; no lockout counting happens client-side.
    ///
    /// # Errors
    /// `Unauthorized` on a rejected triple, `Generic` otherwise.
    pub async fn complete_step_up(
        &mut self,
        email: &str,
        password: &SecretString,
        totp_code: &str,
    ) -> Result<User, ApiError> {
        match self.gateway.login(email, password, Some(totp_code)).await {
            Ok(_) => self.finish_login().await,
            Err(err) => {
                self.set(SessionState::Anonymous, None);
                Err(err)
            }
        }
    }

    /// Confirm the fresh cookie maps to a user and publish the session.
    async fn finish_login(&mut self) -> Result<User, ApiError> {
        match self.gateway.me().await {
            Ok(envelope) => {
                let user = envelope.user;
                self.set(SessionState::Authenticated(user.clone()), None);
                Ok(user)
            }
            Err(err) => {
                self.set(SessionState::Anonymous, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Fail-safe logout: the server call is best-effort and its outcome is
    /// ignored, so a network error cannot leave the client believing it is
    /// still authenticated.
    pub async fn logout(&mut self) {
        if let Err(err) = self.gateway.logout().await {
            debug!("logout request failed, clearing session anyway: {err}");
        }
        self.set(SessionState::Anonymous, None);
    }

    /// React to a 401 from any other authenticated endpoint, the universal
    /// session-invalid signal.
    pub fn invalidate(&mut self) {
        self.set(SessionState::Anonymous, None);
    }
}
