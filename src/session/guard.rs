//! Gate for authenticated views. A pure decision over a session snapshot;
//! real access control lives on the API, this only steers navigation.

use super::{Session, SessionState};
use crate::api::types::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session resolved to a user; render the view.
    Allow(User),
    /// Session still `Unknown`/`Loading`; hold rendering, do not redirect.
    Pending,
    /// Anonymous; send the agent to the login challenge, preserving the
    /// intended destination for after authentication.
    RedirectToLogin { next: String },
}

#[must_use]
pub fn require_session(session: &Session, next: &str) -> RouteDecision {
    match &session.state {
        SessionState::Unknown | SessionState::Loading => RouteDecision::Pending,
        SessionState::Authenticated(user) => RouteDecision::Allow(user.clone()),
        SessionState::Anonymous => RouteDecision::RedirectToLogin {
            next: next.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(state: SessionState) -> Session {
        Session {
            state,
            last_error: None,
        }
    }

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn unresolved_session_is_pending_not_redirected() {
        assert_eq!(
            require_session(&session(SessionState::Unknown), "/inbox"),
            RouteDecision::Pending
        );
        assert_eq!(
            require_session(&session(SessionState::Loading), "/inbox"),
            RouteDecision::Pending
        );
    }

    #[test]
    fn authenticated_session_allows() {
        let decision = require_session(&session(SessionState::Authenticated(user())), "/inbox");
        assert_eq!(decision, RouteDecision::Allow(user()));
    }

    #[test]
    fn anonymous_session_redirects_with_destination() {
        let decision = require_session(&session(SessionState::Anonymous), "/messages/42");
        assert_eq!(
            decision,
            RouteDecision::RedirectToLogin {
                next: "/messages/42".to_string()
            }
        );
    }
}
