//! Session state machine against a mock server: bootstrap, the two-phase
//! login protocol, fail-safe logout, and 401 handling.

use anyhow::{anyhow, Result};
use kurier::api::{error::ApiError, Gateway};
use kurier::session::{LoginOutcome, SessionManager, SessionState};
use secrecy::SecretString;
use std::net::TcpListener;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn manager(server: &MockServer) -> Result<SessionManager> {
    let gateway = Arc::new(Gateway::new(&server.uri())?);
    Ok(SessionManager::new(gateway))
}

fn password() -> SecretString {
    SecretString::from("hunter2!".to_string())
}

fn me_body() -> serde_json::Value {
    serde_json::json!({
        "user": {"id": "u-1", "email": "alice@example.com", "username": "alice"}
    })
}

#[tokio::test]
async fn bootstrap_guest_swallows_unauthorized() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    assert_eq!(session.current().state, SessionState::Unknown);

    session.bootstrap().await;

    let current = session.current();
    assert_eq!(current.state, SessionState::Anonymous);
    // A guest is not an error condition.
    assert!(current.last_error.is_none());
    Ok(())
}

#[tokio::test]
async fn bootstrap_restores_existing_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    session.bootstrap().await;

    let user = session.current().user().cloned().ok_or_else(|| anyhow!("expected user"))?;
    assert_eq!(user.username, "alice");
    Ok(())
}

#[tokio::test]
async fn bootstrap_records_server_failure() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "detail": "database down"
        })))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    session.bootstrap().await;

    let current = session.current();
    assert_eq!(current.state, SessionState::Anonymous);
    assert_eq!(current.last_error.as_deref(), Some("database down"));
    Ok(())
}

#[tokio::test]
async fn login_without_step_up_matches_session_lookup() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "alice@example.com",
            "password": "hunter2!"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .set_body_json(serde_json::json!({"requires_2fa": false})),
        )
        .mount(&server)
        .await;

    // Session lookup must see the cookie the login response set.
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    let outcome = session.login("alice@example.com", &password()).await?;

    let user = match outcome {
        LoginOutcome::Authenticated(user) => user,
        LoginOutcome::TotpRequired => return Err(anyhow!("unexpected step-up")),
    };
    assert_eq!(user.id, "u-1");
    assert_eq!(session.current().user().map(|u| u.id.clone()), Some("u-1".to_string()));
    Ok(())
}

#[tokio::test]
async fn step_up_keeps_session_anonymous_until_code_accepted() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    // Phase 1: password alone answers with the challenge flag.
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "alice@example.com",
            "password": "hunter2!"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"requires_2fa": true})),
        )
        .mount(&server)
        .await;

    // Phase 2: the full triple, the server is stateless between phases.
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "alice@example.com",
            "password": "hunter2!",
            "totp_code": "123456"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "sid=xyz; Path=/; HttpOnly")
                .set_body_json(serde_json::json!({"requires_2fa": false})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    let outcome = session.login("alice@example.com", &password()).await?;
    assert_eq!(outcome, LoginOutcome::TotpRequired);
    assert_eq!(session.current().state, SessionState::Anonymous);

    let user = session
        .complete_step_up("alice@example.com", &password(), "123456")
        .await?;
    assert_eq!(user.username, "alice");
    assert!(session.current().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn rejected_step_up_leaves_session_anonymous() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    let err = session
        .complete_step_up("alice@example.com", &password(), "000000")
        .await
        .err()
        .ok_or_else(|| anyhow!("expected error"))?;
    assert_eq!(err, ApiError::Unauthorized);
    assert_eq!(session.current().state, SessionState::Anonymous);
    Ok(())
}

#[tokio::test]
async fn logout_is_fail_safe() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    // The logout request itself blows up; the local session must clear anyway.
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    session.bootstrap().await;
    assert!(session.current().is_authenticated());

    session.logout().await;
    assert_eq!(session.current().state, SessionState::Anonymous);
    Ok(())
}

#[tokio::test]
async fn invalidate_reacts_to_unauthorized_elsewhere() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    // An authenticated view hits an expired session on another endpoint.
    Mock::given(method("GET"))
        .and(path("/api/messages/inbox"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let gateway = Arc::new(Gateway::new(&server.uri())?);
    let mut session = SessionManager::new(Arc::clone(&gateway));
    session.bootstrap().await;
    assert!(session.current().is_authenticated());

    let err = gateway.inbox().await.err().ok_or_else(|| anyhow!("expected error"))?;
    assert!(err.is_unauthorized());
    session.invalidate();
    assert_eq!(session.current().state, SessionState::Anonymous);
    Ok(())
}

#[tokio::test]
async fn watchers_observe_state_changes() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut session = manager(&server)?;
    let mut watcher = session.subscribe();

    session.bootstrap().await;

    watcher.changed().await?;
    assert_eq!(watcher.borrow().state, SessionState::Anonymous);
    Ok(())
}
