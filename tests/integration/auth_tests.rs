//! Sign-up, login and logout integration tests.
//!
//! Tests verify:
//! - Sign-up stores a hashed password and rejects duplicate emails
//! - Login accepts the right credentials and rejects everything else
//! - Login starts a signed session; logout ends it and redirects

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use gallery_server::password::verify_password;
use gallery_server::store::{DocumentStore, MemoryStore, NewUser};
use gallery_server::{
    create_router_with_state, AppState, SessionSigner, SessionStore, SESSION_COOKIE,
    USER_ID_COOKIE,
};

use super::test_utils::{
    body_json, cookie_pair, post_json, set_cookies, test_app, test_config, TEST_PASSWORD_COST,
    TEST_SECRET,
};

fn signup_body(email: &str, password: &str) -> serde_json::Value {
    json!({ "username": "alice", "email": email, "password": password })
}

fn login_body(email: &str, password: &str) -> serde_json::Value {
    json!({ "email": email, "password": password })
}

// =============================================================================
// Sign-up
// =============================================================================

#[tokio::test]
async fn test_signup_stores_hashed_password() {
    let (router, state) = test_app(MemoryStore::new());

    let response = router
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["acknowledged"], true);

    let user = state
        .store
        .user_by_email("a@example.com")
        .await
        .unwrap()
        .expect("user should be stored");
    assert_eq!(user.id, body["insertedId"]);
    assert_eq!(user.username, "alice");
    assert_ne!(user.password_hash, "hunter2");
    assert!(verify_password("hunter2".to_string(), user.password_hash).await);
}

#[tokio::test]
async fn test_duplicate_signup_conflict() {
    let (router, state) = test_app(MemoryStore::new());

    let first = router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "one")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = router
        .oneshot(post_json("/signup", signup_body("a@example.com", "two")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(second).await,
        json!({ "error": true, "message": "User already exists" })
    );
    assert_eq!(state.store.user_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_signups_single_user() {
    let (router, state) = test_app(MemoryStore::new());

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                router
                    .oneshot(post_json(
                        "/signup",
                        signup_body("race@example.com", &format!("pw{}", i)),
                    ))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::CONFLICT)
            .count(),
        4
    );
    assert_eq!(state.store.user_count().await, 1);
}

#[tokio::test]
async fn test_signup_requires_email_and_password() {
    let (router, state) = test_app(MemoryStore::new());

    for body in [signup_body("", "pw"), signup_body("a@example.com", "")] {
        let response = router
            .clone()
            .oneshot(post_json("/signup", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": true, "message": "Email and password are required" })
        );
    }

    assert_eq!(state.store.user_count().await, 0);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_success() {
    let (router, state) = test_app(MemoryStore::new());

    router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();

    let response = router
        .oneshot(post_json("/login", login_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sid = cookie_pair(&response, SESSION_COOKIE).expect("session cookie set");
    let user_id = cookie_pair(&response, USER_ID_COOKIE).expect("user id cookie set");
    assert!(set_cookies(&response)
        .iter()
        .filter(|c| c.starts_with(SESSION_COOKIE))
        .all(|c| c.contains("HttpOnly")));

    assert_eq!(
        body_json(response).await,
        json!({ "message": "User login successful" })
    );

    // The cookie names a live session for this user
    let value = sid.trim_start_matches(&format!("{}=", SESSION_COOKIE));
    let session_id = SessionSigner::new(TEST_SECRET)
        .verify(value)
        .expect("cookie signature verifies");
    let session = state.sessions.get(session_id).await.expect("session exists");
    assert_eq!(session.email, "a@example.com");
    assert_eq!(
        user_id,
        format!("{}={}", USER_ID_COOKIE, session.user_id)
    );
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (router, state) = test_app(MemoryStore::new());

    router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();

    let response = router
        .oneshot(post_json("/login", login_body("a@example.com", "hunter3")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(
        body_json(response).await,
        json!({ "message": "User not found Or Invalid password" })
    );
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_login_unknown_email() {
    let (router, _) = test_app(MemoryStore::new());

    let response = router
        .oneshot(post_json("/login", login_body("nobody@example.com", "pw")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "User not found Or Invalid password" })
    );
}

#[tokio::test]
async fn test_login_user_without_password_hash() {
    let (router, state) = test_app(MemoryStore::new());

    // A user record that never had a hash
    state
        .store
        .insert_user(NewUser {
            username: "legacy".to_string(),
            email: "legacy@example.com".to_string(),
            password_hash: String::new(),
        })
        .await
        .unwrap();

    for password in ["", "anything"] {
        let response = router
            .clone()
            .oneshot(post_json("/login", login_body("legacy@example.com", password)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "User not found Or Invalid password" })
        );
    }
    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_login_with_unbounded_session_ttl() {
    let state = AppState::new(
        MemoryStore::new(),
        SessionStore::new(Duration::MAX),
        SessionSigner::new(TEST_SECRET),
    )
    .with_password_cost(TEST_PASSWORD_COST);
    let router = create_router_with_state(state.clone(), &test_config());

    router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();

    let response = router
        .oneshot(post_json("/login", login_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sid = set_cookies(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", SESSION_COOKIE)))
        .expect("session cookie set");
    assert!(!sid.contains("Max-Age=-"), "cookie: {}", sid);
    assert_eq!(state.sessions.len().await, 1);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_ends_session() {
    let (router, state) = test_app(MemoryStore::new());

    router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();

    let login = router
        .clone()
        .oneshot(post_json("/login", login_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    let sid = cookie_pair(&login, SESSION_COOKIE).unwrap();
    let user_id = cookie_pair(&login, USER_ID_COOKIE).unwrap();
    assert_eq!(state.sessions.len().await, 1);

    let request = Request::builder()
        .uri("/logout")
        .header(header::COOKIE, format!("{}; {}", sid, user_id))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

    let cleared = set_cookies(&response);
    for name in [SESSION_COOKIE, USER_ID_COOKIE] {
        let cookie = cleared
            .iter()
            .find(|c| c.starts_with(&format!("{}=", name)))
            .unwrap_or_else(|| panic!("{} should be cleared", name));
        assert!(cookie.contains("Max-Age=0"), "cookie: {}", cookie);
    }

    assert!(state.sessions.is_empty().await);
}

#[tokio::test]
async fn test_logout_without_session_redirects() {
    let (router, _) = test_app(MemoryStore::new());

    let request = Request::builder()
        .uri("/logout")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_logout_with_tampered_cookie_keeps_session() {
    let (router, state) = test_app(MemoryStore::new());

    router
        .clone()
        .oneshot(post_json("/signup", signup_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    router
        .clone()
        .oneshot(post_json("/login", login_body("a@example.com", "hunter2")))
        .await
        .unwrap();
    assert_eq!(state.sessions.len().await, 1);

    // A session id signed with a different key
    let forged = SessionSigner::new("attacker-key").sign("deadbeef");
    let request = Request::builder()
        .uri("/logout")
        .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, forged))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(state.sessions.len().await, 1);
}
