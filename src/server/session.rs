//! Login sessions.
//!
//! Sessions are kept in process memory and identified by a random id. The id
//! reaches the client in the `sid` cookie together with an HMAC-SHA256 tag
//! computed with the server's secret key:
//!
//! ```text
//! sid = "{session_id}.{hex(HMAC-SHA256(secret_key, session_id))}"
//! ```
//!
//! A cookie whose tag does not verify is treated as absent. Tags are compared
//! in constant time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum_extra::extract::cookie::{Cookie, SameSite};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "sid";

/// Cookie carrying the logged-in user's id.
pub const USER_ID_COOKIE: &str = "userId";

/// Default session lifetime (24 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 3600);

// =============================================================================
// Session Store
// =============================================================================

/// State attached to a logged-in client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    /// `None` when the lifetime reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory session table.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for a user and return its id.
    ///
    /// Expired sessions are pruned on the way in.
    pub async fn create(&self, user_id: impl Into<String>, email: impl Into<String>) -> String {
        let id = generate_session_id();
        let now = Instant::now();
        let session = Session {
            user_id: user_id.into(),
            email: email.into(),
            expires_at: now.checked_add(self.ttl),
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(id.clone(), session);

        id
    }

    /// Look up a live session.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .get(id)
            .filter(|s| !s.is_expired(now))
            .cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn destroy(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

// =============================================================================
// Cookie Signing
// =============================================================================

/// Signs and verifies session ids with HMAC-SHA256.
#[derive(Clone)]
pub struct SessionSigner {
    secret_key: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Produce the cookie value for a session id.
    pub fn sign(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, hex::encode(self.tag(session_id)))
    }

    /// Extract the session id from a cookie value if its tag verifies.
    pub fn verify<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (session_id, tag) = value.rsplit_once('.')?;
        let provided = hex::decode(tag).ok()?;
        let expected = self.tag(session_id);

        if provided.ct_eq(&expected).into() {
            Some(session_id)
        } else {
            debug!("Rejected session cookie with invalid signature");
            None
        }
    }

    fn tag(&self, session_id: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// Build the `sid` cookie for a signed session value.
pub fn session_cookie(signed_value: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, signed_value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        ))
        .build()
}

/// Build the `userId` cookie.
pub fn user_id_cookie(user_id: String) -> Cookie<'static> {
    Cookie::build((USER_ID_COOKIE, user_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// A cookie that, passed to `CookieJar::remove`, clears `name` on the client.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}
