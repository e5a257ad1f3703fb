//! Router configuration for the gallery server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Welcome page
//! GET  /health            - Health check
//! POST /upload-img        - Store an image document
//! GET  /my-images         - List images by owner email
//! GET  /user/{email}      - Fetch a user by email
//! POST /signup            - Register a user
//! POST /login             - Start a session
//! GET  /logout            - End the session
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gallery_server::server::routes::{create_router, RouterConfig};
//! use gallery_server::store::MemoryStore;
//!
//! let config = RouterConfig::new("my-secret-key")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(MemoryStore::new(), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5100").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, login_handler, logout_handler, missing_user_email_handler, my_images_handler,
    root_handler, signup_handler, upload_image_handler, user_by_email_handler, AppState,
};
use super::session::{SessionSigner, SessionStore, DEFAULT_SESSION_TTL};
use crate::password::DEFAULT_HASH_COST;
use crate::store::DocumentStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Secret key for signing session cookies
    pub secret_key: String,

    /// Lifetime of a login session
    pub session_ttl: Duration,

    /// bcrypt cost factor for new password hashes
    pub password_cost: u32,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with the given secret key.
    ///
    /// By default:
    /// - Sessions last 24 hours
    /// - bcrypt cost is 10
    /// - CORS allows any origin
    /// - Tracing is enabled
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            session_ttl: DEFAULT_SESSION_TTL,
            password_cost: DEFAULT_HASH_COST,
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the bcrypt cost factor.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router around a document store.
pub fn create_router<S>(store: S, config: RouterConfig) -> Router
where
    S: DocumentStore + 'static,
{
    let app_state = AppState::new(
        store,
        SessionStore::new(config.session_ttl),
        SessionSigner::new(&config.secret_key),
    )
    .with_password_cost(config.password_cost);

    create_router_with_state(app_state, &config)
}

/// Create the application router from prebuilt state.
///
/// Lets callers keep a handle on the store and session table.
pub fn create_router_with_state<S>(app_state: AppState<S>, config: &RouterConfig) -> Router
where
    S: DocumentStore + 'static,
{
    let cors = build_cors_layer(config);

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/upload-img", post(upload_image_handler::<S>))
        .route("/my-images", get(my_images_handler::<S>))
        .route("/user", get(missing_user_email_handler))
        .route("/user/", get(missing_user_email_handler))
        .route("/user/{email}", get(user_by_email_handler::<S>))
        .route("/signup", post(signup_handler::<S>))
        .route("/login", post(login_handler::<S>))
        .route("/logout", get(logout_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
