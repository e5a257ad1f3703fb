//! HTTP request handlers for the gallery API.
//!
//! Each handler performs at most one document store operation.
//!
//! # Endpoints
//!
//! - `GET /` - Welcome page
//! - `GET /health` - Health check
//! - `POST /upload-img` - Store an image document
//! - `GET /my-images?email=...` - List a user's images
//! - `GET /user/{email}` - Fetch a user by email
//! - `POST /signup` - Register a user
//! - `POST /login` - Verify credentials and start a session
//! - `GET /logout` - End the session and redirect to `/login`

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::session::{
    removal_cookie, session_cookie, user_id_cookie, SessionSigner, SessionStore, SESSION_COOKIE,
    USER_ID_COOKIE,
};
use crate::error::ApiError;
use crate::password::{hash_password, verify_password, DEFAULT_HASH_COST};
use crate::store::{DocumentStore, Image, InsertAck, NewImage, NewUser};

/// Body of `GET /`.
pub const WELCOME_HTML: &str = "<h1>WELCOME TO GEM CROP GALLERY SERVER</h1>";

/// Where `GET /logout` sends the client.
pub const LOGOUT_REDIRECT: &str = "/login";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Built once at startup and handed to every handler through Axum's `State`
/// extractor.
pub struct AppState<S: DocumentStore> {
    /// The document store holding `users` and `images`
    pub store: Arc<S>,

    /// Live login sessions
    pub sessions: Arc<SessionStore>,

    /// Signs session cookies with the server secret
    pub signer: SessionSigner,

    /// bcrypt cost factor for new password hashes
    pub password_cost: u32,
}

impl<S: DocumentStore> AppState<S> {
    pub fn new(store: S, sessions: SessionStore, signer: SessionSigner) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(sessions),
            signer,
            password_cost: DEFAULT_HASH_COST,
        }
    }

    /// Override the bcrypt cost factor.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}

impl<S: DocumentStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sessions: Arc::clone(&self.sessions),
            signer: self.signer.clone(),
            password_cost: self.password_cost,
        }
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Query parameters for `GET /my-images`.
#[derive(Debug, Deserialize)]
pub struct MyImagesQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON body for error responses and plain acknowledgments.
///
/// `error` is only emitted when set, so bodies read either
/// `{"error": true, "message": ...}` or `{"message": ...}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,

    pub message: String,
}

impl MessageResponse {
    /// A body flagged with `"error": true`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }

    /// A body carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: false,
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ApiError to an HTTP response.
///
/// Server errors are logged at ERROR with the underlying cause; the client
/// only sees a generic message.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, body) = match &self {
            ApiError::MissingEmailQuery => (
                StatusCode::FORBIDDEN,
                "forbidden",
                MessageResponse::error(self.to_string()),
            ),
            ApiError::MissingEmailPath => (
                StatusCode::UNAUTHORIZED,
                "user_not_found",
                MessageResponse::message(self.to_string()),
            ),
            ApiError::MissingImageEmail | ApiError::MissingCredentials => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                MessageResponse::error(self.to_string()),
            ),
            ApiError::UserExists => (
                StatusCode::CONFLICT,
                "user_exists",
                MessageResponse::error(self.to_string()),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                MessageResponse::message(self.to_string()),
            ),
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                MessageResponse::error("Internal server error"),
            ),
            ApiError::Password(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "password_error",
                MessageResponse::error("Internal server error"),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else if status == StatusCode::UNAUTHORIZED {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
        }

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle `GET /`.
pub async fn root_handler() -> Html<&'static str> {
    Html(WELCOME_HTML)
}

/// Handle `GET /health`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle `POST /upload-img`.
///
/// The body is any JSON object with a non-empty `email`. Extra fields are
/// stored as-is; a client-supplied `_id` is dropped.
///
/// # Response
///
/// `200 OK` with `{"acknowledged": true, "insertedId": "..."}`.
pub async fn upload_image_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(image): Json<NewImage>,
) -> Result<Json<InsertAck>, ApiError> {
    if image.email.is_empty() {
        return Err(ApiError::MissingImageEmail);
    }

    let ack = state.store.insert_image(image.normalized()).await?;
    debug!(inserted_id = %ack.inserted_id, "Stored image");
    Ok(Json(ack))
}

/// Handle `GET /my-images?email=...`.
///
/// # Errors
///
/// - `403 Forbidden` when `email` is missing or empty
pub async fn my_images_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<MyImagesQuery>,
) -> Result<Json<Vec<Image>>, ApiError> {
    let email = match query.email {
        Some(email) if !email.is_empty() => email,
        _ => return Err(ApiError::MissingEmailQuery),
    };

    let images = state.store.images_by_email(&email).await?;
    Ok(Json(images))
}

/// Handle `GET /user/{email}`.
///
/// Returns the user as JSON, or `200 OK` with an empty body when no user has
/// that email.
pub async fn user_by_email_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Path(email): Path<String>,
) -> Result<Response, ApiError> {
    if email.is_empty() {
        return Err(ApiError::MissingEmailPath);
    }

    match state.store.user_by_email(&email).await? {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok(StatusCode::OK.into_response()),
    }
}

/// Handle `GET /user` and `GET /user/`, where the email segment is absent.
pub async fn missing_user_email_handler() -> ApiError {
    ApiError::MissingEmailPath
}

/// Handle `POST /signup`.
///
/// Hashes the password and inserts the user. The store rejects a second user
/// with the same email atomically.
///
/// # Errors
///
/// - `400 Bad Request` when email or password is empty
/// - `409 Conflict` when the email is taken
pub async fn signup_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<InsertAck>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::MissingCredentials);
    }

    let password_hash = hash_password(request.password, state.password_cost).await?;
    let ack = state
        .store
        .insert_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    info!(inserted_id = %ack.inserted_id, "User signed up");
    Ok(Json(ack))
}

/// Handle `POST /login`.
///
/// On success starts a session and sets the `sid` and `userId` cookies.
///
/// # Errors
///
/// - `401 Unauthorized` for an unknown email or a wrong password
pub async fn login_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let user = state
        .store
        .user_by_email(&request.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(request.password, user.password_hash.clone()).await {
        return Err(ApiError::InvalidCredentials);
    }

    let session_id = state.sessions.create(user.id.clone(), user.email.clone()).await;
    let jar = jar
        .add(session_cookie(
            state.signer.sign(&session_id),
            state.sessions.ttl(),
        ))
        .add(user_id_cookie(user.id));

    info!(email = %user.email, "User logged in");
    Ok((jar, Json(MessageResponse::message("User login successful"))))
}

/// Handle `GET /logout`.
///
/// Destroys the session named by a valid `sid` cookie, clears both session
/// cookies and redirects to `/login` with `302 Found`.
pub async fn logout_handler<S: DocumentStore>(
    State(state): State<AppState<S>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.signer.verify(cookie.value()).map(str::to_string));

    if let Some(session_id) = session_id {
        if state.sessions.destroy(&session_id).await {
            debug!("Session destroyed");
        }
    }

    let jar = jar
        .remove(removal_cookie(SESSION_COOKIE))
        .remove(removal_cookie(USER_ID_COOKIE));

    let redirect = (StatusCode::FOUND, [(header::LOCATION, LOGOUT_REDIRECT)]).into_response();
    (jar, redirect)
}

// =============================================================================
// Tests
// =============================================================================
