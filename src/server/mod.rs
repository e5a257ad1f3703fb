//! HTTP server layer for the gallery.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   /upload-img  /my-images  /user/{email}  /signup /login ...    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │   session   │  │        routes           │  │
//! │  │ (requests)  │  │ (cookies)   │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;
pub mod session;

pub use handlers::{
    health_handler, login_handler, logout_handler, my_images_handler, root_handler,
    signup_handler, upload_image_handler, user_by_email_handler, AppState, HealthResponse,
    LoginRequest, MessageResponse, MyImagesQuery, SignupRequest, LOGOUT_REDIRECT, WELCOME_HTML,
};
pub use routes::{create_router, create_router_with_state, RouterConfig};
pub use session::{
    Session, SessionSigner, SessionStore, DEFAULT_SESSION_TTL, SESSION_COOKIE, USER_ID_COOKIE,
};
