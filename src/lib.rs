//! # Gallery Server
//!
//! HTTP backend for the Gem Crop image gallery.
//!
//! Users sign up and log in with an email and password; images are JSON
//! documents tagged with their owner's email. Everything is stored in MongoDB
//! and every route maps to a single store operation.
//!
//! ## Architecture
//!
//! - [`store`] - `DocumentStore` trait with MongoDB and in-memory backends
//! - [`password`] - bcrypt hashing and verification
//! - [`server`] - Axum handlers, routes and login sessions
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use gallery_server::{create_router, MemoryStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let router = create_router(MemoryStore::new(), RouterConfig::new("secret"));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5100").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, PasswordError, StoreError};
pub use password::{hash_password, verify_password, DEFAULT_HASH_COST};
pub use server::{
    create_router, create_router_with_state, AppState, MessageResponse, RouterConfig,
    SessionSigner, SessionStore, SESSION_COOKIE, USER_ID_COOKIE,
};
pub use store::{DocumentStore, Image, InsertAck, MemoryStore, MongoStore, NewImage, NewUser, User};
