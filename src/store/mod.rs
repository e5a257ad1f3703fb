//! Document store layer.
//!
//! Handlers never talk to MongoDB directly. They go through the
//! [`DocumentStore`] trait, which exposes exactly the reads and writes the
//! HTTP surface needs:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          DocumentStore trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   MongoStore    │    │    MemoryStore      │
//! │ (users, images) │    │ (dev and tests)     │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Documents cross the trait as typed records ([`NewUser`], [`User`],
//! [`NewImage`], [`Image`]) rather than free-form maps, so each backend
//! decides how to lay them out.

mod memory;
mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, IMAGES_COLLECTION, USERS_COLLECTION};

// =============================================================================
// Records
// =============================================================================

/// A user about to be inserted. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A stored user.
///
/// The password hash is kept for verification but never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
}

/// An image document as uploaded by a client.
///
/// `email` ties the image to its owner; every other field is kept as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct NewImage {
    #[serde(default)]
    pub email: String,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NewImage {
    /// Drop fields the store assigns itself.
    pub fn normalized(mut self) -> Self {
        self.attributes.remove("_id");
        self
    }
}

/// A stored image document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Write acknowledgment returned by inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertAck {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

// =============================================================================
// DocumentStore
// =============================================================================

/// Access to the `users` and `images` collections.
///
/// Implementations must make [`insert_user`](DocumentStore::insert_user)
/// atomic with respect to the email: two concurrent inserts for the same
/// email yield one success and one [`StoreError::DuplicateUser`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert an image document.
    async fn insert_image(&self, image: NewImage) -> Result<InsertAck, StoreError>;

    /// All images whose `email` equals `email`. Order is unspecified.
    async fn images_by_email(&self, email: &str) -> Result<Vec<Image>, StoreError>;

    /// The user registered with `email`, if any.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a user unless one with the same email exists.
    async fn insert_user(&self, user: NewUser) -> Result<InsertAck, StoreError>;

    /// Round-trip to the store to confirm connectivity.
    async fn ping(&self) -> Result<(), StoreError>;
}
