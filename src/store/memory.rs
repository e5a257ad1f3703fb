//! In-process document store.
//!
//! Keeps both collections in memory behind a single lock. Used for local
//! development (`--memory-store`) and as the backing store in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DocumentStore, Image, InsertAck, NewImage, NewUser, User};
use crate::error::StoreError;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    images: Vec<Image>,
}

/// `DocumentStore` backed by in-memory vectors.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.collections.read().await.users.len()
    }

    /// Number of stored images.
    pub async fn image_count(&self) -> usize {
        self.collections.read().await.images.len()
    }

    fn allocate_id(&self) -> String {
        // 24 hex digits, same shape as an ObjectId
        format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_image(&self, image: NewImage) -> Result<InsertAck, StoreError> {
        let id = self.allocate_id();
        self.collections.write().await.images.push(Image {
            id: id.clone(),
            email: image.email,
            attributes: image.attributes,
        });
        Ok(InsertAck::new(id))
    }

    async fn images_by_email(&self, email: &str) -> Result<Vec<Image>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .images
            .iter()
            .filter(|image| image.email == email)
            .cloned()
            .collect())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<InsertAck, StoreError> {
        // Check and insert under one write lock
        let mut collections = self.collections.write().await;
        if collections.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateUser { email: user.email });
        }

        let id = self.allocate_id();
        collections.users.push(User {
            id: id.clone(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        });
        Ok(InsertAck::new(id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
