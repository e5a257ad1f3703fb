//! MongoDB-backed document store.
//!
//! Both collections live in a single database. Documents are read and written
//! as raw BSON and mapped to the typed records at this boundary, so legacy
//! documents with missing or extra fields still load.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind, WriteError, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, Database, IndexModel};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{DocumentStore, Image, InsertAck, NewImage, NewUser, User};
use crate::error::StoreError;

/// Name of the user collection.
pub const USERS_COLLECTION: &str = "users";

/// Name of the image collection.
pub const IMAGES_COLLECTION: &str = "images";

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// `DocumentStore` backed by a MongoDB deployment.
///
/// Holds one long-lived client; the driver manages its own connections.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connect to the deployment at `uri` and select `database`.
    ///
    /// The client pins Stable API v1 (strict, with deprecation errors). No
    /// network round-trip happens here; call [`ping`](DocumentStore::ping)
    /// to check connectivity.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let database = client.database(database);

        Ok(Self { client, database })
    }

    /// Name of the selected database.
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    /// Create the unique index on `users.email` that backs conflict detection.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.users()
            .create_index(index)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        info!("Ensured unique index on {}.email", USERS_COLLECTION);
        Ok(())
    }

    fn users(&self) -> Collection<Document> {
        self.database.collection(USERS_COLLECTION)
    }

    fn images(&self) -> Collection<Document> {
        self.database.collection(IMAGES_COLLECTION)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_image(&self, image: NewImage) -> Result<InsertAck, StoreError> {
        let mut document = mongodb::bson::to_document(&image.attributes)
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        document.insert("email", image.email);

        let result = self
            .images()
            .insert_one(document)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(InsertAck::new(id_to_string(&result.inserted_id)))
    }

    async fn images_by_email(&self, email: &str) -> Result<Vec<Image>, StoreError> {
        let documents: Vec<Document> = self
            .images()
            .find(doc! { "email": email })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        debug!(email, count = documents.len(), "Loaded images");
        Ok(documents.into_iter().map(image_from_document).collect())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let document = self
            .users()
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        document.map(user_from_document).transpose()
    }

    async fn insert_user(&self, user: NewUser) -> Result<InsertAck, StoreError> {
        let document = doc! {
            "username": user.username.as_str(),
            "email": user.email.as_str(),
            "password": user.password_hash.as_str(),
        };

        match self.users().insert_one(document).await {
            Ok(result) => Ok(InsertAck::new(id_to_string(&result.inserted_id))),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::DuplicateUser { email: user.email }),
            Err(e) => Err(StoreError::Query(e.to_string())),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}

// =============================================================================
// Document Mapping
// =============================================================================

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. }))
            if *code == DUPLICATE_KEY_CODE
    )
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn user_from_document(document: Document) -> Result<User, StoreError> {
    let id = document.get("_id").map(id_to_string).unwrap_or_default();
    let email = document
        .get_str("email")
        .map_err(|e| StoreError::InvalidDocument(format!("user email: {}", e)))?
        .to_string();
    // Legacy users without a hash load with an empty one, which never verifies
    let password_hash = document.get_str("password").unwrap_or_default().to_string();
    let username = document.get_str("username").unwrap_or_default().to_string();

    Ok(User {
        id,
        username,
        email,
        password_hash,
    })
}

fn image_from_document(mut document: Document) -> Image {
    let id = document
        .remove("_id")
        .map(|id| id_to_string(&id))
        .unwrap_or_default();
    let email = match document.remove("email") {
        Some(Bson::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let attributes = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Image {
        id,
        email,
        attributes,
    }
}
