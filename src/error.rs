use thiserror::Error;

/// Errors that can occur when talking to the document store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Could not reach the store or establish a client
    #[error("Connection error: {0}")]
    Connection(String),

    /// A read or write against a collection failed
    #[error("Query error: {0}")]
    Query(String),

    /// A user with this email is already registered (unique index violation)
    #[error("User already exists: {email}")]
    DuplicateUser { email: String },

    /// A stored document could not be mapped to a typed record
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Errors raised while hashing a password
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    /// bcrypt rejected the input or cost factor
    #[error("Hashing failed: {0}")]
    Hash(String),

    /// The blocking hashing task panicked or was cancelled
    #[error("Hashing task failed: {0}")]
    Task(String),
}

/// Errors returned by the HTTP handlers.
///
/// Each variant maps to a fixed status code and response body; see the
/// `IntoResponse` implementation in `server::handlers`.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// `GET /my-images` without an `email` query parameter (403)
    #[error("Forbidden Access")]
    MissingEmailQuery,

    /// `GET /user/{email}` with an empty email segment (401)
    #[error("User not found")]
    MissingEmailPath,

    /// Uploaded image has no owner email (400)
    #[error("Image email is required")]
    MissingImageEmail,

    /// Sign-up without an email or password (400)
    #[error("Email and password are required")]
    MissingCredentials,

    /// Sign-up with an email that is already registered (409)
    #[error("User already exists")]
    UserExists,

    /// Unknown email or wrong password on login (401)
    #[error("User not found Or Invalid password")]
    InvalidCredentials,

    /// Document store failure (500)
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Password hashing failure (500)
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUser { .. } => ApiError::UserExists,
            other => ApiError::Store(other),
        }
    }
}
