use serde::{Deserialize, Serialize};

/// Opaque user identifier assigned at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// A stored account. Only the bcrypt hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("username already exists")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("user store error: {0}")]
    Backend(String),
}

/// Seam over the account document store. The production deployment delegates
/// to an external document database; tests and the bundled server use an
/// in-memory adapter.
pub trait UserStore: Send + Sync {
    fn insert(&self, record: UserRecord) -> Result<(), RepositoryError>;
    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;
    fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
}
