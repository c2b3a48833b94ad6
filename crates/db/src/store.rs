use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Book, BookChanges, NewBook};

/// Failures surfaced by a [`BookStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier is not in the store's key format. Never used for a miss.
    #[error("invalid identifier '{0}'")]
    InvalidId(String),

    #[error("store connection is closed")]
    Closed,

    #[error("unsupported connection scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("malformed connection string '{0}'")]
    MalformedUri(String),

    #[cfg(feature = "mongo")]
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// Handle on the book collection.
///
/// Lookups by id distinguish two outcomes: a malformed id is
/// `Err(StoreError::InvalidId)`, a well-formed id with no record is `Ok(None)`.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Persist a new record, assigning id and both timestamps.
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    /// Every record, most recently created first.
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Apply `changes` and refresh `updated_at`; returns the new state.
    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError>;

    /// Hard delete; returns the last known state.
    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
