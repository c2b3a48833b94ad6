//! Document store client factory for the book catalog.
//!
//! [`connect`] picks a backend from the connection string scheme and hands back
//! a shared [`BookStore`] handle. The handle is opened once at startup and
//! closed by the `db` core module on shutdown ([`DbModule`]).

use std::sync::Arc;

use biblio_kernel::settings::DatabaseSettings;

pub mod memory;
pub mod model;
pub mod module;
#[cfg(feature = "mongo")]
pub mod mongo;
pub mod store;

pub use memory::MemoryStore;
pub use model::{Book, BookChanges, BookId, NewBook};
pub use module::DbModule;
pub use store::{BookStore, StoreError};

/// Shared store handle passed to every module that needs persistence.
pub type SharedStore = Arc<dyn BookStore>;

/// Open a store for the configured connection string.
pub async fn connect(settings: &DatabaseSettings) -> Result<SharedStore, StoreError> {
    let (scheme, rest) = settings
        .uri
        .split_once("://")
        .ok_or_else(|| StoreError::MalformedUri(settings.redacted_uri()))?;

    tracing::info!(
        target: "biblio-db",
        uri = %settings.redacted_uri(),
        "opening document store"
    );

    match scheme {
        "memory" => {
            let name = if rest.is_empty() { settings.name.as_str() } else { rest };
            Ok(Arc::new(MemoryStore::new(name)))
        }
        #[cfg(feature = "mongo")]
        "mongodb" | "mongodb+srv" => Ok(Arc::new(mongo::MongoStore::connect(settings).await?)),
        other => Err(StoreError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_uri(uri: &str) -> DatabaseSettings {
        DatabaseSettings {
            uri: uri.to_string(),
            ..DatabaseSettings::default()
        }
    }

    #[tokio::test]
    async fn memory_scheme_opens_an_in_process_store() {
        let store = connect(&with_uri("memory://catalog")).await.unwrap();
        assert_eq!(store.backend(), "memory");
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_scheme_is_rejected() {
        let err = connect(&with_uri("redis://localhost")).await.err().unwrap();
        assert!(matches!(err, StoreError::UnsupportedScheme(s) if s == "redis"));
    }

    #[tokio::test]
    async fn uri_without_scheme_is_rejected() {
        let err = connect(&with_uri("localhost:27017")).await.err().unwrap();
        assert!(matches!(err, StoreError::MalformedUri(_)));
    }
}
