//! Process-local document store, selected with `memory://<name>`.

use async_trait::async_trait;
use time::Duration;
use tokio::sync::RwLock;

use crate::model::{timestamp_now, Book, BookChanges, BookId, NewBook};
use crate::store::{BookStore, StoreError};

#[derive(Debug)]
struct State {
    // Insertion order; the newest record is last.
    books: Vec<Book>,
    open: bool,
}

pub struct MemoryStore {
    name: String,
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(State {
                books: Vec::new(),
                open: true,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl State {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    fn position(&self, id: &BookId) -> Option<usize> {
        self.books.iter().position(|book| &book.id == id)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let mut state = self.state.write().await;
        state.ensure_open()?;

        let stored = Book::from_new(BookId::new(), book, timestamp_now());
        state.books.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let state = self.state.read().await;
        state.ensure_open()?;

        let mut books: Vec<Book> = state.books.iter().rev().cloned().collect();
        // Stable sort keeps later inserts ahead on equal timestamps.
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books)
    }

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let id = BookId::parse(id)?;
        let state = self.state.read().await;
        state.ensure_open()?;

        Ok(state.position(&id).map(|idx| state.books[idx].clone()))
    }

    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        let id = BookId::parse(id)?;
        let mut state = self.state.write().await;
        state.ensure_open()?;

        let Some(idx) = state.position(&id) else {
            return Ok(None);
        };
        let book = &mut state.books[idx];
        changes.apply_to(book);
        // Timestamps are kept at millisecond precision; an update must still move forward.
        book.updated_at = timestamp_now().max(book.updated_at + Duration::milliseconds(1));
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let id = BookId::parse(id)?;
        let mut state = self.state.write().await;
        state.ensure_open()?;

        Ok(state.position(&id).map(|idx| state.books.remove(idx)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.state.read().await.ensure_open()
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.open = false;
        tracing::info!(store = %self.name, "memory store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn dune() -> NewBook {
        NewBook {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            publication_date: datetime!(1965-08-01 0:00 UTC),
            genre: "SF".to_string(),
            available: true,
        }
    }

    fn titled(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            ..dune()
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new("test");
        let book = store.insert(dune()).await.unwrap();

        assert_eq!(book.title, "Dune");
        assert_eq!(book.created_at, book.updated_at);
        assert_eq!(store.find(&book.id.to_string()).await.unwrap(), Some(book));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new("test");
        assert!(store.list().await.unwrap().is_empty());

        for title in ["first", "second", "third"] {
            store.insert(titled(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn malformed_id_is_not_a_miss() {
        let store = MemoryStore::new("test");

        assert!(matches!(
            store.find("42").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.update("42", BookChanges::default()).await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.delete("42").await,
            Err(StoreError::InvalidId(_))
        ));

        let absent = BookId::new().to_string();
        assert!(store.find(&absent).await.unwrap().is_none());
        assert!(store
            .update(&absent, BookChanges::default())
            .await
            .unwrap()
            .is_none());
        assert!(store.delete(&absent).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_creation_time() {
        let store = MemoryStore::new("test");
        let book = store.insert(dune()).await.unwrap();

        let updated = store
            .update(
                &book.id.to_string(),
                BookChanges {
                    available: Some(false),
                    ..BookChanges::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert!(!updated.available);
        assert_eq!(updated.title, book.title);
        assert_eq!(updated.created_at, book.created_at);
        assert!(updated.updated_at > book.updated_at);
    }

    #[tokio::test]
    async fn back_to_back_updates_advance_the_timestamp() {
        let store = MemoryStore::new("test");
        let id = store.insert(dune()).await.unwrap().id.to_string();

        let mut previous = store.find(&id).await.unwrap().unwrap().updated_at;
        for _ in 0..5 {
            let updated = store
                .update(&id, BookChanges::default())
                .await
                .unwrap()
                .unwrap();
            assert!(updated.updated_at > previous);
            assert_eq!(updated.updated_at.nanosecond() % 1_000_000, 0);
            previous = updated.updated_at;
        }
    }

    #[tokio::test]
    async fn deleted_records_stay_deleted() {
        let store = MemoryStore::new("test");
        let id = store.insert(dune()).await.unwrap().id.to_string();

        let removed = store.delete(&id).await.unwrap().unwrap();
        assert_eq!(removed.id.to_string(), id);
        assert!(store.delete(&id).await.unwrap().is_none());
        assert!(store.find(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_store_rejects_operations() {
        let store = MemoryStore::new("test");
        store.ping().await.unwrap();
        store.close().await.unwrap();

        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
        assert!(matches!(store.list().await, Err(StoreError::Closed)));
        assert!(matches!(
            store.insert(dune()).await,
            Err(StoreError::Closed)
        ));
    }
}
