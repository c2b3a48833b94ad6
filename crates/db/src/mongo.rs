//! MongoDB backend, selected with `mongodb://` or `mongodb+srv://`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use biblio_kernel::settings::DatabaseSettings;

use crate::model::{timestamp_now, Book, BookChanges, BookId, NewBook};
use crate::store::{BookStore, StoreError};

/// Document layout in the collection; field names match the wire format.
#[derive(Debug, Serialize, Deserialize)]
struct BookDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    titre: String,
    auteur: String,
    date_publication: DateTime,
    genre: String,
    disponible: bool,
    #[serde(rename = "createdAt")]
    created_at: DateTime,
    #[serde(rename = "updatedAt")]
    updated_at: DateTime,
}

impl From<&Book> for BookDocument {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.object_id(),
            titre: book.title.clone(),
            auteur: book.author.clone(),
            date_publication: DateTime::from_time_0_3(book.publication_date),
            genre: book.genre.clone(),
            disponible: book.available,
            created_at: DateTime::from_time_0_3(book.created_at),
            updated_at: DateTime::from_time_0_3(book.updated_at),
        }
    }
}

impl From<BookDocument> for Book {
    fn from(doc: BookDocument) -> Self {
        Self {
            id: BookId::from(doc.id),
            title: doc.titre,
            author: doc.auteur,
            publication_date: doc.date_publication.to_time_0_3(),
            genre: doc.genre,
            available: doc.disponible,
            created_at: doc.created_at.to_time_0_3(),
            updated_at: doc.updated_at.to_time_0_3(),
        }
    }
}

/// `$set` stage of the update pipeline. Text goes through `$literal` so a
/// leading `$` is never read as a field path.
fn set_clause(changes: BookChanges) -> Document {
    let mut set = Document::new();
    if let Some(title) = changes.title {
        set.insert("titre", doc! { "$literal": title });
    }
    if let Some(author) = changes.author {
        set.insert("auteur", doc! { "$literal": author });
    }
    if let Some(date) = changes.publication_date {
        set.insert("date_publication", DateTime::from_time_0_3(date));
    }
    if let Some(genre) = changes.genre {
        set.insert("genre", doc! { "$literal": genre });
    }
    if let Some(available) = changes.available {
        set.insert("disponible", available);
    }
    // Millisecond precision: never leave updatedAt where it was.
    set.insert(
        "updatedAt",
        doc! {
            "$max": [
                DateTime::from_time_0_3(timestamp_now()),
                { "$add": ["$updatedAt", 1_i64] }
            ]
        },
    );
    set
}

pub struct MongoStore {
    client: Client,
    database: Database,
    books: Collection<BookDocument>,
    closed: AtomicBool,
}

impl MongoStore {
    /// Build a client for `settings.uri`. The driver connects lazily; call
    /// [`BookStore::ping`] to verify the server is reachable.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&settings.uri).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&settings.name));
        let books = database.collection::<BookDocument>(&settings.collection);

        tracing::info!(
            database = %database.name(),
            collection = %settings.collection,
            "mongodb client created"
        );

        Ok(Self {
            client,
            database,
            books,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    fn by_id(id: &str) -> Result<Document, StoreError> {
        let id = BookId::parse(id)?;
        Ok(doc! { "_id": id.object_id() })
    }
}

#[async_trait]
impl BookStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        self.ensure_open()?;
        let stored = Book::from_new(BookId::new(), book, timestamp_now());
        self.books.insert_one(BookDocument::from(&stored)).await?;
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        self.ensure_open()?;
        let cursor = self
            .books
            .find(doc! {})
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?;
        let docs: Vec<BookDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Book::from).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let filter = Self::by_id(id)?;
        self.ensure_open()?;
        Ok(self.books.find_one(filter).await?.map(Book::from))
    }

    async fn update(&self, id: &str, changes: BookChanges) -> Result<Option<Book>, StoreError> {
        let filter = Self::by_id(id)?;
        self.ensure_open()?;
        let updated = self
            .books
            .find_one_and_update(filter, vec![doc! { "$set": set_clause(changes) }])
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(Book::from))
    }

    async fn delete(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let filter = Self::by_id(id)?;
        self.ensure_open()?;
        Ok(self.books.find_one_and_delete(filter).await?.map(Book::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.client.clone().shutdown().await;
        tracing::info!(database = %self.database.name(), "mongodb connection closed");
        Ok(())
    }
}
