//! Book record as persisted in the `livres` collection.

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;

use crate::StoreError;

/// Store-assigned document identifier (24 hex digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookId(ObjectId);

impl BookId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parse an identifier, rejecting anything that is not in the store's key format.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| StoreError::InvalidId(raw.to_string()))
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for BookId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl FromStr for BookId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

// Plain hex on the wire; bson's own impl would emit `{"$oid": ...}` in JSON.
impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id")]
    pub id: BookId,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "auteur")]
    pub author: String,
    #[serde(rename = "date_publication", with = "time::serde::rfc3339")]
    pub publication_date: OffsetDateTime,
    pub genre: String,
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "updatedAt", with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for a new record; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub publication_date: OffsetDateTime,
    pub genre: String,
    pub available: bool,
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publication_date: Option<OffsetDateTime>,
    pub genre: Option<String>,
    pub available: Option<bool>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.publication_date.is_none()
            && self.genre.is_none()
            && self.available.is_none()
    }

    /// Overwrite the fields carried by this change set.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(date) = self.publication_date {
            book.publication_date = date;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(available) = self.available {
            book.available = available;
        }
    }
}

impl Book {
    pub(crate) fn from_new(id: BookId, new: NewBook, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: new.title,
            author: new.author,
            publication_date: new.publication_date,
            genre: new.genre,
            available: new.available,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time truncated to the millisecond precision documents keep.
pub(crate) fn timestamp_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_millisecond(now.millisecond()).unwrap_or(now)
}
