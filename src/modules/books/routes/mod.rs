//! HTTP handlers for `/books`.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use biblio_db::{Book, SharedStore, StoreError};
use biblio_http::{
    error::{route_not_found, AppError},
    extract::Payload,
    response::Envelope,
};

use super::models::{CreateLivre, UpdateLivre};

pub const MSG_CREATED: &str = "Livre ajouté avec succès";
pub const MSG_UPDATED: &str = "Livre modifié avec succès";
pub const MSG_DELETED: &str = "Livre supprimé avec succès";
pub const MSG_NOT_FOUND: &str = "Livre non trouvé";

const MSG_CREATE_FAILED: &str = "Erreur lors de l'ajout du livre";
const MSG_LIST_FAILED: &str = "Erreur lors de la récupération des livres";
const MSG_GET_FAILED: &str = "Erreur lors de la récupération du livre";
const MSG_UPDATE_FAILED: &str = "Erreur lors de la modification du livre";
const MSG_DELETE_FAILED: &str = "Erreur lors de la suppression du livre";

/// Routes relative to the module mount path.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/",
            get(list_books).post(create_book).fallback(route_not_found),
        )
        .route(
            "/{id}",
            get(get_book)
                .put(update_book)
                .delete(delete_book)
                .fallback(route_not_found),
        )
        .with_state(store)
}

/// Malformed ids keep their own status; anything else is a store failure.
fn store_failure(err: StoreError, context: &'static str) -> AppError {
    match err {
        StoreError::InvalidId(id) => AppError::invalid_identifier(id),
        other => AppError::store(context, other),
    }
}

/// A rejected insert is reported as a bad request carrying the store's reason.
fn insert_failure(err: StoreError) -> AppError {
    match err {
        StoreError::InvalidId(id) => AppError::invalid_identifier(id),
        other => AppError::bad_request(MSG_CREATE_FAILED, other.to_string()),
    }
}

async fn create_book(
    State(store): State<SharedStore>,
    Payload(payload): Payload<CreateLivre>,
) -> Result<Envelope<Book>, AppError> {
    let new_book = payload.validate()?;

    let book = store.insert(new_book).await.map_err(insert_failure)?;

    tracing::info!(book_id = %book.id, "book created");
    Ok(Envelope::created(book).with_message(MSG_CREATED))
}

async fn list_books(State(store): State<SharedStore>) -> Result<Envelope<Vec<Book>>, AppError> {
    let books = store
        .list()
        .await
        .map_err(|e| store_failure(e, MSG_LIST_FAILED))?;

    Ok(Envelope::list(books))
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Envelope<Book>, AppError> {
    let book = store
        .find(&id)
        .await
        .map_err(|e| store_failure(e, MSG_GET_FAILED))?
        .ok_or_else(|| AppError::not_found(MSG_NOT_FOUND))?;

    Ok(Envelope::ok(book))
}

async fn update_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Payload(payload): Payload<UpdateLivre>,
) -> Result<Envelope<Book>, AppError> {
    let changes = payload.validate()?;

    let book = store
        .update(&id, changes)
        .await
        .map_err(|e| store_failure(e, MSG_UPDATE_FAILED))?
        .ok_or_else(|| AppError::not_found(MSG_NOT_FOUND))?;

    tracing::info!(book_id = %book.id, "book updated");
    Ok(Envelope::ok(book).with_message(MSG_UPDATED))
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Envelope<Book>, AppError> {
    let book = store
        .delete(&id)
        .await
        .map_err(|e| store_failure(e, MSG_DELETE_FAILED))?
        .ok_or_else(|| AppError::not_found(MSG_NOT_FOUND))?;

    tracing::info!(book_id = %book.id, "book deleted");
    Ok(Envelope::ok(book).with_message(MSG_DELETED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn malformed_id_maps_to_invalid_identifier() {
        let err = store_failure(StoreError::InvalidId("42".to_string()), MSG_GET_FAILED);
        assert!(matches!(err, AppError::InvalidIdentifier { ref id } if id == "42"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn insert_failures_map_to_400_with_cause() {
        let err = insert_failure(StoreError::Closed);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(
            err,
            AppError::BadRequest { ref message, ref cause }
                if message == MSG_CREATE_FAILED && cause == "store connection is closed"
        ));
    }

    #[test]
    fn backend_failures_map_to_500() {
        let err = store_failure(StoreError::Closed, MSG_LIST_FAILED);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), format!("{}: store connection is closed", MSG_LIST_FAILED));
    }
}
