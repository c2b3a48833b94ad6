//! Request body extraction for JSON and urlencoded payloads

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub const MSG_INVALID_BODY: &str = "Corps de requête JSON invalide";

/// Request payload decoded from JSON or `application/x-www-form-urlencoded`.
///
/// A body that is empty (or only whitespace) decodes to `T::default()`, so a
/// request without a body behaves like one carrying `{}`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .to_ascii_lowercase()
                    .starts_with("application/x-www-form-urlencoded")
            });

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::bad_request(MSG_INVALID_BODY, rejection.body_text()))?;
            return Ok(Self(value));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(MSG_INVALID_BODY, rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes)
            .map_err(|rejection| AppError::bad_request(MSG_INVALID_BODY, rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Shelf {
        label: Option<String>,
        rows: Option<u32>,
    }

    async fn extract(content_type: Option<&str>, body: &str) -> Result<Shelf, AppError> {
        let mut builder = Request::builder().method("POST").uri("/shelves");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        Payload::<Shelf>::from_request(request, &()).await.map(|Payload(shelf)| shelf)
    }

    #[tokio::test]
    async fn empty_body_is_the_default_payload() {
        assert_eq!(extract(None, "").await.unwrap(), Shelf::default());
        assert_eq!(
            extract(Some("application/json"), "  \n").await.unwrap(),
            Shelf::default()
        );
    }

    #[tokio::test]
    async fn json_body_is_decoded() {
        let shelf = extract(Some("application/json"), r#"{"label":"SF","rows":3}"#)
            .await
            .unwrap();
        assert_eq!(shelf.label.as_deref(), Some("SF"));
        assert_eq!(shelf.rows, Some(3));
    }

    #[tokio::test]
    async fn urlencoded_body_is_decoded() {
        let shelf = extract(
            Some("application/x-www-form-urlencoded"),
            "label=Science+fiction",
        )
        .await
        .unwrap();
        assert_eq!(shelf.label.as_deref(), Some("Science fiction"));
        assert_eq!(shelf.rows, None);
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let err = extract(Some("application/json"), "{\"label\": ").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, AppError::BadRequest { ref message, .. } if message == MSG_INVALID_BODY));
    }
}
