//! Error handling for the HTTP layer

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const MSG_ROUTE_NOT_FOUND: &str = "Route non trouvée";
pub const MSG_SERVER_ERROR: &str = "Erreur serveur";
pub const MSG_INVALID_ID: &str = "ID invalide";

/// Failure envelope shared by every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        message: String,
    },

    #[error("invalid identifier: {id}")]
    InvalidIdentifier { id: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, cause: String },

    #[error("route not found")]
    RouteNotFound,

    #[error("{message}: {source}")]
    Store {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            message: message.into(),
        }
    }

    pub fn invalid_identifier(id: impl Into<String>) -> Self {
        Self::InvalidIdentifier { id: id.into() }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            cause: cause.into(),
        }
    }

    /// Wrap a persistence failure with the operation it interrupted
    pub fn store(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::InvalidIdentifier { .. }
            | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } | AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let (message, error, details) = match self {
            AppError::Validation { details, message } => (message, None, details),
            AppError::InvalidIdentifier { .. } => (MSG_INVALID_ID.to_string(), None, vec![]),
            AppError::NotFound { message } => (message, None, vec![]),
            AppError::BadRequest { message, cause } => (message, Some(cause), vec![]),
            AppError::RouteNotFound => (MSG_ROUTE_NOT_FOUND.to_string(), None, vec![]),
            AppError::Store { message, source } => (message, Some(source.to_string()), vec![]),
        };

        ErrorBody {
            success: false,
            message,
            error,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "request rejected"
            );
        }

        (status, Json(self.into_body())).into_response()
    }
}

/// Fallback for any method/path pair no handler serves
pub async fn route_not_found() -> AppError {
    AppError::RouteNotFound
}

/// Top-level handler for panics escaping a request handler
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked");

    let body = ErrorBody {
        success: false,
        message: MSG_SERVER_ERROR.to_string(),
        error: Some(detail),
        details: vec![],
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_validation_error() {
        let details = vec![serde_json::json!({"field": "titre", "error": "required"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_validation_envelope() {
        let details = vec![serde_json::json!({"field": "titre", "error": "required"})];
        let (status, body) = body_of(AppError::validation(details, "champs manquants")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "champs manquants");
        assert_eq!(body["details"][0]["field"], "titre");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_invalid_identifier_is_400_not_404() {
        let (status, body) = body_of(AppError::invalid_identifier("abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], MSG_INVALID_ID);
    }

    #[tokio::test]
    async fn test_not_found_mapping() {
        let (status, body) = body_of(AppError::not_found("Livre non trouvé")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Livre non trouvé");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_store_error_carries_cause() {
        let error = AppError::store(
            "Erreur lors de la récupération des livres",
            anyhow::anyhow!("connection reset"),
        );
        let (status, body) = body_of(error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Erreur lors de la récupération des livres");
        assert_eq!(body["error"], "connection reset");
    }

    #[tokio::test]
    async fn test_panic_payload_becomes_server_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "boom");
    }
}
