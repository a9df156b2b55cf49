//! Mapping from catalog errors to HTTP responses.
//!
//! Clients always get a JSON body with a `detail` message, never a raw error.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sekela_core::CatalogError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Catalog(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Catalog(CatalogError::NotFound { .. }) => "University not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "{}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::from(CatalogError::NotFound { id: 3 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.detail(), "University not found");
    }

    #[test]
    fn test_storage_failure_maps_to_500() {
        let err = ApiError::from(CatalogError::Storage(rusqlite::Error::InvalidQuery));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_refresh_failure_maps_to_500() {
        let err = ApiError::from(CatalogError::RefreshTransaction("locked".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), "Database refresh failed: locked");
    }
}
