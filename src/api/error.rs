//! HTTP error mapping
//!
//! Converts service errors into HTML responses. The site is server-rendered,
//! so errors come back as small HTML pages rather than JSON envelopes.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::services::{AuthError, GenreServiceError, StoryServiceError};
use crate::view::ViewError;

/// Error type for page handlers
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Resource does not exist. The body is replaced with the rendered
    /// not-found template by a response-mapping layer in the router.
    #[error("not found")]
    NotFound,

    /// Invalid input from a form or query string
    #[error("{0}")]
    Validation(String),

    /// Wrong or missing write secret
    #[error("unauthorized")]
    Unauthorized,

    /// Operation conflicts with the current state
    #[error("{0}")]
    Conflict(String),

    /// Unexpected internal failure
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PageError {
    fn status(&self) -> StatusCode {
        match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::Validation(_) => StatusCode::BAD_REQUEST,
            PageError::Unauthorized => StatusCode::UNAUTHORIZED,
            PageError::Conflict(_) => StatusCode::CONFLICT,
            PageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            PageError::NotFound => "Không tìm thấy trang".to_string(),
            PageError::Validation(msg) => msg.clone(),
            PageError::Unauthorized => "Mã bí mật không đúng".to_string(),
            PageError::Conflict(msg) => msg.clone(),
            PageError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Lỗi máy chủ".to_string()
            }
        };
        let body = format!(
            "<!DOCTYPE html><html lang=\"vi\"><body><p>{}</p>\
             <p><a href=\"/\">Về trang chủ</a></p></body></html>",
            message
        );
        (status, Html(body)).into_response()
    }
}

impl From<StoryServiceError> for PageError {
    fn from(e: StoryServiceError) -> Self {
        match e {
            StoryServiceError::NotFound(_) => PageError::NotFound,
            StoryServiceError::Validation(msg) => PageError::Validation(msg),
            StoryServiceError::Conflict(msg) => PageError::Conflict(msg),
            StoryServiceError::Internal(e) => PageError::Internal(e),
        }
    }
}

impl From<GenreServiceError> for PageError {
    fn from(e: GenreServiceError) -> Self {
        match e {
            GenreServiceError::NotFound(_) => PageError::NotFound,
            GenreServiceError::Validation(msg) => PageError::Validation(msg),
            GenreServiceError::Conflict(msg) => PageError::Conflict(msg),
            GenreServiceError::Internal(e) => PageError::Internal(e),
        }
    }
}

impl From<AuthError> for PageError {
    fn from(_: AuthError) -> Self {
        PageError::Unauthorized
    }
}

impl From<ViewError> for PageError {
    fn from(e: ViewError) -> Self {
        PageError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PageError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            PageError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PageError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(PageError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            PageError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_conversion() {
        let e: PageError = StoryServiceError::NotFound("x".into()).into();
        assert!(matches!(e, PageError::NotFound));

        let e: PageError = GenreServiceError::Conflict("x".into()).into();
        assert!(matches!(e, PageError::Conflict(_)));

        let e: PageError = AuthError.into();
        assert!(matches!(e, PageError::Unauthorized));
    }
}
