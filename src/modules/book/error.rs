use bookshelf_http::AppError;
use serde_json::json;
use thiserror::Error;

use super::repository::StorageError;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid book id {0}: no such book, check the id")]
    NotFound(i64),
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let description = err.to_string();
        match err {
            BookError::NotFound(_) => AppError::not_found(description),
            BookError::Validation { field, message } => AppError::validation(
                vec![json!({ "field": field, "error": message })],
                description,
            ),
            BookError::Storage(storage) => AppError::Internal(anyhow::Error::new(storage)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn not_found_names_the_id() {
        let err = BookError::NotFound(5);
        assert_eq!(err.to_string(), "invalid book id 5: no such book, check the id");
        assert_eq!(AppError::from(err).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_failures_are_internal() {
        let err = BookError::from(StorageError::DeleteTargetMissing(1));
        assert_eq!(AppError::from(err).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_maps_to_unprocessable() {
        let err = BookError::Validation {
            field: "title",
            message: "must not be blank",
        };
        assert_eq!(AppError::from(err).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
