use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;

/// Failure inside the catalog store. The display text never carries the
/// database message; the `DbErr` is only reachable through `source()`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("catalog read failed")]
    Read(#[source] DbErr),
    #[error("catalog write failed")]
    Write(#[source] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Movie not found")]
    NotFound,
    #[error("Error creating movie")]
    CreateFailed(#[source] StoreError),
    #[error("Internal server error")]
    Store(#[from] StoreError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::CreateFailed(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
