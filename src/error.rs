use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient wallet balance")]
    InsufficientFunds,

    #[error("Wallet not found for party {0}")]
    WalletNotFound(uuid::Uuid),

    #[error("Unknown commission model: {0}")]
    UnknownCommissionModel(String),

    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Ambiguous provider response: {0}")]
    ProviderAmbiguous(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_)
            | AppError::InvalidAmount(_)
            | AppError::InsufficientFunds
            | AppError::UnknownCommissionModel(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateReference(_) => StatusCode::CONFLICT,
            AppError::WalletNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ProviderUnavailable(_) | AppError::ProviderAmbiguous(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateReference(db.message().to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("recipient required".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_insufficient_funds_status_code() {
        assert_eq!(
            AppError::InsufficientFunds.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_wallet_not_found_status_code() {
        let error = AppError::WalletNotFound(uuid::Uuid::new_v4());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_reference_status_code() {
        let error = AppError::DuplicateReference("AIRTIME_123".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_provider_unavailable_status_code() {
        let error = AppError::ProviderUnavailable("timeout".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_database_error_status_code() {
        let error = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_forbidden_error_response() {
        let error = AppError::Forbidden("vendor access only".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_insufficient_funds_response() {
        let response = AppError::InsufficientFunds.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
