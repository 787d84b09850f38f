use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                "Database operation failed".into(),
            ),
            AppError::InvalidCredentials => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidCredentials,
                "Unauthorized".into(),
            ),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, msg)
            }
            AppError::ValidationError(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, msg)
            }
            e @ AppError::SubscriptionRequired => error_resp(
                StatusCode::PAYMENT_REQUIRED,
                ErrorCode::SubscriptionRequired,
                e.to_string(),
            ),
            AppError::Upstream(_) => error_resp(
                StatusCode::BAD_GATEWAY,
                ErrorCode::UpstreamError,
                "Payment or messaging provider unavailable".into(),
            ),
            e @ AppError::VerificationFailure => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::VerificationFailed,
                e.to_string(),
            ),
            e @ AppError::NotFound => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, e.to_string())
            }
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "Internal server error".into(),
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message, "code": code.as_str() });
    (status, Json(body)).into_response()
}
