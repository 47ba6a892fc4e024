//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::booking::BookingError;
use crate::core_state::CoreError;
use crate::tracking::TrackingError;

/// Error response body. `error` is human-readable, `code` is stable.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message, code })).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::db::DatabaseError> for ApiError {
    fn from(err: crate::db::DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::MissingWalkId
            | TrackingError::UnknownAction(_)
            | TrackingError::MissingField { .. }
            | TrackingError::InvalidPoint { .. } => ApiError::BadRequest(err.to_string()),
            TrackingError::WalkNotFound(_) => ApiError::NotFound(err.to_string()),
            TrackingError::TrackingComplete(_) => ApiError::Conflict(err.to_string()),
            TrackingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(_) => ApiError::BadRequest(err.to_string()),
            BookingError::DogNotFound(_) | BookingError::WalkerNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            BookingError::AssessmentRequired(_) => ApiError::Conflict(err.to_string()),
            BookingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    use crate::db::DatabaseError;
    use crate::tracking::TrackingAction;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn bad_request_returns_400_with_code() {
        let response = ApiError::BadRequest("walkId is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "walkId is required");
        assert_eq!(json["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn internal_returns_500_and_hides_detail() {
        let response = ApiError::Internal("disk I/O error".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn conflict_returns_409() {
        let response = ApiError::Conflict("done".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn tracking_errors_map_to_status_classes() {
        let cases = [
            (TrackingError::MissingWalkId, StatusCode::BAD_REQUEST),
            (TrackingError::UnknownAction("fly".into()), StatusCode::BAD_REQUEST),
            (
                TrackingError::MissingField {
                    action: TrackingAction::Pickup,
                    field: "pickupLocation",
                },
                StatusCode::BAD_REQUEST,
            ),
            (TrackingError::WalkNotFound("W9".into()), StatusCode::NOT_FOUND),
            (TrackingError::TrackingComplete("W1".into()), StatusCode::CONFLICT),
            (
                TrackingError::Database(DatabaseError::ConstraintViolation("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn booking_errors_map_to_status_classes() {
        let cases = [
            (BookingError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (BookingError::DogNotFound("D9".into()), StatusCode::NOT_FOUND),
            (BookingError::WalkerNotFound("WK9".into()), StatusCode::NOT_FOUND),
            (BookingError::AssessmentRequired("D1".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn lock_poisoning_is_internal() {
        let response = ApiError::from(CoreError::LockPoisoned).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
