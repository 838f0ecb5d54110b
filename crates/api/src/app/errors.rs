use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stocktrail_core::DomainError;
use stocktrail_infra::event_store::EventStoreError;
use stocktrail_infra::handlers::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(DomainError::InvalidQuantity(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_quantity", msg)
        }
        ServiceError::Domain(DomainError::InsufficientStock(msg)) => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", msg)
        }
        ServiceError::Domain(DomainError::ReservationNotFound(msg)) => {
            json_error(StatusCode::NOT_FOUND, "reservation_not_found", msg)
        }
        ServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        ServiceError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ServiceError::Store(e @ EventStoreError::Concurrency { .. }) => {
            json_error(StatusCode::CONFLICT, "concurrency_conflict", e.to_string())
        }
        ServiceError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            e.to_string(),
        ),
        ServiceError::ReadModel(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "read_model_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
