use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stocktrail_core::{ProductId, StoreId};

use crate::app::services::AppService;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/stock", post(add_stock))
        .route("/reserve", post(reserve_stock))
        .route("/commit", post(commit_reservation))
        .route("/release", post(release_reservation))
        .route("/availability", post(check_availability))
        .route("/products/:product_id", get(get_product_inventory))
        .route("/products/:product_id/stores/:store_id", get(get_stock))
}

pub async fn add_stock(
    Extension(service): Extension<Arc<AppService>>,
    Json(body): Json<dto::AddStockRequest>,
) -> axum::response::Response {
    match service
        .add_stock(body.product_id, body.store_id, body.quantity, &body.reason)
        .await
    {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "message": "stock added" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reserve_stock(
    Extension(service): Extension<Arc<AppService>>,
    Json(body): Json<dto::ReserveStockRequest>,
) -> axum::response::Response {
    let ttl_minutes = body.ttl_minutes.unwrap_or(30);
    if !(1..=1440).contains(&ttl_minutes) {
        return errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "ttl_minutes must be between 1 and 1440",
        );
    }

    match service
        .reserve_stock(
            body.product_id,
            body.store_id,
            body.quantity,
            body.customer_id,
            Some(ttl_minutes),
        )
        .await
    {
        Ok(reservation_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "stock reserved",
                "reservation_id": reservation_id.to_string(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn commit_reservation(
    Extension(service): Extension<Arc<AppService>>,
    Json(body): Json<dto::CommitReservationRequest>,
) -> axum::response::Response {
    match service
        .commit_reservation(
            body.product_id,
            body.store_id,
            body.reservation_id,
            body.order_id,
        )
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "reservation committed" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn release_reservation(
    Extension(service): Extension<Arc<AppService>>,
    Json(body): Json<dto::ReleaseReservationRequest>,
) -> axum::response::Response {
    match service
        .release_reservation(
            body.product_id,
            body.store_id,
            body.reservation_id,
            &body.reason,
        )
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "reservation released" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn check_availability(
    Extension(service): Extension<Arc<AppService>>,
    Json(body): Json<dto::CheckAvailabilityRequest>,
) -> axum::response::Response {
    if body.required_quantity <= 0 {
        return errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "required_quantity must be positive",
        );
    }

    match service
        .check_availability(body.product_id, body.store_id, body.required_quantity as u64)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock(
    Extension(service): Extension<Arc<AppService>>,
    Path((product_id, store_id)): Path<(String, String)>,
) -> axum::response::Response {
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };
    let store_id: StoreId = match store_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid store id")
        }
    };

    match service.get_stock(product_id, store_id).await {
        Ok(Some(record)) => {
            (StatusCode::OK, Json(dto::StockResponse::from(record))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "stock not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product_inventory(
    Extension(service): Extension<Arc<AppService>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match service.get_product_inventory(product_id).await {
        Ok(records) if records.is_empty() => {
            errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found")
        }
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
