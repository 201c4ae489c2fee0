use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use foodtour_shared::models::StopId;
use serde_json::json;
use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing restaurant_id")]
    MissingRestaurantId,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Restaurant {0} not found")]
    UnknownRestaurant(StopId),

    #[error("Failed to load catalog: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingRestaurantId | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownRestaurant(_) => StatusCode::NOT_FOUND,
            AppError::Catalog(_) | AppError::Config(_) | AppError::Storage(_) | AppError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
