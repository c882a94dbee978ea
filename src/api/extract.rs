//! JSON body extractor that rejects with the API error envelope.

use axum::extract::{rejection::JsonRejection, FromRequest};

use super::error::ApiError;

/// `axum::Json` whose rejections are 400 `bad_request` errors
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}
