use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::core::counter::CounterError;

pub const NOT_FOUND_MESSAGE: &str = "Are you sure about that?";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    #[error("invalid operand '{operand}': {reason}")]
    InvalidOperand { operand: &'static str, reason: String },

    #[error(transparent)]
    Counter(#[from] CounterError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidOperand { .. } => StatusCode::BAD_REQUEST,
            ApiError::Counter(CounterError::SumOverflow { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Counter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
