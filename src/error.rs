use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

use crate::validate::FieldError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Poisoned lock: {0}")]
    Poisoned(&'static str),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("Photo not found")]
    NotFound,

    /// Carries the client-facing message; the cause is logged, never sent.
    #[error("{message}")]
    Unexpected {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    pub fn unexpected(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Unexpected { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Validation(errors) => ErrorBody {
                message: self.to_string(),
                errors: Some(errors.clone()),
            },
            _ => ErrorBody::message(self.to_string()),
        }
    }
}

impl warp::reject::Reject for ApiError {}

/// Wire shape of every error response.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self { message: message.into(), errors: None }
    }
}
