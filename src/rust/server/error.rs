use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;

use crate::classifier::ClassifierError;
use crate::history::HistoryError;
use crate::llm::LlmError;

/// Every failure a request can end in, with a stable machine-readable code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Model is not loaded")]
    ModelUnavailable,
    #[error("No valid symptoms provided")]
    NoValidSymptoms,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
    #[error("AI assistant is not configured")]
    LlmUnavailable,
    #[error("AI service failed: {0}")]
    LlmFailure(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::NoValidSymptoms => "no_valid_symptoms",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InternalConsistency(_) => "internal_consistency",
            Self::LlmUnavailable => "llm_unavailable",
            Self::LlmFailure(_) => "llm_failure",
            Self::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable | Self::LlmUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoValidSymptoms | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InternalConsistency(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::LlmFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::NoRecognizableSymptoms => Self::NoValidSymptoms,
            ClassifierError::ValidationError(msg) => Self::InvalidRequest(msg),
            err if err.is_internal_consistency() => Self::InternalConsistency(err.to_string()),
            err => Self::Internal(err.to_string()),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => Self::LlmUnavailable,
            err => Self::LlmFailure(err.to_string()),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", self.code(), self);
        }

        let code = self.code();
        let message = self.to_string();
        let body = match self {
            Self::NoValidSymptoms => json!({
                "error": message,
                "code": code,
                "message": message,
                "chatbot_suggested": true,
            }),
            _ => json!({ "error": message, "code": code }),
        };
        (status, Json(body)).into_response()
    }
}
