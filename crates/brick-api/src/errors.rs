//! Errores de la capa HTTP y su traducción a respuestas.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use brick_core::CallError;
use log::{debug, error};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("malformed query string: {0}")]
    MalformedQuery(String),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("multipart error: {0}")]
    Multipart(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Call(e) if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Call(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MalformedQuery(_) | ApiError::MalformedBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            debug!("rejected request ({status}): {self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Errores al registrar rutas; se detectan antes de servir.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RouteError {
    #[error("route '/{0}' is already registered")]
    Duplicate(String),
    #[error("'{0}' is not a valid route name")]
    InvalidName(String),
}
