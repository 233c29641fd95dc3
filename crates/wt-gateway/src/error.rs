use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("Unknown style '{0}'")]
    UnknownStyle(String),

    #[error("No preview request with id {0}")]
    JobNotFound(String),

    #[error("Preview image not found")]
    PreviewNotFound,

    #[error("Watermark worker is not running")]
    WorkerUnavailable,

    #[error("Failed to render preview: {0}")]
    Render(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnknownStyle(_) | Self::JobNotFound(_) | Self::PreviewNotFound => StatusCode::NOT_FOUND,
            Self::WorkerUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<image::ImageError> for GatewayError {
    fn from(e: image::ImageError) -> Self {
        Self::Render(e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
