use std::sync::Arc;
use axum::Router;
use axum::routing::{get, post};
use crate::routes::preview::{generate_preview, preview_image, preview_status};
use crate::state::GenState;

mod preview;

pub fn api_routes() -> Router<Arc<GenState>> {
    Router::new()
        .route("/generate-style-preview", post(generate_preview))
        .route("/generate-style-preview/status", get(preview_status))
        .route("/previews/{file}", get(preview_image))
}
