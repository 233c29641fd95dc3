use std::sync::Arc;
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use log::{error, info};
use uuid::Uuid;
use wt_core::{ArtStyle, AspectRatio, Quality, StatusSnapshot, SubmitPayload};
use crate::error::GatewayError;
use crate::job::{JobInputs, JobStatus, PreviewJob};
use crate::schemas::{GeneratePreviewBody, StatusQuery};
use crate::state::GenState;

const API_KEY_HEADER: &str = "apikey";
const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
const OVERLOADED: &str = "model overloaded";

pub async fn generate_preview(
    State(state): State<Arc<GenState>>,
    headers: HeaderMap,
    Json(body): Json<GeneratePreviewBody>,
) -> Result<Json<SubmitPayload>, GatewayError> {
    authorize(&state, &headers)?;

    let image_url = required(body.image_url, "imageUrl")?;
    let style_id = required(body.style, "style")?;
    let aspect_ratio: AspectRatio = body
        .aspect_ratio
        .as_deref()
        .unwrap_or(AspectRatio::default().as_str())
        .parse()
        .map_err(|e: wt_core::PreviewError| GatewayError::BadRequest(e.to_string()))?;
    let style = ArtStyle::from_id(&style_id).ok_or(GatewayError::UnknownStyle(style_id))?;

    let quality: Quality = body
        .quality
        .as_deref()
        .map(str::parse::<Quality>)
        .transpose()
        .map_err(|e: wt_core::PreviewError| GatewayError::BadRequest(e.to_string()))?
        .unwrap_or_default();

    let inputs = JobInputs {
        style,
        prompt: state.prompts.prompt_for(style).await,
        image_url,
        aspect_ratio,
        watermark: body.watermark.unwrap_or(true),
        is_authenticated: body.is_authenticated.unwrap_or(false),
    };
    let idempotency_key = header(&headers, IDEMPOTENCY_KEY_HEADER);
    let (job, inserted) = state
        .jobs
        .insert_or_get(PreviewJob::new(Uuid::new_v4().to_string(), inputs), idempotency_key.clone())
        .await;

    if !inserted {
        info!(
            "replaying {} for idempotency key {}",
            job.request_id,
            idempotency_key.as_deref().unwrap_or("-")
        );
        return Ok(Json(payload_for(&job)));
    }

    let request_id = job.request_id;
    let inputs = job.inputs;
    info!(
        "preview {} requested: style={} ratio={} quality={} watermark={} photo={}",
        request_id,
        style.id(),
        aspect_ratio,
        quality,
        inputs.watermark,
        body.photo_id.as_deref().unwrap_or("-"),
    );

    if state.config.sync_responses && !state.config.fails_style(style.id()) {
        let preview_url = match state.render_preview(&request_id, &inputs).await {
            Ok(preview_url) => preview_url,
            Err(e) => {
                state.jobs.fail_job(&request_id, e.to_string()).await;
                return Err(e);
            }
        };
        if let Some(job) = state.jobs.complete_job(&request_id, preview_url).await {
            return Ok(Json(payload_for(&job)));
        }
    }

    Ok(Json(SubmitPayload {
        request_id: Some(request_id),
        ..Default::default()
    }))
}

pub async fn preview_status(
    State(state): State<Arc<GenState>>,
    headers: HeaderMap,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusSnapshot>, GatewayError> {
    authorize(&state, &headers)?;

    let request_id = query.request_id;
    let job = state
        .jobs
        .record_poll(&request_id)
        .await
        .ok_or_else(|| GatewayError::JobNotFound(request_id.clone()))?;

    if job.status.is_complete() || job.polls < state.config.polls_to_complete {
        return Ok(Json(job.snapshot()));
    }

    let finished = if state.config.fails_style(job.inputs.style.id()) {
        state.jobs.fail_job(&request_id, OVERLOADED.to_string()).await
    } else {
        match state.render_preview(&request_id, &job.inputs).await {
            Ok(preview_url) => state.jobs.complete_job(&request_id, preview_url).await,
            Err(e) => {
                error!("preview {} failed to render: {}", request_id, e);
                state.jobs.fail_job(&request_id, e.to_string()).await
            }
        }
    };

    let job = finished.ok_or(GatewayError::JobNotFound(request_id))?;
    Ok(Json(job.snapshot()))
}

pub async fn preview_image(
    State(state): State<Arc<GenState>>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let request_id = file.strip_suffix(".png").unwrap_or(&file);
    let png = state
        .jobs
        .get_preview(request_id)
        .await
        .ok_or(GatewayError::PreviewNotFound)?;

    Ok(([(CONTENT_TYPE, "image/png")], png))
}

fn payload_for(job: &PreviewJob) -> SubmitPayload {
    match (&job.status, &job.preview_url) {
        (JobStatus::Succeeded, Some(url)) => SubmitPayload {
            preview_url: Some(url.clone()),
            request_id: None,
            is_authenticated: Some(job.inputs.is_authenticated),
        },
        _ => SubmitPayload {
            request_id: Some(job.request_id.clone()),
            ..Default::default()
        },
    }
}

fn authorize(state: &GenState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let Some(expected) = state.config.api_key.as_deref() else {
        return Ok(());
    };

    let api_key = header(headers, API_KEY_HEADER);
    let bearer = header(headers, AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer ").map(str::to_string));

    if api_key.as_deref() == Some(expected) || bearer.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(GatewayError::Unauthorized)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(value: Option<String>, field: &str) -> Result<String, GatewayError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::BadRequest(format!("{} is required", field)))
}
