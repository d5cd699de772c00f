//! HTTP request handlers

use axum::body::Body;
use axum::extract::{Form, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::models::{HealthResponse, InferRequest, ServiceEntry, ServicesResponse};
use crate::backend::{build_request, StreamBridge, StreamEvent, StreamTerminator};
use crate::error::AppError;
use crate::AppState;

/// Run one inference call against a single service.
///
/// Validation is identical for both delivery modes; only after the outbound
/// request is built does the handler branch on the streaming flag.
#[utoipa::path(
    post,
    path = "/infer",
    request_body(content = InferRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Normalized result envelope keyed by service, or a text/event-stream of raw chunks plus a terminator"),
        (status = 400, description = "Missing prompt, unknown service, or unsupported modality"),
        (status = 500, description = "Service credential missing from the environment"),
    ),
    tag = "Inference"
)]
pub async fn infer(
    State(state): State<Arc<AppState>>,
    Form(request): Form<InferRequest>,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        service = %request.service,
        streaming = request.is_streaming(),
        "Received inference request"
    );

    if request.service.trim().is_empty() {
        return Err(AppError::MissingService);
    }

    let attachment = request.attachment();
    let outbound = build_request(
        &state.registry,
        &request.service,
        &request.prompt,
        attachment.as_ref(),
        request.is_streaming(),
    )?;

    if request.is_streaming() {
        let bridge = state.dispatcher.dispatch_stream(outbound);
        return Ok(stream_response(bridge));
    }

    let descriptor = state
        .registry
        .get(&request.service)
        .ok_or_else(|| AppError::ServiceNotFound(request.service.clone()))?;

    let result = state.dispatcher.dispatch_buffered(&outbound, descriptor).await;
    info!(
        request_id = %request_id,
        service = %request.service,
        time_taken = result.time_taken,
        "Inference completed"
    );

    let mut body = serde_json::Map::new();
    body.insert(
        request.service.clone(),
        serde_json::to_value(&result)
            .map_err(|e| AppError::Internal(format!("Failed to serialize result: {}", e)))?,
    );

    Ok(Json(serde_json::Value::Object(body)).into_response())
}

/// Adapt the synchronous bridge to a server-push event stream. Raw chunks
/// pass through byte-for-byte; the terminator gets SSE framing here because
/// it is the one event this gateway synthesizes itself.
fn stream_response(bridge: StreamBridge) -> Response {
    let (tx, rx) = futures::channel::mpsc::unbounded::<std::result::Result<Vec<u8>, Infallible>>();

    tokio::task::spawn_blocking(move || {
        for event in bridge {
            let payload = match event {
                StreamEvent::Chunk(bytes) => bytes,
                StreamEvent::Done(terminator) => terminator_frame(&terminator),
            };
            if tx.unbounded_send(Ok(payload)).is_err() {
                // Client went away; dropping the bridge releases the backend
                // connection.
                break;
            }
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(rx),
    )
        .into_response()
}

fn terminator_frame(terminator: &StreamTerminator) -> Vec<u8> {
    let json = serde_json::to_string(terminator).unwrap_or_default();
    format!("data: {}\n\n", json).into_bytes()
}

/// List the registered services with their display metadata
#[utoipa::path(
    get,
    path = "/services",
    responses(
        (status = 200, description = "Registered services", body = ServicesResponse),
    ),
    tag = "Services"
)]
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<ServicesResponse> {
    let services = state
        .registry
        .names()
        .into_iter()
        .filter_map(|name| {
            state.registry.get(name).map(|d| ServiceEntry {
                name: name.to_string(),
                display_name: d.display_name.clone(),
                logo: d.logo.clone(),
            })
        })
        .collect();

    Json(ServicesResponse { services })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Gateway health", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: state.registry.len(),
    })
}
