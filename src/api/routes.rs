//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::{HealthResponse, InferRequest, ServiceEntry, ServicesResponse};
use crate::backend::{InferenceResult, StreamTerminator};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inference Gateway API",
        version = "0.2.0",
        description = "Multi-provider chat inference gateway with buffered and streaming delivery.",
        license(name = "MIT"),
    ),
    paths(
        handlers::infer,
        handlers::list_services,
        handlers::health_check,
    ),
    components(schemas(
        InferRequest,
        InferenceResult,
        StreamTerminator,
        ServiceEntry,
        ServicesResponse,
        HealthResponse,
    )),
    tags(
        (name = "Inference", description = "Chat inference dispatch"),
        (name = "Services", description = "Registered service listing"),
        (name = "Health", description = "Health and monitoring endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    Router::new()
        .route("/infer", post(handlers::infer))
        .route("/services", get(handlers::list_services))
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
