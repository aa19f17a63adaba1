//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

pub mod analytics;
pub mod auth;
pub mod awards;
pub mod consultancy;
pub mod dashboard;
pub mod faculty;
pub mod ip_assets;
pub mod ipr;
pub mod labs;
pub mod materials;
pub mod patents;
pub mod projects;
pub mod publications;
pub mod research_centers;
pub mod student_projects;

use crate::config::Settings;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    http::{header, Method, StatusCode},
    routing::get,
    Json, Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Stored uploads served back as static files
        .nest_service("/uploads", ServeDir::new(&settings.uploads.dir))
        // Entity routes
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/faculty", faculty::router(state.clone()))
        .nest("/api/publications", publications::router(state.clone()))
        .nest("/api/patents", patents::router(state.clone()))
        .nest("/api/ipr", ipr::router(state.clone()))
        .nest("/api/ip-assets", ip_assets::router(state.clone()))
        .nest("/api/projects", projects::router(state.clone()))
        .nest("/api/labs", labs::router(state.clone()))
        .nest(
            "/api/research-centers",
            research_centers::router(state.clone()),
        )
        .nest("/api/consultancy", consultancy::router(state.clone()))
        .nest("/api/materials", materials::materials_router(state.clone()))
        .nest(
            "/api/teaching-materials",
            materials::teaching_materials_router(state.clone()),
        )
        .nest("/api/awards", awards::router(state.clone()))
        .nest(
            "/api/student-projects",
            student_projects::router(state.clone()),
        )
        // Aggregations
        .nest("/api/analytics", analytics::router())
        .nest("/api/dashboard", dashboard::router(state.clone()))
        .fallback(route_not_found)
        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 404 for unknown routes, wrapped in the standard envelope
async fn route_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "success": false,
            "message": "Route not found"
        })),
    )
}

/// Require a non-empty text field from a JSON payload
pub(crate) fn require_field(value: &Option<String>, label: &str) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{} is required", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_require_field() {
        assert_eq!(
            require_field(&Some("  Smart Grid  ".to_string()), "Title").unwrap(),
            "Smart Grid"
        );
        assert!(require_field(&Some("   ".to_string()), "Title").is_err());
        assert!(require_field(&None, "Title").is_err());
    }
}
