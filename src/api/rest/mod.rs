pub mod auth;
pub mod providers;
pub mod requests;
pub mod tracking;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::models::category::ServiceCategory;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(providers::router())
        .merge(requests::router())
        .merge(tracking::router())
        .route("/categories", get(list_categories))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    providers: usize,
    requests: usize,
    tracked_requests: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: state.providers.len(),
        requests: state.requests.len(),
        tracked_requests: state.samples.len(),
    })
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<ServiceCategory>> {
    let mut categories: Vec<ServiceCategory> = state
        .categories
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    Json(categories)
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
