use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::provider::GeoPoint;
use crate::models::request::AssistanceRequest;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(create_request))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id/accept", post(accept_request))
        .route("/requests/:id/start", post(start_service))
        .route("/requests/:id/complete", post(complete_service))
        .route("/requests/:id/cancel", post(cancel_request))
}

#[derive(Deserialize)]
pub struct CreateAssistanceRequest {
    pub provider_id: Uuid,
    pub service_category: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub tracking_token: Uuid,
    pub request: AssistanceRequest,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<CreateAssistanceRequest>,
) -> Result<Json<CreatedResponse>, AppError> {
    let request = lifecycle::create(
        &state,
        actor,
        lifecycle::CreateRequestParams {
            provider_id: payload.provider_id,
            service_category: payload.service_category,
            location: payload.location,
            description: payload.description,
        },
    )?;

    Ok(Json(CreatedResponse {
        tracking_token: request.tracking_token,
        request,
    }))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssistanceRequest>, AppError> {
    let request = state
        .requests
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("request {id} not found")))?;

    Ok(Json(request.value().clone()))
}

async fn accept_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<AssistanceRequest>, AppError> {
    Ok(Json(lifecycle::accept(&state, id, actor)?))
}

async fn start_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<AssistanceRequest>, AppError> {
    Ok(Json(lifecycle::start(&state, id, actor)?))
}

async fn complete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<AssistanceRequest>, AppError> {
    Ok(Json(lifecycle::complete(&state, id, actor)?))
}

async fn cancel_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<Json<AssistanceRequest>, AppError> {
    Ok(Json(lifecycle::cancel(&state, id, actor)?))
}
