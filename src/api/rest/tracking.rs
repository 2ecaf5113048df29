use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::tracker;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::provider::GeoPoint;
use crate::models::request::AssistanceRequest;
use crate::models::tracking::{LocationSample, TrackingSnapshot, TripProgress};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tracking/:token", get(tracking_snapshot))
        .route("/tracking/:token/location", post(report_location))
        .route("/tracking/:token/simulate", post(simulate_approach))
        .route("/tracking/:token/trip", get(trip_progress))
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub location: GeoPoint,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
}

#[derive(Deserialize, Default)]
pub struct SimulateRequest {
    pub step_fraction: Option<f64>,
}

/// Provider-app ingestion endpoint. The token is the only credential; the
/// sample is attributed to the request's bound provider, mirroring how the
/// field app reports.
async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<LocationSample>, AppError> {
    let request = resolve_token(&state, &token)?;
    let provider_id = request.accepted_provider.ok_or_else(|| {
        AppError::InvalidState("request has no bound provider".to_string())
    })?;

    let sample = tracker::report_location(
        &state,
        request.id,
        provider_id,
        payload.location,
        payload.speed_kmh,
        payload.heading_deg,
    )?;

    Ok(Json(sample))
}

async fn tracking_snapshot(
    State(state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
    actor: Actor,
) -> Result<Json<TrackingSnapshot>, AppError> {
    let request = resolve_token(&state, &token)?;
    check_viewer(&request, actor)?;

    Ok(Json(tracker::snapshot(&state, request.id)?))
}

async fn simulate_approach(
    State(state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
    payload: Option<Json<SimulateRequest>>,
) -> Result<Json<tracker::ApproachStep>, AppError> {
    let request = resolve_token(&state, &token)?;
    let step_fraction = payload
        .and_then(|Json(body)| body.step_fraction)
        .unwrap_or(tracker::DEFAULT_STEP_FRACTION);

    if !(0.0..=1.0).contains(&step_fraction) {
        return Err(AppError::BadRequest(
            "step_fraction must be within [0, 1]".to_string(),
        ));
    }

    Ok(Json(tracker::simulate_approach(
        &state,
        request.id,
        step_fraction,
    )?))
}

async fn trip_progress(
    State(state): State<Arc<AppState>>,
    Path(token): Path<Uuid>,
    actor: Actor,
) -> Result<Json<TripProgress>, AppError> {
    let request = resolve_token(&state, &token)?;
    check_viewer(&request, actor)?;

    let trip = state
        .trips
        .get(&request.id)
        .ok_or_else(|| AppError::NotFound("trip has not started yet".to_string()))?;

    Ok(Json(trip.value().clone()))
}

fn resolve_token(state: &AppState, token: &Uuid) -> Result<AssistanceRequest, AppError> {
    let request_id = state
        .request_id_for_token(token)
        .ok_or_else(|| AppError::NotFound("unknown tracking token".to_string()))?;

    state
        .requests
        .get(&request_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound("unknown tracking token".to_string()))
}

fn check_viewer(request: &AssistanceRequest, actor: Actor) -> Result<(), AppError> {
    let is_requester = request.requester_id == actor.id;
    let is_bound_provider = request.accepted_provider == Some(actor.id);

    if is_requester || is_bound_provider {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "you are not a party to this request".to_string(),
        ))
    }
}
