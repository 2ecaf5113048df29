use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::directory::find_nearby;
use crate::error::AppError;
use crate::models::provider::{GeoPoint, NearbyProvider, ProviderProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", post(register_provider).get(list_providers))
        .route("/providers/nearby", get(nearby_providers))
        .route("/providers/:id/availability", patch(update_availability))
        .route("/providers/:id/location", patch(update_location))
        .route("/providers/:id/verify", patch(verify_provider))
}

#[derive(Deserialize)]
pub struct RegisterProviderRequest {
    pub company_name: String,
    pub location: GeoPoint,
    pub services: Vec<String>,
    pub rating: f64,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    /// Comma-separated service-category names.
    pub services: Option<String>,
    pub radius_km: Option<f64>,
}

#[derive(Serialize)]
pub struct NearbyResponse {
    pub providers: Vec<NearbyProvider>,
    pub user_location: GeoPoint,
}

async fn register_provider(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterProviderRequest>,
) -> Result<Json<ProviderProfile>, AppError> {
    if payload.company_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "company_name cannot be empty".to_string(),
        ));
    }

    if payload.services.is_empty() {
        return Err(AppError::BadRequest(
            "at least one service is required".to_string(),
        ));
    }

    // Verification is a separate step; fresh registrations do not match.
    let provider = ProviderProfile {
        id: Uuid::new_v4(),
        company_name: payload.company_name,
        location: payload.location,
        services: payload.services,
        is_available: true,
        is_verified: false,
        rating: payload.rating.clamp(0.0, 5.0),
    };

    state.providers.insert(provider.id, provider.clone());
    Ok(Json(provider))
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderProfile>> {
    let providers = state
        .providers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(providers)
}

async fn nearby_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Json<NearbyResponse> {
    let origin = GeoPoint {
        lat: query.lat,
        lon: query.lon,
    };
    let radius = query.radius_km.unwrap_or(state.default_search_radius_km);

    let wanted: Option<Vec<String>> = query.services.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    });

    let providers = find_nearby(&state, origin, wanted.as_deref(), radius);

    Json(NearbyResponse {
        providers,
        user_location: origin,
    })
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ProviderProfile>, AppError> {
    let mut provider = state
        .providers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("provider {id} not found")))?;

    provider.is_available = payload.is_available;
    Ok(Json(provider.clone()))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<ProviderProfile>, AppError> {
    let mut provider = state
        .providers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("provider {id} not found")))?;

    provider.location = payload.location;
    Ok(Json(provider.clone()))
}

async fn verify_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProviderProfile>, AppError> {
    let mut provider = state
        .providers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("provider {id} not found")))?;

    provider.is_verified = true;
    Ok(Json(provider.clone()))
}
