use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{eta_minutes, haversine_km};
use crate::models::actor::{AccountRole, Actor};
use crate::models::provider::{GeoPoint, ProviderProfile};
use crate::models::request::{AssistanceRequest, RequestStatus};
use crate::models::tracking::{DispatchEvent, TripProgress};
use crate::state::AppState;

pub struct CreateRequestParams {
    pub provider_id: Uuid,
    pub service_category: String,
    pub location: GeoPoint,
    pub description: String,
}

/// Creates a request in `pending` for a driver. The chosen provider and the
/// service category must resolve; the category's base price seeds the
/// estimate shown to the driver.
pub fn create(
    state: &AppState,
    actor: Actor,
    params: CreateRequestParams,
) -> Result<AssistanceRequest, AppError> {
    let result = try_create(state, actor, params);
    state.metrics.transition("create", outcome_label(&result));
    result
}

fn try_create(
    state: &AppState,
    actor: Actor,
    params: CreateRequestParams,
) -> Result<AssistanceRequest, AppError> {
    if actor.role != AccountRole::Driver {
        return Err(AppError::Forbidden(
            "only drivers can create assistance requests".to_string(),
        ));
    }

    if !state.providers.contains_key(&params.provider_id) {
        return Err(AppError::NotFound(format!(
            "provider {} not found",
            params.provider_id
        )));
    }

    let category = state
        .category(&params.service_category)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "service category {} not found",
                params.service_category
            ))
        })?;

    let request = AssistanceRequest {
        id: Uuid::new_v4(),
        requester_id: actor.id,
        service_category: category.name,
        description: params.description,
        location: params.location,
        status: RequestStatus::Pending,
        created_at: Utc::now(),
        requested_provider: Some(params.provider_id),
        accepted_provider: None,
        estimated_price: Some(category.base_price),
        completed_at: None,
        tracking_token: Uuid::new_v4(),
    };

    state.requests.insert(request.id, request.clone());
    state
        .tracking_index
        .insert(request.tracking_token, request.id);
    state.metrics.active_requests.inc();
    emit_status(state, &request);

    info!(
        request_id = %request.id,
        requester_id = %request.requester_id,
        category = %request.service_category,
        "assistance request created"
    );

    Ok(request)
}

/// Binds the acting provider and moves `pending` to `accepted`. The status
/// check and the bind happen under the request's map entry lock, so of any
/// number of concurrent attempts exactly one wins; the rest see Conflict.
pub fn accept(state: &AppState, request_id: Uuid, actor: Actor) -> Result<AssistanceRequest, AppError> {
    let result = try_accept(state, request_id, actor);
    state.metrics.transition("accept", outcome_label(&result));
    result
}

fn try_accept(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    let provider = require_provider(state, actor)?;

    let updated = {
        let mut request = state
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict(
                "request is no longer pending".to_string(),
            ));
        }

        request.status = RequestStatus::Accepted;
        request.accepted_provider = Some(actor.id);
        request.clone()
    };

    let distance_km = haversine_km(&provider.location, &updated.location);
    let now = Utc::now();
    state.trips.insert(
        updated.id,
        TripProgress {
            request_id: updated.id,
            provider_start: provider.location,
            destination: updated.location,
            started_at: now,
            estimated_arrival: now + Duration::minutes(eta_minutes(distance_km)),
            actual_arrival: None,
            route: Vec::new(),
        },
    );

    emit_status(state, &updated);
    info!(
        request_id = %updated.id,
        provider_id = %actor.id,
        distance_km,
        "request accepted"
    );

    Ok(updated)
}

/// `accepted` to `in_progress`, by the bound provider only.
pub fn start(state: &AppState, request_id: Uuid, actor: Actor) -> Result<AssistanceRequest, AppError> {
    let result = try_start(state, request_id, actor);
    state.metrics.transition("start", outcome_label(&result));
    result
}

fn try_start(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    require_provider(state, actor)?;

    let updated = {
        let mut request = state
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))?;

        check_bound_provider(&request, actor)?;
        if request.status != RequestStatus::Accepted {
            return Err(AppError::Conflict(
                "service can only start from an accepted request".to_string(),
            ));
        }

        request.status = RequestStatus::InProgress;
        request.clone()
    };

    emit_status(state, &updated);
    info!(request_id = %updated.id, provider_id = %actor.id, "service started");

    Ok(updated)
}

/// Terminal `completed`, by the bound provider, from `accepted` or
/// `in_progress`. Stamps the completion time and finalizes the trip.
pub fn complete(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    let result = try_complete(state, request_id, actor);
    state.metrics.transition("complete", outcome_label(&result));
    result
}

fn try_complete(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    require_provider(state, actor)?;

    let updated = {
        let mut request = state
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))?;

        check_bound_provider(&request, actor)?;
        if !matches!(
            request.status,
            RequestStatus::Accepted | RequestStatus::InProgress
        ) {
            return Err(AppError::Conflict(
                "request is not in a completable state".to_string(),
            ));
        }

        request.status = RequestStatus::Completed;
        request.completed_at = Some(Utc::now());
        request.clone()
    };

    if let Some(mut trip) = state.trips.get_mut(&updated.id) {
        if trip.actual_arrival.is_none() {
            trip.actual_arrival = updated.completed_at;
        }
    }

    state.metrics.active_requests.dec();
    emit_status(state, &updated);
    info!(request_id = %updated.id, provider_id = %actor.id, "service completed");

    Ok(updated)
}

/// Terminal `cancelled`, by the requester, from any non-terminal status.
pub fn cancel(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    let result = try_cancel(state, request_id, actor);
    state.metrics.transition("cancel", outcome_label(&result));
    result
}

fn try_cancel(
    state: &AppState,
    request_id: Uuid,
    actor: Actor,
) -> Result<AssistanceRequest, AppError> {
    let updated = {
        let mut request = state
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))?;

        if actor.role != AccountRole::Driver || request.requester_id != actor.id {
            return Err(AppError::Forbidden(
                "only the requesting driver can cancel this request".to_string(),
            ));
        }
        if request.status.is_terminal() {
            return Err(AppError::Conflict(
                "request can no longer be cancelled".to_string(),
            ));
        }

        request.status = RequestStatus::Cancelled;
        request.clone()
    };

    state.metrics.active_requests.dec();
    emit_status(state, &updated);
    info!(request_id = %updated.id, requester_id = %actor.id, "request cancelled");

    Ok(updated)
}

fn require_provider(state: &AppState, actor: Actor) -> Result<ProviderProfile, AppError> {
    if actor.role != AccountRole::Provider {
        return Err(AppError::Forbidden(
            "only service providers can perform this action".to_string(),
        ));
    }

    state
        .providers
        .get(&actor.id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::Forbidden(format!("provider {} is not registered", actor.id)))
}

// When no provider is bound yet the status check below reports the precise
// Conflict; a bound but different provider is a Forbidden.
fn check_bound_provider(request: &AssistanceRequest, actor: Actor) -> Result<(), AppError> {
    if let Some(bound) = request.accepted_provider {
        if bound != actor.id {
            return Err(AppError::Forbidden(
                "you are not assigned to this request".to_string(),
            ));
        }
    }
    Ok(())
}

fn emit_status(state: &AppState, request: &AssistanceRequest) {
    let _ = state.events_tx.send(DispatchEvent::StatusChanged {
        request_id: request.id,
        tracking_token: request.tracking_token,
        status: request.status,
    });
}

fn outcome_label<T>(result: &Result<T, AppError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(_) => "rejected",
    }
}
