use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::{eta_minutes, haversine_km, step_toward};
use crate::models::provider::GeoPoint;
use crate::models::request::{AssistanceRequest, RequestStatus};
use crate::models::tracking::{DispatchEvent, LocationSample, TrackingSnapshot};
use crate::state::AppState;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const DEFAULT_STEP_FRACTION: f64 = 0.1;

/// Inside this radius the simulated provider counts as arrived.
const ARRIVAL_THRESHOLD_KM: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct ApproachStep {
    pub new_location: GeoPoint,
    pub remaining_distance_km: f64,
    pub status: RequestStatus,
}

/// Appends one provider position report to a request's history. Only the
/// bound provider may report, and only while the request is accepted or
/// in progress.
pub fn report_location(
    state: &AppState,
    request_id: Uuid,
    provider_id: Uuid,
    location: GeoPoint,
    speed_kmh: Option<f64>,
    heading_deg: Option<f64>,
) -> Result<LocationSample, AppError> {
    let request = get_request(state, request_id)?;
    check_reporting_window(&request, provider_id)?;

    Ok(append_sample(
        state, &request, provider_id, location, speed_kmh, heading_deg,
    ))
}

/// Most recent sample for a request, if any has been reported yet.
pub fn latest(state: &AppState, request_id: Uuid) -> Option<LocationSample> {
    state
        .samples
        .get(&request_id)
        .and_then(|entry| entry.value().last().cloned())
}

/// Up to `limit` samples, most recent first.
pub fn history(state: &AppState, request_id: Uuid, limit: usize) -> Vec<LocationSample> {
    state
        .samples
        .get(&request_id)
        .map(|entry| entry.value().iter().rev().take(limit).cloned().collect())
        .unwrap_or_default()
}

/// Live view for the tracking page: latest provider position with derived
/// distance and ETA, recent history, and the request status. Distance and
/// ETA stay null until the first sample arrives.
pub fn snapshot(state: &AppState, request_id: Uuid) -> Result<TrackingSnapshot, AppError> {
    let request = get_request(state, request_id)?;
    let latest_sample = latest(state, request_id);

    let (provider_location, distance_km, eta) = match &latest_sample {
        Some(sample) => {
            let distance = haversine_km(&sample.location, &request.location);
            (
                Some(sample.location),
                Some(distance),
                Some(eta_minutes(distance)),
            )
        }
        None => (None, None, None),
    };

    Ok(TrackingSnapshot {
        provider_location,
        user_location: request.location,
        distance_km,
        eta_minutes: eta,
        history: history(state, request_id, DEFAULT_HISTORY_LIMIT),
        status: request.status,
    })
}

/// Demo affordance: moves the provider `step_fraction` of the remaining
/// vector toward the stranded driver and records the result as a regular
/// sample. Under 100 m the request auto-transitions accepted to
/// in_progress; that flip is a demo heuristic, not a real arrival signal.
pub fn simulate_approach(
    state: &AppState,
    request_id: Uuid,
    step_fraction: f64,
) -> Result<ApproachStep, AppError> {
    let request = get_request(state, request_id)?;

    if request.status != RequestStatus::Accepted {
        return Err(AppError::InvalidState(
            "request is not accepted yet".to_string(),
        ));
    }
    let provider_id = request.accepted_provider.ok_or_else(|| {
        AppError::InvalidState("request has no bound provider".to_string())
    })?;

    let current = match latest(state, request_id) {
        Some(sample) => sample.location,
        None => {
            // No report yet; the simulated trip starts from the provider's
            // registered base.
            state
                .providers
                .get(&provider_id)
                .map(|entry| entry.value().location)
                .ok_or_else(|| {
                    AppError::NotFound(format!("provider {provider_id} not found"))
                })?
        }
    };

    let new_location = step_toward(&current, &request.location, step_fraction);
    append_sample(state, &request, provider_id, new_location, None, None);

    let remaining_distance_km = haversine_km(&new_location, &request.location);
    let mut status = request.status;

    if remaining_distance_km < ARRIVAL_THRESHOLD_KM {
        status = mark_arrived(state, request_id).unwrap_or(status);
    }

    Ok(ApproachStep {
        new_location,
        remaining_distance_km,
        status,
    })
}

/// Arrival flip, at most once: the check and the transition share the
/// request's entry lock.
fn mark_arrived(state: &AppState, request_id: Uuid) -> Option<RequestStatus> {
    let updated = {
        let mut request = state.requests.get_mut(&request_id)?;
        if request.status != RequestStatus::Accepted {
            return Some(request.status);
        }
        request.status = RequestStatus::InProgress;
        request.clone()
    };

    if let Some(mut trip) = state.trips.get_mut(&request_id) {
        trip.actual_arrival = Some(Utc::now());
    }

    let _ = state.events_tx.send(DispatchEvent::StatusChanged {
        request_id: updated.id,
        tracking_token: updated.tracking_token,
        status: updated.status,
    });
    info!(request_id = %updated.id, "provider arrived, service in progress");

    Some(updated.status)
}

fn append_sample(
    state: &AppState,
    request: &AssistanceRequest,
    provider_id: Uuid,
    location: GeoPoint,
    speed_kmh: Option<f64>,
    heading_deg: Option<f64>,
) -> LocationSample {
    // Timestamp assigned while holding the entry lock, so a request's
    // history stays in recording order even under concurrent reports.
    let sample = {
        let mut samples = state.samples.entry(request.id).or_default();
        let sample = LocationSample {
            provider_id,
            request_id: request.id,
            location,
            recorded_at: Utc::now(),
            speed_kmh,
            heading_deg,
        };
        samples.push(sample.clone());
        sample
    };

    if let Some(mut trip) = state.trips.get_mut(&request.id) {
        trip.route.push(location);
    }

    state.metrics.location_samples_total.inc();
    let _ = state.events_tx.send(DispatchEvent::LocationReported {
        request_id: request.id,
        tracking_token: request.tracking_token,
        location,
        recorded_at: sample.recorded_at,
    });

    sample
}

fn get_request(state: &AppState, request_id: Uuid) -> Result<AssistanceRequest, AppError> {
    state
        .requests
        .get(&request_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("request {request_id} not found")))
}

fn check_reporting_window(
    request: &AssistanceRequest,
    provider_id: Uuid,
) -> Result<(), AppError> {
    match request.accepted_provider {
        None => Err(AppError::InvalidState(
            "request has no bound provider".to_string(),
        )),
        Some(bound) if bound != provider_id => Err(AppError::InvalidState(
            "provider is not bound to this request".to_string(),
        )),
        Some(_) => match request.status {
            RequestStatus::Accepted | RequestStatus::InProgress => Ok(()),
            _ => Err(AppError::InvalidState(
                "request is not being serviced".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{
        history, latest, report_location, simulate_approach, snapshot, DEFAULT_STEP_FRACTION,
    };
    use crate::engine::lifecycle::{accept, create, CreateRequestParams};
    use crate::error::AppError;
    use crate::geo::haversine_km;
    use crate::models::actor::Actor;
    use crate::models::provider::{GeoPoint, ProviderProfile};
    use crate::models::request::RequestStatus;
    use crate::state::AppState;

    const USER: GeoPoint = GeoPoint {
        lat: 5.60,
        lon: -0.19,
    };

    fn setup() -> (AppState, Uuid, Uuid) {
        let state = AppState::new(16, 10.0);
        let provider_id = Uuid::from_u128(1);
        state.providers.insert(
            provider_id,
            ProviderProfile {
                id: provider_id,
                company_name: "Ace Towing".to_string(),
                location: GeoPoint {
                    lat: 5.618,
                    lon: -0.19,
                },
                services: vec!["towing".to_string()],
                is_available: true,
                is_verified: true,
                rating: 4.5,
            },
        );

        let request = create(
            &state,
            Actor::driver(Uuid::from_u128(9)),
            CreateRequestParams {
                provider_id,
                service_category: "towing".to_string(),
                location: USER,
                description: "engine trouble".to_string(),
            },
        )
        .unwrap();

        (state, request.id, provider_id)
    }

    fn accepted(state: &AppState, request_id: Uuid, provider_id: Uuid) {
        accept(state, request_id, Actor::provider(provider_id)).unwrap();
    }

    #[test]
    fn report_before_acceptance_is_invalid_state() {
        let (state, request_id, provider_id) = setup();

        let err = report_location(&state, request_id, provider_id, USER, None, None).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn report_by_unbound_provider_is_invalid_state() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        let err = report_location(&state, request_id, Uuid::from_u128(42), USER, None, None)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn history_is_most_recent_first_and_capped() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        for i in 1..=3 {
            let point = GeoPoint {
                lat: 5.61 + i as f64 * 0.001,
                lon: -0.19,
            };
            report_location(&state, request_id, provider_id, point, None, None).unwrap();
        }

        let recent = history(&state, request_id, 2);
        assert_eq!(recent.len(), 2);
        assert!((recent[0].location.lat - 5.613).abs() < 1e-9);
        assert!((recent[1].location.lat - 5.612).abs() < 1e-9);
        assert!(recent[0].recorded_at >= recent[1].recorded_at);

        let newest = latest(&state, request_id).unwrap();
        assert!((newest.location.lat - 5.613).abs() < 1e-9);
    }

    #[test]
    fn snapshot_without_samples_has_null_distance() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        let view = snapshot(&state, request_id).unwrap();
        assert!(view.provider_location.is_none());
        assert!(view.distance_km.is_none());
        assert!(view.eta_minutes.is_none());
        assert_eq!(view.user_location.lat, USER.lat);
        assert_eq!(view.status, RequestStatus::Accepted);
    }

    #[test]
    fn snapshot_derives_distance_and_eta_from_latest_sample() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        let reported = GeoPoint {
            lat: 5.62,
            lon: -0.195,
        };
        report_location(&state, request_id, provider_id, reported, Some(32.0), None).unwrap();

        let view = snapshot(&state, request_id).unwrap();
        let expected = haversine_km(&reported, &USER);

        assert_eq!(view.provider_location.unwrap().lat, reported.lat);
        assert!((view.distance_km.unwrap() - expected).abs() < 1e-9);
        assert_eq!(view.eta_minutes.unwrap(), 9);
        assert_eq!(view.history.len(), 1);
    }

    #[test]
    fn sample_appends_extend_the_trip_route() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        report_location(&state, request_id, provider_id, USER, None, None).unwrap();
        report_location(&state, request_id, provider_id, USER, None, None).unwrap();

        assert_eq!(state.trips.get(&request_id).unwrap().route.len(), 2);
    }

    #[test]
    fn simulation_flips_status_exactly_once_on_arrival() {
        let (state, request_id, provider_id) = setup();
        accepted(&state, request_id, provider_id);

        // Provider starts about 2 km out; each step closes 10% of the gap,
        // so arrival is reached well within 100 iterations.
        let mut flipped_at = None;
        for i in 0..100 {
            match simulate_approach(&state, request_id, DEFAULT_STEP_FRACTION) {
                Ok(step) => {
                    if step.status == RequestStatus::InProgress {
                        assert!(step.remaining_distance_km < 0.1);
                        flipped_at = Some(i);
                        break;
                    }
                }
                Err(err) => panic!("simulation failed before arrival: {err}"),
            }
        }

        assert!(flipped_at.is_some(), "provider never arrived");
        assert_eq!(
            state.requests.get(&request_id).unwrap().status,
            RequestStatus::InProgress
        );
        assert!(state
            .trips
            .get(&request_id)
            .unwrap()
            .actual_arrival
            .is_some());

        // Once in progress the simulation window is closed.
        let err = simulate_approach(&state, request_id, DEFAULT_STEP_FRACTION).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn simulation_requires_acceptance() {
        let (state, request_id, _provider_id) = setup();

        let err = simulate_approach(&state, request_id, DEFAULT_STEP_FRACTION).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }
}
