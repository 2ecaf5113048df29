use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::provider::GeoPoint;
use crate::models::request::RequestStatus;

/// One timestamped provider position tied to a request. Samples are
/// append-only; a request's samples form a time-ordered sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSample {
    pub provider_id: Uuid,
    pub request_id: Uuid,
    pub location: GeoPoint,
    pub recorded_at: DateTime<Utc>,
    pub speed_kmh: Option<f64>,
    pub heading_deg: Option<f64>,
}

/// Trip summary kept alongside a request from acceptance to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripProgress {
    pub request_id: Uuid,
    pub provider_start: GeoPoint,
    pub destination: GeoPoint,
    pub started_at: DateTime<Utc>,
    pub estimated_arrival: DateTime<Utc>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub route: Vec<GeoPoint>,
}

/// Live view returned by the tracking endpoint. Distance and ETA are null
/// until the provider reports a first position.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingSnapshot {
    pub provider_location: Option<GeoPoint>,
    pub user_location: GeoPoint,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<i64>,
    pub history: Vec<LocationSample>,
    pub status: RequestStatus,
}

/// Pushed on the websocket feed so tracking views update without polling.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    StatusChanged {
        request_id: Uuid,
        tracking_token: Uuid,
        status: RequestStatus,
    },
    LocationReported {
        request_id: Uuid,
        tracking_token: Uuid,
        location: GeoPoint,
        recorded_at: DateTime<Utc>,
    },
}
