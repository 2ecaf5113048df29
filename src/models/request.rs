use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::provider::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistanceRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub service_category: String,
    pub description: String,
    pub location: GeoPoint,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Provider the driver picked on the map. A routing hint only; the
    /// request stays open to any eligible provider until accepted.
    pub requested_provider: Option<Uuid>,
    /// Set exactly when status is accepted, in_progress or completed.
    pub accepted_provider: Option<Uuid>,
    pub estimated_price: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Opaque external handle for the tracking endpoints. Random, unique,
    /// immutable after creation; never the internal id.
    pub tracking_token: Uuid,
}
