use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::category::{default_categories, ServiceCategory};
use crate::models::provider::ProviderProfile;
use crate::models::request::AssistanceRequest;
use crate::models::tracking::{DispatchEvent, LocationSample, TripProgress};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub providers: DashMap<Uuid, ProviderProfile>,
    pub requests: DashMap<Uuid, AssistanceRequest>,
    /// tracking token -> internal request id. External parties only ever
    /// hold the token.
    pub tracking_index: DashMap<Uuid, Uuid>,
    /// request id -> time-ordered, append-only location history.
    pub samples: DashMap<Uuid, Vec<LocationSample>>,
    pub trips: DashMap<Uuid, TripProgress>,
    pub categories: DashMap<String, ServiceCategory>,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub default_search_radius_km: f64,
}

impl AppState {
    pub fn new(event_buffer_size: usize, default_search_radius_km: f64) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        let categories = DashMap::new();
        for category in default_categories() {
            categories.insert(category.name.clone(), category);
        }

        Self {
            providers: DashMap::new(),
            requests: DashMap::new(),
            tracking_index: DashMap::new(),
            samples: DashMap::new(),
            trips: DashMap::new(),
            categories,
            events_tx,
            metrics: Metrics::new(),
            default_search_radius_km,
        }
    }

    pub fn category(&self, name: &str) -> Option<ServiceCategory> {
        self.categories.get(name).map(|entry| entry.value().clone())
    }

    pub fn request_id_for_token(&self, token: &Uuid) -> Option<Uuid> {
        self.tracking_index.get(token).map(|entry| *entry.value())
    }
}
