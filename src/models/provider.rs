use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub company_name: String,
    pub location: GeoPoint,
    pub services: Vec<String>,
    pub is_available: bool,
    pub is_verified: bool,
    pub rating: f64,
}

impl ProviderProfile {
    /// Only available and verified providers may be matched to a request.
    pub fn is_eligible(&self) -> bool {
        self.is_available && self.is_verified
    }

    pub fn offers_any(&self, wanted: &[String]) -> bool {
        wanted.iter().any(|w| self.services.iter().any(|s| s == w))
    }
}

/// Read-only projection returned by nearby searches. Distance and ETA are
/// computed per query and never written back onto the stored profile.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyProvider {
    #[serde(flatten)]
    pub provider: ProviderProfile,
    pub distance_km: f64,
    pub eta_minutes: i64,
}
