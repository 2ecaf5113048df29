use crate::geo::{eta_minutes, haversine_km};
use crate::models::provider::{GeoPoint, NearbyProvider};
use crate::state::AppState;

/// Ranked proximity search over the provider registry. Read-only: distance
/// and ETA land on a projection, never on the stored profile.
///
/// Candidates must be available and verified, offer at least one of
/// `wanted_services` when a filter is given, and sit within
/// `max_distance_km` of the origin. Results are ordered by ascending
/// distance with provider id as a stable tie-break.
pub fn find_nearby(
    state: &AppState,
    origin: GeoPoint,
    wanted_services: Option<&[String]>,
    max_distance_km: f64,
) -> Vec<NearbyProvider> {
    if max_distance_km <= 0.0 {
        return Vec::new();
    }

    let timer = state.metrics.nearby_search_seconds.start_timer();

    let mut nearby: Vec<NearbyProvider> = state
        .providers
        .iter()
        .filter_map(|entry| {
            let provider = entry.value();

            if !provider.is_eligible() {
                return None;
            }
            if let Some(wanted) = wanted_services {
                if !provider.offers_any(wanted) {
                    return None;
                }
            }

            let distance_km = haversine_km(&origin, &provider.location);
            if distance_km > max_distance_km {
                return None;
            }

            Some(NearbyProvider {
                provider: provider.clone(),
                distance_km,
                eta_minutes: eta_minutes(distance_km),
            })
        })
        .collect();

    nearby.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.provider.id.cmp(&b.provider.id))
    });

    timer.observe_duration();
    nearby
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::find_nearby;
    use crate::models::provider::{GeoPoint, ProviderProfile};
    use crate::state::AppState;

    const ORIGIN: GeoPoint = GeoPoint {
        lat: 5.6037,
        lon: -0.1870,
    };

    fn provider(id_seed: u128, offset_lat: f64, services: &[&str]) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::from_u128(id_seed),
            company_name: format!("provider-{id_seed}"),
            location: GeoPoint {
                lat: ORIGIN.lat + offset_lat,
                lon: ORIGIN.lon,
            },
            services: services.iter().map(|s| s.to_string()).collect(),
            is_available: true,
            is_verified: true,
            rating: 4.0,
        }
    }

    fn state_with(providers: Vec<ProviderProfile>) -> AppState {
        let state = AppState::new(16, 10.0);
        for p in providers {
            state.providers.insert(p.id, p);
        }
        state
    }

    #[test]
    fn results_within_radius_ordered_by_distance() {
        // One degree of latitude is roughly 111 km; offsets chosen to land
        // at about 2, 5 and 11 km from the origin.
        let state = state_with(vec![
            provider(3, 11.0 / 111.0, &["towing"]),
            provider(1, 2.0 / 111.0, &["towing"]),
            provider(2, 5.0 / 111.0, &["towing"]),
        ]);

        let nearby = find_nearby(&state, ORIGIN, None, 10.0);

        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].provider.id, Uuid::from_u128(1));
        assert_eq!(nearby[1].provider.id, Uuid::from_u128(2));
        assert!(nearby[0].distance_km < nearby[1].distance_km);
    }

    #[test]
    fn unavailable_and_unverified_providers_are_excluded() {
        let mut offline = provider(1, 0.01, &["towing"]);
        offline.is_available = false;
        let mut unvetted = provider(2, 0.01, &["towing"]);
        unvetted.is_verified = false;

        let state = state_with(vec![offline, unvetted]);

        assert!(find_nearby(&state, ORIGIN, None, 10.0).is_empty());
    }

    #[test]
    fn service_filter_requires_overlap() {
        let state = state_with(vec![
            provider(1, 0.01, &["towing", "mechanic"]),
            provider(2, 0.01, &["washing"]),
        ]);

        let wanted = vec!["mechanic".to_string(), "parts".to_string()];
        let nearby = find_nearby(&state, ORIGIN, Some(&wanted), 10.0);

        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].provider.id, Uuid::from_u128(1));
    }

    #[test]
    fn non_positive_radius_yields_empty() {
        let state = state_with(vec![provider(1, 0.0, &["towing"])]);

        assert!(find_nearby(&state, ORIGIN, None, 0.0).is_empty());
        assert!(find_nearby(&state, ORIGIN, None, -3.0).is_empty());
    }

    #[test]
    fn empty_registry_is_not_an_error() {
        let state = state_with(Vec::new());
        assert!(find_nearby(&state, ORIGIN, None, 10.0).is_empty());
    }

    #[test]
    fn equidistant_providers_tie_break_on_id() {
        let state = state_with(vec![
            provider(7, 0.02, &["towing"]),
            provider(3, 0.02, &["towing"]),
        ]);

        let nearby = find_nearby(&state, ORIGIN, None, 10.0);

        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].provider.id, Uuid::from_u128(3));
        assert_eq!(nearby[1].provider.id, Uuid::from_u128(7));
    }
}
