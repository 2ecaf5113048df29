use crate::models::provider::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const AVERAGE_SPEED_KMH: f64 = 30.0;
const PREPARATION_BUFFER_MIN: i64 = 5;
const MINIMUM_ETA_MIN: i64 = 5;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lon = (delta_lon / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lon * sin_lon;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Minutes to cover `distance_km` at urban average speed, plus a fixed
/// preparation buffer, never below the 5-minute floor.
pub fn eta_minutes(distance_km: f64) -> i64 {
    let travel = (distance_km / AVERAGE_SPEED_KMH * 60.0).floor() as i64;
    (travel + PREPARATION_BUFFER_MIN).max(MINIMUM_ETA_MIN)
}

/// Linear step of `fraction` of the remaining vector from `from` toward
/// `to`. Good enough for the approach simulation; no route awareness.
pub fn step_toward(from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint {
    GeoPoint {
        lat: from.lat + (to.lat - from.lat) * fraction,
        lon: from.lon + (to.lon - from.lon) * fraction,
    }
}
