//! Great-circle distance for within-radius predicates.

/// Earth mean radius in kilometers.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance in kilometers between two `(lat, lon)` points in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_MEAN_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Whether `(lat, lon)` lies within `radius_km` of `(center_lat, center_lon)`.
pub fn within_radius(lat: f64, lon: f64, center_lat: f64, center_lon: f64, radius_km: f64) -> bool {
    haversine_km(center_lat, center_lon, lat, lon) <= radius_km
}
