use crate::core::error::CoordinateError;
use crate::models::{BoundingBox, Coordinates};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two optional locations
///
/// Returns `f64::INFINITY` when either side has no coordinates, so callers
/// can sort unknown distances last without special casing.
pub fn distance_between(from: Option<Coordinates>, to: Option<Coordinates>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude),
        _ => f64::INFINITY,
    }
}

/// Check that a raw coordinate pair is usable for distance computation
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, CoordinateError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(CoordinateError::NotFinite(latitude, longitude));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(CoordinateError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(CoordinateError::LongitudeOutOfRange(longitude));
    }
    Ok(Coordinates::new(latitude, longitude))
}

/// Calculate a bounding box around a center point
///
/// This is much faster than Haversine for pre-filtering.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
///
/// # Arguments
/// * `lat` - Center latitude in degrees
/// * `lon` - Center longitude in degrees
/// * `radius_km` - Radius in kilometers
///
/// # Returns
/// BoundingBox with min/max lat/lon
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    // 1 degree latitude is approximately 111 km
    let lat_delta = radius_km / 111.0;

    // 1 degree longitude varies by latitude
    let lon_delta = radius_km / (111.0 * lat.to_radians().cos().abs());

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && lon >= bbox.min_lon
        && lon <= bbox.max_lon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Moscow to Saint Petersburg (approximately 634 km)
        let moscow = (55.7558, 37.6173);
        let spb = (59.9343, 30.3351);

        let distance = haversine_distance(moscow.0, moscow.1, spb.0, spb.1);
        assert!((distance - 634.0).abs() < 10.0, "Distance should be ~634km, got {}", distance);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_same_point() {
        let a = haversine_distance(55.75, 37.61, 55.80, 37.70);
        let b = haversine_distance(55.80, 37.70, 55.75, 37.61);
        assert!((a - b).abs() < 1e-9);
        assert_eq!(haversine_distance(55.75, 37.61, 55.75, 37.61), 0.0);
    }

    #[test]
    fn test_distance_between_missing_side_is_infinite() {
        let center = Some(Coordinates::new(55.75, 37.61));
        assert!(distance_between(center, None).is_infinite());
        assert!(distance_between(None, center).is_infinite());
        assert!(distance_between(center, center) < 1e-9);
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(55.75, 37.61).is_ok());
        assert!(matches!(
            validate_coordinates(f64::NAN, 37.61),
            Err(CoordinateError::NotFinite(_, _))
        ));
        assert!(matches!(
            validate_coordinates(55.75, f64::INFINITY),
            Err(CoordinateError::NotFinite(_, _))
        ));
        assert_eq!(
            validate_coordinates(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            validate_coordinates(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(55.7558, 37.6173, 10.0);

        assert!(bbox.min_lat < 55.7558);
        assert!(bbox.max_lat > 55.7558);
        assert!(bbox.min_lon < 37.6173);
        assert!(bbox.max_lon > 37.6173);

        // Check approximate size (20km / 111km per degree = ~0.18 degrees)
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.18).abs() < 0.02, "Lat span should be ~0.18 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(55.7558, 37.6173, 10.0);

        // Center point should be within
        assert!(is_within_bounding_box(55.7558, 37.6173, &bbox));

        // Close point should be within
        assert!(is_within_bounding_box(55.76, 37.62, &bbox));

        // Far point should not be within
        assert!(!is_within_bounding_box(59.9343, 30.3351, &bbox));
    }
}
