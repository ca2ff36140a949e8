//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_km(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_paris_lyon() {
        let paris = Coordinates::new(48.8566, 2.3522);
        let lyon = Coordinates::new(45.7640, 4.8357);

        let distance = haversine_km(&paris, &lyon);

        // Paris to Lyon is approximately 392 km
        assert!((distance - 392.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates::new(48.0, 2.0);
        assert!(haversine_km(&point, &point).abs() < 0.001);
    }

    #[test]
    fn test_haversine_symmetric() {
        let a = Coordinates::new(48.8566, 2.3522);
        let b = Coordinates::new(47.2184, -1.5536);
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinates::new(48.0, 2.0);
        let b = Coordinates::new(49.0, 2.0);
        // One degree of latitude is ~111.2 km
        assert!((haversine_km(&a, &b) - 111.2).abs() < 0.5);
    }
}
