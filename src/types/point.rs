//! Visit points and coordinates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check that these coordinates are a usable geocode.
    ///
    /// (0, 0) is the sentinel a failed geocoding pass leaves behind and is
    /// rejected together with out-of-range and non-finite values.
    pub fn is_valid_geocode(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
            && !(self.lat == 0.0 && self.lng == 0.0)
    }

    /// Describe why these coordinates are not a usable geocode.
    /// Returns `None` when they are valid.
    pub fn geocode_issue(&self) -> Option<CoordinateIssue> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Some(CoordinateIssue::LatOutOfRange(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Some(CoordinateIssue::LngOutOfRange(self.lng));
        }
        if self.lat == 0.0 && self.lng == 0.0 {
            return Some(CoordinateIssue::UngeocodedSentinel);
        }
        None
    }
}

/// Reason a coordinate pair was rejected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateIssue {
    LatOutOfRange(f64),
    LngOutOfRange(f64),
    /// lat/lng both exactly zero, i.e. geocoding never resolved this address
    UngeocodedSentinel,
}

impl std::fmt::Display for CoordinateIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LatOutOfRange(lat) => write!(f, "latitude out of range ({lat})"),
            Self::LngOutOfRange(lng) => write!(f, "longitude out of range ({lng})"),
            Self::UngeocodedSentinel => write!(f, "lat/lng = 0 (geocoding missing)"),
        }
    }
}

/// A visit request with resolved coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitPoint {
    pub id: Uuid,
    pub coordinates: Coordinates,
    pub visit_duration_minutes: i32,
}

/// A point rejected before clustering or sequencing, with the reason
#[derive(Debug, Clone)]
pub struct ExcludedPoint {
    pub id: Uuid,
    pub coordinates: Coordinates,
    pub issue: CoordinateIssue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geocode() {
        assert!(Coordinates::new(50.0755, 14.4378).is_valid_geocode());
        assert!(Coordinates::new(-33.86, 151.2).is_valid_geocode());
    }

    #[test]
    fn test_zero_zero_is_sentinel() {
        let c = Coordinates::new(0.0, 0.0);
        assert!(!c.is_valid_geocode());
        assert_eq!(c.geocode_issue(), Some(CoordinateIssue::UngeocodedSentinel));
    }

    #[test]
    fn test_out_of_range_lat() {
        let c = Coordinates::new(91.0, 14.0);
        assert!(!c.is_valid_geocode());
        assert!(matches!(c.geocode_issue(), Some(CoordinateIssue::LatOutOfRange(_))));
    }

    #[test]
    fn test_out_of_range_lng() {
        let c = Coordinates::new(50.0, -180.5);
        assert!(!c.is_valid_geocode());
        assert!(matches!(c.geocode_issue(), Some(CoordinateIssue::LngOutOfRange(_))));
    }

    #[test]
    fn test_nan_is_invalid() {
        assert!(!Coordinates::new(f64::NAN, 14.0).is_valid_geocode());
    }

    #[test]
    fn test_zero_lat_nonzero_lng_is_valid() {
        // Equator crossings are real places, only the exact (0, 0) pair is a sentinel
        assert!(Coordinates::new(0.0, 6.73).is_valid_geocode());
    }
}
