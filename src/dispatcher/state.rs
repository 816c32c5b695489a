use std::collections::HashMap;
use std::time::Duration;

use haversine::{distance, Location, Units};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::model::{GeoCoordinate, NamedLocation};

/// OpenWeatherMap recommends waiting 10 minutes between requests.
pub const REQUEST_THRESHOLD: Duration = Duration::from_secs(10 * 60);

/// 5 km: the weather won't change that much over such a short distance.
pub const LOCATION_DISTANCE_KM_THRESHOLD: f64 = 5.0;

/// Tuning knobs for the suppression policy. Production uses the defaults;
/// tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    pub request_threshold: Duration,
    pub distance_threshold_km: f64,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            request_threshold: REQUEST_THRESHOLD,
            distance_threshold_km: LOCATION_DISTANCE_KM_THRESHOLD,
        }
    }
}

/// The weather-side in-flight mapping together with the last-request
/// bookkeeping the suppression check reads. Guarded by a single lock so the
/// too-soon check and the insert/stamp are one step.
#[derive(Debug, Default)]
pub struct WeatherDispatchState {
    pub tasks: HashMap<Uuid, CancellationToken>,
    pub last_request: Option<Instant>,
    pub last_geo: Option<GeoCoordinate>,
    pub last_named: Option<NamedLocation>,
}

impl WeatherDispatchState {
    pub fn clear(&mut self) {
        for (_, token) in self.tasks.drain() {
            token.cancel();
        }
        self.last_request = None;
        self.last_geo = None;
        self.last_named = None;
    }
}

/// Two coordinates within the distance threshold count as the same place.
pub fn is_same_geo_location(
    new: &GeoCoordinate,
    last: &GeoCoordinate,
    threshold_km: f64,
) -> bool {
    let km = distance(
        Location {
            latitude: new.latitude,
            longitude: new.longitude,
        },
        Location {
            latitude: last.latitude,
            longitude: last.longitude,
        },
        Units::Kilometers,
    );
    km < threshold_km
}

/// Named locations must agree on every identifying field.
pub fn is_same_named_location(new: &NamedLocation, last: &NamedLocation) -> bool {
    new == last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoCoordinate {
        GeoCoordinate {
            latitude,
            longitude,
        }
    }

    #[test]
    fn test_identical_coordinates_are_the_same_place() {
        let here = point(51.5074, -0.1278);
        assert!(is_same_geo_location(
            &here,
            &here,
            LOCATION_DISTANCE_KM_THRESHOLD
        ));
    }

    #[test]
    fn test_nearby_coordinates_are_the_same_place() {
        // roughly 110 m apart
        let a = point(51.5074, -0.1278);
        let b = point(51.5084, -0.1278);
        assert!(is_same_geo_location(&a, &b, LOCATION_DISTANCE_KM_THRESHOLD));
    }

    #[test]
    fn test_coordinates_past_the_threshold_are_different_places() {
        // one degree of latitude is about 111 km
        let a = point(51.5074, -0.1278);
        let b = point(51.5524, -0.1278);
        assert!(!is_same_geo_location(&a, &b, LOCATION_DISTANCE_KM_THRESHOLD));

        let c = point(52.5074, -0.1278);
        assert!(!is_same_geo_location(&a, &c, LOCATION_DISTANCE_KM_THRESHOLD));
    }

    #[test]
    fn test_named_location_comparison_covers_all_fields() {
        let london = NamedLocation::new("2643743", "London").with_country("GB");
        assert!(is_same_named_location(&london, &london.clone()));

        let mut other = london.clone();
        other.country_id = Some("826".to_string());
        assert!(!is_same_named_location(&london, &other));
    }

    #[tokio::test]
    async fn test_clear_cancels_outstanding_tasks() {
        let mut state = WeatherDispatchState::default();
        let token = CancellationToken::new();
        state.tasks.insert(Uuid::new_v4(), token.clone());
        state.last_request = Some(Instant::now());

        state.clear();
        assert!(token.is_cancelled());
        assert!(state.tasks.is_empty());
        assert_eq!(state.last_request, None);
    }
}
