use crate::geo::haversine_distance;
use crate::models::{Position, Stop};

/// Proximity radius for automatic arrival, in meters.
pub const ARRIVAL_THRESHOLD_M: f64 = 50.0;

/// Distance from `position` to `stop`, or `None` when the stop has no coordinates.
pub fn distance_to(position: &Position, stop: &Stop) -> Option<f64> {
    stop.location
        .map(|loc| haversine_distance(position.point(), loc))
}

/// Returns the first stop, in route order, within the arrival threshold.
///
/// Scanning stops at the first match, so an earlier stop wins over a closer
/// later one.
pub fn detect_arrival<'a>(position: Option<&Position>, route: &'a [Stop]) -> Option<&'a Stop> {
    let position = position?;
    route.iter().find(|stop| match distance_to(position, stop) {
        Some(d) => {
            tracing::debug!(stop = %stop.name, distance_m = d, "distance to stop");
            d <= ARRIVAL_THRESHOLD_M
        }
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    // One meter of latitude, in degrees.
    const LAT_PER_M: f64 = 1.0 / 111_194.93;

    fn here() -> Position {
        Position {
            latitude: 10.7725,
            longitude: 106.6980,
            accuracy_meters: 5.0,
        }
    }

    fn stop_north_of(id: i64, meters: f64) -> Stop {
        let p = here();
        Stop {
            id,
            name: format!("Stop {id}"),
            location: Some(GeoPoint::new(p.latitude + meters * LAT_PER_M, p.longitude)),
            address: None,
            tags: vec![],
            rating: None,
        }
    }

    #[test]
    fn test_no_position_means_no_arrival() {
        let route = vec![stop_north_of(1, 0.0)];
        assert!(detect_arrival(None, &route).is_none());
    }

    #[test]
    fn test_empty_route_means_no_arrival() {
        assert!(detect_arrival(Some(&here()), &[]).is_none());
    }

    #[test]
    fn test_first_listed_match_wins_over_closer_stop() {
        let route = vec![stop_north_of(1, 40.0), stop_north_of(2, 30.0)];
        let hit = detect_arrival(Some(&here()), &route).unwrap();
        assert_eq!(hit.id, 1);
    }

    #[test]
    fn test_skips_stops_outside_threshold() {
        let route = vec![stop_north_of(1, 200.0), stop_north_of(2, 10.0)];
        let hit = detect_arrival(Some(&here()), &route).unwrap();
        assert_eq!(hit.id, 2);
    }

    #[test]
    fn test_threshold_is_inclusive_boundary_region() {
        let route = vec![stop_north_of(1, 49.5)];
        assert!(detect_arrival(Some(&here()), &route).is_some());
        let route = vec![stop_north_of(1, 51.0)];
        assert!(detect_arrival(Some(&here()), &route).is_none());
    }

    #[test]
    fn test_stop_without_coordinates_is_ignored() {
        let mut unlocated = stop_north_of(1, 0.0);
        unlocated.location = None;
        let route = vec![unlocated, stop_north_of(2, 5.0)];
        let hit = detect_arrival(Some(&here()), &route).unwrap();
        assert_eq!(hit.id, 2);
        assert!(distance_to(&here(), &route[0]).is_none());
    }
}
