use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type StopId = i64;

/// Fallback label for a visited stop whose restaurant carries no tags.
pub const DEFAULT_DISH: &str = "Specialty";

/// Estimated walking distance per stop when a tour has no recorded distance.
pub const ESTIMATED_KM_PER_STOP: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }
}

/// A single fix reported by the geolocation source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
}

impl Position {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A restaurant waypoint as seen by the navigation client.
///
/// Deserializes straight from the catalog's restaurant JSON; fields the client
/// does not use are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Full catalog entry served by the route store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: StopId,
    pub name: String,
    pub rating: f64,
    pub average_price: f64,
    #[serde(default)]
    pub cuisines: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub open_hours: String,
    #[serde(default)]
    pub special_flags: Vec<String>,
    pub location: GeoPoint,
    #[serde(rename = "image_url", default)]
    pub image_url: String,
    #[serde(rename = "distance_text", default)]
    pub distance_text: String,
    #[serde(rename = "price_text", default)]
    pub price_text: String,
    #[serde(default)]
    pub address: String,
}

impl From<&Restaurant> for Stop {
    fn from(r: &Restaurant) -> Self {
        Stop {
            id: r.id,
            name: r.name.clone(),
            location: Some(r.location),
            address: (!r.address.is_empty()).then(|| r.address.clone()),
            tags: r.tags.clone(),
            rating: Some(r.rating),
        }
    }
}

/// Reduced snapshot of a stop, taken when arrival is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitedStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<StopId>,
    pub name: String,
    pub dish: String,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl VisitedStop {
    pub fn from_stop(stop: &Stop) -> Self {
        VisitedStop {
            stop_id: Some(stop.id),
            name: stop.name.clone(),
            dish: stop
                .tags
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_DISH.to_string()),
            rating: stop.rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TourStatus {
    Completed,
    InProgress,
    Cancelled,
}

impl TourStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TourStatus::Completed => "Completed",
            TourStatus::InProgress => "In Progress",
            TourStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for TourStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourRecord {
    pub id: i64,
    pub name: String,
    pub date: DateTime<Utc>,
    pub status: TourStatus,
    pub stops: Vec<VisitedStop>,
    pub duration: String,
    /// Walked distance in kilometres, when one was measured.
    #[serde(default, deserialize_with = "lenient_km")]
    pub distance: Option<f64>,
}

impl TourRecord {
    /// Distance used for statistics and reports: the measured value when
    /// positive, otherwise a per-stop estimate.
    pub fn distance_km(&self) -> f64 {
        match self.distance {
            Some(d) if d > 0.0 => d,
            _ => self.stops.len() as f64 * ESTIMATED_KM_PER_STOP,
        }
    }
}

// Route store wire types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse<T = Stop> {
    pub count: usize,
    pub route: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStopRequest {
    pub restaurant_id: Option<StopId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMutationStatus {
    Added,
    AlreadyExists,
    Removed,
    NotFound,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMutation {
    pub status: RouteMutationStatus,
    pub route: Vec<StopId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InRouteResponse {
    pub restaurant_id: StopId,
    pub in_route: bool,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

/// Older records stored the distance as a string ("5.2", "Unknown").
fn lenient_km<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
