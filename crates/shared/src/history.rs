use std::rc::Rc;

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::models::{Stop, TourRecord, TourStatus, VisitedStop};
use crate::storage::{read_json, write_json, KeyValueStore, StorageError};

/// Session-storage key of the in-progress tour's visited stops.
pub const SESSION_STOPS_KEY: &str = "current_tour_stops";

/// User name used when nobody is signed in.
pub const DEFAULT_USER: &str = "Traveler";

pub fn history_key(user: &str) -> String {
    format!("tour_history_{user}")
}

/// Visited stops of the running tour, kept in session storage.
#[derive(Clone)]
pub struct SessionVisits {
    store: Rc<dyn KeyValueStore>,
}

impl SessionVisits {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        SessionVisits { store }
    }

    pub fn stops(&self) -> Vec<VisitedStop> {
        read_json(self.store.as_ref(), SESSION_STOPS_KEY).unwrap_or_default()
    }

    /// Append a snapshot of `stop` unless one with the same id is already recorded.
    /// Returns whether an entry was added.
    pub fn record(&self, stop: &Stop) -> Result<bool, StorageError> {
        let mut visited = self.stops();
        if visited.iter().any(|v| v.stop_id == Some(stop.id)) {
            return Ok(false);
        }
        visited.push(VisitedStop::from_stop(stop));
        write_json(self.store.as_ref(), SESSION_STOPS_KEY, &visited)?;
        Ok(true)
    }

    pub fn clear(&self) {
        self.store.remove(SESSION_STOPS_KEY);
    }
}

/// Per-user list of completed tours, newest first.
#[derive(Clone)]
pub struct HistoryStore {
    store: Rc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        HistoryStore { store }
    }

    pub fn load(&self, user: &str) -> Vec<TourRecord> {
        read_json(self.store.as_ref(), &history_key(user)).unwrap_or_default()
    }

    pub fn prepend(&self, user: &str, record: TourRecord) -> Result<(), StorageError> {
        let mut history = self.load(user);
        history.insert(0, record);
        write_json(self.store.as_ref(), &history_key(user), &history)
    }

    /// Remove the record with `id`. Returns whether anything was removed.
    pub fn delete(&self, user: &str, id: i64) -> Result<bool, StorageError> {
        let mut history = self.load(user);
        let before = history.len();
        history.retain(|t| t.id != id);
        if history.len() == before {
            return Ok(false);
        }
        write_json(self.store.as_ref(), &history_key(user), &history)?;
        Ok(true)
    }
}

/// Measurements of a finished navigation session.
#[derive(Debug, Clone, Copy)]
pub struct TourSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub walked_m: f64,
    /// Traveller's UTC offset; the record is named after the local day.
    pub offset: FixedOffset,
}

/// Turn the session's visited stops into a history record.
///
/// Nothing is written when no stop was visited. Otherwise the record is
/// prepended to the user's history and the session accumulator is cleared.
pub fn finalize_tour(
    visits: &SessionVisits,
    history: &HistoryStore,
    user: &str,
    summary: TourSummary,
) -> Result<Option<TourRecord>, StorageError> {
    let stops = visits.stops();
    if stops.is_empty() {
        tracing::info!(user, "tour finished without visited stops, nothing recorded");
        return Ok(None);
    }

    let km = (summary.walked_m / 100.0).round() / 10.0;
    let record = TourRecord {
        id: summary.finished_at.timestamp_millis(),
        name: format!(
            "Food Tour {}",
            summary.finished_at.with_timezone(&summary.offset).format("%-d/%-m/%Y")
        ),
        date: summary.finished_at,
        status: TourStatus::Completed,
        stops,
        duration: format_duration(summary.finished_at - summary.started_at),
        distance: (km > 0.0).then_some(km),
    };

    history.prepend(user, record.clone())?;
    visits.clear();
    tracing::info!(user, id = record.id, stops = record.stops.len(), "tour recorded");
    Ok(Some(record))
}

/// "1h 05m" for an hour or more, otherwise "12m".
pub fn format_duration(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes().max(0);
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TourStatus),
}

impl StatusFilter {
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => StatusFilter::Only(TourStatus::Completed),
            "in-progress" => StatusFilter::Only(TourStatus::InProgress),
            "cancelled" => StatusFilter::Only(TourStatus::Cancelled),
            _ => StatusFilter::All,
        }
    }

    pub fn matches(&self, record: &TourRecord) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => record.status == *status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Recent,
    Oldest,
    Restaurants,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        match s {
            "oldest" => SortOrder::Oldest,
            "restaurants" => SortOrder::Restaurants,
            _ => SortOrder::Recent,
        }
    }
}

/// Filter and sort a history list for display.
pub fn select_tours(tours: &[TourRecord], filter: StatusFilter, order: SortOrder) -> Vec<TourRecord> {
    let mut selected: Vec<TourRecord> = tours.iter().filter(|t| filter.matches(t)).cloned().collect();
    match order {
        SortOrder::Recent => selected.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::Oldest => selected.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Restaurants => selected.sort_by(|a, b| b.stops.len().cmp(&a.stops.len())),
    }
    selected
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryStats {
    pub tours: usize,
    pub restaurants: usize,
    /// One dish is counted per visited stop.
    pub dishes: usize,
    pub distance_km: f64,
}

impl HistoryStats {
    pub fn from_tours(tours: &[TourRecord]) -> Self {
        tours.iter().fold(
            HistoryStats {
                tours: tours.len(),
                ..Default::default()
            },
            |mut acc, t| {
                acc.restaurants += t.stops.len();
                acc.dishes += t.stops.len();
                acc.distance_km += t.distance_km();
                acc
            },
        )
    }
}

/// Plain-text summary for sharing a tour.
pub fn share_text(record: &TourRecord) -> String {
    format!(
        "Tour: {}\n{} stops\n{}\n\nExplore more food tours with us!",
        record.name,
        record.stops.len(),
        record.duration
    )
}
