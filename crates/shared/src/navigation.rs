//! Turn-by-turn progress through the active route.
//!
//! [`TourNavigator`] owns one navigation session: it consumes position fixes,
//! detects arrival, applies arrive/skip mutations to the [`RouteStore`] and
//! re-fetches the route after each of them. When the store reports an empty
//! route the visited stops are turned into a history record.
//!
//! Everything runs on one thread. Interior state lives in `RefCell`s whose
//! borrows are never held across an `.await`.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use thiserror::Error;

use crate::arrival::detect_arrival;
use crate::geo::{haversine_distance, initial_bearing};
use crate::history::{finalize_tour, HistoryStore, SessionVisits, TourSummary};
use crate::models::{GeoPoint, Position, Stop, StopId, TourRecord, VisitedStop};
use crate::route_store::{RouteStore, RouteStoreError};
use crate::storage::{StorageError, Stores};

/// Pause between the completion message and leaving the navigation view.
pub const FINISH_REDIRECT_DELAY: Duration = Duration::from_millis(500);

pub const FINISH_MESSAGE: &str = "Tour completed! Thank you for participating.";

pub fn skip_prompt(stop: &Stop) -> String {
    format!("Skip \"{}\"? It won't be saved to your history.", stop.name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// Waiting for the first position fix.
    #[default]
    Idle,
    Navigating,
    Finished,
}

/// Straight segment drawn from the traveller to the current stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLine {
    pub from: GeoPoint,
    pub to: GeoPoint,
    pub distance_m: f64,
    pub bearing_deg: f64,
}

/// Snapshot handed to subscribers after every event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NavView {
    pub state: NavState,
    pub position: Option<Position>,
    pub route: Vec<Stop>,
    pub visited: Vec<VisitedStop>,
    pub walked_m: f64,
    pub busy: bool,
}

impl NavView {
    /// Head of the remaining route while navigating.
    pub fn current_stop(&self) -> Option<&Stop> {
        match self.state {
            NavState::Navigating => self.route.first(),
            _ => None,
        }
    }

    /// `None` when there is no fix or the current stop has no coordinates.
    pub fn route_line(&self) -> Option<RouteLine> {
        let from = self.position?.point();
        let to = self.current_stop()?.location?;
        Some(RouteLine {
            from,
            to,
            distance_m: haversine_distance(from, to),
            bearing_deg: initial_bearing(from, to),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Positioned(Position),
    RouteSynced { remaining: usize },
    Arrived { stop: Stop, automatic: bool },
    Skipped { stop: Stop },
    Finished {
        record: Option<TourRecord>,
        message: String,
        redirect_after: Duration,
    },
    /// Blocking notification for the user.
    Notice(String),
}

#[derive(Debug, Error)]
pub enum NavError {
    #[error("no tour is being navigated")]
    NotNavigating,
    #[error("a route update is already in progress")]
    Busy,
    #[error("stop {0} is not on the route")]
    NotOnRoute(StopId),
    #[error(transparent)]
    Store(#[from] RouteStoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Default)]
struct Session {
    state: NavState,
    position: Option<Position>,
    route: Vec<Stop>,
    started_at: Option<DateTime<Utc>>,
    walked_m: f64,
}

struct BusyGuard<'a>(&'a Cell<bool>);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self, NavError> {
        if flag.replace(true) {
            return Err(NavError::Busy);
        }
        Ok(BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

type Observer = Box<dyn FnMut(&NavEvent, &NavView)>;

pub struct TourNavigator<R: RouteStore> {
    store: R,
    visits: SessionVisits,
    history: HistoryStore,
    user: String,
    session: RefCell<Session>,
    busy: Cell<bool>,
    observers: RefCell<Vec<Observer>>,
}

impl<R: RouteStore> TourNavigator<R> {
    pub fn new(store: R, stores: &Stores, user: impl Into<String>) -> Self {
        TourNavigator {
            store,
            visits: SessionVisits::new(stores.session.clone()),
            history: HistoryStore::new(stores.local.clone()),
            user: user.into(),
            session: RefCell::new(Session::default()),
            busy: Cell::new(false),
            observers: RefCell::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Register a callback run after every event. Callbacks may read
    /// [`view`](Self::view) but must not subscribe further observers.
    pub fn subscribe(&self, observer: impl FnMut(&NavEvent, &NavView) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    pub fn view(&self) -> NavView {
        let session = self.session.borrow();
        NavView {
            state: session.state,
            position: session.position,
            route: session.route.clone(),
            visited: self.visits.stops(),
            walked_m: session.walked_m,
            busy: self.busy.get(),
        }
    }

    pub fn state(&self) -> NavState {
        self.session.borrow().state
    }

    fn emit(&self, event: NavEvent) {
        let view = self.view();
        for observer in self.observers.borrow_mut().iter_mut() {
            observer(&event, &view);
        }
    }

    fn notice(&self, message: impl Into<String>) {
        self.emit(NavEvent::Notice(message.into()));
    }

    /// Feed a position fix from the geolocation watcher.
    ///
    /// The first fix starts the session and fetches the route. Later fixes
    /// run arrival detection unless a route update is still in flight.
    pub async fn on_position(&self, position: Position) -> Result<(), NavError> {
        let state = {
            let mut session = self.session.borrow_mut();
            if session.state == NavState::Finished {
                return Ok(());
            }
            if let Some(prev) = session.position {
                session.walked_m += haversine_distance(prev.point(), position.point());
            }
            session.position = Some(position);
            session.state
        };
        self.emit(NavEvent::Positioned(position));

        if self.busy.get() {
            tracing::debug!("route update in flight, skipping arrival detection");
            return Ok(());
        }

        if state == NavState::Idle {
            let _guard = BusyGuard::acquire(&self.busy)?;
            self.session.borrow_mut().started_at.get_or_insert_with(Utc::now);
            tracing::info!(user = %self.user, "first position fix, loading route");
            self.sync_logged().await;
        }

        let arrived = {
            let session = self.session.borrow();
            if session.state != NavState::Navigating {
                return Ok(());
            }
            detect_arrival(session.position.as_ref(), &session.route).cloned()
        };
        match arrived {
            Some(stop) => self.arrive(stop, true).await,
            None => Ok(()),
        }
    }

    /// Manual "Arrived" for the current stop.
    pub async fn confirm_current(&self) -> Result<(), NavError> {
        let stop = self.current_stop()?;
        self.arrive(stop, false).await
    }

    /// Manual "Arrived" for any stop still on the route.
    pub async fn confirm_arrival(&self, id: StopId) -> Result<(), NavError> {
        let stop = {
            let session = self.session.borrow();
            if session.state != NavState::Navigating {
                return Err(NavError::NotNavigating);
            }
            session
                .route
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(NavError::NotOnRoute(id))?
        };
        self.arrive(stop, false).await
    }

    /// Drop the current stop without recording it. `confirm` receives the
    /// prompt text and decides; returns the skipped stop, or `None` when
    /// the user declined.
    pub async fn skip(&self, confirm: impl FnOnce(&str) -> bool) -> Result<Option<Stop>, NavError> {
        let stop = self.current_stop()?;
        if self.busy.get() {
            return Err(NavError::Busy);
        }
        if !confirm(&skip_prompt(&stop)) {
            return Ok(None);
        }

        let _guard = BusyGuard::acquire(&self.busy)?;
        if let Err(e) = self.store.remove_stop(stop.id).await {
            tracing::warn!(stop = stop.id, error = %e, "failed to skip stop");
            self.notice(e.user_message());
            return Err(e.into());
        }
        tracing::info!(stop = stop.id, name = %stop.name, "stop skipped");
        self.emit(NavEvent::Skipped { stop: stop.clone() });
        self.sync_logged().await;
        Ok(Some(stop))
    }

    /// Re-fetch the route from the store and apply it.
    ///
    /// On failure the last known route and state are kept.
    pub async fn resync(&self) -> Result<NavState, NavError> {
        if self.state() == NavState::Finished {
            return Ok(NavState::Finished);
        }
        let route = self.store.fetch_route().await?;
        let remaining = route.len();

        let state = {
            let mut session = self.session.borrow_mut();
            session.route = route;
            session.state = if remaining == 0 {
                NavState::Finished
            } else {
                NavState::Navigating
            };
            session.state
        };
        tracing::info!(remaining, ?state, "route synced");
        self.emit(NavEvent::RouteSynced { remaining });

        if state == NavState::Finished {
            self.finish();
        }
        Ok(state)
    }

    fn current_stop(&self) -> Result<Stop, NavError> {
        let session = self.session.borrow();
        match session.state {
            NavState::Navigating => session.route.first().cloned().ok_or(NavError::NotNavigating),
            _ => Err(NavError::NotNavigating),
        }
    }

    async fn arrive(&self, stop: Stop, automatic: bool) -> Result<(), NavError> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        if let Err(e) = self.store.remove_stop(stop.id).await {
            tracing::warn!(stop = stop.id, error = %e, "failed to mark stop as visited");
            self.notice(e.user_message());
            return Err(e.into());
        }

        match self.visits.record(&stop) {
            Ok(true) => tracing::info!(stop = stop.id, name = %stop.name, automatic, "arrived"),
            Ok(false) => tracing::debug!(stop = stop.id, "stop already recorded this session"),
            Err(e) => {
                tracing::warn!(stop = stop.id, error = %e, "failed to record visited stop");
                self.notice("Could not save this stop to your tour.");
            }
        }
        self.emit(NavEvent::Arrived { stop, automatic });
        self.sync_logged().await;
        Ok(())
    }

    async fn sync_logged(&self) {
        if let Err(e) = self.resync().await {
            tracing::warn!(error = %e, "route re-fetch failed, keeping last known route");
        }
    }

    fn finish(&self) {
        let (started_at, walked_m) = {
            let session = self.session.borrow();
            (session.started_at, session.walked_m)
        };
        let finished_at = Utc::now();
        let summary = TourSummary {
            started_at: started_at.unwrap_or(finished_at),
            finished_at,
            walked_m,
            offset: *finished_at.with_timezone(&Local).offset(),
        };

        let record = match finalize_tour(&self.visits, &self.history, &self.user, summary) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save finished tour");
                None
            }
        };
        self.emit(NavEvent::Finished {
            record,
            message: FINISH_MESSAGE.to_string(),
            redirect_after: FINISH_REDIRECT_DELAY,
        });
    }
}
