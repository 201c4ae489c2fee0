use std::rc::Rc;

use chrono::Local;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use foodtour_shared::history::{select_tours, share_text, HistoryStats, HistoryStore, SortOrder, StatusFilter};
use foodtour_shared::models::{StopId, TourRecord};
use foodtour_shared::report::{export_csv, report_file_name, ReportError};
use foodtour_shared::route_store::{RouteStore, RouteStoreError};

use crate::browser::{self, alert, confirm, copy_to_clipboard, download_text};
use crate::components::flash::{use_flash, FlashText};
use crate::{api, CurrentUser, Route};

const DELETE_PROMPT: &str = "Are you sure you want to delete this history record?";
const CSV_MIME: &str = "text/csv;charset=utf-8;";

fn repeat_prompt(tour: &TourRecord) -> String {
    format!(
        "Do you want to repeat tour \"{}\"?\n\nThis tour will be recreated with the same stops.",
        tour.name
    )
}

/// Replace the active route with the stops of a past tour, in visiting
/// order. Visits recorded without a stop id cannot be replayed and are left
/// out.
async fn replay_route(store: &impl RouteStore, stops: &[StopId]) -> Result<usize, RouteStoreError> {
    store.clear().await?;
    for id in stops {
        store.add_stop(*id).await?;
    }
    Ok(stops.len())
}

fn export_report(tours: &[TourRecord]) {
    let now = Local::now();
    let today = now.date_naive();
    match export_csv(tours, today, *now.offset()) {
        Ok(csv) => {
            if let Err(e) = download_text(&report_file_name(today), &csv, CSV_MIME) {
                tracing::warn!(error = %browser::js_error_text(&e), "report download failed");
                alert("Unable to download the report.");
            }
        }
        Err(ReportError::Empty) => alert("No data to export!"),
        Err(e) => {
            tracing::warn!(error = %e, "report export failed");
            alert("Unable to build the report.");
        }
    }
}

#[component]
pub fn History() -> Element {
    let CurrentUser(user) = use_context::<CurrentUser>();
    let router = use_navigator();
    let history = use_hook(|| Rc::new(HistoryStore::new(browser::stores().local)));

    let mut revision = use_signal(|| 0u32);
    let tours = use_memo({
        let history = history.clone();
        move || {
            revision.read();
            history.load(&user.read())
        }
    });

    let mut filter = use_signal(StatusFilter::default);
    let mut order = use_signal(SortOrder::default);
    let flash = use_flash();

    let all = tours.read().clone();
    let stats = HistoryStats::from_tours(&all);
    let shown = select_tours(&all, *filter.read(), *order.read());
    let distance = format!("{:.1} km", stats.distance_km);

    let delete = {
        let history = history.clone();
        move |id: i64| {
            if !confirm(DELETE_PROMPT) {
                return;
            }
            let owner = user.peek().clone();
            match history.delete(&owner, id) {
                Ok(true) => tracing::info!(user = %owner, id, "history record deleted"),
                Ok(false) => tracing::debug!(id, "history record already gone"),
                Err(e) => {
                    tracing::warn!(id, error = %e, "deleting history record failed");
                    alert("Unable to delete this record.");
                }
            }
            revision += 1;
        }
    };

    let repeat = move |tour: TourRecord| {
        if !confirm(&repeat_prompt(&tour)) {
            return;
        }
        let ids: Vec<StopId> = tour.stops.iter().filter_map(|s| s.stop_id).collect();
        spawn(async move {
            match replay_route(&api::route_store(), &ids).await {
                Ok(count) => {
                    tracing::info!(tour = tour.id, count, "tour recreated");
                    router.push(Route::Designer {});
                }
                Err(e) => {
                    tracing::warn!(tour = tour.id, error = %e, "recreating tour failed");
                    alert(e.user_message());
                }
            }
        });
    };

    rsx! {
        div { class: "history",
            div { class: "stats",
                div { class: "stat", strong { "{stats.tours}" } span { "Tours" } }
                div { class: "stat", strong { "{stats.restaurants}" } span { "Restaurants" } }
                div { class: "stat", strong { "{stats.dishes}" } span { "Dishes tried" } }
                div { class: "stat", strong { "{distance}" } span { "Distance" } }
            }

            div { class: "panel toolbar",
                select {
                    "aria-label": "Filter by status",
                    onchange: move |evt: Event<FormData>| filter.set(StatusFilter::parse(&evt.value())),
                    option { value: "all", "All tours" }
                    option { value: "completed", "Completed" }
                    option { value: "in-progress", "In Progress" }
                    option { value: "cancelled", "Cancelled" }
                }
                select {
                    "aria-label": "Sort tours",
                    onchange: move |evt: Event<FormData>| order.set(SortOrder::parse(&evt.value())),
                    option { value: "recent", "Most recent" }
                    option { value: "oldest", "Oldest" }
                    option { value: "restaurants", "Most restaurants" }
                }
                button { class: "secondary", onclick: move |_| export_report(&tours.read()), "Export CSV" }
                FlashText { flash }
            }

            if shown.is_empty() {
                div { class: "panel empty",
                    p { "No tours yet." }
                    Link { to: Route::Designer {}, "Plan your first tour" }
                }
            }

            for tour in shown {
                {
                    let id = tour.id;
                    let date = tour.date.with_timezone(&Local).format("%-d/%-m/%Y %H:%M").to_string();
                    let stop_count = tour.stops.len();
                    let km = format!("{:.1} km", tour.distance_km());
                    let names = tour.stops.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(" → ");
                    let share = share_text(&tour);
                    let status_class = format!("status {}", tour.status.label().to_lowercase().replace(' ', "-"));
                    let mut delete = delete.clone();
                    let replay = tour.clone();
                    rsx! {
                        div { key: "{id}", class: "panel tour-card",
                            div { class: "tour-head",
                                h3 { "{tour.name}" }
                                span { class: "{status_class}", "{tour.status}" }
                            }
                            p { class: "muted", "{date} · {stop_count} stops · {tour.duration} · {km}" }
                            p { class: "tour-stops", "{names}" }
                            div { class: "actions",
                                button { onclick: move |_| repeat(replay.clone()), "Repeat" }
                                button {
                                    class: "secondary",
                                    onclick: move |_| {
                                        copy_to_clipboard(share.clone());
                                        flash.show("Tour information copied!");
                                    },
                                    "Share"
                                }
                                button { class: "danger", onclick: move |_| delete(id), "Delete" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use foodtour_shared::models::{RouteMutation, RouteMutationStatus, Stop, TourStatus, VisitedStop};

    #[derive(Default)]
    struct RecordingStore {
        calls: RefCell<Vec<String>>,
        fail_add: Option<StopId>,
    }

    impl RecordingStore {
        fn mutation(status: RouteMutationStatus) -> RouteMutation {
            RouteMutation { status, route: vec![] }
        }
    }

    impl RouteStore for RecordingStore {
        async fn fetch_route(&self) -> Result<Vec<Stop>, RouteStoreError> {
            Ok(vec![])
        }

        async fn add_stop(&self, id: StopId) -> Result<RouteMutation, RouteStoreError> {
            if self.fail_add == Some(id) {
                return Err(RouteStoreError::Timeout);
            }
            self.calls.borrow_mut().push(format!("add {id}"));
            Ok(Self::mutation(RouteMutationStatus::Added))
        }

        async fn remove_stop(&self, _id: StopId) -> Result<RouteMutation, RouteStoreError> {
            unreachable!("replay never removes")
        }

        async fn clear(&self) -> Result<RouteMutation, RouteStoreError> {
            self.calls.borrow_mut().push("clear".into());
            Ok(Self::mutation(RouteMutationStatus::Cleared))
        }

        async fn contains(&self, _id: StopId) -> Result<bool, RouteStoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_replay_clears_then_adds_in_order() {
        let store = RecordingStore::default();
        let count = replay_route(&store, &[3, 1]).await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(*store.calls.borrow(), vec!["clear", "add 3", "add 1"]);
    }

    #[tokio::test]
    async fn test_replay_stops_at_first_failure() {
        let store = RecordingStore {
            fail_add: Some(1),
            ..Default::default()
        };
        let err = replay_route(&store, &[3, 1, 2]).await.unwrap_err();
        assert!(matches!(err, RouteStoreError::Timeout));
        assert_eq!(*store.calls.borrow(), vec!["clear", "add 3"]);
    }

    #[test]
    fn test_repeat_prompt_names_the_tour() {
        let tour = TourRecord {
            id: 1,
            name: "Food Tour 2/3/2025".into(),
            date: chrono::Utc::now(),
            status: TourStatus::Completed,
            stops: vec![VisitedStop {
                stop_id: Some(1),
                name: "Phở Hòa".into(),
                dish: "Specialty".into(),
                rating: None,
            }],
            duration: "12m".into(),
            distance: None,
        };
        assert!(repeat_prompt(&tour).starts_with("Do you want to repeat tour \"Food Tour 2/3/2025\"?"));
    }
}
