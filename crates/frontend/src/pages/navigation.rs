use std::rc::Rc;

use dioxus::logger::tracing;
use dioxus::prelude::*;
use foodtour_shared::client::HttpRouteStore;
use foodtour_shared::geo::{compass_label, format_distance};
use foodtour_shared::models::Position;
use foodtour_shared::navigation::{NavError, NavEvent, NavState, NavView, TourNavigator};
use futures::StreamExt;
use gloo_timers::future::TimeoutFuture;

use crate::browser::{self, alert, PositionWatch};
use crate::components::route_map::RouteMap;
use crate::{api, CurrentUser, Route};

type TourSession = Rc<TourNavigator<HttpRouteStore>>;

/// Messages from the geolocation watch. The browser invokes the watch
/// callbacks outside any dioxus task, so they are queued through a coroutine.
enum Fix {
    Position(Position),
    Failed(&'static str),
}

fn log_nav_error(action: &str, err: NavError) {
    match err {
        NavError::Busy => tracing::debug!(action, "ignored, route update in flight"),
        // Store failures were already surfaced through a notice.
        NavError::Store(_) => {}
        other => tracing::warn!(action, error = %other, "navigation action failed"),
    }
}

#[component]
pub fn Navigation() -> Element {
    let CurrentUser(user) = use_context::<CurrentUser>();
    let router = use_navigator();
    let mut view = use_signal(NavView::default);
    let mut location_error = use_signal(|| None::<&'static str>);

    let nav: TourSession = use_hook(|| {
        let stores = browser::stores();
        let nav = TourNavigator::new(api::route_store(), &stores, user.peek().clone());
        nav.subscribe(move |event, snapshot| {
            view.set(snapshot.clone());
            match event {
                NavEvent::Notice(message) => alert(message),
                NavEvent::Finished {
                    message,
                    redirect_after,
                    ..
                } => {
                    alert(message);
                    let delay = redirect_after.as_millis() as u32;
                    spawn(async move {
                        TimeoutFuture::new(delay).await;
                        router.push(Route::History {});
                    });
                }
                _ => {}
            }
        });
        Rc::new(nav)
    });

    let fixes = use_coroutine({
        let nav = nav.clone();
        move |mut rx: UnboundedReceiver<Fix>| {
            let nav = nav.clone();
            async move {
                while let Some(fix) = rx.next().await {
                    match fix {
                        Fix::Position(p) => {
                            location_error.set(None);
                            if let Err(e) = nav.on_position(p).await {
                                log_nav_error("position", e);
                            }
                        }
                        Fix::Failed(message) => {
                            if location_error.peek().is_none() {
                                alert(message);
                            }
                            location_error.set(Some(message));
                        }
                    }
                }
            }
        }
    });

    let _watch: Rc<Option<PositionWatch>> = use_hook(|| {
        let watch = browser::watch_position(
            move |p| fixes.send(Fix::Position(p)),
            move |message| fixes.send(Fix::Failed(message)),
        );
        match watch {
            Ok(w) => Rc::new(Some(w)),
            Err(e) => {
                tracing::warn!(error = %e, "geolocation unavailable");
                fixes.send(Fix::Failed(browser::location_error_message(0)));
                Rc::new(None)
            }
        }
    });

    let on_arrived = {
        let nav = nav.clone();
        move |_: MouseEvent| {
            let nav = nav.clone();
            spawn(async move {
                if let Err(e) = nav.confirm_current().await {
                    log_nav_error("arrive", e);
                }
            });
        }
    };

    let on_skip = {
        let nav = nav.clone();
        move |_: MouseEvent| {
            let nav = nav.clone();
            spawn(async move {
                if let Err(e) = nav.skip(browser::confirm).await {
                    log_nav_error("skip", e);
                }
            });
        }
    };

    let snapshot = view.read().clone();
    let current = snapshot.current_stop().cloned();
    let heading = snapshot
        .route_line()
        .map(|l| format!("{} {}", format_distance(l.distance_m), compass_label(l.bearing_deg)));
    let remaining = snapshot.route.len();
    let walked = format_distance(snapshot.walked_m);
    let status = match (snapshot.state, *location_error.read()) {
        (NavState::Idle, Some(message)) => message.to_string(),
        (NavState::Idle, None) => "Waiting for your location...".to_string(),
        (NavState::Navigating, _) => format!("{remaining} stops left"),
        (NavState::Finished, _) => "Tour finished.".to_string(),
    };

    rsx! {
        div { class: "navigation",
            div { class: "sidebar",
                div { class: "panel",
                    h3 { "Navigation" }
                    p { class: "muted", "{status}" }

                    if let Some(stop) = &current {
                        div { class: "current-stop",
                            strong { "{stop.name}" }
                            if let Some(address) = &stop.address {
                                div { class: "muted", "{address}" }
                            }
                            if let Some(heading) = &heading {
                                div { class: "heading", "{heading}" }
                            } else {
                                div { class: "muted", "No coordinates for this stop." }
                            }
                        }
                        div { class: "actions",
                            button { disabled: snapshot.busy, onclick: on_arrived, "Arrived" }
                            button { class: "secondary", disabled: snapshot.busy, onclick: on_skip, "Skip" }
                        }
                    }
                }

                div { class: "panel",
                    h3 { "Visited" }
                    p { class: "muted", "Walked {walked}" }
                    if snapshot.visited.is_empty() {
                        p { class: "muted", "Nothing yet." }
                    }
                    ul {
                        for (i, v) in snapshot.visited.iter().enumerate() {
                            li { key: "{i}", "{v.name} · {v.dish}" }
                        }
                    }
                }

                Link { to: Route::Designer {}, class: "back-link", "Back to designer" }
            }

            RouteMap {
                stops: snapshot.route.clone(),
                position: snapshot.position,
                current: current.as_ref().map(|s| s.id),
            }
        }
    }
}
