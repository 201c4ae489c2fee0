use std::rc::Rc;

use chrono::Utc;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use foodtour_shared::auth::current_session;
use foodtour_shared::favorites::{Favorite, FavoriteKind, FavoritesStore};
use foodtour_shared::models::{Restaurant, RouteMutation, Stop, StopId};
use foodtour_shared::route_store::{RouteStore, RouteStoreError};
use foodtour_shared::search::{search_catalog, SearchBy, TourSearchQuery};

use crate::browser::{self, alert, confirm};
use crate::components::flash::{use_flash, FlashText};
use crate::components::route_map::RouteMap;
use crate::{api, CurrentUser, Route};

const CATALOG_ERROR: &str = "Unable to load restaurant data. Please check the server.";
const EMPTY_ROUTE: &str = "Please add at least one restaurant to the route!";
const CLEAR_PROMPT: &str = "Are you sure you want to remove all restaurants from the route?";
const CLEAR_FAILED: &str = "Error clearing route!";
const SIGN_IN_FOR_FAVORITES: &str = "Please sign in to add favorites";

fn favorite_notice(saved: bool) -> &'static str {
    if saved {
        "Added to favorites!"
    } else {
        "Removed from favorites!"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Edit {
    Add(StopId),
    Remove(StopId),
    Clear,
}

async fn apply_edit(store: &impl RouteStore, edit: Edit) -> Result<RouteMutation, RouteStoreError> {
    match edit {
        Edit::Add(id) => store.add_stop(id).await,
        Edit::Remove(id) => store.remove_stop(id).await,
        Edit::Clear => store.clear().await,
    }
}

fn failure_message(edit: Edit, err: &RouteStoreError) -> &'static str {
    let network = matches!(err, RouteStoreError::Timeout | RouteStoreError::Connect(_));
    match edit {
        Edit::Clear if !network => CLEAR_FAILED,
        _ => err.user_message(),
    }
}

fn parse_search_by(s: &str) -> SearchBy {
    match s {
        "name" => SearchBy::Name,
        "tags" => SearchBy::Tags,
        _ => SearchBy::All,
    }
}

#[component]
pub fn Designer() -> Element {
    let catalog = use_resource(|| async move { api::route_store().restaurants().await });
    let mut route = use_resource(|| async move { api::route_store().fetch_route().await });

    let mut query_text = use_signal(String::new);
    let mut search_by = use_signal(SearchBy::default);
    let mut pending = use_signal(|| false);
    let navigator = use_navigator();
    let CurrentUser(user) = use_context::<CurrentUser>();
    let stores = use_hook(browser::stores);
    let favorites = use_hook(|| Rc::new(FavoritesStore::new(stores.local.clone())));
    let mut favorites_changed = use_signal(|| 0u32);
    let flash = use_flash();

    let restaurants: Vec<Restaurant> = match &*catalog.read() {
        Some(Ok(list)) => list.clone(),
        _ => vec![],
    };
    let catalog_failed = matches!(&*catalog.read(), Some(Err(_)));

    let stops: Vec<Stop> = match &*route.read() {
        Some(Ok(stops)) => stops.clone(),
        _ => vec![],
    };
    let on_route: Vec<StopId> = stops.iter().map(|s| s.id).collect();
    let route_len = stops.len();

    let query = TourSearchQuery {
        query_text: query_text.read().clone(),
        search_by: *search_by.read(),
    };
    let hits = search_catalog(&restaurants, &query);

    let mut apply = move |edit: Edit| {
        if *pending.read() {
            return;
        }
        if edit == Edit::Clear && !confirm(CLEAR_PROMPT) {
            return;
        }
        pending.set(true);
        spawn(async move {
            match apply_edit(&api::route_store(), edit).await {
                Ok(m) => tracing::info!(?edit, status = ?m.status, "route updated"),
                Err(e) => {
                    tracing::warn!(?edit, error = %e, "route update failed");
                    alert(failure_message(edit, &e));
                }
            }
            pending.set(false);
            route.restart();
        });
    };

    let toggle_favorite = {
        let local = stores.local.clone();
        let favorites = favorites.clone();
        move |r: Restaurant| {
            if current_session(&*local).is_none() {
                alert(SIGN_IN_FOR_FAVORITES);
                return;
            }
            let owner = user.peek().clone();
            match favorites.toggle(&owner, Favorite::from_restaurant(&r, Utc::now())) {
                Ok(saved) => flash.show(favorite_notice(saved)),
                Err(e) => {
                    tracing::warn!(id = r.id, error = %e, "updating favorites failed");
                    alert("Unable to update favorites.");
                }
            }
            favorites_changed += 1;
        }
    };

    // Re-read when a heart is toggled or the user changes.
    let _ = favorites_changed.read();
    let saved: Vec<StopId> = favorites
        .load(&user.read())
        .iter()
        .filter(|f| f.kind == FavoriteKind::Restaurant)
        .map(|f| f.id)
        .collect();

    let start_tour = {
        let empty = stops.is_empty();
        move |_: MouseEvent| {
            if empty {
                alert(EMPTY_ROUTE);
                return;
            }
            navigator.push(Route::Navigation {});
        }
    };

    rsx! {
        div { class: "designer",
            div { class: "sidebar",
                div { class: "panel",
                    h3 { "Find restaurants" }
                    input {
                        r#type: "search",
                        placeholder: "Name or tag...",
                        value: "{query_text}",
                        oninput: move |evt: Event<FormData>| query_text.set(evt.value()),
                    }
                    select {
                        "aria-label": "Search by",
                        onchange: move |evt: Event<FormData>| search_by.set(parse_search_by(&evt.value())),
                        option { value: "all", selected: *search_by.read() == SearchBy::All, "Everything" }
                        option { value: "name", selected: *search_by.read() == SearchBy::Name, "Name" }
                        option { value: "tags", selected: *search_by.read() == SearchBy::Tags, "Tags" }
                    }
                }

                div { class: "panel catalog",
                    FlashText { flash }
                    if catalog_failed {
                        p { class: "error", "{CATALOG_ERROR}" }
                    } else if hits.is_empty() {
                        p { class: "muted", "No restaurants match." }
                    }
                    for hit in hits {
                        {
                            let r = hit.restaurant;
                            let id = r.id;
                            let added = on_route.contains(&id);
                            let summary = format!("★ {:.1} · {}", r.rating, r.price_text);
                            let tags = r.tags.join(", ");
                            let favorite = saved.contains(&id);
                            let mut toggle_favorite = toggle_favorite.clone();
                            let target = r.clone();
                            rsx! {
                                div { key: "{id}", class: if added { "restaurant on-route" } else { "restaurant" },
                                    div { class: "restaurant-info",
                                        strong { "{r.name}" }
                                        span { class: "muted", " {summary}" }
                                        if !r.address.is_empty() {
                                            div { class: "muted", "{r.address}" }
                                        }
                                        if !tags.is_empty() {
                                            div { class: "tags", "{tags}" }
                                        }
                                    }
                                    button {
                                        class: if favorite { "heart saved" } else { "heart" },
                                        title: if favorite { "Remove from favorites" } else { "Add to favorites" },
                                        onclick: move |_| toggle_favorite(target.clone()),
                                        if favorite { "♥" } else { "♡" }
                                    }
                                    if added {
                                        button {
                                            class: "secondary",
                                            disabled: *pending.read(),
                                            onclick: move |_| apply(Edit::Remove(id)),
                                            "Remove"
                                        }
                                    } else {
                                        button {
                                            disabled: *pending.read(),
                                            onclick: move |_| apply(Edit::Add(id)),
                                            "Add"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div { class: "main-column",
                div { class: "panel route-panel",
                    h3 { "Your route ({route_len})" }
                    ol {
                        for stop in stops.iter() {
                            li { key: "{stop.id}", "{stop.name}" }
                        }
                    }
                    div { class: "actions",
                        button { onclick: start_tour, "Start tour" }
                        button {
                            class: "secondary",
                            disabled: stops.is_empty() || *pending.read(),
                            onclick: move |_| apply(Edit::Clear),
                            "Clear route"
                        }
                    }
                }
                RouteMap { stops: stops.clone(), position: None, current: None }
            }
        }
    }
}
