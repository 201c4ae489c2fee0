use std::rc::Rc;

use chrono::Utc;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use foodtour_shared::auth::current_session;
use foodtour_shared::favorites::{
    added_label, select_favorites, share_text, FavoriteFilter, FavoriteKind, FavoriteOrder, FavoritesStore,
};
use foodtour_shared::models::StopId;

use crate::browser::{self, alert, confirm, copy_to_clipboard};
use crate::components::flash::{use_flash, FlashText};
use crate::{CurrentUser, Route};

const REMOVE_PROMPT: &str = "Are you sure you want to remove this item from favorites?";
const ALREADY_EMPTY: &str = "Favorites list is already empty!";

fn clear_prompt(count: usize) -> String {
    format!("Are you sure you want to remove all {count} favorite items?")
}

#[component]
pub fn Favorites() -> Element {
    let CurrentUser(user) = use_context::<CurrentUser>();
    let stores = use_hook(browser::stores);
    let favorites = use_hook(|| Rc::new(FavoritesStore::new(stores.local.clone())));

    let mut revision = use_signal(|| 0u32);
    let items = use_memo({
        let favorites = favorites.clone();
        move || {
            revision.read();
            favorites.load(&user.read())
        }
    });

    let mut filter = use_signal(FavoriteFilter::default);
    let mut order = use_signal(FavoriteOrder::default);
    let flash = use_flash();

    let _ = user.read();
    if current_session(&*stores.local).is_none() {
        return rsx! {
            div { class: "panel empty",
                p { "Sign in to keep a list of favorite places." }
                Link { to: Route::Account {}, "Sign in" }
            }
        };
    }

    let all = items.read().clone();
    let total = all.len();
    let shown = select_favorites(&all, *filter.read(), *order.read());
    let now = Utc::now();

    let remove = {
        let favorites = favorites.clone();
        move |id: StopId, kind: FavoriteKind| {
            if !confirm(REMOVE_PROMPT) {
                return;
            }
            let owner = user.peek().clone();
            match favorites.remove(&owner, id, kind) {
                Ok(_) => flash.show("Removed from favorites!"),
                Err(e) => {
                    tracing::warn!(id, error = %e, "removing favorite failed");
                    alert("Unable to update favorites.");
                }
            }
            revision += 1;
        }
    };

    let clear_all = {
        let favorites = favorites.clone();
        move |_: MouseEvent| {
            if total == 0 {
                alert(ALREADY_EMPTY);
                return;
            }
            if !confirm(&clear_prompt(total)) {
                return;
            }
            let owner = user.peek().clone();
            match favorites.clear(&owner) {
                Ok(count) => {
                    tracing::info!(user = %owner, count, "favorites cleared");
                    flash.show("All favorites removed!");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "clearing favorites failed");
                    alert("Unable to update favorites.");
                }
            }
            revision += 1;
        }
    };

    rsx! {
        div { class: "favorites",
            div { class: "panel toolbar",
                h3 { "Favorites ({total})" }
                select {
                    "aria-label": "Filter favorites",
                    onchange: move |evt: Event<FormData>| filter.set(FavoriteFilter::parse(&evt.value())),
                    option { value: "all", "Everything" }
                    option { value: "restaurants", "Restaurants" }
                    option { value: "dishes", "Dishes" }
                }
                select {
                    "aria-label": "Sort favorites",
                    onchange: move |evt: Event<FormData>| order.set(FavoriteOrder::parse(&evt.value())),
                    option { value: "recent", "Recently added" }
                    option { value: "oldest", "Oldest" }
                    option { value: "name", "Name" }
                    option { value: "rating", "Rating" }
                }
                button { class: "danger", onclick: clear_all, "Clear all" }
                FlashText { flash }
            }

            if shown.is_empty() {
                div { class: "panel empty",
                    p { "No favorites yet." }
                    Link { to: Route::Designer {}, "Browse restaurants" }
                }
            }

            for item in shown {
                {
                    let (id, kind) = (item.id, item.kind);
                    let key = format!("{kind:?}-{id}");
                    let added = added_label(item.added_date, now);
                    let rating = item.rating.map(|r| format!("★ {r:.1}"));
                    let share = share_text(&item);
                    let mut remove = remove.clone();
                    rsx! {
                        div { key: "{key}", class: "panel favorite-card",
                            if !item.image.is_empty() {
                                img { src: "{item.image}", alt: "{item.name}" }
                            }
                            h3 { "{item.name}" }
                            p { class: "muted", "{item.description}" }
                            p { class: "muted",
                                if let Some(rating) = &rating { "{rating} · " }
                                if let Some(price) = &item.price { "{price} · " }
                                "Added {added}"
                            }
                            div { class: "actions",
                                button {
                                    class: "secondary",
                                    onclick: move |_| {
                                        copy_to_clipboard(share.clone());
                                        flash.show("Link copied!");
                                    },
                                    "Share"
                                }
                                button { class: "danger", onclick: move |_| remove(id, kind), "Remove" }
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

    #[test]
    fn test_clear_prompt_counts_items() {
        assert_eq!(clear_prompt(3), "Are you sure you want to remove all 3 favorite items?");
    }
}
