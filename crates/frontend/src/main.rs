mod api;
mod browser;
mod components;
mod coords;
mod pages;

use dioxus::prelude::*;
use foodtour_shared::auth::current_username;

use components::nav_bar::NavBar;
use pages::{
    account::Account, designer::Designer, favorites::Favorites, history::History, navigation::Navigation,
};

#[derive(Routable, Clone, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Shell)]
        #[route("/")]
        Designer {},
        #[route("/navigate")]
        Navigation {},
        #[route("/history")]
        History {},
        #[route("/favorites")]
        Favorites {},
        #[route("/account")]
        Account {},
}

/// Name shown in the header and used to key history and favorites. Updated
/// on sign in, sign out and rename.
#[derive(Clone, Copy)]
pub struct CurrentUser(pub Signal<String>);

#[component]
fn Shell() -> Element {
    use_context_provider(|| {
        let stores = browser::stores();
        CurrentUser(Signal::new(current_username(&*stores.local)))
    });

    rsx! {
        div { class: "app",
            NavBar {}
            main { class: "content", Outlet::<Route> {} }
        }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: CSS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
