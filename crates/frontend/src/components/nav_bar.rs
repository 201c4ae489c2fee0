use dioxus::prelude::*;

use crate::{CurrentUser, Route};

#[component]
pub fn NavBar() -> Element {
    let CurrentUser(user) = use_context::<CurrentUser>();

    rsx! {
        header { class: "header",
            h1 { "Food Tour" }
            nav { class: "nav-links",
                Link { to: Route::Designer {}, active_class: "active", "Design" }
                Link { to: Route::Navigation {}, active_class: "active", "Navigate" }
                Link { to: Route::History {}, active_class: "active", "History" }
                Link { to: Route::Favorites {}, active_class: "active", "Favorites" }
                Link { to: Route::Account {}, active_class: "active", "Account" }
            }
            span { class: "current-user", "{user}" }
        }
    }
}
