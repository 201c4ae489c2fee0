use chrono::{Local, Utc};
use dioxus::logger::tracing;
use dioxus::prelude::*;
use foodtour_shared::auth::{
    current_session, sign_in, sign_out, sign_up, update_profile, AuthError, ProfileUpdate,
};
use foodtour_shared::history::DEFAULT_USER;

use crate::browser::{self, alert, confirm};
use crate::{CurrentUser, Route};

const SIGN_UP_DONE: &str = "Sign up successful! 🎉\n\nRedirecting to sign in page...";
const SIGN_OUT_PROMPT: &str = "Are you sure you want to sign out?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    SignIn,
    SignUp,
}

fn report(action: &str, err: &AuthError) {
    match err {
        AuthError::Storage(e) => tracing::warn!(action, error = %e, "account storage failed"),
        other => tracing::debug!(action, reason = %other, "rejected"),
    }
    alert(&err.to_string());
}

#[component]
pub fn Account() -> Element {
    let CurrentUser(mut user) = use_context::<CurrentUser>();
    let router = use_navigator();
    let stores = use_hook(browser::stores);

    let mut mode = use_signal(|| Mode::SignIn);
    let mut username = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut editing = use_signal(|| None::<ProfileUpdate>);

    // Re-read on every render so sign in and sign out show immediately.
    let _ = user.read();
    let session = current_session(&*stores.local);

    let submit = {
        let local = stores.local.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let (name, mail, pass) = (username.read().clone(), email.read().clone(), password.read().clone());
            let current = *mode.read();
            match current {
                Mode::SignUp => match sign_up(&*local, &name, &mail, &pass, Utc::now()) {
                    Ok(_) => {
                        alert(SIGN_UP_DONE);
                        password.set(String::new());
                        mode.set(Mode::SignIn);
                    }
                    Err(e) => report("sign up", &e),
                },
                Mode::SignIn => match sign_in(&*local, &name, &pass) {
                    Ok(session) => {
                        alert(&format!("Sign in successful! Welcome {} 🎉", session.user.username));
                        password.set(String::new());
                        user.set(session.user.username);
                        router.push(Route::Designer {});
                    }
                    Err(e) => report("sign in", &e),
                },
            }
        }
    };

    let on_sign_out = {
        let local = stores.local.clone();
        move |_: MouseEvent| {
            if !confirm(SIGN_OUT_PROMPT) {
                return;
            }
            sign_out(&*local);
            tracing::info!("signed out");
            user.set(DEFAULT_USER.to_string());
        }
    };

    let save_profile = {
        let local = stores.local.clone();
        move |evt: FormEvent| {
            evt.prevent_default();
            let Some(update) = editing.read().clone() else {
                return;
            };
            match update_profile(&*local, &update) {
                Ok(change) => {
                    alert(&change.message());
                    user.set(change.session.user.username);
                    editing.set(None);
                }
                Err(e) => report("profile update", &e),
            }
        }
    };

    if let Some(session) = session {
        let joined = session
            .user
            .created_at
            .with_timezone(&Local)
            .format("%-d/%-m/%Y")
            .to_string();
        let draft = editing.read().clone();
        let start_editing = {
            let user = session.user.clone();
            move |_: MouseEvent| {
                editing.set(Some(ProfileUpdate {
                    username: user.username.clone(),
                    email: user.email.clone(),
                    ..Default::default()
                }));
            }
        };
        return rsx! {
            div { class: "account",
                div { class: "panel",
                    h3 { "Signed in as {session.user.username}" }
                    p { class: "muted", "{session.user.email}" }
                    p { class: "muted", "Member since {joined}" }
                    div { class: "actions",
                        Link { to: Route::History {}, "Your tours" }
                        Link { to: Route::Favorites {}, "Favorites" }
                        if draft.is_none() {
                            button { onclick: start_editing, "Edit profile" }
                        }
                        button { class: "secondary", onclick: on_sign_out, "Sign out" }
                    }
                }
                if let Some(draft) = draft {
                    form { class: "panel", onsubmit: save_profile,
                        h3 { "Edit profile" }
                        input {
                            r#type: "text",
                            placeholder: "Username",
                            value: "{draft.username}",
                            oninput: move |evt: Event<FormData>| {
                                if let Some(d) = editing.write().as_mut() {
                                    d.username = evt.value();
                                }
                            },
                        }
                        input {
                            r#type: "email",
                            placeholder: "Email",
                            value: "{draft.email}",
                            oninput: move |evt: Event<FormData>| {
                                if let Some(d) = editing.write().as_mut() {
                                    d.email = evt.value();
                                }
                            },
                        }
                        input {
                            r#type: "password",
                            placeholder: "New password (leave blank to keep)",
                            autocomplete: "new-password",
                            value: "{draft.new_password}",
                            oninput: move |evt: Event<FormData>| {
                                if let Some(d) = editing.write().as_mut() {
                                    d.new_password = evt.value();
                                }
                            },
                        }
                        input {
                            r#type: "password",
                            placeholder: "Confirm new password",
                            autocomplete: "new-password",
                            value: "{draft.confirm_password}",
                            oninput: move |evt: Event<FormData>| {
                                if let Some(d) = editing.write().as_mut() {
                                    d.confirm_password = evt.value();
                                }
                            },
                        }
                        div { class: "actions",
                            button { r#type: "submit", "Save" }
                            button {
                                r#type: "button",
                                class: "secondary",
                                onclick: move |_| editing.set(None),
                                "Cancel"
                            }
                        }
                    }
                }
            }
        };
    }

    let signing_up = *mode.read() == Mode::SignUp;

    rsx! {
        div { class: "account",
            form { class: "panel", onsubmit: submit,
                h3 { if signing_up { "Create an account" } else { "Sign in" } }
                input {
                    r#type: "text",
                    placeholder: "Username",
                    autocomplete: "username",
                    value: "{username}",
                    oninput: move |evt: Event<FormData>| username.set(evt.value()),
                }
                if signing_up {
                    input {
                        r#type: "email",
                        placeholder: "Email",
                        value: "{email}",
                        oninput: move |evt: Event<FormData>| email.set(evt.value()),
                    }
                }
                input {
                    r#type: "password",
                    placeholder: "Password",
                    autocomplete: if signing_up { "new-password" } else { "current-password" },
                    value: "{password}",
                    oninput: move |evt: Event<FormData>| password.set(evt.value()),
                }
                button { r#type: "submit", if signing_up { "Sign up" } else { "Sign in" } }
                p { class: "muted",
                    if signing_up { "Already registered? " } else { "New here? " }
                    a {
                        href: "#",
                        onclick: move |evt: MouseEvent| {
                            evt.prevent_default();
                            mode.set(if signing_up { Mode::SignIn } else { Mode::SignUp });
                        },
                        if signing_up { "Sign in" } else { "Create an account" }
                    }
                }
                p { class: "muted", "Without an account, tours are saved as {DEFAULT_USER}." }
            }
        }
    }
}
