//! Thin wrappers over the browser APIs the pages use: storage, dialogs,
//! clipboard, file download and the geolocation watch.

use std::rc::Rc;

use dioxus::logger::tracing;
use foodtour_shared::models::Position;
use foodtour_shared::storage::{KeyValueStore, MemoryStore, StorageError, Stores};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// `sessionStorage` or `localStorage` behind the shared storage trait.
pub struct WebStorage(web_sys::Storage);

impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0
            .set_item(key, value)
            .map_err(|e| StorageError::Unavailable(js_error_text(&e)))
    }

    fn remove(&self, key: &str) {
        let _ = self.0.remove_item(key);
    }
}

/// Session and durable storage of the current page. Falls back to memory
/// when the browser refuses access (private mode, disabled storage).
pub fn stores() -> Stores {
    let window = web_sys::window();
    let session = window.as_ref().and_then(|w| w.session_storage().ok().flatten());
    let local = window.as_ref().and_then(|w| w.local_storage().ok().flatten());
    Stores {
        session: wrap(session, "session"),
        local: wrap(local, "local"),
    }
}

fn wrap(storage: Option<web_sys::Storage>, area: &'static str) -> Rc<dyn KeyValueStore> {
    match storage {
        Some(s) => Rc::new(WebStorage(s)),
        None => {
            tracing::warn!(area, "browser storage unavailable, state will not persist");
            Rc::new(MemoryStore::new())
        }
    }
}

pub fn js_error_text(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        window.alert_with_message(message).ok();
    }
}

/// Blocking yes/no dialog. Anything but an explicit "OK" counts as no.
pub fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

pub fn copy_to_clipboard(text: String) {
    wasm_bindgen_futures::spawn_local(async move {
        if let Some(window) = web_sys::window() {
            let clipboard = window.navigator().clipboard();
            let _ = wasm_bindgen_futures::JsFuture::from(clipboard.write_text(&text)).await;
        }
    });
}

/// Offer `text` as a file download.
pub fn download_text(file_name: &str, text: &str, mime: &str) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(mime);
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    web_sys::Url::revoke_object_url(&url)
}

const PERMISSION_DENIED: u16 = 1;

pub fn location_error_message(code: u16) -> &'static str {
    if code == PERMISSION_DENIED {
        "Please allow access to your location."
    } else {
        "Cannot get your location."
    }
}

type FixCallback = Closure<dyn FnMut(web_sys::GeolocationPosition)>;
type ErrorCallback = Closure<dyn FnMut(web_sys::GeolocationPositionError)>;

/// An active `watchPosition` subscription. Dropping it clears the watch.
pub struct PositionWatch {
    id: i32,
    geolocation: web_sys::Geolocation,
    _on_fix: FixCallback,
    _on_error: ErrorCallback,
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.geolocation.clear_watch(self.id);
    }
}

/// Start receiving position fixes. There is no timeout; fixes arrive until
/// the watch is dropped.
pub fn watch_position(
    mut on_fix: impl FnMut(Position) + 'static,
    mut on_error: impl FnMut(&'static str) + 'static,
) -> Result<PositionWatch, String> {
    let geolocation = web_sys::window()
        .ok_or("no window")?
        .navigator()
        .geolocation()
        .map_err(|e| js_error_text(&e))?;

    let fix = FixCallback::new(move |p: web_sys::GeolocationPosition| {
        let c = p.coords();
        on_fix(Position {
            latitude: c.latitude(),
            longitude: c.longitude(),
            accuracy_meters: c.accuracy(),
        });
    });
    let error = ErrorCallback::new(move |e: web_sys::GeolocationPositionError| {
        tracing::warn!(code = e.code(), message = %e.message(), "geolocation error");
        on_error(location_error_message(e.code()));
    });

    let options = web_sys::PositionOptions::new();
    options.set_enable_high_accuracy(true);
    let id = geolocation
        .watch_position_with_error_callback_and_options(
            fix.as_ref().unchecked_ref(),
            Some(error.as_ref().unchecked_ref()),
            &options,
        );

    Ok(PositionWatch {
        id,
        geolocation,
        _on_fix: fix,
        _on_error: error,
    })
}
