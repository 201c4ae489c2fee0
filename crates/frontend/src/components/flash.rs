use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

/// How long a confirmation stays on screen.
pub const FLASH_MS: u32 = 2_500;

/// Short-lived confirmation text ("copied!", "removed!").
#[derive(Clone, Copy, PartialEq)]
pub struct Flash {
    message: Signal<Option<&'static str>>,
    shown: Signal<u32>,
}

pub fn use_flash() -> Flash {
    Flash {
        message: use_signal(|| None),
        shown: use_signal(|| 0),
    }
}

/// A flash hides itself only if no newer one replaced it meanwhile.
fn still_current(generation: u32, latest: u32) -> bool {
    generation == latest
}

impl Flash {
    pub fn message(&self) -> Option<&'static str> {
        *self.message.read()
    }

    pub fn show(mut self, text: &'static str) {
        let generation = self.shown.peek().wrapping_add(1);
        self.shown.set(generation);
        self.message.set(Some(text));
        spawn(async move {
            TimeoutFuture::new(FLASH_MS).await;
            if still_current(generation, *self.shown.peek()) {
                self.message.set(None);
            }
        });
    }
}

#[component]
pub fn FlashText(flash: Flash) -> Element {
    match flash.message() {
        Some(text) => rsx! { span { class: "flash", "{text}" } },
        None => rsx! {},
    }
}
