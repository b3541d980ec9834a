//! Window-level event wiring: scroll and system color-scheme changes in,
//! `themechange` on `document` out.

use std::rc::{Rc, Weak};

use theme::chrome::ThemeChrome;
use theme::dispose::{DisposeBag, Disposer};
use theme::preference::ResolvedTheme;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{AddEventListenerOptions, CustomEvent, CustomEventInit, EventTarget};

use super::{describe, document};

const COLOR_SCHEME_QUERY: &str = "(prefers-color-scheme: dark)";

/// Dispatched on `document` after the root marker changes.
/// `event.detail` is `"dark"` or `"light"`.
pub const THEME_CHANGE_EVENT: &str = "themechange";

/// Add `handler` for `event` on `target`; the disposer removes it.
pub(crate) fn listen(
    target: &EventTarget,
    event: &'static str,
    passive: bool,
    handler: impl FnMut() + 'static,
) -> Result<Disposer, JsValue> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    let options = AddEventListenerOptions::new();
    options.set_passive(passive);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        cb.as_ref().unchecked_ref(),
        &options,
    )?;

    let target = target.clone();
    Ok(Disposer::new(move || {
        if let Err(err) = target.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref()) {
            log::debug!("theme: removing {event} listener failed: {}", describe(&err));
        }
        drop(cb);
    }))
}

/// Feed scroll events to the tracker and OS scheme flips to `refresh`.
///
/// The scheme flip is only a recheck trigger: under `auto` the clock still
/// decides.
pub fn attach(chrome: &Rc<ThemeChrome>) -> DisposeBag {
    let mut bag = DisposeBag::new();
    let Some(window) = web_sys::window() else {
        return bag;
    };

    let weak: Weak<ThemeChrome> = Rc::downgrade(chrome);
    let scroll_window = window.clone();
    match listen(&window, "scroll", true, move || {
        if let Some(chrome) = weak.upgrade() {
            chrome.record_scroll(scroll_window.scroll_y().unwrap_or(0.0));
        }
    }) {
        Ok(disposer) => bag.push(disposer),
        Err(err) => log::warn!("theme: scroll listener not attached: {}", describe(&err)),
    }

    match window.match_media(COLOR_SCHEME_QUERY) {
        Ok(Some(query)) => {
            let weak: Weak<ThemeChrome> = Rc::downgrade(chrome);
            match listen(&query, "change", false, move || {
                if let Some(chrome) = weak.upgrade() {
                    log::debug!("theme: system color scheme changed; rechecking");
                    chrome.refresh();
                }
            }) {
                Ok(disposer) => bag.push(disposer),
                Err(err) => log::debug!("theme: color-scheme listener not attached: {}", describe(&err)),
            }
        }
        Ok(None) => {}
        Err(err) => log::debug!("theme: matchMedia unavailable: {}", describe(&err)),
    }

    bag
}

/// Re-publish theme changes to page script as [`THEME_CHANGE_EVENT`].
pub fn broadcast(chrome: &ThemeChrome) -> Disposer {
    chrome.subscribe(|theme| {
        if let Err(err) = dispatch_theme_change(theme) {
            log::debug!("theme: {THEME_CHANGE_EVENT} not dispatched: {}", describe(&err));
        }
    })
}

fn dispatch_theme_change(theme: ResolvedTheme) -> Result<(), JsValue> {
    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let init = CustomEventInit::new();
    init.set_detail(&JsValue::from_str(theme.as_str()));
    let event = CustomEvent::new_with_event_init_dict(THEME_CHANGE_EVENT, &init)?;
    document.dispatch_event(&event)?;
    Ok(())
}
