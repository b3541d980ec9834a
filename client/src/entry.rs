//! WASM exports.
//!
//! `start` runs once when the module loads. `init()` may be called again by
//! page script (e.g. after a client-side navigation swaps the body); it
//! rebuilds the floating controls and ambient layer without duplicating them.
//! `cycleTheme()` goes through the same path as a toggle click. Theme changes
//! reach page script as a `themechange` event on `document`.

use std::cell::RefCell;
use std::rc::Rc;

use theme::chrome::{ChromeHosts, ThemeChrome};
use theme::config::ThemeConfig;
use theme::dispose::DisposeBag;
use wasm_bindgen::prelude::*;

use crate::browser::ambient::DomAmbientHost;
use crate::browser::controls::DomControlsHost;
use crate::browser::events;
use crate::browser::marker::RootMarker;
use crate::browser::scheduler::BrowserScheduler;
use crate::browser::storage::LocalStorage;
use crate::config_source::{self, CONFIG_ELEMENT_ID};

struct Active {
    // Window listeners go before the chrome they point at.
    listeners: DisposeBag,
    chrome: Rc<ThemeChrome>,
}

thread_local! {
    static ACTIVE: RefCell<Option<Active>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Trace) {
        web_sys::console::warn_1(&format!("theme: logger already installed: {err}").into());
    }

    let config = read_config();
    log::set_max_level(config_source::level_filter(&config));
    boot(config);
}

/// Re-run page-level initialization. Safe to call any number of times.
#[wasm_bindgen]
pub fn init() {
    if let Some(chrome) = active_chrome() {
        chrome.reinit();
        return;
    }
    boot(read_config());
}

/// Advance the preference one step; returns the new preference name.
#[wasm_bindgen(js_name = cycleTheme)]
pub fn cycle_theme() -> Option<String> {
    active_chrome().map(|chrome| chrome.cycle_theme().as_str().to_owned())
}

fn active_chrome() -> Option<Rc<ThemeChrome>> {
    ACTIVE.with(|active| active.borrow().as_ref().map(|a| Rc::clone(&a.chrome)))
}

fn read_config() -> ThemeConfig {
    let raw = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|e| e.text_content());
    config_source::load(raw.as_deref())
}

fn boot(config: ThemeConfig) {
    let Some(window) = web_sys::window() else {
        log::warn!("theme: no window; chrome not started");
        return;
    };
    let initial_y = window.scroll_y().unwrap_or(0.0);
    let seed = config_source::seed_from_clock(js_sys::Date::now());

    let hosts = ChromeHosts {
        storage: Box::new(LocalStorage),
        marker: Box::new(RootMarker),
        scheduler: Rc::new(BrowserScheduler),
        controls: Box::new(DomControlsHost::new(config.controls.clone())),
        ambient: Box::new(DomAmbientHost::new(config.ambient.navbar_selector.clone())),
    };
    let chrome = Rc::new(ThemeChrome::start(config, hosts, initial_y, seed));
    let mut listeners = events::attach(&chrome);
    listeners.push(events::broadcast(&chrome));

    let previous = ACTIVE.with(|active| active.borrow_mut().replace(Active { listeners, chrome }));
    drop(previous);
}
