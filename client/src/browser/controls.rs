//! DOM side of the floating buttons.
//!
//! Both buttons live in one fixed wrapper `<div>` appended to the configured
//! container (default `<body>`). The wrapper is shared through an `Rc` and
//! removed when the last button holding it is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use theme::config::ControlsConfig;
use theme::controls::{ButtonKind, ButtonState, ControlsHost, FloatingButton, MountError};
use theme::dispose::Disposer;
use theme::preference::ResolvedTheme;
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Document, Element, HtmlElement, MutationObserver, MutationObserverInit, ScrollBehavior, ScrollToOptions};

use super::events::listen;
use super::{create_element, describe, document, set_styles};

const TOAST_CLASS: &str = "theme-toast";

const MOON_ICON: &str = r#"<svg viewBox="0 0 24 24" width="20" height="20" fill="currentColor"><path d="M21 12.79A9 9 0 1 1 11.21 3 7 7 0 0 0 21 12.79z"/></svg>"#;

const SUN_ICON: &str = r#"<svg viewBox="0 0 24 24" width="20" height="20" fill="none" stroke="currentColor" stroke-width="2"><circle cx="12" cy="12" r="5"/><line x1="12" y1="1" x2="12" y2="3"/><line x1="12" y1="21" x2="12" y2="23"/><line x1="4.22" y1="4.22" x2="5.64" y2="5.64"/><line x1="18.36" y1="18.36" x2="19.78" y2="19.78"/><line x1="1" y1="12" x2="3" y2="12"/><line x1="21" y1="12" x2="23" y2="12"/><line x1="4.22" y1="19.78" x2="5.64" y2="18.36"/><line x1="18.36" y1="5.64" x2="19.78" y2="4.22"/></svg>"#;

const ARROW_ICON: &str = r#"<svg viewBox="0 0 24 24" width="20" height="20" fill="none" stroke="currentColor" stroke-width="2"><polyline points="18 15 12 9 6 15"/></svg>"#;

fn dom_error(err: JsValue) -> MountError {
    MountError::Dom(describe(&err))
}

struct Wrapper {
    element: HtmlElement,
}

impl Drop for Wrapper {
    fn drop(&mut self) {
        self.element.remove();
    }
}

struct DomButton {
    element: HtmlElement,
    click: Option<Disposer>,
    _wrapper: Rc<Wrapper>,
}

impl FloatingButton for DomButton {
    fn set_state(&self, state: ButtonState) {
        let (display, opacity, pointer) = match state {
            ButtonState::Visible => ("flex", "1", "auto"),
            ButtonState::Suppressed => ("flex", "0", "none"),
            ButtonState::Hidden => ("none", "0", "none"),
        };
        set_styles(&self.element, &[("display", display), ("opacity", opacity), ("pointer-events", pointer)]);
        let name = match state {
            ButtonState::Visible => "visible",
            ButtonState::Suppressed => "suppressed",
            ButtonState::Hidden => "hidden",
        };
        if let Err(err) = self.element.set_attribute("data-state", name) {
            log::debug!("theme: data-state not set: {}", describe(&err));
        }
    }

    fn set_icon(&self, theme: ResolvedTheme) {
        self.element.set_inner_html(if theme.is_dark() { MOON_ICON } else { SUN_ICON });
    }
}

impl Drop for DomButton {
    fn drop(&mut self) {
        if let Some(click) = self.click.take() {
            click.dispose();
        }
        self.element.remove();
    }
}

pub struct DomControlsHost {
    config: ControlsConfig,
    wrapper: RefCell<Weak<Wrapper>>,
}

impl DomControlsHost {
    pub fn new(config: ControlsConfig) -> Self {
        Self { config, wrapper: RefCell::new(Weak::new()) }
    }

    fn container(&self, document: &Document) -> Result<Element, MountError> {
        match &self.config.container_selector {
            Some(selector) => document
                .query_selector(selector)
                .map_err(dom_error)?
                .ok_or_else(|| MountError::ContainerMissing(selector.clone())),
            None => document
                .body()
                .map(Element::from)
                .ok_or_else(|| MountError::ContainerMissing("body".to_owned())),
        }
    }

    fn container_present(&self) -> bool {
        document().is_some_and(|d| self.container(&d).is_ok())
    }

    fn wrapper(&self, document: &Document) -> Result<Rc<Wrapper>, MountError> {
        if let Some(existing) = self.wrapper.borrow().upgrade() {
            return Ok(existing);
        }
        let container = self.container(document)?;
        let element = create_element(document, "div", &self.config.wrapper_class).map_err(dom_error)?;
        set_styles(
            &element,
            &[
                ("position", "fixed"),
                ("right", "24px"),
                ("bottom", "24px"),
                ("display", "flex"),
                ("flex-direction", "column"),
                ("gap", "12px"),
                ("z-index", "999"),
            ],
        );
        container.append_child(&element).map_err(dom_error)?;
        let wrapper = Rc::new(Wrapper { element });
        *self.wrapper.borrow_mut() = Rc::downgrade(&wrapper);
        Ok(wrapper)
    }

    fn remove_all(document: &Document, class: &str) -> usize {
        let Ok(nodes) = document.query_selector_all(&format!(".{class}")) else {
            return 0;
        };
        let mut removed = 0;
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).as_ref().and_then(|n| n.dyn_ref::<Element>()) {
                element.remove();
                removed += 1;
            }
        }
        removed
    }
}

impl ControlsHost for DomControlsHost {
    fn clear_strays(&self, kind: ButtonKind) {
        let Some(document) = document() else {
            return;
        };
        let removed = Self::remove_all(&document, kind.class_name(&self.config));
        if self.wrapper.borrow().upgrade().is_none() {
            Self::remove_all(&document, &self.config.wrapper_class);
        }
        if removed > 0 {
            log::debug!("theme: removed {removed} stray {kind:?} node(s)");
        }
    }

    fn mount_button(&self, kind: ButtonKind, on_click: Rc<dyn Fn()>) -> Result<Box<dyn FloatingButton>, MountError> {
        let document = document().ok_or_else(|| MountError::Dom("no document".to_owned()))?;
        let wrapper = self.wrapper(&document)?;

        let tag_class = kind.class_name(&self.config);
        let element = create_element(&document, "button", tag_class).map_err(dom_error)?;
        let label = match kind {
            ButtonKind::ThemeToggle => "Toggle theme",
            ButtonKind::BackToTop => "Back to top",
        };
        element.set_attribute("type", "button").map_err(dom_error)?;
        element.set_attribute("aria-label", label).map_err(dom_error)?;
        element.set_title(label);
        if kind == ButtonKind::BackToTop {
            element.set_inner_html(ARROW_ICON);
        }
        set_styles(&element, &[("display", "none"), ("transition", "opacity 0.3s ease")]);
        wrapper.element.append_child(&element).map_err(dom_error)?;

        let click = listen(&element, "click", false, move || on_click());
        let click = match click {
            Ok(click) => click,
            Err(err) => {
                element.remove();
                return Err(dom_error(err));
            }
        };

        Ok(Box::new(DomButton { element, click: Some(click), _wrapper: wrapper }))
    }

    fn scroll_to_top(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(ScrollBehavior::Smooth);
        window.scroll_to_with_scroll_to_options(&options);
    }

    fn show_toast(&self, message: &str) -> Disposer {
        let Some(document) = document() else {
            return Disposer::noop();
        };
        let Some(body) = document.body() else {
            return Disposer::noop();
        };
        let toast = match create_element(&document, "div", TOAST_CLASS) {
            Ok(toast) => toast,
            Err(err) => {
                log::debug!("theme: toast not created: {}", describe(&err));
                return Disposer::noop();
            }
        };
        toast.set_text_content(Some(message));
        if let Err(err) = toast.set_attribute("role", "status") {
            log::debug!("theme: toast role not set: {}", describe(&err));
        }
        if let Err(err) = body.append_child(&toast) {
            log::debug!("theme: toast not shown: {}", describe(&err));
            return Disposer::noop();
        }
        Disposer::new(move || toast.remove())
    }

    fn watch_for_container(&self, on_ready: Box<dyn FnOnce()>) -> Disposer {
        let Some(root) = document().and_then(|d| d.document_element()) else {
            return Disposer::noop();
        };

        let host = DomControlsHost::new(self.config.clone());
        let pending: Rc<RefCell<Option<Box<dyn FnOnce()>>>> = Rc::new(RefCell::new(Some(on_ready)));
        let pending_for_cb = Rc::clone(&pending);
        let cb = Closure::wrap(Box::new(move || {
            if !host.container_present() {
                return;
            }
            let ready = pending_for_cb.borrow_mut().take();
            if let Some(ready) = ready {
                ready();
            }
        }) as Box<dyn FnMut()>);

        let observer = match MutationObserver::new(cb.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(err) => {
                log::debug!("theme: MutationObserver unavailable: {}", describe(&err));
                return Disposer::noop();
            }
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if let Err(err) = observer.observe_with_options(&root, &init) {
            log::debug!("theme: container watch not started: {}", describe(&err));
            return Disposer::noop();
        }

        Disposer::new(move || {
            observer.disconnect();
            let unfired = pending.borrow_mut().take();
            drop(unfired);
            drop(cb);
        })
    }
}
