//! Browser implementations of the `theme` host traits.

pub mod ambient;
pub mod controls;
pub mod events;
pub mod marker;
pub mod scheduler;
pub mod storage;

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{Document, HtmlElement};

pub(crate) fn document() -> Option<Document> {
    web_sys::window().and_then(|w| w.document())
}

/// Readable text for a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// `<tag class="class">` as an `HtmlElement`.
pub(crate) fn create_element(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let element: HtmlElement = document.create_element(tag)?.dyn_into()?;
    element.set_class_name(class);
    Ok(element)
}

/// Set inline style properties, logging (not failing) on rejection.
pub(crate) fn set_styles<V: AsRef<str>>(element: &HtmlElement, styles: &[(&str, V)]) {
    let style = element.style();
    for (name, value) in styles {
        if let Err(err) = style.set_property(name, value.as_ref()) {
            log::debug!("theme: style {name} rejected: {}", describe(&err));
        }
    }
}
