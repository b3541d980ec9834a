//! DOM side of the ambient backdrop: star field, drifting blobs, navbar paint.

use theme::ambient::{AmbientHost, AmbientScene, Blob, SceneHandle, Star};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement};

use super::{create_element, describe, document, set_styles};

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
const LAYER_CLASS: &str = "ambient-layer";
const STAR_CLASS: &str = "ambient-star";
const BLOB_CLASS: &str = "ambient-blob";
const TWINKLE_KEYFRAMES_ID: &str = "ambient-twinkle-keyframes";
const TWINKLE_KEYFRAMES: &str =
    "@keyframes ambient-twinkle { 0%, 100% { opacity: var(--star-opacity); } 50% { opacity: 0.1; } }";

pub struct DomAmbientHost {
    navbar_selector: String,
}

impl DomAmbientHost {
    pub fn new(navbar_selector: impl Into<String>) -> Self {
        Self { navbar_selector: navbar_selector.into() }
    }
}

struct DomScene {
    layer: Option<HtmlElement>,
    blobs: Vec<HtmlElement>,
}

impl SceneHandle for DomScene {
    fn set_offsets(&self, offsets: &[(f64, f64)]) {
        for (blob, (dx, dy)) in self.blobs.iter().zip(offsets) {
            set_styles(blob, &[("transform", format!("translate({dx:.2}px, {dy:.2}px)"))]);
        }
    }
}

impl Drop for DomScene {
    fn drop(&mut self) {
        if let Some(layer) = self.layer.take() {
            layer.remove();
        }
    }
}

fn build_layer(document: &Document) -> Result<HtmlElement, JsValue> {
    let layer = create_element(document, "div", LAYER_CLASS)?;
    layer.set_attribute("aria-hidden", "true")?;
    set_styles(
        &layer,
        &[
            ("position", "fixed"),
            ("inset", "0"),
            ("overflow", "hidden"),
            ("pointer-events", "none"),
            ("z-index", "-1"),
        ],
    );
    Ok(layer)
}

fn ensure_twinkle_keyframes(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id(TWINKLE_KEYFRAMES_ID).is_some() {
        return Ok(());
    }
    let Some(head) = document.head() else {
        return Ok(());
    };
    let style = document.create_element("style")?;
    style.set_id(TWINKLE_KEYFRAMES_ID);
    style.set_text_content(Some(TWINKLE_KEYFRAMES));
    head.append_child(&style)?;
    Ok(())
}

fn star_node(document: &Document, star: &Star, animate: bool) -> Result<HtmlElement, JsValue> {
    let node = create_element(document, "div", STAR_CLASS)?;
    let mut styles = vec![
        ("position", "absolute".to_owned()),
        ("width", "2px".to_owned()),
        ("height", "2px".to_owned()),
        ("border-radius", "50%".to_owned()),
        ("background", "white".to_owned()),
        ("top", format!("{:.2}%", star.top_pct)),
        ("left", format!("{:.2}%", star.left_pct)),
        ("opacity", format!("{:.2}", star.opacity)),
        ("--star-opacity", format!("{:.2}", star.opacity)),
    ];
    if animate {
        styles.push(("animation", format!("ambient-twinkle {:.2}s ease-in-out infinite", star.twinkle_secs)));
    }
    set_styles(&node, &styles);
    Ok(node)
}

fn blob_node(document: &Document, blob: &Blob) -> Result<HtmlElement, JsValue> {
    let node = create_element(document, "div", BLOB_CLASS)?;
    set_styles(
        &node,
        &[
            ("position", "absolute".to_owned()),
            ("width", format!("{:.0}px", blob.size_px)),
            ("height", format!("{:.0}px", blob.size_px)),
            ("top", format!("{:.2}%", blob.top_pct)),
            ("left", format!("{:.2}%", blob.left_pct)),
            ("border-radius", "50%".to_owned()),
            ("filter", "blur(60px)".to_owned()),
            ("opacity", "0.6".to_owned()),
            ("background", blob.gradient.to_owned()),
        ],
    );
    Ok(node)
}

fn render_scene(scene: &AmbientScene, animate: bool) -> Result<DomScene, JsValue> {
    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document.body().ok_or_else(|| JsValue::from_str("no body"))?;
    let layer = build_layer(&document)?;
    let mut blobs = Vec::new();

    match scene {
        AmbientScene::Stars(stars) => {
            if animate {
                ensure_twinkle_keyframes(&document)?;
            }
            for star in stars {
                let node = star_node(&document, star, animate)?;
                layer.append_child(&node)?;
            }
        }
        AmbientScene::Blobs(planned) => {
            for blob in planned {
                let node = blob_node(&document, blob)?;
                layer.append_child(&node)?;
                blobs.push(node);
            }
        }
    }

    body.append_child(&layer)?;
    Ok(DomScene { layer: Some(layer), blobs })
}

impl AmbientHost for DomAmbientHost {
    fn prefers_reduced_motion(&self) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        match window.match_media(REDUCED_MOTION_QUERY) {
            Ok(Some(query)) => query.matches(),
            Ok(None) => false,
            Err(err) => {
                log::debug!("theme: reduced-motion query failed: {}", describe(&err));
                false
            }
        }
    }

    fn render(&self, scene: &AmbientScene, animate: bool) -> Box<dyn SceneHandle> {
        match render_scene(scene, animate) {
            Ok(rendered) => Box::new(rendered),
            Err(err) => {
                log::warn!("theme: ambient scene not rendered: {}", describe(&err));
                Box::new(DomScene { layer: None, blobs: Vec::new() })
            }
        }
    }

    fn paint_navbar(&self, background: &str) {
        let Some(document) = document() else {
            return;
        };
        let Ok(nodes) = document.query_selector_all(&self.navbar_selector) else {
            log::debug!("theme: navbar selector {:?} rejected", self.navbar_selector);
            return;
        };
        for i in 0..nodes.length() {
            if let Some(navbar) = nodes.item(i).as_ref().and_then(|n| n.dyn_ref::<HtmlElement>()) {
                set_styles(navbar, &[("background", background)]);
            }
        }
    }
}
