//! The `data-theme` attribute on `<html>`.

use theme::applier::ThemeMarker;
use theme::consts::{MARKER_ATTRIBUTE, MARKER_DARK};
use theme::preference::ResolvedTheme;

use super::{describe, document};

pub struct RootMarker;

impl ThemeMarker for RootMarker {
    fn write(&self, theme: ResolvedTheme) {
        let Some(root) = document().and_then(|d| d.document_element()) else {
            log::warn!("theme: no document element to mark as {theme}");
            return;
        };
        let result = if theme.is_dark() {
            root.set_attribute(MARKER_ATTRIBUTE, MARKER_DARK)
        } else {
            root.remove_attribute(MARKER_ATTRIBUTE)
        };
        if let Err(err) = result {
            log::warn!("theme: failed to write {MARKER_ATTRIBUTE}: {}", describe(&err));
        }
    }
}
