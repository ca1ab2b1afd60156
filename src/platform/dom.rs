//! Browser stage over the page markup
//!
//! Expected markup:
//! - `.gallery` holding `.item` tiles (films carry `data-video-src`, essays
//!   carry `data-essay-src` and an `.essay-box` with `.essay-content`)
//! - `.social-btn` links floating over the page (controls)
//! - `#overlay`, `#return-btn` (the toggle) and `#easter-egg-msg`

use std::collections::BTreeMap;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, Window};

use super::media;
use crate::Rect;
use crate::error::{GalleryError, Result};
use crate::gallery::{DisplayMode, FlipTransform, Stage, TileId, TileKind};

/// Class on `.gallery` while the justified grid is shown
const GRID_CLASS: &str = "return-to-form";
/// Row container the grid packs into; page CSS sets its gap
const GRID_CONTAINER_CLASS: &str = "grid-container";
/// Background color transitions, in seconds
const DISCO_FADE_SECS: f32 = 1.5;
const PLAIN_FADE_SECS: f32 = 0.5;
const PLAIN_BACKGROUND: &str = "#ffffff";
/// Selector for the elements each tile sizes against a committed row height
const MEDIA_SELECTOR: &str = "img, video, .thumbnail";
const ESSAY_BOX_SELECTOR: &str = ".essay-box";

fn by_id(document: &Document, id: &str) -> Result<HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| GalleryError::MissingElement(format!("#{id}")))
}

fn create_div(document: &Document) -> Result<HtmlElement> {
    document
        .create_element("div")?
        .dyn_into()
        .map_err(|_| GalleryError::Js("created <div> is not an HTML element".into()))
}

fn find(parent: &Element, selector: &str) -> Option<HtmlElement> {
    parent
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

/// Classify a tile element from its markup
pub fn tile_kind(el: &Element) -> TileKind {
    if el.class_list().contains("social-btn") {
        return TileKind::Control;
    }
    if let Some(src) = el.get_attribute("data-video-src") {
        return TileKind::Media {
            video_src: Some(src),
        };
    }
    if let Some(path) = el.get_attribute("data-essay-src") {
        return TileKind::Essay { path };
    }
    if find(el, MEDIA_SELECTOR).is_some() {
        TileKind::Media { video_src: None }
    } else {
        TileKind::Plain
    }
}

pub struct DomStage {
    window: Window,
    document: Document,
    gallery: HtmlElement,
    /// Present only in grid mode
    grid_container: Option<HtmlElement>,
    overlay: HtmlElement,
    toggle: HtmlElement,
    message: Option<HtmlElement>,
    /// Tile elements, indexed by `TileId`
    tiles: Vec<HtmlElement>,
    placeholders: BTreeMap<TileId, HtmlElement>,
}

impl DomStage {
    /// Collect the gallery's elements. Returns the stage plus each tile's
    /// kind in `TileId` order.
    pub fn from_document() -> Result<(Self, Vec<TileKind>)> {
        let window = web_sys::window().ok_or_else(|| GalleryError::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| GalleryError::MissingElement("document".into()))?;

        let gallery = document
            .query_selector(".gallery")?
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| GalleryError::MissingElement(".gallery".into()))?;
        let overlay = by_id(&document, "overlay")?;
        let toggle = by_id(&document, "return-btn")?;
        let message = by_id(&document, "easter-egg-msg").ok();

        let mut tiles = Vec::new();
        let mut kinds = Vec::new();
        let nodes = document.query_selector_all(".item, .social-btn")?;
        for i in 0..nodes.length() {
            let Some(el) = nodes
                .item(i)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok())
            else {
                continue;
            };
            kinds.push(tile_kind(&el));
            tiles.push(el);
        }
        log::info!("Found {} tiles", tiles.len());

        let stage = Self {
            window,
            document,
            gallery,
            grid_container: None,
            overlay,
            toggle,
            message,
            tiles,
            placeholders: BTreeMap::new(),
        };
        Ok((stage, kinds))
    }

    pub fn element(&self, tile: TileId) -> Option<&HtmlElement> {
        self.tiles.get(tile.index())
    }

    pub fn toggle_button(&self) -> &HtmlElement {
        &self.toggle
    }

    pub fn overlay(&self) -> &HtmlElement {
        &self.overlay
    }

    /// Natural media size, once the tile's image has loaded
    pub fn natural_size(&self, tile: TileId) -> Option<Vec2> {
        let img = find(self.element(tile)?, "img")?.dyn_into::<HtmlImageElement>().ok()?;
        (img.natural_width() > 0)
            .then(|| Vec2::new(img.natural_width() as f32, img.natural_height() as f32))
    }

    /// Images of the page that have not finished loading
    pub fn pending_images(&self) -> Vec<(TileId, HtmlImageElement)> {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(i, el)| {
                let img = find(el, "img")?.dyn_into::<HtmlImageElement>().ok()?;
                (!img.complete()).then_some((TileId(i as u32), img))
            })
            .collect()
    }

    fn with_element(&self, tile: TileId, f: impl FnOnce(&HtmlElement) -> Result<()>) {
        let Some(el) = self.element(tile) else {
            log::warn!("No element for {:?}", tile);
            return;
        };
        if let Err(e) = f(el) {
            log::warn!("DOM update of {:?} failed: {e}", tile);
        }
    }

    /// Parent the grid lays tiles into
    fn grid_root(&self) -> &HtmlElement {
        self.grid_container.as_ref().unwrap_or(&self.gallery)
    }

    fn open_grid_container(&mut self) -> Result<()> {
        self.gallery.class_list().add_1(GRID_CLASS)?;
        if self.grid_container.is_none() {
            let container = create_div(&self.document)?;
            container.class_list().add_1(GRID_CONTAINER_CLASS)?;
            self.gallery.append_child(&container)?;
            self.grid_container = Some(container);
        }
        Ok(())
    }

    /// Move the grid's children back under `.gallery` and drop the container
    fn close_grid_container(&mut self) -> Result<()> {
        self.gallery.class_list().remove_1(GRID_CLASS)?;
        let Some(container) = self.grid_container.take() else {
            return Ok(());
        };
        while let Some(child) = container.first_child() {
            self.gallery.append_child(&child)?;
        }
        container.remove();
        Ok(())
    }

    fn dim_controls(&self, dim: bool) -> Result<()> {
        let nodes = self.document.query_selector_all(".social-btn, #return-btn")?;
        for i in 0..nodes.length() {
            if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                if dim {
                    el.style().set_property("opacity", "0.15")?;
                } else {
                    el.style().remove_property("opacity")?;
                }
            }
        }
        Ok(())
    }
}

impl Stage for DomStage {
    fn viewport(&self) -> Vec2 {
        let dim = |v: std::result::Result<wasm_bindgen::JsValue, _>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or_default() as f32
        };
        Vec2::new(dim(self.window.inner_width()), dim(self.window.inner_height()))
    }

    fn container_width(&self) -> f32 {
        self.grid_root().client_width() as f32
    }

    fn tile_size(&self, tile: TileId) -> Vec2 {
        self.element(tile)
            .map(|el| Vec2::new(el.offset_width() as f32, el.offset_height() as f32))
            .unwrap_or_default()
    }

    fn bounding_rect(&self, tile: TileId) -> Rect {
        self.element(tile)
            .map(|el| {
                let r = el.get_bounding_client_rect();
                Rect::new(r.left() as f32, r.top() as f32, r.width() as f32, r.height() as f32)
            })
            .unwrap_or_default()
    }

    fn text_width(&self, tile: TileId) -> Option<f32> {
        find(self.element(tile)?, ESSAY_BOX_SELECTOR).map(|el| el.scroll_width() as f32)
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        let result = match mode {
            DisplayMode::Grid => self.open_grid_container(),
            DisplayMode::Disco => self.close_grid_container(),
        };
        if let Err(e) = result {
            log::warn!("Switching gallery to {:?}: {e}", mode);
        }
    }

    fn set_grid_order(&mut self, order: &[TileId]) {
        let root = self.grid_root();
        for &tile in order {
            if let Some(el) = self.element(tile) {
                // Appending an attached node moves it
                if let Err(e) = root.append_child(el) {
                    log::warn!("Reordering {:?}: {e:?}", tile);
                }
            }
        }
    }

    fn set_row_height(&mut self, tile: TileId, height: Option<f32>) {
        self.with_element(tile, |el| {
            if let Some(media) = find(el, MEDIA_SELECTOR) {
                let style = media.style();
                match height {
                    Some(h) => {
                        style.set_property("height", &format!("{h}px"))?;
                        style.set_property("width", "auto")?;
                    }
                    None => {
                        style.remove_property("height")?;
                        style.remove_property("width")?;
                    }
                }
            }
            if let Some(essay) = find(el, ESSAY_BOX_SELECTOR) {
                let style = essay.style();
                match height {
                    Some(h) => style.set_property("height", &format!("{h}px"))?,
                    None => {
                        style.remove_property("height")?;
                        style.remove_property("width")?;
                    }
                }
            }
            Ok(())
        });
    }

    fn set_floating(&mut self, tile: TileId, floating: bool) {
        self.with_element(tile, |el| {
            let style = el.style();
            let is_control = el.class_list().contains("social-btn");
            if floating {
                el.class_list().add_1("floating")?;
                style.set_property("position", "absolute")?;
                style.set_property("left", "0")?;
                style.set_property("top", "0")?;
                style.set_property("animation", "none")?;
                style.set_property("transition", "none")?;
                style.set_property("opacity", "1")?;
                if is_control {
                    style.set_property("z-index", "60")?;
                }
            } else {
                el.class_list().remove_1("floating")?;
                for property in [
                    "position", "left", "top", "animation", "transition", "opacity", "z-index",
                    "transform",
                ] {
                    style.remove_property(property)?;
                }
            }
            Ok(())
        });
    }

    fn set_transform(&mut self, tile: TileId, top_left: Vec2, angle: f32) {
        self.with_element(tile, |el| {
            el.style().set_property(
                "transform",
                &format!("translate({}px, {}px) rotate({}rad)", top_left.x, top_left.y, angle),
            )?;
            Ok(())
        });
    }

    fn set_hidden(&mut self, tile: TileId, hidden: bool) {
        self.with_element(tile, |el| {
            if hidden {
                el.style().set_property("display", "none")?;
            } else {
                el.style().remove_property("display")?;
            }
            Ok(())
        });
    }

    fn set_focused(&mut self, tile: TileId, focused: bool) {
        self.with_element(tile, |el| {
            if focused {
                el.class_list().add_1("is-focused")?;
            } else {
                el.class_list().remove_1("is-focused")?;
            }
            Ok(())
        });
    }

    fn set_focus_transform(&mut self, tile: TileId, transform: Option<FlipTransform>) {
        self.with_element(tile, |el| {
            let style = el.style();
            match transform {
                Some(t) => {
                    style.set_property("transform-origin", "top left")?;
                    style.set_property("transform", &t.to_css())?;
                }
                None => {
                    style.remove_property("transform-origin")?;
                    style.remove_property("transform")?;
                }
            }
            Ok(())
        });
    }

    fn insert_placeholder(&mut self, tile: TileId, size: Vec2) {
        let Some(el) = self.element(tile).cloned() else {
            return;
        };
        let result = (|| -> Result<HtmlElement> {
            let placeholder = create_div(&self.document)?;
            placeholder.class_list().add_1("grid-placeholder")?;
            let style = placeholder.style();
            style.set_property("width", &format!("{}px", size.x))?;
            style.set_property("height", &format!("{}px", size.y))?;
            style.set_property("flex", "0 0 auto")?;
            if let Some(parent) = el.parent_node() {
                parent.insert_before(&placeholder, Some(&el))?;
            }
            Ok(placeholder)
        })();

        match result {
            Ok(placeholder) => {
                if let Some(old) = self.placeholders.insert(tile, placeholder) {
                    old.remove();
                }
            }
            Err(e) => log::warn!("Placeholder for {:?}: {e}", tile),
        }
    }

    fn remove_placeholder(&mut self, tile: TileId) {
        if let Some(placeholder) = self.placeholders.remove(&tile) {
            placeholder.remove();
        }
    }

    fn set_overlay(&mut self, active: bool) {
        let result = if active {
            self.overlay.class_list().add_1("active")
        } else {
            self.overlay.class_list().remove_1("active")
        };
        if let Err(e) = result {
            log::warn!("Overlay: {e:?}");
        }
        if let Err(e) = self.dim_controls(active) {
            log::warn!("Dimming controls: {e}");
        }
    }

    fn start_media(&mut self, tile: TileId, src: &str) {
        self.with_element(tile, |el| media::start(el, src));
    }

    fn stop_media(&mut self, tile: TileId) {
        self.with_element(tile, media::stop);
    }

    fn show_message(&mut self, text: &str) {
        if let Some(msg) = &self.message {
            msg.set_inner_text(text);
            let _ = msg.class_list().add_1("visible");
            let _ = msg.style().set_property("z-index", "9999");
        }
    }

    fn hide_message(&mut self) {
        if let Some(msg) = &self.message {
            let _ = msg.class_list().remove_1("visible");
        }
    }

    fn set_toggle_visible(&mut self, visible: bool) {
        let style = self.toggle.style();
        let result = if visible {
            style.remove_property("display").map(|_| ())
        } else {
            style.set_property("display", "none")
        };
        if let Err(e) = result {
            log::warn!("Toggle visibility: {e:?}");
        }
    }

    fn set_background(&mut self, color: Option<&str>) {
        let Some(body) = self.document.body() else {
            return;
        };
        let style = body.style();
        let (color, fade) = match color {
            Some(color) => (color, DISCO_FADE_SECS),
            None => (PLAIN_BACKGROUND, PLAIN_FADE_SECS),
        };
        let result = style
            .set_property("transition", &format!("background-color {fade}s ease"))
            .and_then(|_| style.set_property("background-color", color));
        if let Err(e) = result {
            log::warn!("Page background: {e:?}");
        }
    }
}
