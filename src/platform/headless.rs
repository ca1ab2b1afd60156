//! In-memory stage for native runs and tests
//!
//! Records every visual change the gallery pushes and answers geometry
//! queries from a simple model: grid tiles sit on a diagonal by grid slot,
//! floating tiles sit wherever the last transform put them, and a focused
//! tile is centered and scaled to fit most of the viewport.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use crate::Rect;
use crate::gallery::{DisplayMode, FlipTransform, Stage, TileId};

/// Share of the viewport a focused tile may fill
const FOCUS_FILL: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct HeadlessStage {
    viewport: Vec2,
    container_width: f32,
    default_size: Vec2,
    sizes: BTreeMap<TileId, Vec2>,
    text_widths: BTreeMap<TileId, f32>,

    display_mode: DisplayMode,
    grid_order: Vec<TileId>,
    row_heights: BTreeMap<TileId, f32>,
    floating: BTreeSet<TileId>,
    transforms: BTreeMap<TileId, (Vec2, f32)>,
    hidden: BTreeSet<TileId>,
    focused: BTreeSet<TileId>,
    focus_transforms: BTreeMap<TileId, FlipTransform>,
    placeholders: BTreeMap<TileId, Vec2>,
    overlay: bool,
    playing: BTreeMap<TileId, String>,
    message: Option<String>,
    toggle_visible: bool,
    background: Option<String>,
    background_changes: u32,
}

impl HeadlessStage {
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            container_width: viewport.x,
            default_size: Vec2::new(200.0, 150.0),
            sizes: BTreeMap::new(),
            text_widths: BTreeMap::new(),
            display_mode: DisplayMode::Grid,
            grid_order: Vec::new(),
            row_heights: BTreeMap::new(),
            floating: BTreeSet::new(),
            transforms: BTreeMap::new(),
            hidden: BTreeSet::new(),
            focused: BTreeSet::new(),
            focus_transforms: BTreeMap::new(),
            placeholders: BTreeMap::new(),
            overlay: false,
            playing: BTreeMap::new(),
            message: None,
            toggle_visible: true,
            background: None,
            background_changes: 0,
        }
    }

    /// Give one tile an explicit element size
    pub fn with_tile_size(mut self, tile: TileId, size: Vec2) -> Self {
        self.sizes.insert(tile, size);
        self
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn set_container_width(&mut self, width: f32) {
        self.container_width = width;
    }

    /// Simulate an essay's text reflowing to a new width
    pub fn set_text_width(&mut self, tile: TileId, width: f32) {
        self.text_widths.insert(tile, width);
    }

    // === Recorded state ===

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn grid_order(&self) -> &[TileId] {
        &self.grid_order
    }

    pub fn row_height(&self, tile: TileId) -> Option<f32> {
        self.row_heights.get(&tile).copied()
    }

    pub fn is_floating(&self, tile: TileId) -> bool {
        self.floating.contains(&tile)
    }

    /// Last physics transform written for a tile: top-left and angle
    pub fn transform(&self, tile: TileId) -> Option<(Vec2, f32)> {
        self.transforms.get(&tile).copied()
    }

    pub fn is_hidden(&self, tile: TileId) -> bool {
        self.hidden.contains(&tile)
    }

    pub fn is_focused(&self, tile: TileId) -> bool {
        self.focused.contains(&tile)
    }

    pub fn focus_transform(&self, tile: TileId) -> Option<FlipTransform> {
        self.focus_transforms.get(&tile).copied()
    }

    pub fn has_placeholder(&self, tile: TileId) -> bool {
        self.placeholders.contains_key(&tile)
    }

    pub fn overlay(&self) -> bool {
        self.overlay
    }

    pub fn playing(&self, tile: TileId) -> Option<&str> {
        self.playing.get(&tile).map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn toggle_visible(&self) -> bool {
        self.toggle_visible
    }

    /// Current disco background, `None` for the plain page
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// Number of disco colors painted so far
    pub fn background_changes(&self) -> u32 {
        self.background_changes
    }

    fn size_of(&self, tile: TileId) -> Vec2 {
        let size = self.sizes.get(&tile).copied().unwrap_or(self.default_size);
        match self.row_heights.get(&tile) {
            Some(&height) if size.y > 0.0 => Vec2::new(size.x * height / size.y, height),
            _ => size,
        }
    }
}

impl Stage for HeadlessStage {
    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn container_width(&self) -> f32 {
        self.container_width
    }

    fn tile_size(&self, tile: TileId) -> Vec2 {
        self.size_of(tile)
    }

    fn bounding_rect(&self, tile: TileId) -> Rect {
        let size = self.size_of(tile);

        if self.focused.contains(&tile) {
            let fit = (self.viewport * FOCUS_FILL / size.max(Vec2::ONE)).min_element();
            let focused = size * fit;
            let origin = (self.viewport - focused) / 2.0;
            return Rect::new(origin.x, origin.y, focused.x, focused.y);
        }

        if let Some(&(top_left, _)) = self.transforms.get(&tile) {
            if self.floating.contains(&tile) {
                return Rect::new(top_left.x, top_left.y, size.x, size.y);
            }
        }

        let slot = self
            .grid_order
            .iter()
            .position(|&t| t == tile)
            .unwrap_or(self.grid_order.len()) as f32;
        Rect::new(slot * 20.0, slot * 20.0, size.x, size.y)
    }

    fn text_width(&self, tile: TileId) -> Option<f32> {
        self.text_widths.get(&tile).copied()
    }

    fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    fn set_grid_order(&mut self, order: &[TileId]) {
        self.grid_order = order.to_vec();
    }

    fn set_row_height(&mut self, tile: TileId, height: Option<f32>) {
        match height {
            Some(height) => self.row_heights.insert(tile, height),
            None => self.row_heights.remove(&tile),
        };
    }

    fn set_floating(&mut self, tile: TileId, floating: bool) {
        if floating {
            self.floating.insert(tile);
        } else {
            self.floating.remove(&tile);
            self.transforms.remove(&tile);
        }
    }

    fn set_transform(&mut self, tile: TileId, top_left: Vec2, angle: f32) {
        self.transforms.insert(tile, (top_left, angle));
    }

    fn set_hidden(&mut self, tile: TileId, hidden: bool) {
        if hidden {
            self.hidden.insert(tile);
        } else {
            self.hidden.remove(&tile);
        }
    }

    fn set_focused(&mut self, tile: TileId, focused: bool) {
        if focused {
            self.focused.insert(tile);
        } else {
            self.focused.remove(&tile);
        }
    }

    fn set_focus_transform(&mut self, tile: TileId, transform: Option<FlipTransform>) {
        match transform {
            Some(transform) => self.focus_transforms.insert(tile, transform),
            None => self.focus_transforms.remove(&tile),
        };
    }

    fn insert_placeholder(&mut self, tile: TileId, size: Vec2) {
        self.placeholders.insert(tile, size);
    }

    fn remove_placeholder(&mut self, tile: TileId) {
        self.placeholders.remove(&tile);
    }

    fn set_overlay(&mut self, active: bool) {
        self.overlay = active;
    }

    fn start_media(&mut self, tile: TileId, src: &str) {
        self.playing.insert(tile, src.to_string());
    }

    fn stop_media(&mut self, tile: TileId) {
        self.playing.remove(&tile);
    }

    fn show_message(&mut self, text: &str) {
        self.message = Some(text.to_string());
    }

    fn hide_message(&mut self) {
        self.message = None;
    }

    fn set_toggle_visible(&mut self, visible: bool) {
        self.toggle_visible = visible;
    }

    fn set_background(&mut self, color: Option<&str>) {
        if color.is_some() {
            self.background_changes += 1;
        }
        self.background = color.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focused_rect_is_centered() {
        let mut stage = HeadlessStage::new(Vec2::new(1000.0, 800.0));
        stage.set_focused(TileId(0), true);
        let rect = stage.bounding_rect(TileId(0));
        assert!(rect.center().abs_diff_eq(Vec2::new(500.0, 400.0), 1e-3));
        assert!(rect.size.x <= 800.0 + 1e-3 && rect.size.y <= 640.0 + 1e-3);
    }

    #[test]
    fn test_row_height_scales_element() {
        let mut stage = HeadlessStage::new(Vec2::new(1000.0, 800.0))
            .with_tile_size(TileId(1), Vec2::new(400.0, 200.0));
        stage.set_row_height(TileId(1), Some(100.0));
        assert_eq!(stage.tile_size(TileId(1)), Vec2::new(200.0, 100.0));
        stage.set_row_height(TileId(1), None);
        assert_eq!(stage.tile_size(TileId(1)), Vec2::new(400.0, 200.0));
    }
}
