//! The visual side of the gallery
//!
//! A stage owns the rendered elements. The gallery queries it for geometry
//! and pushes every visual change through it, so the core never touches
//! the DOM directly. The browser implementation lives in
//! `platform::dom`; `platform::headless` backs native runs and tests.

use glam::Vec2;

use super::focus::FlipTransform;
use super::{DisplayMode, TileId};
use crate::Rect;

pub trait Stage {
    // === Geometry queries ===

    /// Current viewport size
    fn viewport(&self) -> Vec2;

    /// Inner width of the grid container
    fn container_width(&self) -> f32;

    /// Untransformed layout size of a tile's element
    fn tile_size(&self, tile: TileId) -> Vec2;

    /// On-screen bounding box of a tile's element
    fn bounding_rect(&self, tile: TileId) -> Rect;

    /// Rendered width of an essay tile's text; re-read on every layout pass
    fn text_width(&self, tile: TileId) -> Option<f32>;

    // === Grid ===

    /// Switch the gallery container between grid and floating presentation
    fn set_display_mode(&mut self, mode: DisplayMode);

    /// Re-order grid cells (laid-out tiles only)
    fn set_grid_order(&mut self, order: &[TileId]);

    /// Apply a committed row height, or clear it with `None`
    fn set_row_height(&mut self, tile: TileId, height: Option<f32>);

    // === Floating ===

    /// Hand the element's position over to the physics sync (or take it back)
    fn set_floating(&mut self, tile: TileId, floating: bool);

    /// Place a floating element: top-left corner plus rotation (radians)
    fn set_transform(&mut self, tile: TileId, top_left: Vec2, angle: f32);

    fn set_hidden(&mut self, tile: TileId, hidden: bool);

    // === Focus ===

    /// Derived "is-focused" presentation
    fn set_focused(&mut self, tile: TileId, focused: bool);

    /// Focus transition transform; `None` cancels it and releases the element
    fn set_focus_transform(&mut self, tile: TileId, transform: Option<FlipTransform>);

    /// Hold the tile's grid slot with a same-size placeholder
    fn insert_placeholder(&mut self, tile: TileId, size: Vec2);

    fn remove_placeholder(&mut self, tile: TileId);

    /// Dim everything behind a focused tile
    fn set_overlay(&mut self, active: bool);

    // === Media and messages ===

    fn start_media(&mut self, tile: TileId, src: &str);

    /// Stop playback and restore the thumbnail
    fn stop_media(&mut self, tile: TileId);

    fn show_message(&mut self, text: &str);

    fn hide_message(&mut self);

    fn set_toggle_visible(&mut self, visible: bool);

    /// Page background: a disco color, or `None` for the plain page
    fn set_background(&mut self, color: Option<&str>);
}
