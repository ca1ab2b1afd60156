//! Gallery mode state machine
//!
//! Two independent axes of state:
//! - the global [`DisplayMode`]: tiles packed in a justified grid, or
//!   released into the physics sandbox ("disco")
//! - the per-tile [`TileMode`]: Grid, Floating, Focused or Disappeared
//!
//! `Gallery` is the only thing a UI layer talks to. It owns the tiles, the
//! sandbox and the stage, and keeps all three consistent across every
//! transition. Nothing in here fails: missing bodies or tiles are skipped
//! and logged.

pub mod focus;
pub mod stage;
pub mod tile;

pub use focus::{CubicBezier, FlipTransform, FocusAnimation};
pub use stage::Stage;
pub use tile::{Tile, TileId, TileKind, TileMode};

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::layout::{JustifiedLayout, LayoutItem, justify};
use crate::settings::Settings;
use crate::sim::Sandbox;

/// Global presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Tiles packed by the justified layout
    #[default]
    Grid,
    /// Tiles float freely in the physics sandbox
    Disco,
}

/// What pressing the toggle control did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Switched to the given display mode
    Switched(DisplayMode),
    /// The cleared-board message was shown instead
    Finale,
}

pub struct Gallery<S: Stage> {
    tiles: Vec<Tile>,
    /// Grid order of laid-out tiles (controls excluded)
    order: Vec<TileId>,
    display: DisplayMode,
    sandbox: Sandbox,
    stage: S,
    settings: Settings,
    rng: Pcg32,
    animation: Option<FocusAnimation>,
    layout: JustifiedLayout,
    /// Unsimulated time carried between frames
    accumulator: f32,
    /// Debounced grid relayout (seconds remaining)
    relayout_in: Option<f32>,
    /// Next disco background change (seconds remaining)
    disco_color_in: Option<f32>,
    /// Bumped on every focus, close and mode change
    focus_epoch: u64,
    easter_egg_ready: bool,
}

impl<S: Stage> Gallery<S> {
    pub fn new(stage: S, settings: Settings, seed: u64) -> Self {
        Self {
            tiles: Vec::new(),
            order: Vec::new(),
            display: DisplayMode::Grid,
            sandbox: Sandbox::new(),
            stage,
            settings,
            rng: Pcg32::seed_from_u64(seed),
            animation: None,
            layout: JustifiedLayout::default(),
            accumulator: 0.0,
            relayout_in: None,
            disco_color_in: None,
            focus_epoch: 0,
            easter_egg_ready: false,
        }
    }

    /// Register a tile from markup
    pub fn add_tile(&mut self, kind: TileKind) -> TileId {
        let id = TileId(self.tiles.len() as u32);
        let tile = Tile::new(id, kind);
        if tile.is_laid_out() {
            self.order.push(id);
        }
        self.tiles.push(tile);
        id
    }

    // === Accessors ===

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    pub fn grid_order(&self) -> &[TileId] {
        &self.order
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display
    }

    pub fn focused(&self) -> Option<TileId> {
        self.tiles.iter().find(|t| t.is_focused()).map(|t| t.id)
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut Sandbox {
        &mut self.sandbox
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &JustifiedLayout {
        &self.layout
    }

    pub fn focus_epoch(&self) -> u64 {
        self.focus_epoch
    }

    pub fn easter_egg_ready(&self) -> bool {
        self.easter_egg_ready
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    // === Tile metrics ===

    /// Record natural media dimensions once an image has loaded
    pub fn set_natural_size(&mut self, id: TileId, width: f32, height: f32) {
        if let Some(tile) = self.tiles.get_mut(id.index()) {
            tile.natural_size = Some(Vec2::new(width, height));
        }
    }

    /// Record the rendered width of an essay's text
    pub fn set_text_width(&mut self, id: TileId, width: f32) {
        if let Some(tile) = self.tiles.get_mut(id.index()) {
            tile.text_width = Some(width);
        }
    }

    // === Mode transitions ===

    /// Tear down the sandbox, reset every tile, reshuffle and lay out the grid
    pub fn enter_grid_mode(&mut self) {
        log::info!("Entering grid mode");
        self.reset_easter_egg();
        self.stop_disco_background();
        self.sandbox.stop();
        self.accumulator = 0.0;

        self.display = DisplayMode::Grid;
        self.stage.set_display_mode(DisplayMode::Grid);
        self.release_tiles(None);

        for tile in &mut self.tiles {
            tile.mode = TileMode::Grid;
            tile.visible = true;
            tile.held = false;
            self.stage.set_floating(tile.id, false);
            self.stage.set_hidden(tile.id, false);
        }
        self.stage.set_toggle_visible(true);

        // Fisher-Yates
        self.order.shuffle(&mut self.rng);
        self.stage.set_grid_order(&self.order);

        self.relayout_in = None;
        self.relayout();
    }

    /// Release every visible tile into the physics sandbox
    pub fn enter_disco_mode(&mut self) {
        if self.display == DisplayMode::Disco {
            log::debug!("Already in disco mode");
            self.close_all();
            return;
        }

        log::info!("Entering disco mode");
        self.reset_easter_egg();
        // Close while still in grid mode so a focused tile returns to the grid
        self.release_tiles(None);
        self.relayout_in = None;

        self.display = DisplayMode::Disco;
        self.stage.set_display_mode(DisplayMode::Disco);

        let mut bodies = Vec::new();
        for tile in &mut self.tiles {
            if !tile.visible {
                continue;
            }
            tile.mode = TileMode::Floating;
            tile.held = false;
            self.stage.set_row_height(tile.id, None);
            self.stage.set_floating(tile.id, true);
            bodies.push((tile.id, self.stage.tile_size(tile.id)));
        }

        let viewport = self.stage.viewport();
        self.accumulator = 0.0;
        self.sandbox
            .start(viewport, &bodies, &self.settings.tuning, &mut self.rng);
        self.change_disco_background();
    }

    /// "Lose form": leave the grid for disco mode
    pub fn lose_form(&mut self) {
        self.enter_disco_mode();
    }

    /// The toggle control: switch modes, or play the finale once the board is clear
    pub fn toggle(&mut self) -> ToggleOutcome {
        if self.easter_egg_ready {
            log::info!("Finale");
            self.stage.set_toggle_visible(false);
            self.stage.show_message(FINALE_MESSAGE);
            return ToggleOutcome::Finale;
        }

        match self.display {
            DisplayMode::Grid => {
                self.enter_disco_mode();
                ToggleOutcome::Switched(DisplayMode::Disco)
            }
            DisplayMode::Disco => {
                self.enter_grid_mode();
                ToggleOutcome::Switched(DisplayMode::Grid)
            }
        }
    }

    fn reset_easter_egg(&mut self) {
        self.easter_egg_ready = false;
        self.stage.hide_message();
    }

    /// Paint a random vibrant background and schedule the next one
    fn change_disco_background(&mut self) {
        if let Some(color) = DISCO_COLORS.choose(&mut self.rng) {
            self.stage.set_background(Some(*color));
        }
        self.disco_color_in = Some(self.settings.tuning.disco_color_interval);
    }

    fn stop_disco_background(&mut self) {
        self.disco_color_in = None;
        self.stage.set_background(None);
    }

    // === Focus ===

    /// Click entry point for a tile
    pub fn activate(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get(id.index()) else {
            log::warn!("activate: unknown tile {:?}", id);
            return;
        };

        match &tile.kind {
            TileKind::Control => {}
            TileKind::Media {
                video_src: Some(src),
            } => {
                // Clicks on a playing film must not close it
                if tile.is_focused() {
                    return;
                }
                let src = src.clone();
                self.focus(id);
                if self.tiles[id.index()].is_focused() {
                    self.stage.start_media(id, &src);
                }
            }
            TileKind::Essay { .. } => {
                if !tile.is_focused() {
                    self.focus(id);
                }
            }
            _ => self.focus(id),
        }
    }

    /// Finish an activation that had to wait (essay fetch). Ignored if any
    /// focus, close or mode change happened since `epoch` was read.
    pub fn focus_if_current(&mut self, id: TileId, epoch: u64) -> bool {
        if epoch != self.focus_epoch {
            log::debug!("Stale activation of {:?} dropped", id);
            return false;
        }
        let Some(tile) = self.tiles.get(id.index()) else {
            return false;
        };
        if !tile.visible || tile.mode == TileMode::Disappeared {
            return false;
        }
        self.activate(id);
        true
    }

    /// Focus a tile, or close it if it is already focused
    pub fn focus(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get(id.index()) else {
            log::warn!("focus: unknown tile {:?}", id);
            return;
        };
        if tile.kind.is_control() || !tile.visible || tile.mode == TileMode::Disappeared {
            return;
        }
        if tile.is_focused() {
            self.close_all();
            return;
        }

        // First: where the tile is now
        let first = self.stage.bounding_rect(id);
        let size = self.stage.tile_size(id);
        self.stage.insert_placeholder(id, size);
        self.tiles[id.index()].has_placeholder = true;

        self.close_all_except(Some(id));

        // Last: where it lands once focused and unconstrained
        self.tiles[id.index()].mode = TileMode::Focused;
        self.stage.set_focused(id, true);
        self.stage.set_overlay(true);
        self.stage.set_row_height(id, None);
        let last = self.stage.bounding_rect(id);

        if self.sandbox.freeze(id) {
            log::debug!("Froze body of focused {:?}", id);
        }

        // Invert, then play back to identity
        let mut animation = FocusAnimation::new(
            id,
            FlipTransform::invert(first, last),
            self.settings.effective_focus_duration(),
        );
        let transform = animation.advance(0.0);
        self.stage.set_focus_transform(id, Some(transform));
        self.animation = if animation.is_finished() {
            None
        } else {
            Some(animation)
        };
        log::info!("Focused {:?}", id);
    }

    /// Close every focused tile
    pub fn close_all(&mut self) {
        self.close_all_except(None);
    }

    fn close_all_except(&mut self, except: Option<TileId>) {
        self.release_tiles(except);
        if self.display == DisplayMode::Grid {
            self.relayout();
        }
    }

    /// Unfocus every tile but `except`. In disco mode a tile that was focused
    /// disappears; any other bound body is unfrozen.
    fn release_tiles(&mut self, except: Option<TileId>) {
        self.focus_epoch += 1;
        let disco = self.display == DisplayMode::Disco;
        let tuning = &self.settings.tuning;

        for tile in &mut self.tiles {
            let id = tile.id;
            if Some(id) == except || tile.kind.is_control() {
                continue;
            }

            let was_focused = tile.is_focused();
            let animating = self.animation.as_ref().is_some_and(|a| a.tile == id);
            if animating {
                self.animation = None;
            }
            if was_focused || animating {
                self.stage.set_focus_transform(id, None);
            }
            if was_focused {
                self.stage.set_focused(id, false);
            }
            if tile.has_placeholder {
                self.stage.remove_placeholder(id);
                tile.has_placeholder = false;
            }

            let bound = self.sandbox.binding().body_of(id).is_some();
            if disco {
                if was_focused {
                    if !bound {
                        log::warn!("No physics body for focused {:?}", id);
                    }
                    self.sandbox.release(id);
                    tile.mode = TileMode::Disappeared;
                    tile.visible = false;
                    self.stage.set_hidden(id, true);
                    log::info!("{:?} disappeared", id);
                } else if bound {
                    self.sandbox.unfreeze(id);
                }
            } else {
                // Grid mode stops the sandbox first; this only catches a
                // sandbox left running into grid mode
                if bound {
                    self.sandbox.unfreeze(id);
                    self.sandbox.rescue(id, tuning, &mut self.rng);
                }
                if was_focused {
                    tile.mode = TileMode::Grid;
                }
            }

            if tile.kind.video_src().is_some() {
                self.stage.stop_media(id);
            }
        }

        self.stage.set_overlay(false);
        self.check_easter_egg();
    }

    // === Controls ===

    /// Pointer entered a floating control: freeze it so it is easy to click
    pub fn hold(&mut self, id: TileId) {
        if self.display != DisplayMode::Disco {
            return;
        }
        let Some(tile) = self.tiles.get_mut(id.index()) else {
            return;
        };
        if tile.kind.is_control() && tile.mode == TileMode::Floating && !tile.held {
            tile.held = true;
            self.sandbox.freeze(id);
        }
    }

    /// Pointer left a control: let it drift again with a gentle push
    pub fn release_hold(&mut self, id: TileId) {
        let Some(tile) = self.tiles.get_mut(id.index()) else {
            return;
        };
        if !tile.held {
            return;
        }
        tile.held = false;
        if tile.visible && tile.mode == TileMode::Floating {
            self.sandbox.unfreeze(id);
            self.sandbox
                .nudge(id, self.settings.tuning.hover_release_speed, &mut self.rng);
        }
    }

    /// Click on a floating control: it disappears. Returns false outside
    /// disco mode, where the control keeps its normal action.
    pub fn dismiss(&mut self, id: TileId) -> bool {
        if self.display != DisplayMode::Disco {
            return false;
        }
        let Some(tile) = self.tiles.get_mut(id.index()) else {
            return false;
        };
        if !tile.kind.is_control() || tile.mode != TileMode::Floating {
            return false;
        }

        tile.held = false;
        tile.visible = false;
        tile.mode = TileMode::Disappeared;
        self.sandbox.release(id);
        self.stage.set_hidden(id, true);
        self.check_easter_egg();
        true
    }

    fn check_easter_egg(&mut self) {
        if self.display != DisplayMode::Disco || self.easter_egg_ready {
            return;
        }
        if self.tiles.iter().any(|t| t.visible) {
            return;
        }

        log::info!("Board cleared");
        self.easter_egg_ready = true;
        self.stage.show_message(CONGRATS_MESSAGE);
        self.stage.set_toggle_visible(true);
    }

    // === Layout & frame driving ===

    /// Re-run the justified layout (grid mode only)
    pub fn relayout(&mut self) {
        if self.display != DisplayMode::Grid {
            return;
        }

        // Essay text reflows with the viewport
        for tile in &mut self.tiles {
            if matches!(tile.kind, TileKind::Essay { .. }) {
                if let Some(width) = self.stage.text_width(tile.id) {
                    tile.text_width = Some(width);
                }
            }
        }

        let tuning = &self.settings.tuning;
        let items: Vec<LayoutItem> = self
            .order
            .iter()
            .map(|&id| LayoutItem {
                tile: id,
                aspect: self.tiles[id.index()].aspect_ratio(tuning),
            })
            .collect();

        let width = self.stage.container_width();
        self.layout = justify(&items, width, tuning, &mut self.rng);

        for (id, height) in self.layout.assignments() {
            // A focused tile stays unconstrained
            if self.tiles[id.index()].is_focused() {
                continue;
            }
            self.stage.set_row_height(id, Some(height));
        }
    }

    /// Viewport changed size
    pub fn on_viewport_resize(&mut self) {
        // Re-laying out behind a focused tile makes the background flash
        if self.focused().is_some() {
            return;
        }

        match self.display {
            DisplayMode::Grid => {
                self.relayout_in = Some(self.settings.tuning.resize_debounce);
            }
            DisplayMode::Disco => {
                let viewport = self.stage.viewport();
                self.sandbox
                    .on_viewport_resize(viewport, &self.settings.tuning, &mut self.rng);
            }
        }
    }

    /// Run exactly one physics tick (step + sync)
    pub fn tick(&mut self) {
        self.sandbox.tick(
            &self.tiles,
            &mut self.stage,
            &self.settings.tuning,
            &mut self.rng,
        );
    }

    /// Per-frame driver: debounced relayout, focus animation, fixed-step physics
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);

        if let Some(remaining) = self.disco_color_in {
            let remaining = remaining - dt;
            if remaining <= 0.0 {
                self.change_disco_background();
            } else {
                self.disco_color_in = Some(remaining);
            }
        }

        if let Some(remaining) = self.relayout_in.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.relayout_in = None;
                self.relayout();
            }
        }

        if let Some(animation) = self.animation.as_mut() {
            let transform = animation.advance(dt);
            let tile = animation.tile;
            let finished = animation.is_finished();
            self.stage.set_focus_transform(tile, Some(transform));
            if finished {
                self.animation = None;
            }
        }

        if !self.sandbox.is_active() {
            return;
        }

        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.tick();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop backlog the substep cap could not absorb
        self.accumulator = self.accumulator.min(SIM_DT);
    }
}
