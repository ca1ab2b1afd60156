//! Disco Gallery - a justified media grid that can lose its form
//!
//! Core modules:
//! - `layout`: Justified row packing for the grid view
//! - `sim`: Zero-gravity physics sandbox (world, tile binding, self-healing sync)
//! - `gallery`: Tiles, focus animation and the grid/disco mode state machine
//! - `platform`: Browser DOM stage and a headless stage for native runs
//! - `settings`: Tunable heuristics and preferences

pub mod error;
pub mod gallery;
pub mod layout;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::GalleryError;
pub use gallery::{DisplayMode, Gallery, Stage, Tile, TileId, TileKind, TileMode, ToggleOutcome};
pub use settings::{Settings, Tuning};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Gallery-wide constants that are not worth tuning
pub mod consts {
    /// Fixed physics timestep (60 Hz). Velocities are expressed per tick.
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum physics ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Largest frame delta fed into the accumulator (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Shown when every tile and control has been cleared in disco mode
    pub const CONGRATS_MESSAGE: &str = "congrats";
    /// Shown when the toggle is pressed after the board was cleared
    pub const FINALE_MESSAGE: &str = "you did it! email me and say so";
    /// Page backgrounds cycled through while in disco mode
    pub const DISCO_COLORS: [&str; 9] = [
        "#FF5733", "#33FF57", "#3357FF", "#FF33A1", "#FF8F33", "#33FFF5", "#8F33FF", "#F533FF",
        "#FFF533",
    ];
    /// Substituted when an essay body cannot be fetched
    pub const ESSAY_FALLBACK_TEXT: &str = "Error loading text.";
}

/// Axis-aligned box in viewport coordinates (top-left origin, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }
}

/// Uniform sample in `[-spread / 2, spread / 2)`
#[inline]
pub fn jitter(rng: &mut impl Rng, spread: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * spread
}

/// Random 2D vector with each component in `[-spread / 2, spread / 2)`
#[inline]
pub fn jitter_vec(rng: &mut impl Rng, spread: f32) -> Vec2 {
    Vec2::new(jitter(rng, spread), jitter(rng, spread))
}
