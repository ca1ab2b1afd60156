//! Gallery settings and tunable heuristics
//!
//! Read from LocalStorage so a deployment can retune row heights or the
//! physics feel without a rebuild.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Randomized heuristics and thresholds used by layout, sandbox and focus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Justified layout ===
    /// Range the next row's target height is drawn from after a row closes
    pub target_height_range: (f32, f32),
    /// Target height of the very first row
    pub initial_row_height: f32,
    /// Hard cap on a solved row height
    pub max_row_height: f32,
    /// Aspect ratios below this count as portrait
    pub portrait_threshold: f32,
    /// Minimum target height for a row holding a portrait tile
    pub portrait_row_height: f32,
    /// Horizontal gap between tiles in a row (must match the CSS gap)
    pub gap: f32,
    /// Extra width added to an essay's measured text width
    pub essay_padding: f32,
    /// Reference height the essay aspect ratio is estimated against
    pub essay_reference_height: f32,

    // === Sandbox ===
    /// Distance from an edge that counts as "in" that edge for stuck detection
    pub corner_threshold: f32,
    /// Consecutive slow cornered ticks tolerated before a kick
    pub stuck_frame_limit: u32,
    /// Speed (units per tick) below which a body counts as stationary
    pub min_speed: f32,
    /// Range of each kick component, directed away from the occupied edges
    pub kick_magnitude_range: (f32, f32),
    /// Launch velocity components are drawn from `[-launch_speed, launch_speed)`
    pub launch_speed: f32,
    /// Launch angular velocity is drawn from `[-launch_spin, launch_spin)`
    pub launch_spin: f32,
    /// Bodies this close to an edge (or origin) are considered corrupted
    pub rescue_margin: f32,
    /// Rescued bodies land within `rescue_spread` of the viewport center
    pub rescue_spread: f32,
    /// Bodies are clamped this far inside the walls after a resize
    pub resize_padding: f32,
    /// Nudge velocity components are drawn from `[-nudge_speed, nudge_speed)`
    pub nudge_speed: f32,
    /// Push given to a control when the pointer leaves it
    pub hover_release_speed: f32,
    /// Boundary wall thickness (thick walls prevent tunneling)
    pub wall_thickness: f32,
    /// Cushion added to a body's safety radius when spawning
    pub spawn_padding: f32,

    // === Timing (seconds) ===
    pub focus_duration: f32,
    pub resize_debounce: f32,
    /// How long each disco background color lasts
    pub disco_color_interval: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            target_height_range: (180.0, 320.0),
            initial_row_height: 250.0,
            max_row_height: 700.0,
            portrait_threshold: 0.95,
            portrait_row_height: 600.0,
            gap: 12.0,
            essay_padding: 100.0,
            essay_reference_height: 250.0,

            corner_threshold: 100.0,
            stuck_frame_limit: 30,
            min_speed: 0.5,
            kick_magnitude_range: (3.0, 8.0),
            launch_speed: 4.0,
            launch_spin: 0.025,
            rescue_margin: 50.0,
            rescue_spread: 50.0,
            resize_padding: 50.0,
            nudge_speed: 2.5,
            hover_release_speed: 2.0,
            wall_thickness: 1000.0,
            spawn_padding: 25.0,

            focus_duration: 0.4,
            resize_debounce: 0.05,
            disco_color_interval: 1.5,
        }
    }
}

/// Gallery settings/preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Layout and physics heuristics
    pub tuning: Tuning,

    // === Accessibility ===
    /// Reduced motion (focus jumps instead of animating)
    pub reduced_motion: bool,
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective focus animation duration (respects reduced_motion)
    pub fn effective_focus_duration(&self) -> f32 {
        if self.reduced_motion {
            0.0
        } else {
            self.tuning.focus_duration
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "disco_gallery_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
