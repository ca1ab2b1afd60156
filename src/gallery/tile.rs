//! Tiles: the visual units of the gallery
//!
//! Tiles are created once from markup and never destroyed, only hidden.
//! The per-tile [`TileMode`] is the single source of truth for how a tile
//! is presented; visual classes are derived from it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::Tuning;

/// Stable tile identifier (index into the gallery's tile list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a tile shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Image or film still; films carry a playable source
    Media { video_src: Option<String> },
    /// Text essay loaded on demand from `path`
    Essay { path: String },
    /// Anything else laid out in the grid
    Plain,
    /// Floating link button: never laid out or focused, floats in disco mode
    Control,
}

impl TileKind {
    pub fn is_control(&self) -> bool {
        matches!(self, TileKind::Control)
    }

    pub fn video_src(&self) -> Option<&str> {
        match self {
            TileKind::Media { video_src } => video_src.as_deref(),
            _ => None,
        }
    }
}

/// Presentation state of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileMode {
    /// Packed in the justified grid (or pinned in place, for controls)
    Grid,
    /// Represented by a dynamic body in the sandbox
    Floating,
    /// Enlarged for viewing; any body is frozen
    Focused,
    /// Removed from view and from the sandbox (disco mode only)
    Disappeared,
}

/// A gallery tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileKind,
    pub mode: TileMode,
    /// Natural media dimensions, once known
    pub natural_size: Option<Vec2>,
    /// Rendered width of an essay's text, once measured
    pub text_width: Option<f32>,
    pub visible: bool,
    /// Hovered control whose body is frozen on purpose
    pub held: bool,
    /// A same-size placeholder currently holds this tile's grid slot
    pub has_placeholder: bool,
}

impl Tile {
    pub fn new(id: TileId, kind: TileKind) -> Self {
        Self {
            id,
            kind,
            mode: TileMode::Grid,
            natural_size: None,
            text_width: None,
            visible: true,
            held: false,
            has_placeholder: false,
        }
    }

    #[inline]
    pub fn is_focused(&self) -> bool {
        self.mode == TileMode::Focused
    }

    /// Whether the tile takes part in the justified grid
    #[inline]
    pub fn is_laid_out(&self) -> bool {
        !self.kind.is_control()
    }

    /// Aspect ratio used for layout
    ///
    /// Media with known natural dimensions use them; essays without media
    /// are estimated from their text width; everything else is square.
    pub fn aspect_ratio(&self, tuning: &Tuning) -> f32 {
        if let Some(size) = self.natural_size {
            if size.x > 0.0 && size.y > 0.0 {
                return size.x / size.y;
            }
        }
        if let (TileKind::Essay { .. }, Some(text_width)) = (&self.kind, self.text_width) {
            let ratio = (text_width + tuning.essay_padding) / tuning.essay_reference_height;
            if ratio.is_finite() && ratio > 0.0 {
                return ratio;
            }
        }
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_aspect_from_natural_size() {
        let mut tile = Tile::new(TileId(0), TileKind::Media { video_src: None });
        assert_eq!(tile.aspect_ratio(&Tuning::default()), 1.0);
        tile.natural_size = Some(Vec2::new(1600.0, 900.0));
        assert!((tile.aspect_ratio(&Tuning::default()) - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_essay_aspect_estimate() {
        let mut tile = Tile::new(
            TileId(1),
            TileKind::Essay {
                path: "essays/one.txt".into(),
            },
        );
        tile.text_width = Some(400.0);
        assert!((tile.aspect_ratio(&Tuning::default()) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_natural_size_falls_back() {
        let mut tile = Tile::new(TileId(2), TileKind::Plain);
        tile.natural_size = Some(Vec2::ZERO);
        assert_eq!(tile.aspect_ratio(&Tuning::default()), 1.0);
    }
}
