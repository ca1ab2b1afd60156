//! First-last-invert-play focus transition
//!
//! When a tile is focused its layout box jumps to the enlarged position.
//! The inverse transform from the new box back to the old one is applied
//! immediately, then eased to identity so the tile appears to grow from
//! where it was.

use glam::Vec2;

use super::TileId;
use crate::Rect;

/// Translate + scale about the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipTransform {
    pub translate: Vec2,
    pub scale: Vec2,
}

impl FlipTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Transform that renders a box laid out at `last` exactly over `first`
    pub fn invert(first: Rect, last: Rect) -> Self {
        let ratio = |a: f32, b: f32| if b.abs() > f32::EPSILON { a / b } else { 1.0 };
        Self {
            translate: first.origin - last.origin,
            scale: Vec2::new(
                ratio(first.size.x, last.size.x),
                ratio(first.size.y, last.size.y),
            ),
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate.lerp(other.translate, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }

    /// Where `rect` renders under this transform
    pub fn apply(&self, rect: Rect) -> Rect {
        Rect {
            origin: rect.origin + self.translate,
            size: rect.size * self.scale,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translate.abs_diff_eq(Vec2::ZERO, 1e-4) && self.scale.abs_diff_eq(Vec2::ONE, 1e-4)
    }

    /// CSS `transform` value (pair with `transform-origin: top left`)
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}, {})",
            self.translate.x, self.translate.y, self.scale.x, self.scale.y
        )
    }
}

/// CSS-style cubic bezier easing with endpoints fixed at (0,0) and (1,1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    /// `cubic-bezier(0.2, 0, 0.2, 1)`
    pub const FOCUS: Self = Self {
        x1: 0.2,
        y1: 0.0,
        x2: 0.2,
        y2: 1.0,
    };

    fn sample(a1: f32, a2: f32, s: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    }

    fn slope(a1: f32, a2: f32, s: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    }

    /// Eased progress for linear progress `t` in `[0, 1]`
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }

        // Newton first, bisection if the slope flattens out
        let mut s = t;
        for _ in 0..8 {
            let err = Self::sample(self.x1, self.x2, s) - t;
            if err.abs() < 1e-5 {
                return Self::sample(self.y1, self.y2, s);
            }
            let d = Self::slope(self.x1, self.x2, s);
            if d.abs() < 1e-6 {
                break;
            }
            s = (s - err / d).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = t;
        for _ in 0..32 {
            let x = Self::sample(self.x1, self.x2, s);
            if (x - t).abs() < 1e-5 {
                break;
            }
            if x < t {
                lo = s;
            } else {
                hi = s;
            }
            s = (lo + hi) * 0.5;
        }
        Self::sample(self.y1, self.y2, s)
    }
}

/// An in-flight focus transition, cancellable at any point
#[derive(Debug, Clone)]
pub struct FocusAnimation {
    pub tile: TileId,
    pub from: FlipTransform,
    elapsed: f32,
    duration: f32,
    easing: CubicBezier,
}

impl FocusAnimation {
    pub fn new(tile: TileId, from: FlipTransform, duration: f32) -> Self {
        Self {
            tile,
            from,
            elapsed: 0.0,
            duration: duration.max(0.0),
            easing: CubicBezier::FOCUS,
        }
    }

    /// Advance by `dt` seconds and return the transform for this frame
    pub fn advance(&mut self, dt: f32) -> FlipTransform {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.current()
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        }
    }

    pub fn current(&self) -> FlipTransform {
        let eased = self.easing.ease(self.progress());
        self.from.lerp(FlipTransform::IDENTITY, eased)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}
